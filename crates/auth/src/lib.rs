// SPDX-License-Identifier: MIT

//! ak-auth: mint and verify the HS256 bearer tokens that bind a caller
//! to a specific actor (spec §4.1, §6).
//!
//! Grounded in `spacetimedb-auth`'s `jsonwebtoken`-based identity claims
//! (examples/clockworklabs-SpacetimeDB/crates/auth) — same library,
//! narrowed to the single `{jti, sub, aud, exp}` shape this spec needs
//! instead of SpacetimeDB's richer identity claims.

use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use ak_core::{ActorAddress, Caller};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 30 days, per spec §3.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 30 * 24 * 60 * 60;
/// 1 day, per spec §3.
pub const CONNECTION_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("signature invalid or token malformed: {0}")]
    Malformed(String),
    #[error("token expired")]
    Expired,
    #[error("token jti {actual:?} does not match expected {expected:?}")]
    JtiMismatch { expected: String, actual: String },
    #[error("token aud {actual:?} does not match expected actor type {expected:?}")]
    AudMismatch { expected: String, actual: String },
    #[error("token sub {0:?} is not a valid \"<callerType>-<uuid|anonymous>\" subject")]
    BadSubject(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    jti: String,
    sub: String,
    aud: String,
    exp: u64,
}

fn encode(key: &[u8], jti: &str, caller: &Caller, aud: &str, ttl_secs: u64) -> String {
    let exp = now_epoch_secs() + ttl_secs;
    let claims = Claims { jti: jti.to_string(), sub: caller.to_sub(), aud: aud.to_string(), exp };
    let header = Header::new(Algorithm::HS256);
    // encoding with a valid EncodingKey over well-formed claims cannot
    // fail; unwrap_or_default avoids pulling Result through callers that
    // cannot do anything but treat it as "could not mint a token".
    jsonwebtoken::encode(&header, &claims, &EncodingKey::from_secret(key)).unwrap_or_default()
}

fn now_epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Mints a 30-day access token binding `caller` to `actor`.
pub fn issue_access(signing_key: &[u8], actor: &ActorAddress, caller: &Caller) -> String {
    encode(signing_key, &actor.actor_id, caller, &actor.actor_type, ACCESS_TOKEN_TTL_SECS)
}

/// Mints a 1-day connection token carrying `connection_id` in `jti`,
/// letting a re-entering client reclaim its server-side caller record
/// without re-presenting the original access token.
pub fn issue_connection(signing_key: &[u8], actor: &ActorAddress, connection_id: &str, caller: &Caller) -> String {
    encode(signing_key, connection_id, caller, &actor.actor_type, CONNECTION_TOKEN_TTL_SECS)
}

fn decode_claims(signing_key: &[u8], token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // `exp` is checked manually below against our own clock so test
    // code can use `ak_core::FakeClock`-driven expectations; disabling
    // jsonwebtoken's own exp check keeps us from validating twice.
    validation.validate_exp = false;
    validation.validate_aud = false;
    let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    Ok(data.claims)
}

fn verify_claims(claims: Claims, expected_jti: &str, expected_aud: &str) -> Result<Caller, TokenError> {
    if claims.exp < now_epoch_secs() {
        return Err(TokenError::Expired);
    }
    if claims.jti != expected_jti {
        return Err(TokenError::JtiMismatch { expected: expected_jti.to_string(), actual: claims.jti });
    }
    if claims.aud != expected_aud {
        return Err(TokenError::AudMismatch { expected: expected_aud.to_string(), actual: claims.aud });
    }
    Caller::from_str(&claims.sub).map_err(|_| TokenError::BadSubject(claims.sub))
}

/// Verifies an access token against the actor it claims to bind to.
/// Fails per spec §4.1: bad signature, expired, `jti != actorId`,
/// `aud != actorType`, or an unparseable `sub`.
pub fn verify_access(signing_key: &[u8], token: &str, expected_actor: &ActorAddress) -> Result<Caller, TokenError> {
    let claims = decode_claims(signing_key, token)?;
    verify_claims(claims, &expected_actor.actor_id, &expected_actor.actor_type)
}

/// Verifies a connection token, whose `jti` is a `connection_id`
/// rather than the actor id.
pub fn verify_connection(
    signing_key: &[u8],
    token: &str,
    expected_actor: &ActorAddress,
    expected_connection_id: &str,
) -> Result<Caller, TokenError> {
    let claims = decode_claims(signing_key, token)?;
    verify_claims(claims, expected_connection_id, &expected_actor.actor_type)
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
