use super::*;

const KEY: &[u8] = b"test-signing-key";

fn actor() -> ActorAddress {
    ActorAddress::new("todo", "L1")
}

#[test]
fn access_token_round_trips() {
    let caller = Caller::client("anonymous");
    let token = issue_access(KEY, &actor(), &caller);
    let verified = verify_access(KEY, &token, &actor()).unwrap();
    assert_eq!(verified, caller);
}

#[test]
fn connection_token_round_trips() {
    let caller = Caller::client("anonymous");
    let token = issue_connection(KEY, &actor(), "conn-1", &caller);
    let verified = verify_connection(KEY, &token, &actor(), "conn-1").unwrap();
    assert_eq!(verified, caller);
}

#[test]
fn rejects_wrong_signing_key() {
    let token = issue_access(KEY, &actor(), &Caller::client("anonymous"));
    let err = verify_access(b"other-key", &token, &actor()).unwrap_err();
    assert!(matches!(err, TokenError::Malformed(_)));
}

#[test]
fn rejects_mismatched_actor_id() {
    let token = issue_access(KEY, &actor(), &Caller::client("anonymous"));
    let other = ActorAddress::new("todo", "L2");
    let err = verify_access(KEY, &token, &other).unwrap_err();
    assert!(matches!(err, TokenError::JtiMismatch { .. }));
}

#[test]
fn rejects_mismatched_actor_type() {
    let token = issue_access(KEY, &actor(), &Caller::client("anonymous"));
    let other = ActorAddress::new("note", "L1");
    let err = verify_access(KEY, &token, &other).unwrap_err();
    assert!(matches!(err, TokenError::AudMismatch { .. }));
}

#[test]
fn connection_token_does_not_verify_as_access_token() {
    let token = issue_connection(KEY, &actor(), "conn-1", &Caller::client("anonymous"));
    // jti is "conn-1", not the actor id, so access verification fails.
    let err = verify_access(KEY, &token, &actor()).unwrap_err();
    assert!(matches!(err, TokenError::JtiMismatch { .. }));
}
