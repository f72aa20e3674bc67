// SPDX-License-Identifier: MIT

//! ak-core: shared data model for the actor host runtime.
//!
//! Types here are intentionally thin — they describe the wire shapes
//! from the spec (caller, address, event envelope, machine context) and
//! carry no behavior that belongs to a specific component (host,
//! router, client). Every other `ak-*` crate depends on this one.

pub mod address;
pub mod caller;
pub mod clock;
pub mod context;
pub mod error;
pub mod event;

pub use address::ActorAddress;
pub use caller::{Caller, CallerType, ParseCallerError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{CallerSnapshot, MachineContext, Snapshot};
pub use error::CoreError;
pub use event::{Event, RequestInfo, SystemEventKind};
