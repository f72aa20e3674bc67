// SPDX-License-Identifier: MIT

//! ak-host: the actor host (C3 projection + C4 lifecycle/event loop),
//! generic over the [`ak_machine::Machine`] collaborator and the
//! [`ak_storage::SnapshotStore`] persistence backend.

mod actor;
mod cache;
mod error;
mod project;
mod subscription;

pub use actor::{ActorHandle, ConnectResult, GetSnapshotResult, WaitFor};
pub use cache::SnapshotCache;
pub use error::HostError;
pub use project::project;
pub use subscription::{CloseReason, Patch};
