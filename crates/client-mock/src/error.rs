// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MockClientError {
    #[error("waitFor timed out before the predicate matched")]
    WaitTimeout,
}
