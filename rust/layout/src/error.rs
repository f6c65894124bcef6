// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while solving a layout
#[derive(Error, Debug)]
pub enum Error {
    #[error("Constraint solver returned status {status}. Consider relaxing constraints or using the heuristic solver.")]
    SolverStatus { status: String },

    #[error("Constraint solver found no feasible layout within {limit_secs} s")]
    Timeout { limit_secs: u64 },

    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
