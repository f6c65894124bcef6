// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for topology operations.

/// Result type alias for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or querying a topology graph.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An edge or query referenced a space that is not in the graph.
    #[error("space '{space_id}' referenced in edge but not defined as a node")]
    MissingNode { space_id: String },

    /// An area attribute was present but not a positive, finite number.
    #[error("space '{space_id}' has invalid {field}: {value}")]
    InvalidArea {
        space_id: String,
        field: &'static str,
        value: f64,
    },
}

impl Error {
    pub(crate) fn missing(space_id: &str) -> Self {
        Error::MissingNode {
            space_id: space_id.to_string(),
        }
    }
}
