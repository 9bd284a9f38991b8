// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Could not read host snapshot `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid host snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {member} description of function `{function}`: {source}")]
    InvalidDescription {
        function: String,
        member: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
