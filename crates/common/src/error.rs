// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthenticationError;

const NO_PROTOCOLS_MESSAGE: &str =
    "There are no web service protocols enabled or you don't have permission to use them";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred while describing web services";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("{0}")]
    AuthenticationFailure(AuthenticationError),

    #[error("There are no web service protocols enabled or you don't have permission to use them")]
    AuthorizationEmpty,

    #[error("{0}")]
    Unexpected(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub exception: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errorcode: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debuginfo: Option<String>,
}

impl DiscoveryError {
    pub fn unexpected(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        DiscoveryError::Unexpected(error.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DiscoveryError::AuthenticationFailure(_) => StatusCode::UNAUTHORIZED,
            DiscoveryError::AuthorizationEmpty => StatusCode::FORBIDDEN,
            DiscoveryError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn exception(&self) -> &'static str {
        match self {
            DiscoveryError::AuthenticationFailure(_) => "authentication_failure",
            DiscoveryError::AuthorizationEmpty => "authorization_empty",
            DiscoveryError::Unexpected(_) => "unexpected_failure",
        }
    }

    /// Shape the error for a response. Debugging information is only included if `debug` is set.
    pub fn to_envelope(&self, debug: bool) -> ErrorEnvelope {
        let (errorcode, message, debuginfo) = match self {
            DiscoveryError::AuthenticationFailure(error) => (
                Some(error.errorcode.clone()),
                error.message.clone(),
                error.debuginfo.clone(),
            ),
            DiscoveryError::AuthorizationEmpty => (
                Some("noprotocols".to_string()),
                NO_PROTOCOLS_MESSAGE.to_string(),
                None,
            ),
            DiscoveryError::Unexpected(error) => {
                (None, UNEXPECTED_MESSAGE.to_string(), Some(error.to_string()))
            }
        };

        ErrorEnvelope {
            exception: self.exception().to_string(),
            errorcode,
            message,
            debuginfo: debuginfo.filter(|_| debug),
        }
    }
}
