// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Authentication of discovery requests.
//!
//! Callers present a web service token in the `Authorization` header. The host resolves the token
//! to a user and the external service the token was issued for ([`Authenticator`]), and decides
//! which enabled protocols that user may use ([`ProtocolAuthorizer`]).

use async_trait::async_trait;
use thiserror::Error;

use crate::error::DiscoveryError;
use crate::http::{AUTHORIZATION_HEADER, RequestHead};

const TOKEN_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: i64,
    pub username: String,
}

/// A successfully authenticated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authentication {
    pub caller: Caller,
    /// The external service the token grants access to.
    pub service_id: i64,
}

/// A rejected token, reported with the host's error code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthenticationError {
    pub errorcode: String,
    pub message: String,
    pub debuginfo: Option<String>,
}

impl AuthenticationError {
    pub fn new(errorcode: &str, message: &str) -> Self {
        Self {
            errorcode: errorcode.to_string(),
            message: message.to_string(),
            debuginfo: None,
        }
    }

    pub fn with_debuginfo(mut self, debuginfo: impl Into<String>) -> Self {
        self.debuginfo = Some(debuginfo.into());
        self
    }

    pub fn no_auth_header() -> Self {
        Self::new(
            "noauthheader",
            "No Authorization header found in request sent to Moodle",
        )
    }

    pub fn invalid_token() -> Self {
        Self::new("invalidtoken", "Invalid token - token not found")
    }

    pub fn expired_token() -> Self {
        Self::new("expiredtoken", "Invalid token - token expired")
    }

    pub fn service_not_available() -> Self {
        Self::new(
            "servicenotavailable",
            "Web service is not available (it doesn't exist or might be disabled)",
        )
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Authentication, AuthenticationError>;
}

#[async_trait]
pub trait ProtocolAuthorizer: Send + Sync {
    /// The enabled protocols the caller may use, in the host's order.
    async fn permitted_protocols(&self, caller: &Caller) -> Result<Vec<String>, DiscoveryError>;
}

/// Extract the web service token from the `Authorization` header, with any `Bearer ` prefix
/// removed.
pub fn extract_token(head: &dyn RequestHead) -> Result<String, DiscoveryError> {
    let header = head
        .get_header(AUTHORIZATION_HEADER)
        .ok_or_else(|| DiscoveryError::AuthenticationFailure(AuthenticationError::no_auth_header()))?;

    Ok(header
        .strip_prefix(TOKEN_PREFIX)
        .unwrap_or(&header)
        .to_string())
}
