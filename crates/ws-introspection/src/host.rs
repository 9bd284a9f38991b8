// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Interfaces to the host platform.
//!
//! The catalog is built from information the host owns: the table of registered functions, the
//! reflection layer that describes them, the plugin registry and the installed languages and
//! themes. Hosts implement these traits; tests substitute fixed data.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::function::{FunctionInfo, FunctionRecord};

pub type ServiceId = i64;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("Function `{0}` is not registered")]
    UnknownFunction(String),

    #[error("External service {0} does not exist")]
    UnknownService(ServiceId),

    #[error("{0}")]
    Delegate(#[from] Box<dyn std::error::Error + Send + Sync>),
}

#[async_trait]
pub trait FunctionRegistry: Send + Sync {
    /// Every registered function, ordered by component and then by name.
    async fn all_functions(&self) -> Result<Vec<FunctionRecord>, HostError>;

    /// The functions exposed by an external service, ordered by name.
    async fn service_functions(
        &self,
        service: ServiceId,
    ) -> Result<Vec<FunctionRecord>, HostError>;

    /// Reflect on a registered function. Fails with [`HostError::UnknownFunction`] if the record
    /// does not refer to a registered function.
    async fn describe_function(&self, record: &FunctionRecord) -> Result<FunctionInfo, HostError>;
}

#[async_trait]
pub trait PluginRegistry: Send + Sync {
    async fn list_components(&self) -> Result<Vec<String>, HostError>;

    /// Components shipped as part of the platform's standard distribution. Potentially expensive.
    async fn standard_plugins(&self) -> Result<HashSet<String>, HostError>;

    /// Version of an installed plugin, `None` if the component is unknown.
    async fn component_version(&self, component: &str) -> Result<Option<String>, HostError>;

    /// Version of the platform itself (the version of the root component).
    async fn platform_version(&self) -> Result<String, HostError>;
}

/// The closed sets of legal values for the language and theme semantic types.
pub trait SiteEnumerations: Send + Sync {
    fn installed_languages(&self) -> Vec<String>;

    fn installed_themes(&self) -> Vec<String>;
}
