// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use ws_introspection::{Description, FunctionInfo};

use crate::error::SnapshotError;

/// A site export, with all function descriptions validated.
#[derive(Debug, Clone)]
pub struct HostSnapshot {
    /// The platform's own version, such as `2024100700.00`.
    pub version: String,
    pub release: Option<String>,
    pub languages: Vec<String>,
    pub themes: Vec<String>,
    pub protocols: Vec<ProtocolSnapshot>,
    pub components: Vec<ComponentSnapshot>,
    pub users: Vec<UserSnapshot>,
    pub services: Vec<ServiceSnapshot>,
    pub tokens: Vec<TokenSnapshot>,
    pub functions: Vec<FunctionInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolSnapshot {
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentSnapshot {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub standard: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSnapshot {
    pub id: i64,
    pub username: String,
    /// Protocols the user has the capability to use.
    #[serde(default)]
    pub protocols: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSnapshot {
    pub id: i64,
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Names of the functions the service exposes.
    #[serde(default)]
    pub functions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSnapshot {
    pub token: String,
    pub user: i64,
    pub service: i64,
    /// Expiry in seconds since the Unix epoch. Tokens without one never expire.
    #[serde(default)]
    pub valid_until: Option<i64>,
}

#[derive(Deserialize)]
struct RawSnapshot {
    version: String,
    #[serde(default)]
    release: Option<String>,
    #[serde(default)]
    languages: Vec<String>,
    #[serde(default)]
    themes: Vec<String>,
    #[serde(default)]
    protocols: Vec<ProtocolSnapshot>,
    #[serde(default)]
    components: Vec<ComponentSnapshot>,
    #[serde(default)]
    users: Vec<UserSnapshot>,
    #[serde(default)]
    services: Vec<ServiceSnapshot>,
    #[serde(default)]
    tokens: Vec<TokenSnapshot>,
    #[serde(default)]
    functions: Vec<RawFunction>,
}

// Descriptions are kept as plain JSON until the whole file is parsed, so that a bad description
// can be reported with the name of its function.
#[derive(Deserialize)]
struct RawFunction {
    id: i64,
    name: String,
    component: String,
    #[serde(default)]
    classname: String,
    #[serde(default)]
    methodname: String,
    #[serde(default)]
    classpath: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(rename = "type", default = "default_function_type")]
    function_type: String,
    #[serde(default)]
    capabilities: String,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    ajax: bool,
    #[serde(default = "default_true")]
    loginrequired: bool,
    #[serde(default)]
    readonlysession: bool,
    #[serde(default)]
    deprecated: bool,
    parameters: Value,
    #[serde(default)]
    returns: Option<Value>,
    #[serde(default)]
    extra: IndexMap<String, Value>,
}

fn default_true() -> bool {
    true
}

fn default_function_type() -> String {
    "read".to_string()
}

impl HostSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let json = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let snapshot = Self::from_json_str(&json)?;
        debug!(
            path = %path.display(),
            functions = snapshot.functions.len(),
            "Loaded host snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_json_str(json: &str) -> Result<Self, SnapshotError> {
        let raw: RawSnapshot = serde_json::from_str(json)?;

        let functions = raw
            .functions
            .into_iter()
            .map(RawFunction::into_info)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: raw.version,
            release: raw.release,
            languages: raw.languages,
            themes: raw.themes,
            protocols: raw.protocols,
            components: raw.components,
            users: raw.users,
            services: raw.services,
            tokens: raw.tokens,
            functions,
        })
    }
}

impl RawFunction {
    fn into_info(self) -> Result<FunctionInfo, SnapshotError> {
        let parameters_desc = parse_description(&self.name, "parameters", self.parameters)?;
        let returns_desc = self
            .returns
            .filter(|returns| !returns.is_null())
            .map(|returns| parse_description(&self.name, "returns", returns))
            .transpose()?;

        Ok(FunctionInfo {
            id: self.id,
            name: self.name,
            classname: self.classname,
            methodname: self.methodname,
            classpath: self.classpath,
            component: self.component,
            description: self.description,
            function_type: self.function_type,
            capabilities: self.capabilities,
            services: self.services,
            ajax: self.ajax,
            loginrequired: self.loginrequired,
            readonlysession: self.readonlysession,
            deprecated: self.deprecated,
            parameters_desc,
            returns_desc,
            extra: self.extra,
        })
    }
}

fn parse_description(
    function: &str,
    member: &'static str,
    value: Value,
) -> Result<Description, SnapshotError> {
    serde_json::from_value(value).map_err(|source| SnapshotError::InvalidDescription {
        function: function.to_string(),
        member,
        source,
    })
}
