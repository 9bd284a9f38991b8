// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use common::auth::{
    Authentication, AuthenticationError, Authenticator, Caller, ProtocolAuthorizer,
};
use common::error::DiscoveryError;
use ws_introspection::{
    Clock, FunctionInfo, FunctionRecord, FunctionRegistry, HostError, PluginRegistry, ServiceId,
    SiteEnumerations, SystemClock,
};

use crate::error::SnapshotError;
use crate::snapshot::{HostSnapshot, ServiceSnapshot};

pub struct SnapshotHost {
    snapshot: HostSnapshot,
    clock: Arc<dyn Clock>,
}

impl SnapshotHost {
    pub fn new(snapshot: HostSnapshot, clock: Arc<dyn Clock>) -> Self {
        Self { snapshot, clock }
    }

    /// Load a snapshot file, checking token expiry against the system clock.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        Ok(Self::new(HostSnapshot::load(path)?, Arc::new(SystemClock)))
    }

    pub fn snapshot(&self) -> &HostSnapshot {
        &self.snapshot
    }

    fn find_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.snapshot.functions.iter().find(|f| f.name == name)
    }

    fn find_service(&self, service: ServiceId) -> Option<&ServiceSnapshot> {
        self.snapshot.services.iter().find(|s| s.id == service)
    }
}

fn to_record(info: &FunctionInfo) -> FunctionRecord {
    FunctionRecord::new(info.id, &info.name, &info.component)
}

#[async_trait]
impl FunctionRegistry for SnapshotHost {
    async fn all_functions(&self) -> Result<Vec<FunctionRecord>, HostError> {
        let mut records: Vec<_> = self.snapshot.functions.iter().map(to_record).collect();
        records.sort_by(|a, b| (&a.component, &a.name).cmp(&(&b.component, &b.name)));
        Ok(records)
    }

    async fn service_functions(
        &self,
        service: ServiceId,
    ) -> Result<Vec<FunctionRecord>, HostError> {
        let service = self
            .find_service(service)
            .ok_or(HostError::UnknownService(service))?;

        let mut records = Vec::with_capacity(service.functions.len());
        for name in &service.functions {
            match self.find_function(name) {
                Some(info) => records.push(to_record(info)),
                None => warn!(
                    service = %service.name,
                    function = %name,
                    "Service lists a function that is not registered"
                ),
            }
        }
        records.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(records)
    }

    async fn describe_function(&self, record: &FunctionRecord) -> Result<FunctionInfo, HostError> {
        self.find_function(&record.name)
            .cloned()
            .ok_or_else(|| HostError::UnknownFunction(record.name.clone()))
    }
}

#[async_trait]
impl PluginRegistry for SnapshotHost {
    async fn list_components(&self) -> Result<Vec<String>, HostError> {
        Ok(self
            .snapshot
            .components
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    async fn standard_plugins(&self) -> Result<HashSet<String>, HostError> {
        Ok(self
            .snapshot
            .components
            .iter()
            .filter(|c| c.standard)
            .map(|c| c.name.clone())
            .collect())
    }

    async fn component_version(&self, component: &str) -> Result<Option<String>, HostError> {
        Ok(self
            .snapshot
            .components
            .iter()
            .find(|c| c.name == component)
            .and_then(|c| c.version.clone()))
    }

    async fn platform_version(&self) -> Result<String, HostError> {
        Ok(self.snapshot.version.clone())
    }
}

impl SiteEnumerations for SnapshotHost {
    fn installed_languages(&self) -> Vec<String> {
        self.snapshot.languages.clone()
    }

    fn installed_themes(&self) -> Vec<String> {
        self.snapshot.themes.clone()
    }
}

#[async_trait]
impl Authenticator for SnapshotHost {
    async fn authenticate(&self, token: &str) -> Result<Authentication, AuthenticationError> {
        let token = self
            .snapshot
            .tokens
            .iter()
            .find(|t| t.token == token)
            .ok_or_else(AuthenticationError::invalid_token)?;

        if token.valid_until.is_some_and(|valid_until| valid_until < self.clock.now()) {
            return Err(AuthenticationError::expired_token());
        }

        let service = self
            .find_service(token.service)
            .filter(|service| service.enabled)
            .ok_or_else(AuthenticationError::service_not_available)?;

        let user = self
            .snapshot
            .users
            .iter()
            .find(|u| u.id == token.user)
            .ok_or_else(|| {
                AuthenticationError::invalid_token()
                    .with_debuginfo(format!("Token refers to unknown user {}", token.user))
            })?;

        Ok(Authentication {
            caller: Caller {
                id: user.id,
                username: user.username.clone(),
            },
            service_id: service.id,
        })
    }
}

#[async_trait]
impl ProtocolAuthorizer for SnapshotHost {
    async fn permitted_protocols(&self, caller: &Caller) -> Result<Vec<String>, DiscoveryError> {
        let user = self
            .snapshot
            .users
            .iter()
            .find(|u| u.id == caller.id)
            .ok_or_else(|| DiscoveryError::unexpected(format!("Unknown user {}", caller.id)))?;

        Ok(self
            .snapshot
            .protocols
            .iter()
            .filter(|p| p.enabled && user.protocols.contains(&p.name))
            .map(|p| p.name.clone())
            .collect())
    }
}
