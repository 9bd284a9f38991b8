// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The JSON documents produced from a catalog.

use indexmap::IndexMap;
use serde::Serialize;

use crate::catalog::CatalogEntry;

/// What the discovery endpoint returns to an authenticated caller.
#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub protocols: Vec<String>,
    pub functions: Vec<CatalogEntry>,
}

/// An export of the catalog, either flat or grouped by component.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CatalogDocument {
    Functions {
        functions: Vec<CatalogEntry>,
    },
    Components {
        components: IndexMap<String, ComponentGroup>,
    },
}

#[derive(Debug, Serialize)]
pub struct ComponentGroup {
    pub version: Option<String>,
    pub functions: Vec<CatalogEntry>,
}
