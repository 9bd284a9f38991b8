// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::description::Description;

/// A row of the host's table of registered functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: i64,
    pub name: String,
    pub component: String,
}

impl FunctionRecord {
    pub fn new(id: i64, name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            component: component.into(),
        }
    }
}

/// Everything the host's reflection layer knows about a registered function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionInfo {
    pub id: i64,
    pub name: String,
    pub classname: String,
    pub methodname: String,
    pub classpath: Option<String>,
    pub component: String,
    pub description: String,
    /// "read" or "write"
    pub function_type: String,
    pub capabilities: String,
    pub services: Vec<String>,
    pub ajax: bool,
    pub loginrequired: bool,
    pub readonlysession: bool,
    pub deprecated: bool,
    pub parameters_desc: Description,
    pub returns_desc: Option<Description>,
    /// Any further properties reported by the host (such as `parameters_method`).
    pub extra: IndexMap<String, Value>,
}
