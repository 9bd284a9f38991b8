// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Flattening of typed descriptions into plain JSON.
//!
//! Each description node becomes a JSON object whose first entry, `class`, is the node's lineage
//! joined with commas. The rest of the object mirrors the node's attributes, with three
//! adjustments:
//!
//! - `default` is only emitted when the node's required-ness is [`Required::DefaultValue`].
//! - Integer defaults equal to the current time (within one second) are emitted as `0`, since a
//!   default computed from "now" would differ on every call.
//! - Language and theme values get an `enum` listing the values installed on the site.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::description::{Description, ParamType, Required};
use crate::function::FunctionInfo;
use crate::host::SiteEnumerations;

/// Language that is always installed on a site, used if the host reports none.
const FALLBACK_LANGUAGE: &str = "en";

/// Keys `normalize_info` emits after the host's extra properties.
const DESCRIPTION_KEYS: [&str; 2] = ["parameters_desc", "returns_desc"];

pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[derive(Clone)]
pub struct Normalizer {
    clock: Arc<dyn Clock>,
    enumerations: Arc<dyn SiteEnumerations>,
}

impl Normalizer {
    pub fn new(clock: Arc<dyn Clock>, enumerations: Arc<dyn SiteEnumerations>) -> Self {
        Self {
            clock,
            enumerations,
        }
    }

    pub fn normalize(&self, description: &Description) -> Value {
        let mut object = Map::new();
        object.insert(
            "class".to_string(),
            Value::String(description.class().lineage().join(",")),
        );

        match description {
            Description::Value(value) => {
                object.insert(
                    "type".to_string(),
                    Value::String(value.param_type.as_str().to_string()),
                );
            }
            Description::Structure(structure) => {
                let fields = structure
                    .fields
                    .iter()
                    .map(|(name, field)| (name.clone(), self.normalize(field)))
                    .collect();
                object.insert("fields".to_string(), Value::Object(fields));
            }
            Description::List(list) => {
                object.insert("content".to_string(), self.normalize(&list.content));
            }
        }

        let meta = description.meta();
        object.insert("desc".to_string(), Value::String(meta.desc.clone()));
        object.insert("required".to_string(), Value::from(meta.required.code()));
        if meta.required == Required::DefaultValue {
            object.insert("default".to_string(), self.normalize_default(description));
        }
        object.insert("allownull".to_string(), Value::Bool(meta.allow_null));

        if let Description::Value(value) = description
            && let Some(values) = self.enumerated_values(&value.param_type)
        {
            object.insert("enum".to_string(), Value::from(values));
        }

        Value::Object(object)
    }

    /// Normalize everything the reflection layer reports about a function.
    pub fn normalize_info(&self, info: &FunctionInfo) -> Map<String, Value> {
        let mut object = Map::new();
        let mut insert = |key: &str, value: Value| {
            object.insert(key.to_string(), value);
        };

        insert("id", Value::from(info.id));
        insert("name", Value::from(info.name.as_str()));
        insert("classname", Value::from(info.classname.as_str()));
        insert("methodname", Value::from(info.methodname.as_str()));
        insert("classpath", Value::from(info.classpath.clone()));
        insert("component", Value::from(info.component.as_str()));
        insert("description", Value::from(info.description.as_str()));
        insert("type", Value::from(info.function_type.as_str()));
        insert("capabilities", Value::from(info.capabilities.as_str()));
        insert("services", Value::from(info.services.clone()));
        insert("ajax", Value::Bool(info.ajax));
        insert("loginrequired", Value::Bool(info.loginrequired));
        insert("readonlysession", Value::Bool(info.readonlysession));
        insert("deprecated", Value::Bool(info.deprecated));

        for (key, value) in &info.extra {
            if object.contains_key(key) || DESCRIPTION_KEYS.contains(&key.as_str()) {
                warn!(function = %info.name, key = %key, "Ignoring extra property that shadows a known one");
                continue;
            }
            object.insert(key.clone(), Self::normalize_value(value));
        }

        object.insert(
            "parameters_desc".to_string(),
            self.normalize(&info.parameters_desc),
        );
        object.insert(
            "returns_desc".to_string(),
            info.returns_desc
                .as_ref()
                .map(|returns| self.normalize(returns))
                .unwrap_or(Value::Null),
        );

        object
    }

    /// Plain JSON carries no type information, so it is rebuilt as is.
    pub fn normalize_value(value: &Value) -> Value {
        match value {
            Value::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::normalize_value(value)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(Self::normalize_value).collect()),
            scalar => scalar.clone(),
        }
    }

    fn normalize_default(&self, description: &Description) -> Value {
        let default = description
            .meta()
            .default
            .as_ref()
            .map(Self::normalize_value)
            .unwrap_or(Value::Null);

        match description {
            Description::Value(value)
                if value.param_type == ParamType::Int && self.is_current_time(&default) =>
            {
                Value::from(0)
            }
            _ => default,
        }
    }

    /// Hosts may export numeric defaults as floats or numeric strings; all are compared by value.
    fn is_current_time(&self, value: &Value) -> bool {
        let timestamp = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };

        timestamp.is_some_and(|timestamp| {
            let now = self.clock.now() as f64;
            (now - 1.0..=now).contains(&timestamp)
        })
    }

    fn enumerated_values(&self, param_type: &ParamType) -> Option<Vec<String>> {
        match param_type {
            ParamType::Lang => {
                let mut languages = self.enumerations.installed_languages();
                if languages.is_empty() {
                    languages.push(FALLBACK_LANGUAGE.to_string());
                }
                Some(languages)
            }
            ParamType::Theme => Some(self.enumerations.installed_themes()),
            _ => None,
        }
    }
}
