// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Typed descriptions of web service parameters and return values.
//!
//! A description is a tree of three kinds of nodes: scalar values, keyed structures and lists.
//! Every node carries a [`DescriptionClass`], the host's name for the kind of description
//! together with its ancestry (for example, a function's parameter set is a specialized single
//! structure).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The abstract class every description class derives from. It never appears in a lineage.
pub const ROOT_DESCRIPTION_CLASS: &str = "external_description";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Value,
    Structure,
    List,
}

impl Shape {
    /// Only plain values accept null unless a description says otherwise.
    pub fn allows_null_by_default(self) -> bool {
        self == Shape::Value
    }
}

/// The closed set of description classes known to the host, with their (static) ancestry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptionClass {
    Value,
    SingleStructure,
    MultipleStructure,
    FunctionParameters,
    Warnings,
    Files,
}

impl DescriptionClass {
    pub const ALL: [DescriptionClass; 6] = [
        DescriptionClass::Value,
        DescriptionClass::SingleStructure,
        DescriptionClass::MultipleStructure,
        DescriptionClass::FunctionParameters,
        DescriptionClass::Warnings,
        DescriptionClass::Files,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DescriptionClass::Value => "external_value",
            DescriptionClass::SingleStructure => "external_single_structure",
            DescriptionClass::MultipleStructure => "external_multiple_structure",
            DescriptionClass::FunctionParameters => "external_function_parameters",
            DescriptionClass::Warnings => "external_warnings",
            DescriptionClass::Files => "external_files",
        }
    }

    /// The direct parent class, or `None` if the parent is the abstract root.
    pub fn parent(self) -> Option<DescriptionClass> {
        match self {
            DescriptionClass::Value
            | DescriptionClass::SingleStructure
            | DescriptionClass::MultipleStructure => None,
            DescriptionClass::FunctionParameters => Some(DescriptionClass::SingleStructure),
            DescriptionClass::Warnings | DescriptionClass::Files => {
                Some(DescriptionClass::MultipleStructure)
            }
        }
    }

    pub fn shape(self) -> Shape {
        match self.parent() {
            Some(parent) => parent.shape(),
            None => match self {
                DescriptionClass::Value => Shape::Value,
                DescriptionClass::SingleStructure => Shape::Structure,
                _ => Shape::List,
            },
        }
    }

    /// This class followed by all its ancestors, excluding [`ROOT_DESCRIPTION_CLASS`].
    pub fn lineage(self) -> Vec<&'static str> {
        let mut lineage = vec![self.name()];
        if let Some(parent) = self.parent() {
            lineage.extend(parent.lineage());
        }
        lineage
    }

    pub fn from_name(name: &str) -> Option<DescriptionClass> {
        Self::ALL.into_iter().find(|class| class.name() == name)
    }
}

/// Whether a value must be supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Required {
    Required,
    Optional,
    #[serde(rename = "default")]
    DefaultValue,
}

impl Required {
    /// The host's numeric code for this required-ness, as emitted in the catalog.
    pub fn code(self) -> i64 {
        match self {
            Required::DefaultValue => 0,
            Required::Required => 1,
            Required::Optional => 2,
        }
    }
}

macro_rules! param_types {
    ($($variant:ident => $name:literal),* $(,)?) => {
        /// The semantic type of a scalar value.
        ///
        /// Host-specific types that are not listed here are kept verbatim in `Other`.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ParamType {
            $($variant,)*
            Other(String),
        }

        impl ParamType {
            pub fn as_str(&self) -> &str {
                match self {
                    $(ParamType::$variant => $name,)*
                    ParamType::Other(name) => name.as_str(),
                }
            }
        }

        impl From<&str> for ParamType {
            fn from(name: &str) -> Self {
                match name {
                    $($name => ParamType::$variant,)*
                    other => ParamType::Other(other.to_string()),
                }
            }
        }
    };
}

param_types! {
    Int => "int",
    Float => "float",
    Bool => "bool",
    Text => "text",
    Raw => "raw",
    RawTrimmed => "raw_trimmed",
    Alpha => "alpha",
    AlphaNum => "alphanum",
    AlphaExt => "alphaext",
    AlphaNumExt => "alphanumext",
    Notags => "notags",
    CleanHtml => "cleanhtml",
    Url => "url",
    LocalUrl => "localurl",
    Email => "email",
    Lang => "lang",
    Theme => "theme",
    Component => "component",
    Plugin => "plugin",
    Area => "area",
    SafeDir => "safedir",
    SafePath => "safepath",
    Username => "username",
    Timezone => "timezone",
    Sequence => "sequence",
    Base64 => "base64",
    Tag => "tag",
    TagList => "tagList",
    File => "file",
    Path => "path",
    Host => "host",
}

impl From<String> for ParamType {
    fn from(name: String) -> Self {
        ParamType::from(name.as_str())
    }
}

impl From<ParamType> for String {
    fn from(param_type: ParamType) -> Self {
        param_type.as_str().to_string()
    }
}

/// Attributes shared by every kind of description.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionMeta {
    pub desc: String,
    pub required: Required,
    /// The declared default. Only meaningful when `required` is [`Required::DefaultValue`].
    pub default: Option<Value>,
    pub allow_null: bool,
}

impl DescriptionMeta {
    fn new(desc: impl Into<String>, shape: Shape) -> Self {
        Self {
            desc: desc.into(),
            required: Required::Required,
            default: None,
            allow_null: shape.allows_null_by_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDescription {
    pub param_type: ParamType,
    pub meta: DescriptionMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureDescription {
    pub class: DescriptionClass,
    pub fields: IndexMap<String, Description>,
    pub meta: DescriptionMeta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListDescription {
    pub class: DescriptionClass,
    pub content: Box<Description>,
    pub meta: DescriptionMeta,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawDescription")]
pub enum Description {
    Value(ValueDescription),
    Structure(StructureDescription),
    List(ListDescription),
}

impl Description {
    pub fn value(param_type: impl Into<ParamType>, desc: impl Into<String>) -> Self {
        Description::Value(ValueDescription {
            param_type: param_type.into(),
            meta: DescriptionMeta::new(desc, Shape::Value),
        })
    }

    pub fn single_structure<K: Into<String>>(
        fields: impl IntoIterator<Item = (K, Description)>,
        desc: impl Into<String>,
    ) -> Self {
        Description::Structure(StructureDescription {
            class: DescriptionClass::SingleStructure,
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.into(), field))
                .collect(),
            meta: DescriptionMeta::new(desc, Shape::Structure),
        })
    }

    /// The parameter set of a function.
    pub fn function_parameters<K: Into<String>>(
        fields: impl IntoIterator<Item = (K, Description)>,
    ) -> Self {
        Description::Structure(StructureDescription {
            class: DescriptionClass::FunctionParameters,
            fields: fields
                .into_iter()
                .map(|(name, field)| (name.into(), field))
                .collect(),
            meta: DescriptionMeta::new("", Shape::Structure),
        })
    }

    pub fn multiple_structure(content: Description, desc: impl Into<String>) -> Self {
        Description::List(ListDescription {
            class: DescriptionClass::MultipleStructure,
            content: Box::new(content),
            meta: DescriptionMeta::new(desc, Shape::List),
        })
    }

    /// Re-classify this description as a more specific class of the same shape.
    pub fn with_class(mut self, class: DescriptionClass) -> Result<Self, DescriptionError> {
        let shape = self.class().shape();
        match &mut self {
            Description::Value(_) if class == DescriptionClass::Value => {}
            Description::Structure(structure) if class.shape() == Shape::Structure => {
                structure.class = class
            }
            Description::List(list) if class.shape() == Shape::List => list.class = class,
            _ => {
                return Err(DescriptionError::ShapeMismatch {
                    class: class.name(),
                    shape,
                });
            }
        }
        Ok(self)
    }

    pub fn with_required(mut self, required: Required) -> Self {
        self.meta_mut().required = required;
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.meta_mut().default = Some(default);
        self
    }

    /// Shorthand for an argument that falls back to `default` when the caller omits it.
    pub fn defaulting_to(self, default: Value) -> Self {
        self.with_required(Required::DefaultValue)
            .with_default(default)
    }

    pub fn with_allow_null(mut self, allow_null: bool) -> Self {
        self.meta_mut().allow_null = allow_null;
        self
    }

    pub fn class(&self) -> DescriptionClass {
        match self {
            Description::Value(_) => DescriptionClass::Value,
            Description::Structure(structure) => structure.class,
            Description::List(list) => list.class,
        }
    }

    pub fn meta(&self) -> &DescriptionMeta {
        match self {
            Description::Value(value) => &value.meta,
            Description::Structure(structure) => &structure.meta,
            Description::List(list) => &list.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut DescriptionMeta {
        match self {
            Description::Value(value) => &mut value.meta,
            Description::Structure(structure) => &mut structure.meta,
            Description::List(list) => &mut list.meta,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum DescriptionError {
    #[error("Unknown description class `{0}`")]
    UnknownClass(String),

    #[error("`{class}` cannot describe a {shape:?}")]
    ShapeMismatch { class: &'static str, shape: Shape },

    #[error("`{class}` requires `{member}`")]
    MissingMember {
        class: &'static str,
        member: &'static str,
    },

    #[error("`{class}` does not accept `{member}`")]
    UnexpectedMember {
        class: &'static str,
        member: &'static str,
    },
}

/// The serialized form of a description, as exported by a host.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescription {
    class: String,
    #[serde(rename = "type")]
    param_type: Option<ParamType>,
    #[serde(default)]
    desc: String,
    #[serde(default = "default_required")]
    required: Required,
    #[serde(default)]
    default: Option<Value>,
    #[serde(default)]
    allownull: Option<bool>,
    fields: Option<IndexMap<String, Description>>,
    content: Option<Box<Description>>,
}

fn default_required() -> Required {
    Required::Required
}

impl TryFrom<RawDescription> for Description {
    type Error = DescriptionError;

    fn try_from(raw: RawDescription) -> Result<Self, Self::Error> {
        let class = DescriptionClass::from_name(&raw.class)
            .ok_or_else(|| DescriptionError::UnknownClass(raw.class.clone()))?;

        let meta = DescriptionMeta {
            desc: raw.desc,
            required: raw.required,
            default: raw.default,
            allow_null: raw
                .allownull
                .unwrap_or_else(|| class.shape().allows_null_by_default()),
        };

        let unexpected = |member| DescriptionError::UnexpectedMember {
            class: class.name(),
            member,
        };
        let missing = |member| DescriptionError::MissingMember {
            class: class.name(),
            member,
        };

        match class.shape() {
            Shape::Value => {
                if raw.fields.is_some() {
                    return Err(unexpected("fields"));
                }
                if raw.content.is_some() {
                    return Err(unexpected("content"));
                }
                Ok(Description::Value(ValueDescription {
                    param_type: raw.param_type.ok_or_else(|| missing("type"))?,
                    meta,
                }))
            }
            Shape::Structure => {
                if raw.param_type.is_some() {
                    return Err(unexpected("type"));
                }
                if raw.content.is_some() {
                    return Err(unexpected("content"));
                }
                Ok(Description::Structure(StructureDescription {
                    class,
                    fields: raw.fields.ok_or_else(|| missing("fields"))?,
                    meta,
                }))
            }
            Shape::List => {
                if raw.param_type.is_some() {
                    return Err(unexpected("type"));
                }
                if raw.fields.is_some() {
                    return Err(unexpected("fields"));
                }
                Ok(Description::List(ListDescription {
                    class,
                    content: raw.content.ok_or_else(|| missing("content"))?,
                    meta,
                }))
            }
        }
    }
}
