// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Web service introspection.
//!
//! This crate provides types and utilities for:
//! - Describing the parameters and return values of registered web service functions
//! - Normalizing those descriptions into plain JSON
//! - Building filtered catalogs of functions, optionally grouped by component

pub mod catalog;
pub mod description;
pub mod document;
pub mod filter;
pub mod function;
pub mod host;
pub mod normalizer;

// Re-export commonly used types
pub use catalog::{CatalogBuilder, CatalogEntry, CatalogError};
pub use description::{Description, DescriptionClass, ParamType, Required};
pub use document::{CatalogDocument, ComponentGroup, DiscoveryResponse};
pub use filter::ComponentList;
pub use function::{FunctionInfo, FunctionRecord};
pub use host::{FunctionRegistry, HostError, PluginRegistry, ServiceId, SiteEnumerations};
pub use normalizer::{Clock, Normalizer, SystemClock};
