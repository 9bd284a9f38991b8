// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Both spellings of the platform's own component.
pub const ROOT_COMPONENT_ALIASES: [&str; 2] = ["moodle", "core"];

/// Selects every component shipped with the platform.
pub const STANDARD: &str = "standard";

/// Selects every component not shipped with the platform.
pub const ADDONS: &str = "addons";

pub fn is_root_component(component: &str) -> bool {
    ROOT_COMPONENT_ALIASES.contains(&component)
}

/// A list of component names and selectors, as given to `--include` or `--exclude`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentList(Vec<String>);

impl ComponentList {
    /// Parse a comma separated list, ignoring surrounding whitespace and empty items.
    pub fn parse(list: &str) -> Self {
        Self(
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|i| i == item)
    }

    pub fn contains_root(&self) -> bool {
        ROOT_COMPONENT_ALIASES.iter().any(|alias| self.contains(alias))
    }

    /// Whether the list uses a selector that depends on the set of standard plugins.
    pub fn needs_standard_plugins(&self) -> bool {
        self.contains(STANDARD) || self.contains(ADDONS)
    }

    /// The items that name a specific plugin (not a selector nor the platform itself).
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|item| *item != STANDARD && *item != ADDONS && !is_root_component(item))
    }
}

impl<const N: usize> From<[&str; N]> for ComponentList {
    fn from(items: [&str; N]) -> Self {
        Self(items.into_iter().map(str::to_string).collect())
    }
}
