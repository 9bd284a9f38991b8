// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Building catalogs of registered functions.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::try_join_all;
use indexmap::{IndexMap, map::Entry};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::document::{CatalogDocument, ComponentGroup};
use crate::filter::{ADDONS, ComponentList, STANDARD, is_root_component};
use crate::function::FunctionRecord;
use crate::host::{FunctionRegistry, HostError, PluginRegistry, ServiceId};
use crate::normalizer::Normalizer;

/// Top-level properties that only matter to the host's dispatcher.
const BOOKKEEPING_FIELDS: [&str; 4] = ["classpath", "classname", "methodname", "id"];
const METHOD_FIELD_SUFFIX: &str = "_method";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Host(#[from] HostError),
}

/// The normalized description of one function, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CatalogEntry(Map<String, Value>);

impl CatalogEntry {
    /// Create an entry from a normalized function info, dropping the bookkeeping properties.
    /// Only the top level is filtered; parameter and return descriptions are kept intact.
    pub fn new(mut info: Map<String, Value>) -> Self {
        info.retain(|key, _| !is_bookkeeping_field(key));
        Self(info)
    }

    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    pub fn component(&self) -> &str {
        self.str_field("component")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    fn str_field(&self, key: &str) -> &str {
        self.0.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}

fn is_bookkeeping_field(key: &str) -> bool {
    BOOKKEEPING_FIELDS.contains(&key) || key.ends_with(METHOD_FIELD_SUFFIX)
}

pub struct CatalogBuilder {
    functions: Arc<dyn FunctionRegistry>,
    plugins: Arc<dyn PluginRegistry>,
    normalizer: Normalizer,
    standard_plugins: OnceCell<HashSet<String>>,
}

impl CatalogBuilder {
    pub fn new(
        functions: Arc<dyn FunctionRegistry>,
        plugins: Arc<dyn PluginRegistry>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            functions,
            plugins,
            normalizer,
            standard_plugins: OnceCell::new(),
        }
    }

    pub async fn build_entry(&self, record: &FunctionRecord) -> Result<CatalogEntry, CatalogError> {
        debug!(function = %record.name, "Describing function");

        let info = self.functions.describe_function(record).await?;
        Ok(CatalogEntry::new(self.normalizer.normalize_info(&info)))
    }

    /// Build the entries of all records, in the order of the records.
    pub async fn build_entries(
        &self,
        records: &[FunctionRecord],
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        try_join_all(records.iter().map(|record| self.build_entry(record))).await
    }

    /// Build the entries of all registered functions that pass the include and exclude lists.
    ///
    /// A function is kept if the include list is empty or selects its component, and the exclude
    /// list does not select its component. A component named in both lists is therefore
    /// excluded.
    pub async fn build_catalog(
        &self,
        include: &str,
        exclude: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let include = ComponentList::parse(include);
        let exclude = ComponentList::parse(exclude);

        self.warn_unknown_components(&include, &exclude).await;

        let mut records = self.functions.all_functions().await?;
        records.sort_by(|a, b| (&a.component, &a.name).cmp(&(&b.component, &b.name)));

        let mut selected = Vec::with_capacity(records.len());
        for record in records {
            if self
                .passes_filters(&record.component, &include, &exclude)
                .await?
            {
                selected.push(record);
            }
        }

        debug!(count = selected.len(), "Selected functions for the catalog");

        self.build_entries(&selected).await
    }

    /// Build a catalog and shape it as an export document.
    pub async fn build_document(
        &self,
        include: &str,
        exclude: &str,
        group_by_component: bool,
    ) -> Result<CatalogDocument, CatalogError> {
        let functions = self.build_catalog(include, exclude).await?;

        if group_by_component {
            Ok(CatalogDocument::Components {
                components: self.group_by_component(functions).await?,
            })
        } else {
            Ok(CatalogDocument::Functions { functions })
        }
    }

    /// Build the entries of the functions exposed by an external service.
    pub async fn build_service_catalog(
        &self,
        service: ServiceId,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut records = self.functions.service_functions(service).await?;
        records.sort_by(|a, b| a.name.cmp(&b.name));

        self.build_entries(&records).await
    }

    /// Group entries by component (in order of first appearance), with each component's version.
    pub async fn group_by_component(
        &self,
        entries: Vec<CatalogEntry>,
    ) -> Result<IndexMap<String, ComponentGroup>, CatalogError> {
        let mut groups: IndexMap<String, ComponentGroup> = IndexMap::new();

        for entry in entries {
            let group = match groups.entry(entry.component().to_string()) {
                Entry::Occupied(occupied) => occupied.into_mut(),
                Entry::Vacant(vacant) => {
                    let version = self.component_version(vacant.key()).await?;
                    vacant.insert(ComponentGroup {
                        version,
                        functions: vec![],
                    })
                }
            };
            group.functions.push(entry);
        }

        Ok(groups)
    }

    pub async fn is_component_selected(
        &self,
        component: &str,
        list: &ComponentList,
    ) -> Result<bool, CatalogError> {
        if list.is_empty() {
            return Ok(true);
        }

        if is_root_component(component) {
            return Ok(list.contains_root());
        }

        if list.contains(component) {
            return Ok(true);
        }

        if !list.needs_standard_plugins() {
            return Ok(false);
        }

        let standard = self.standard_plugins().await?.contains(component);
        Ok((standard && list.contains(STANDARD)) || (!standard && list.contains(ADDONS)))
    }

    /// The components shipped with the platform. Loaded once per builder.
    pub async fn standard_plugins(&self) -> Result<&HashSet<String>, CatalogError> {
        let plugins = self
            .standard_plugins
            .get_or_try_init(|| async move {
                debug!("Loading the list of standard plugins");
                self.plugins.standard_plugins().await
            })
            .await?;

        Ok(plugins)
    }

    /// The version of a component; the platform's version for the root component.
    pub async fn component_version(&self, component: &str) -> Result<Option<String>, CatalogError> {
        if is_root_component(component) {
            Ok(Some(self.plugins.platform_version().await?))
        } else {
            Ok(self.plugins.component_version(component).await?)
        }
    }

    async fn passes_filters(
        &self,
        component: &str,
        include: &ComponentList,
        exclude: &ComponentList,
    ) -> Result<bool, CatalogError> {
        if !self.is_component_selected(component, include).await? {
            return Ok(false);
        }

        if exclude.is_empty() {
            return Ok(true);
        }

        Ok(!self.is_component_selected(component, exclude).await?)
    }

    /// Diagnostic only: a host that cannot list its components does not fail the catalog.
    async fn warn_unknown_components(&self, include: &ComponentList, exclude: &ComponentList) {
        let named: Vec<&str> = include.plugin_names().chain(exclude.plugin_names()).collect();
        if named.is_empty() {
            return;
        }

        let installed: HashSet<String> = match self.plugins.list_components().await {
            Ok(components) => components.into_iter().collect(),
            Err(err) => {
                warn!(error = %err, "Could not list installed components to check the filters");
                return;
            }
        };

        for component in named {
            if !installed.contains(component) {
                warn!(component, "Filter names a component that is not installed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::description::{Description, ParamType, Required};
    use crate::function::FunctionInfo;
    use crate::normalizer::tests::normalizer;

    struct FakeHost {
        records: Vec<FunctionRecord>,
        standard: Vec<&'static str>,
        standard_plugin_loads: AtomicUsize,
        components_unavailable: bool,
    }

    impl FakeHost {
        fn new() -> Self {
            // Deliberately not sorted
            let records = vec![
                FunctionRecord::new(4, "mod_forum_get_forums", "mod_forum"),
                FunctionRecord::new(2, "core_course_get_courses", "moodle"),
                FunctionRecord::new(1, "core_course_get_contents", "moodle"),
                FunctionRecord::new(3, "mod_assign_get_assignments", "mod_assign"),
                FunctionRecord::new(5, "tool_custom_do", "tool_custom"),
                FunctionRecord::new(6, "mod_assign_submit", "mod_assign"),
            ];

            Self {
                records,
                standard: vec!["mod_assign", "mod_forum"],
                standard_plugin_loads: AtomicUsize::new(0),
                components_unavailable: false,
            }
        }
    }

    #[async_trait]
    impl FunctionRegistry for FakeHost {
        async fn all_functions(&self) -> Result<Vec<FunctionRecord>, HostError> {
            Ok(self.records.clone())
        }

        async fn service_functions(
            &self,
            service: ServiceId,
        ) -> Result<Vec<FunctionRecord>, HostError> {
            match service {
                1 => Ok(vec![self.records[1].clone(), self.records[2].clone()]),
                other => Err(HostError::UnknownService(other)),
            }
        }

        async fn describe_function(
            &self,
            record: &FunctionRecord,
        ) -> Result<FunctionInfo, HostError> {
            if !self.records.contains(record) {
                return Err(HostError::UnknownFunction(record.name.clone()));
            }

            let parameters_desc = Description::function_parameters([
                ("courseid", Description::value(ParamType::Int, "course id")),
                (
                    "options",
                    Description::multiple_structure(Description::value(ParamType::Int, ""), "")
                        .with_required(Required::Optional)
                        .with_default(json!([])),
                ),
            ]);

            Ok(FunctionInfo {
                id: record.id,
                name: record.name.clone(),
                classname: "core_course_external".to_string(),
                methodname: "get_course_contents".to_string(),
                classpath: None,
                component: record.component.clone(),
                description: format!("{} description", record.name),
                function_type: "read".to_string(),
                capabilities: String::new(),
                services: vec!["moodle_mobile_app".to_string()],
                ajax: true,
                loginrequired: true,
                readonlysession: false,
                deprecated: false,
                parameters_desc,
                returns_desc: Some(Description::multiple_structure(
                    Description::single_structure(
                        [("id", Description::value(ParamType::Int, "section id"))],
                        "",
                    ),
                    "",
                )),
                extra: [
                    ("parameters_method".to_string(), json!("get_course_contents_parameters")),
                    ("returns_method".to_string(), json!("get_course_contents_returns")),
                ]
                .into_iter()
                .collect(),
            })
        }
    }

    #[async_trait]
    impl PluginRegistry for FakeHost {
        async fn list_components(&self) -> Result<Vec<String>, HostError> {
            if self.components_unavailable {
                return Err(HostError::Delegate("plugin directory is unreadable".into()));
            }
            let mut components: Vec<String> =
                self.records.iter().map(|r| r.component.clone()).collect();
            components.dedup();
            Ok(components)
        }

        async fn standard_plugins(&self) -> Result<HashSet<String>, HostError> {
            self.standard_plugin_loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.standard.iter().map(|p| p.to_string()).collect())
        }

        async fn component_version(&self, component: &str) -> Result<Option<String>, HostError> {
            Ok(self
                .standard
                .contains(&component)
                .then(|| "2024100700".to_string()))
        }

        async fn platform_version(&self) -> Result<String, HostError> {
            Ok("2024100700.00".to_string())
        }
    }

    fn builder() -> (CatalogBuilder, Arc<FakeHost>) {
        let host = Arc::new(FakeHost::new());
        let builder = CatalogBuilder::new(host.clone(), host.clone(), normalizer());
        (builder, host)
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(CatalogEntry::name).collect()
    }

    #[tokio::test]
    async fn entries_drop_bookkeeping_fields() {
        let (builder, _) = builder();

        let entry = builder
            .build_entry(&FunctionRecord::new(1, "core_course_get_contents", "moodle"))
            .await
            .unwrap();

        for key in [
            "id",
            "classname",
            "methodname",
            "classpath",
            "parameters_method",
            "returns_method",
        ] {
            assert!(entry.get(key).is_none(), "{key} should have been removed");
        }
        assert_eq!(entry.name(), "core_course_get_contents");
        assert_eq!(entry.component(), "moodle");
        assert_eq!(entry.get("type"), Some(&json!("read")));

        let parameters = entry.get("parameters_desc").unwrap();
        assert_eq!(
            parameters["class"],
            "external_function_parameters,external_single_structure"
        );
        assert!(parameters["fields"]["courseid"].get("default").is_none());
        assert!(parameters["fields"]["options"].get("default").is_none());
        assert_eq!(
            entry.get("returns_desc").unwrap()["class"],
            "external_multiple_structure"
        );
    }

    #[tokio::test]
    async fn entries_are_stable_across_calls() {
        let (builder, _) = builder();
        let record = FunctionRecord::new(1, "core_course_get_contents", "moodle");

        let first = builder.build_entry(&record).await.unwrap();
        let second = builder.build_entry(&record).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn unknown_functions_fail() {
        let (builder, _) = builder();

        let result = builder
            .build_entry(&FunctionRecord::new(99, "local_missing", "local_missing"))
            .await;

        assert!(matches!(
            result,
            Err(CatalogError::Host(HostError::UnknownFunction(name))) if name == "local_missing"
        ));
    }

    #[tokio::test]
    async fn root_component_aliases_are_interchangeable() {
        let (builder, _) = builder();

        assert!(
            builder
                .is_component_selected("core", &ComponentList::from(["moodle"]))
                .await
                .unwrap()
        );
        assert!(
            builder
                .is_component_selected("moodle", &ComponentList::from(["core"]))
                .await
                .unwrap()
        );
        assert!(
            !builder
                .is_component_selected("moodle", &ComponentList::from(["standard", "addons"]))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn standard_and_addons_selectors() {
        let (builder, _) = builder();
        let standard = ComponentList::from(["standard"]);
        let addons = ComponentList::from(["addons"]);

        assert!(builder.is_component_selected("mod_forum", &standard).await.unwrap());
        assert!(!builder.is_component_selected("tool_custom", &standard).await.unwrap());
        assert!(!builder.is_component_selected("mod_forum", &addons).await.unwrap());
        assert!(builder.is_component_selected("tool_custom", &addons).await.unwrap());
        assert!(
            builder
                .is_component_selected("anything", &ComponentList::default())
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn standard_plugins_are_loaded_once() {
        let (builder, host) = builder();

        builder.build_catalog("standard", "").await.unwrap();
        builder.build_catalog("addons", "").await.unwrap();
        builder.standard_plugins().await.unwrap();

        assert_eq!(host.standard_plugin_loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unfiltered_catalog_is_sorted_by_component_and_name() {
        let (builder, _) = builder();

        let catalog = builder.build_catalog("", "").await.unwrap();

        assert_eq!(
            names(&catalog),
            vec![
                "mod_assign_get_assignments",
                "mod_assign_submit",
                "mod_forum_get_forums",
                "core_course_get_contents",
                "core_course_get_courses",
                "tool_custom_do",
            ]
        );
    }

    #[tokio::test]
    async fn include_and_its_complement_partition_the_catalog() {
        let (builder, _) = builder();

        let all = builder.build_catalog("", "").await.unwrap();
        let included = builder.build_catalog("mod_assign, core", "").await.unwrap();
        let rest = builder
            .build_catalog("mod_forum,tool_custom", "")
            .await
            .unwrap();
        let excluded = builder.build_catalog("", "mod_assign,moodle").await.unwrap();

        assert_eq!(included.len() + rest.len(), all.len());
        assert!(names(&included).iter().all(|n| !names(&rest).contains(n)));
        assert_eq!(names(&excluded), names(&rest));
    }

    #[tokio::test]
    async fn exclude_applies_after_include() {
        let (builder, _) = builder();

        let catalog = builder
            .build_catalog("standard,moodle", "mod_assign")
            .await
            .unwrap();
        assert_eq!(
            names(&catalog),
            vec![
                "mod_forum_get_forums",
                "core_course_get_contents",
                "core_course_get_courses"
            ]
        );

        let both = builder
            .build_catalog("mod_forum", "mod_forum")
            .await
            .unwrap();
        assert!(both.is_empty());
    }

    #[tokio::test]
    async fn unlistable_components_do_not_fail_the_catalog() {
        let host = Arc::new(FakeHost {
            components_unavailable: true,
            ..FakeHost::new()
        });
        let builder = CatalogBuilder::new(host.clone(), host, normalizer());

        let catalog = builder.build_catalog("mod_forum", "").await.unwrap();
        assert_eq!(names(&catalog), vec!["mod_forum_get_forums"]);

        let excluded = builder.build_catalog("", "tool_custom,unknown_plugin").await.unwrap();
        assert_eq!(excluded.len(), 5);
    }

    #[tokio::test]
    async fn grouped_document_carries_versions() {
        let (builder, _) = builder();

        let document = builder
            .build_document("moodle,addons", "", true)
            .await
            .unwrap();
        let document = serde_json::to_value(&document).unwrap();

        let components = document["components"].as_object().unwrap();
        assert_eq!(
            components.keys().collect::<Vec<_>>(),
            vec!["moodle", "tool_custom"]
        );
        assert_eq!(components["moodle"]["version"], "2024100700.00");
        assert_eq!(components["moodle"]["functions"].as_array().unwrap().len(), 2);
        assert_eq!(components["tool_custom"]["version"], Value::Null);
    }

    #[tokio::test]
    async fn flat_document() {
        let (builder, _) = builder();

        let document = builder.build_document("mod_forum", "", false).await.unwrap();
        let document = serde_json::to_value(&document).unwrap();

        assert_eq!(document["functions"][0]["name"], "mod_forum_get_forums");
        assert!(document.get("components").is_none());
    }

    #[tokio::test]
    async fn service_catalog_is_sorted_by_name() {
        let (builder, _) = builder();

        let catalog = builder.build_service_catalog(1).await.unwrap();
        assert_eq!(
            names(&catalog),
            vec!["core_course_get_contents", "core_course_get_courses"]
        );

        assert!(matches!(
            builder.build_service_catalog(2).await,
            Err(CatalogError::Host(HostError::UnknownService(2)))
        ));
    }
}
