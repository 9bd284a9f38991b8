// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::info;

use common::env_const::get_host_snapshot_path;
use snapshot_host::SnapshotHost;
use ws_introspection::{CatalogBuilder, CatalogDocument, Normalizer, SystemClock};
use wsd_env::Environment;

use crate::commands::command::{CommandDefinition, get, output_arg, snapshot_arg, yes_arg};
use crate::util::open_file_for_output;

const EXAMPLES: &str = "\
Unlike the discovery endpoint, this command does not take a web service token and describes all
registered web service functions, not only those available to a particular user.

Examples:

To generate JSON for core and standard plugins and group by component:
  wsd --include=moodle,standard --group-by-component

To include all non-standard plugins except for tool_idonotneed:
  wsd --include=addons --exclude=tool_idonotneed";

pub(crate) struct ExportCommandDefinition {}

#[async_trait]
impl CommandDefinition for ExportCommandDefinition {
    fn command(&self) -> Command {
        Command::new("wsd")
            .about("Generate JSON describing the web service functions of a site")
            .arg(
                Arg::new("include")
                    .help("List of components to include (comma separated)")
                    .long_help("List of components to include (comma separated). 'moodle' for core web services, 'standard' for standard plugins, 'addons' for all non-standard plugins, or a full plugin name for a specific plugin. By default all components are included.")
                    .long("include")
                    .value_name("LIST")
                    .required(false)
                    .num_args(1),
            )
            .arg(
                Arg::new("exclude")
                    .help("List of components to exclude (comma separated)")
                    .long_help("List of components to exclude (comma separated). If specified together with --include, applies after the include filter.")
                    .long("exclude")
                    .value_name("LIST")
                    .required(false)
                    .num_args(1),
            )
            .arg(
                Arg::new("group-by-component")
                    .help("Group the functions by component")
                    .long_help("Group the functions by component in the generated JSON and include each component's version.")
                    .long("group-by-component")
                    .action(ArgAction::SetTrue),
            )
            .arg(snapshot_arg())
            .arg(output_arg())
            .arg(yes_arg())
            .after_help(EXAMPLES)
    }

    async fn execute(&self, matches: &ArgMatches, env: &dyn Environment) -> Result<()> {
        let include: String = get(matches, "include").unwrap_or_default();
        let exclude: String = get(matches, "exclude").unwrap_or_default();
        let group_by_component = matches.get_flag("group-by-component");
        let snapshot: PathBuf =
            get(matches, "snapshot").unwrap_or_else(|| get_host_snapshot_path(env));
        let output: Option<PathBuf> = get(matches, "output");
        let yes = matches.get_flag("yes");

        let document = export(&snapshot, &include, &exclude, group_by_component).await?;

        let mut buffer = open_file_for_output(output.as_deref(), yes)?;
        serde_json::to_writer_pretty(&mut buffer, &document)?;
        writeln!(buffer)?;
        buffer.flush()?;

        Ok(())
    }
}

async fn export(
    snapshot: &Path,
    include: &str,
    exclude: &str,
    group_by_component: bool,
) -> Result<CatalogDocument> {
    let host = Arc::new(SnapshotHost::load(snapshot)?);
    info!(
        snapshot = %snapshot.display(),
        release = host.snapshot().release.as_deref().unwrap_or("unknown"),
        "Describing web services"
    );

    let builder = CatalogBuilder::new(
        host.clone(),
        host.clone(),
        Normalizer::new(Arc::new(SystemClock), host),
    );

    Ok(builder
        .build_document(include, exclude, group_by_component)
        .await?)
}
