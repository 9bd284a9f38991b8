// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgAction, ArgMatches, Command};
use wsd_env::Environment;

#[async_trait]
pub trait CommandDefinition {
    fn command(&self) -> Command;

    async fn execute(&self, matches: &ArgMatches, env: &dyn Environment) -> Result<()>;
}

pub fn get<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, arg_id: &str) -> Option<T> {
    matches.get_one::<T>(arg_id).cloned()
}

pub fn output_arg() -> Arg {
    Arg::new("output")
        .help("Output file path")
        .long_help("If specified, the output will be written to this file path instead of stdout.")
        .short('o')
        .long("output")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}

pub fn yes_arg() -> Arg {
    Arg::new("yes")
        .help("Overwrite the output file without asking")
        .short('y')
        .long("yes")
        .required(false)
        .action(ArgAction::SetTrue)
}

pub fn snapshot_arg() -> Arg {
    Arg::new("snapshot")
        .help("The path to the host snapshot")
        .long_help("The JSON export of the site to describe. If not specified, the program will read it from the environment (`WSD_HOST_SNAPSHOT`), falling back to `host.json`.")
        .long("snapshot")
        .required(false)
        .value_parser(clap::value_parser!(PathBuf))
        .num_args(1)
}
