// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use anyhow::Result;
use common::logging_tracing;
use wsd_env::SystemEnvironment;

use commands::{command::CommandDefinition, export::ExportCommandDefinition};

mod commands;
mod util;

#[tokio::main]
async fn main() -> Result<()> {
    logging_tracing::init();

    let command_definition = ExportCommandDefinition {};

    let command = command_definition
        .command()
        .version(env!("CARGO_PKG_VERSION"));

    let matches = command.get_matches();

    command_definition
        .execute(&matches, &SystemEnvironment)
        .await
}
