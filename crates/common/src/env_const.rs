// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::path::PathBuf;

use wsd_env::{EnvError, Environment, get_parsed};

pub const WSD_LOG: &str = "WSD_LOG";
pub const WSD_DEBUG: &str = "WSD_DEBUG";

pub const WSD_HOST_SNAPSHOT: &str = "WSD_HOST_SNAPSHOT";

pub const WSD_SERVER_PORT: &str = "WSD_SERVER_PORT";
pub const WSD_SERVER_HOST: &str = "WSD_SERVER_HOST";

pub const WSD_DISCOVERY_HTTP_PATH: &str = "WSD_DISCOVERY_HTTP_PATH";

const DEFAULT_HOST_SNAPSHOT: &str = "host.json";
const DEFAULT_SERVER_PORT: u16 = 9876;
const DEFAULT_SERVER_HOST: &str = "localhost";
const DEFAULT_DISCOVERY_HTTP_PATH: &str = "/discovery";

/// Whether error responses may carry debugging information.
pub fn is_debug(env: &dyn Environment) -> Result<bool, EnvError> {
    env.enabled(WSD_DEBUG, false)
}

pub fn get_host_snapshot_path(env: &dyn Environment) -> PathBuf {
    PathBuf::from(env.get_or_else(WSD_HOST_SNAPSHOT, DEFAULT_HOST_SNAPSHOT))
}

pub fn get_server_port(env: &dyn Environment) -> Result<u16, EnvError> {
    get_parsed(env, WSD_SERVER_PORT, DEFAULT_SERVER_PORT)
}

pub fn get_server_host(env: &dyn Environment) -> String {
    env.get_or_else(WSD_SERVER_HOST, DEFAULT_SERVER_HOST)
}

pub fn get_discovery_http_path(env: &dyn Environment) -> String {
    env.get_or_else(WSD_DISCOVERY_HTTP_PATH, DEFAULT_DISCOVERY_HTTP_PATH)
}
