// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A host backed by a JSON export of a site.
//!
//! [`HostSnapshot`] holds everything the discovery binaries need to know about a site: its
//! registered functions with their descriptions, plugins, installed languages and themes,
//! protocols, external services, users and tokens. [`SnapshotHost`] serves all the collaborator
//! interfaces from such a snapshot.

mod error;
mod host;
mod snapshot;

pub use error::SnapshotError;
pub use host::SnapshotHost;
pub use snapshot::{
    ComponentSnapshot, HostSnapshot, ProtocolSnapshot, ServiceSnapshot, TokenSnapshot,
    UserSnapshot,
};
