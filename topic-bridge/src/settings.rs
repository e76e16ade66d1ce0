/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use crate::run_mode::DEFAULT_LOOPBACK_ADDRESS;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5);
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SOCKET_DIR: &str = "/tmp/topic-bridge";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Tunables shared by the transports and the relay loop.
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeSettings {
    /// Upper bound on one poll of the subscribing sockets.
    pub poll_timeout: Duration,
    /// Upper bound on one poll while a publisher still has queued output.
    pub flush_interval: Duration,
    /// Minimum delay between connection attempts of a disconnected subscriber.
    pub reconnect_interval: Duration,
    /// Directory holding the local transport's sockets.
    pub socket_dir: PathBuf,
    /// Interface the network publishers bind to.
    pub bind_address: String,
    /// Address the subscribing side uses when no remote address applies.
    pub loopback_address: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            loopback_address: DEFAULT_LOOPBACK_ADDRESS.to_string(),
        }
    }
}
