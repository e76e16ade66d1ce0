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

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use topic_bridge::{
    BridgeSettings, LocalRole, DEFAULT_BIND_ADDRESS, DEFAULT_FLUSH_INTERVAL, DEFAULT_POLL_TIMEOUT,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_SOCKET_DIR,
};

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub(crate) relay: RelayConfig,
    pub(crate) ipc: IpcConfig,
    pub(crate) network: NetworkConfig,
    pub(crate) whitelists: WhitelistConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct RelayConfig {
    pub(crate) poll_timeout_ms: u64,
    pub(crate) flush_interval_ms: u64,
    pub(crate) reconnect_interval_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT.as_millis() as u64,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL.as_millis() as u64,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct IpcConfig {
    pub(crate) socket_dir: PathBuf,
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            socket_dir: PathBuf::from(DEFAULT_SOCKET_DIR),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct NetworkConfig {
    pub(crate) bind_address: String,
    pub(crate) loopback_address: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            loopback_address: topic_bridge::run_mode::DEFAULT_LOOPBACK_ADDRESS.to_string(),
        }
    }
}

/// Per-role whitelist overrides; an absent entry keeps the built-in list.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct WhitelistConfig {
    pub(crate) operator: Option<String>,
    pub(crate) simulator: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config: Config = json5::from_str(&contents)
            .with_context(|| format!("unable to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.relay.poll_timeout_ms > 0,
            "relay.poll_timeout_ms must be greater than zero"
        );
        anyhow::ensure!(
            self.relay.flush_interval_ms > 0,
            "relay.flush_interval_ms must be greater than zero"
        );
        anyhow::ensure!(
            !self.ipc.socket_dir.as_os_str().is_empty(),
            "ipc.socket_dir must not be empty"
        );
        Ok(())
    }

    pub fn bridge_settings(&self) -> BridgeSettings {
        BridgeSettings {
            poll_timeout: Duration::from_millis(self.relay.poll_timeout_ms),
            flush_interval: Duration::from_millis(self.relay.flush_interval_ms),
            reconnect_interval: Duration::from_millis(self.relay.reconnect_interval_ms),
            socket_dir: self.ipc.socket_dir.clone(),
            bind_address: self.network.bind_address.clone(),
            loopback_address: self.network.loopback_address.clone(),
        }
    }

    pub fn whitelist_for(&self, role: LocalRole) -> Option<&str> {
        match role {
            LocalRole::Operator => self.whitelists.operator.as_deref(),
            LocalRole::Simulator => self.whitelists.simulator.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;
    use topic_bridge::{BridgeSettings, LocalRole};

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn empty_config_matches_library_defaults() {
        let file = write_config("{}");
        let config = Config::load(file.path()).expect("empty config is valid");

        assert_eq!(config, Config::default());
        assert_eq!(config.bridge_settings(), BridgeSettings::default());
        assert_eq!(config.whitelist_for(LocalRole::Operator), None);
    }

    #[test]
    fn sample_config_loads() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static-configs/bridge.json5");
        let config = Config::load(&path).expect("sample config is valid");

        assert_eq!(config.bridge_settings(), BridgeSettings::default());
        assert_eq!(
            config.whitelist_for(LocalRole::Operator),
            Some(topic_bridge::run_mode::OPERATOR_WHITELIST)
        );
        assert_eq!(
            config.whitelist_for(LocalRole::Simulator),
            Some(topic_bridge::run_mode::SIMULATOR_WHITELIST)
        );
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let file = write_config(
            r#"{
                // json5 comments and trailing commas are accepted
                relay: { poll_timeout_ms: 250, },
                network: { loopback_address: "10.1.1.1" },
                whitelists: { simulator: "carState" },
            }"#,
        );
        let config = Config::load(file.path()).expect("partial config is valid");
        let settings = config.bridge_settings();

        assert_eq!(settings.poll_timeout, Duration::from_millis(250));
        assert_eq!(settings.flush_interval, Duration::from_millis(5));
        assert_eq!(settings.loopback_address, "10.1.1.1");
        assert_eq!(settings.bind_address, "0.0.0.0");
        assert_eq!(config.whitelist_for(LocalRole::Simulator), Some("carState"));
        assert_eq!(config.whitelist_for(LocalRole::Operator), None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = write_config("{ relay: { poll_timeout: 10 } }");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn zero_poll_timeout_is_rejected() {
        let file = write_config("{ relay: { poll_timeout_ms: 0 } }");
        let err = Config::load(file.path()).expect_err("zero timeout is invalid");
        assert!(err.to_string().contains("poll_timeout_ms"));
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let err = Config::load(std::path::Path::new("/nonexistent/bridge.json5"))
            .expect_err("missing file");
        assert!(format!("{err:#}").contains("/nonexistent/bridge.json5"));
    }
}
