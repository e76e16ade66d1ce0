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

mod config;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use topic_bridge::{spawn_signal_listener, Bridge, RunMode};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Relays whitelisted pub/sub topics between the local bus and a peer host.
#[derive(Parser, Debug)]
#[command(version)]
struct BridgeArgs {
    /// `op` for the operator role; anything else selects the simulator role.
    role: String,

    /// `pub` to republish network topics locally; anything else republishes local
    /// topics on the network.
    locality: String,

    /// Peer host the network subscribers connect to when publishing locally.
    remote_address: String,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn run(args: BridgeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mode = RunMode::from_args(&args.role, &args.locality);
    let mut bridge = Bridge::new(mode, args.remote_address, config.bridge_settings());
    if let Some(whitelist) = config.whitelist_for(mode.role) {
        bridge = bridge.with_whitelist(whitelist);
    }
    info!(
        mode = %bridge.mode(),
        whitelist = bridge.whitelist(),
        "starting topic bridge"
    );

    // Handlers go in before any socket is wired.
    spawn_signal_listener(bridge.shutdown_flag()).context("unable to start signal listener")?;

    let stats = bridge.run().context("topic bridge stopped with an error")?;
    info!(
        received = stats.received,
        forwarded = stats.forwarded,
        abandoned = stats.abandoned,
        "topic bridge stopped"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = BridgeArgs::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BridgeArgs;
    use clap::Parser;

    #[test]
    fn requires_exactly_three_positionals() {
        assert!(BridgeArgs::try_parse_from(["bridge", "op", "pub"]).is_err());
        assert!(
            BridgeArgs::try_parse_from(["bridge", "op", "pub", "10.0.0.2", "extra"]).is_err()
        );

        let args = BridgeArgs::try_parse_from(["bridge", "op", "pub", "10.0.0.2"])
            .expect("three positionals parse");
        assert_eq!(args.role, "op");
        assert_eq!(args.locality, "pub");
        assert_eq!(args.remote_address, "10.0.0.2");
        assert!(args.config.is_none());
    }

    #[test]
    fn usage_error_exits_with_status_two() {
        let err = BridgeArgs::try_parse_from(["bridge"]).expect_err("missing positionals");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn config_flag_is_optional() {
        let args = BridgeArgs::try_parse_from([
            "bridge",
            "sim",
            "sub",
            "10.0.0.2",
            "--config",
            "bridge.json5",
        ])
        .expect("config flag parses");
        assert_eq!(args.config.as_deref(), Some(std::path::Path::new("bridge.json5")));
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        BridgeArgs::command().debug_assert();
    }
}
