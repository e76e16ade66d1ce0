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

//! Run mode of one bridge process: which whitelist applies and which side publishes.

use std::fmt;

pub const OPERATOR_WHITELIST: &str = "carControl,controlsState,carParams";
pub const SIMULATOR_WHITELIST: &str = "can,gpsLocationExternal,driverStateV2,peripheralState,roadCameraState,roadEncodeData,roadEncodeIdx,wideRoadCameraState,wideRoadEncodeData,wideRoadEncodeIdx";

pub const DEFAULT_LOOPBACK_ADDRESS: &str = "127.0.0.1";

/// Which end of the link this process sits on, selecting the whitelist.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LocalRole {
    Operator,
    Simulator,
}

impl LocalRole {
    /// `op` selects the operator role; any other value selects the simulator role.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "op" {
            LocalRole::Operator
        } else {
            LocalRole::Simulator
        }
    }

    pub fn default_whitelist(&self) -> &'static str {
        match self {
            LocalRole::Operator => OPERATOR_WHITELIST,
            LocalRole::Simulator => SIMULATOR_WHITELIST,
        }
    }
}

/// Which transport plays the publishing role.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PublishLocality {
    /// Subscribe over the network, republish on the local transport.
    Local,
    /// Subscribe on the local transport, republish over the network.
    Remote,
}

impl PublishLocality {
    /// `pub` selects local publishing; any other value selects remote publishing.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "pub" {
            PublishLocality::Local
        } else {
            PublishLocality::Remote
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunMode {
    pub role: LocalRole,
    pub locality: PublishLocality,
}

impl RunMode {
    pub fn new(role: LocalRole, locality: PublishLocality) -> Self {
        Self { role, locality }
    }

    pub fn from_args(role: &str, locality: &str) -> Self {
        Self::new(LocalRole::from_arg(role), PublishLocality::from_arg(locality))
    }

    /// Address the subscribing side connects to.
    ///
    /// Only the network→local direction subscribes from a remote host; the other
    /// direction subscribes locally and falls back to `loopback`.
    pub fn bridge_address<'a>(&self, remote_address: &'a str, loopback: &'a str) -> &'a str {
        match self.locality {
            PublishLocality::Local => remote_address,
            PublishLocality::Remote => loopback,
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let role = match self.role {
            LocalRole::Operator => "operator",
            LocalRole::Simulator => "simulator",
        };
        let direction = match self.locality {
            PublishLocality::Local => "network->local",
            PublishLocality::Remote => "local->network",
        };
        write!(f, "{role} ({direction})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_arg_is_operator_only_for_op() {
        assert_eq!(LocalRole::from_arg("op"), LocalRole::Operator);
        assert_eq!(LocalRole::from_arg("sim"), LocalRole::Simulator);
        assert_eq!(LocalRole::from_arg("OP"), LocalRole::Simulator);
        assert_eq!(LocalRole::from_arg(""), LocalRole::Simulator);
    }

    #[test]
    fn locality_arg_is_local_only_for_pub() {
        assert_eq!(PublishLocality::from_arg("pub"), PublishLocality::Local);
        assert_eq!(PublishLocality::from_arg("sub"), PublishLocality::Remote);
        assert_eq!(PublishLocality::from_arg("anything"), PublishLocality::Remote);
    }

    #[test]
    fn whitelist_follows_role() {
        assert_eq!(
            RunMode::from_args("op", "sub").role.default_whitelist(),
            OPERATOR_WHITELIST
        );
        assert_eq!(
            RunMode::from_args("sim", "sub").role.default_whitelist(),
            SIMULATOR_WHITELIST
        );
    }

    #[test]
    fn bridge_address_uses_remote_only_when_publishing_locally() {
        let local = RunMode::from_args("op", "pub");
        assert_eq!(
            local.bridge_address("192.168.1.20", DEFAULT_LOOPBACK_ADDRESS),
            "192.168.1.20"
        );

        let remote = RunMode::from_args("op", "sub");
        assert_eq!(
            remote.bridge_address("192.168.1.20", DEFAULT_LOOPBACK_ADDRESS),
            DEFAULT_LOOPBACK_ADDRESS
        );
    }

    #[test]
    fn display_names_role_and_direction() {
        assert_eq!(
            RunMode::from_args("sim", "pub").to_string(),
            "simulator (network->local)"
        );
    }
}
