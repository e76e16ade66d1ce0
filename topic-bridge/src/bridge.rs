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

//! Bridge facade: topic selection, transport choice and the relay run.

use crate::error::BridgeError;
use crate::factory::TransportSet;
use crate::observability::events;
use crate::relay::RelayStats;
use crate::run_mode::{PublishLocality, RunMode};
use crate::services::service_names;
use crate::settings::BridgeSettings;
use crate::shutdown::ShutdownFlag;
use crate::topic_selector::select_topics;
use crate::transport::ipc::IpcTransport;
use crate::transport::tcp::TcpTransport;
use crate::transport::Transport;
use tracing::info;

const COMPONENT: &str = "bridge";

/// One bridge process: relays the whitelisted topics in the direction given by its [`RunMode`].
pub struct Bridge {
    mode: RunMode,
    remote_address: String,
    settings: BridgeSettings,
    whitelist: Option<String>,
    services: Option<Vec<String>>,
    shutdown: ShutdownFlag,
}

impl Bridge {
    pub fn new(mode: RunMode, remote_address: impl Into<String>, settings: BridgeSettings) -> Self {
        Self {
            mode,
            remote_address: remote_address.into(),
            settings,
            whitelist: None,
            services: None,
            shutdown: ShutdownFlag::new(),
        }
    }

    /// Replaces the role's built-in whitelist.
    pub fn with_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.whitelist = Some(whitelist.into());
        self
    }

    /// Replaces the built-in service registry as the set of known topic names.
    pub fn with_services<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Uses an existing flag, e.g. one already wired to signal handlers.
    pub fn with_shutdown_flag(mut self, shutdown: ShutdownFlag) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Handle that stops [`run`](Self::run) once requested.
    pub fn shutdown_flag(&self) -> ShutdownFlag {
        self.shutdown.clone()
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn whitelist(&self) -> &str {
        self.whitelist
            .as_deref()
            .unwrap_or_else(|| self.mode.role.default_whitelist())
    }

    pub fn selected_topics(&self) -> Vec<String> {
        match &self.services {
            Some(names) => select_topics(names, self.whitelist()),
            None => select_topics(service_names(), self.whitelist()),
        }
    }

    /// Address the subscribing sockets read from.
    pub fn bridge_address(&self) -> &str {
        self.mode
            .bridge_address(&self.remote_address, &self.settings.loopback_address)
    }

    /// Wires every selected topic and relays until shutdown.
    ///
    /// Setup failures are returned before any message is relayed.
    pub fn run(self) -> Result<RelayStats, BridgeError> {
        let topics = self.selected_topics();
        let address = self.bridge_address();
        info!(
            event = events::BRIDGE_ADDRESS_RESOLVED,
            component = COMPONENT,
            mode = %self.mode,
            address,
            topics = topics.len(),
            "bridge address resolved"
        );

        match self.mode.locality {
            PublishLocality::Local => self.relay::<TcpTransport, IpcTransport>(&topics, address),
            PublishLocality::Remote => self.relay::<IpcTransport, TcpTransport>(&topics, address),
        }
    }

    fn relay<Src, Dst>(&self, topics: &[String], address: &str) -> Result<RelayStats, BridgeError>
    where
        Src: Transport,
        Dst: Transport<Message = Src::Message>,
    {
        info!(
            event = events::TRANSPORTS_SELECTED,
            component = COMPONENT,
            sub_transport = Src::NAME,
            pub_transport = Dst::NAME,
            "transports selected"
        );
        TransportSet::<Src, Dst>::new(&self.settings)?
            .into_relay(topics, address, &self.settings, self.shutdown.clone())?
            .run()
    }
}
