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

//! Transport pairing for one bridge direction.

use crate::error::{BridgeError, TransportError};
use crate::observability::events;
use crate::relay::Relay;
use crate::settings::BridgeSettings;
use crate::shutdown::ShutdownFlag;
use crate::transport::Transport;
use crate::wiring::wire_topics;
use tracing::info;

const COMPONENT: &str = "transport_factory";

fn setup_failed(transport: &'static str) -> impl FnOnce(TransportError) -> BridgeError {
    move |source| BridgeError::TransportSetup { transport, source }
}

/// Relay over a subscribing transport `Src` and a publishing transport `Dst`.
pub type TransportRelay<Src, Dst> = Relay<
    <Src as Transport>::SubSocket,
    <Dst as Transport>::PubSocket,
    <Src as Transport>::Poller,
>;

/// Contexts and poller for one direction: read from `Src`, publish on `Dst`.
///
/// The poller comes from `Src`, since the subscribing sockets are the ones it waits on.
pub struct TransportSet<Src: Transport, Dst: Transport> {
    poller: Src::Poller,
    sub_context: Src::Context,
    pub_context: Dst::Context,
}

impl<Src, Dst> TransportSet<Src, Dst>
where
    Src: Transport,
    Dst: Transport<Message = Src::Message>,
{
    /// Builds both contexts and the poller; any failure is fatal for the bridge.
    pub fn new(settings: &BridgeSettings) -> Result<Self, BridgeError> {
        let sub_context = Src::context(settings).map_err(setup_failed(Src::NAME))?;
        let pub_context = Dst::context(settings).map_err(setup_failed(Dst::NAME))?;
        let poller = Src::poller(settings).map_err(setup_failed(Src::NAME))?;
        Ok(Self::from_parts(poller, sub_context, pub_context))
    }

    pub fn from_parts(
        poller: Src::Poller,
        sub_context: Src::Context,
        pub_context: Dst::Context,
    ) -> Self {
        Self {
            poller,
            sub_context,
            pub_context,
        }
    }

    /// Wires every topic and hands the sockets and the poller to a new relay.
    pub fn into_relay(
        self,
        topics: &[String],
        address: &str,
        settings: &BridgeSettings,
        shutdown: ShutdownFlag,
    ) -> Result<TransportRelay<Src, Dst>, BridgeError> {
        let Self {
            mut poller,
            sub_context,
            pub_context,
        } = self;

        let table =
            wire_topics::<Src, Dst>(topics, &sub_context, &pub_context, address, &mut poller)?;
        info!(
            event = events::TOPICS_WIRED,
            component = COMPONENT,
            sub_transport = Src::NAME,
            pub_transport = Dst::NAME,
            topics = table.len(),
            "all topics wired"
        );
        Ok(Relay::new(table, poller, settings, shutdown))
    }
}
