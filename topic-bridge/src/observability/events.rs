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

//! Canonical structured event names used across `topic-bridge`.

// Topic selection and setup events.
pub const TOPIC_ALLOWED: &str = "topic_allowed";
pub const TRANSPORTS_SELECTED: &str = "transports_selected";
pub const BRIDGE_ADDRESS_RESOLVED: &str = "bridge_address_resolved";
pub const TOPIC_WIRED: &str = "topic_wired";
pub const TOPIC_WIRING_FAILED: &str = "topic_wiring_failed";
pub const TOPICS_WIRED: &str = "topics_wired";
pub const TRANSPORT_CONTEXT_READY: &str = "transport_context_ready";

// Relay loop events.
pub const RELAY_START: &str = "relay_start";
pub const RELAY_STOP: &str = "relay_stop";
pub const RELAY_SEND_RETRY: &str = "relay_send_retry";
pub const RELAY_SEND_SUPPRESSED: &str = "relay_send_suppressed";
pub const RELAY_SEND_FAILED: &str = "relay_send_failed";
pub const RELAY_FLUSH_FAILED: &str = "relay_flush_failed";
pub const POLLER_WAIT_FAILED: &str = "poller_wait_failed";

// Subscriber socket events.
pub const SUBSCRIBER_ADDRESS_RESOLVED: &str = "subscriber_address_resolved";
pub const SUBSCRIBER_CONNECTED: &str = "subscriber_connected";
pub const SUBSCRIBER_CONNECT_FAILED: &str = "subscriber_connect_failed";
pub const SUBSCRIBER_DISCONNECTED: &str = "subscriber_disconnected";
pub const SUBSCRIBER_FRAME_REJECTED: &str = "subscriber_frame_rejected";

// Publisher socket events.
pub const PUBLISHER_BOUND: &str = "publisher_bound";
pub const PUBLISHER_STALE_SOCKET_REMOVED: &str = "publisher_stale_socket_removed";
pub const PUBLISHER_SOCKET_REMOVE_FAILED: &str = "publisher_socket_remove_failed";
pub const PUBLISHER_PEER_ACCEPTED: &str = "publisher_peer_accepted";
pub const PUBLISHER_PEER_DROPPED: &str = "publisher_peer_dropped";
pub const PUBLISHER_PEER_BROKEN_PIPE: &str = "publisher_peer_broken_pipe";
pub const PUBLISHER_PEER_HIGH_WATER_MARK: &str = "publisher_peer_high_water_mark";

// Runtime/signal events.
pub const SIGNAL_SHUTDOWN_REQUESTED: &str = "signal_shutdown_requested";
pub const SIGNAL_BROKEN_PIPE: &str = "signal_broken_pipe";
pub const RUNTIME_SPAWN_OK: &str = "runtime_spawn_ok";
pub const RUNTIME_SPAWN_FAILED: &str = "runtime_spawn_failed";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn event_names_are_unique_snake_case() {
        let names = [
            TOPIC_ALLOWED,
            TRANSPORTS_SELECTED,
            BRIDGE_ADDRESS_RESOLVED,
            TOPIC_WIRED,
            TOPIC_WIRING_FAILED,
            TOPICS_WIRED,
            TRANSPORT_CONTEXT_READY,
            RELAY_START,
            RELAY_STOP,
            RELAY_SEND_RETRY,
            RELAY_SEND_SUPPRESSED,
            RELAY_SEND_FAILED,
            RELAY_FLUSH_FAILED,
            POLLER_WAIT_FAILED,
            SUBSCRIBER_ADDRESS_RESOLVED,
            SUBSCRIBER_CONNECTED,
            SUBSCRIBER_CONNECT_FAILED,
            SUBSCRIBER_DISCONNECTED,
            SUBSCRIBER_FRAME_REJECTED,
            PUBLISHER_BOUND,
            PUBLISHER_STALE_SOCKET_REMOVED,
            PUBLISHER_SOCKET_REMOVE_FAILED,
            PUBLISHER_PEER_ACCEPTED,
            PUBLISHER_PEER_DROPPED,
            PUBLISHER_PEER_BROKEN_PIPE,
            PUBLISHER_PEER_HIGH_WATER_MARK,
            SIGNAL_SHUTDOWN_REQUESTED,
            SIGNAL_BROKEN_PIPE,
            RUNTIME_SPAWN_OK,
            RUNTIME_SPAWN_FAILED,
        ];
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
        for name in names {
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}
