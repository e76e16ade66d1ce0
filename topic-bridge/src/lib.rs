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

//! # topic-bridge
//!
//! `topic-bridge` relays a whitelisted set of pub/sub topics between the local
//! message bus of a host and a peer host on the network.
//!
//! A bridge process runs in one direction. Publishing locally, it subscribes to
//! each topic over the network and republishes it on the local transport.
//! Publishing remotely, it subscribes on the local transport and republishes over
//! the network. The whitelist follows the process role (operator or simulator).
//!
//! ```no_run
//! use topic_bridge::{Bridge, BridgeSettings, RunMode};
//!
//! let bridge = Bridge::new(
//!     RunMode::from_args("op", "pub"),
//!     "192.168.1.20",
//!     BridgeSettings::default(),
//! );
//! let shutdown = bridge.shutdown_flag();
//! let _signals = topic_bridge::spawn_signal_listener(shutdown).unwrap();
//!
//! let stats = bridge.run().unwrap();
//! println!("forwarded {} messages", stats.forwarded);
//! ```
//!
//! ## Internal architecture map
//!
//! - API facade: [`Bridge`], run mode and settings
//! - Selection: whitelist resolution against the service registry
//! - Transport: the [`transport::Transport`] seam plus the `ipc` and `tcp` transports
//! - Wiring: one socket pair per topic, addressed by [`transport::SocketHandle`]
//! - Relay: the single-threaded poll/receive/forward/flush loop over `mio` readiness
//! - Runtime: the signal listener thread and the shared [`ShutdownFlag`]
//!
//! ## Observability model
//!
//! The workspace uses `tracing` for logs/events.
//! Library code emits events and does not initialize a global subscriber.
//! Binaries and tests are responsible for one-time `tracing_subscriber`
//! initialization at process boundaries.

mod bridge;
pub use bridge::Bridge;

mod error;
pub use error::{BridgeError, SendError, TransportError};

mod factory;
pub use factory::{TransportRelay, TransportSet};

#[doc(hidden)]
pub mod observability;

mod relay;
pub use relay::{Relay, RelayStats};

pub mod run_mode;
pub use run_mode::{LocalRole, PublishLocality, RunMode};

pub mod services;

mod settings;
pub use settings::{
    BridgeSettings, DEFAULT_BIND_ADDRESS, DEFAULT_FLUSH_INTERVAL, DEFAULT_POLL_TIMEOUT,
    DEFAULT_RECONNECT_INTERVAL, DEFAULT_SOCKET_DIR,
};

mod shutdown;
pub use shutdown::ShutdownFlag;

mod signals;
pub use signals::spawn_signal_listener;

mod topic_selector;
pub use topic_selector::{select_topics, EXCLUDED_TOPICS};

pub mod transport;

mod wiring;
pub use wiring::{wire_topics, SocketTable};
