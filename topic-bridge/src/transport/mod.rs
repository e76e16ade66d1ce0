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

//! Transport layer.
//!
//! A [`Transport`] bundles a context, subscribing and publishing socket types, and
//! the poller able to wait on its subscribing sockets. The bridge picks one
//! transport for each side at startup and is monomorphized over the pair, so the
//! relay loop never branches on the transport kind.
//!
//! Two transports ship with the crate:
//!
//! - [`ipc::IpcTransport`]: the local transport, Unix domain stream sockets in a
//!   shared directory.
//! - [`tcp::TcpTransport`]: the network transport, one TCP port per topic.
//!
//! Both frame each message with a little-endian `u32` length prefix, so message
//! boundaries survive the byte stream, and both wait for readiness through a
//! [`poller::MioPoller`].
//!
//! ```no_run
//! use std::time::Duration;
//! use topic_bridge::transport::{ipc::IpcTransport, Message, PubSocket, SubSocket, Transport};
//! use topic_bridge::BridgeSettings;
//!
//! let settings = BridgeSettings::default();
//! let context = IpcTransport::context(&settings).unwrap();
//!
//! let mut publisher = IpcTransport::pub_socket(&context, "carState").unwrap();
//! let mut subscriber =
//!     IpcTransport::sub_socket(&context, "carState", "127.0.0.1", false).unwrap();
//!
//! // The first send accepts the pending subscriber connection.
//! publisher.send(&Message::new(b"hello".to_vec())).unwrap();
//! while publisher.has_pending() {
//!     publisher.flush_pending().unwrap();
//! }
//! std::thread::sleep(Duration::from_millis(10));
//! if let Some(message) = subscriber.receive() {
//!     println!("{} bytes on {}", message.len(), subscriber.topic());
//! }
//! ```

use crate::error::{SendError, TransportError};
use crate::settings::BridgeSettings;
use std::io;
use std::time::Duration;

pub(crate) mod framing;
pub mod ipc;
pub mod poller;
pub mod stream;
pub mod tcp;

/// An opaque message payload.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    data: Vec<u8>,
}

impl Message {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for Message {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Stable index of one socket pair, assigned during wiring.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SocketHandle(usize);

impl SocketHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Receiving end of one topic.
pub trait SubSocket {
    type Message;

    fn topic(&self) -> &str;

    /// Non-blocking check: `true` when [`receive`](SubSocket::receive) would yield a message.
    fn poll_ready(&mut self) -> bool;

    /// Next available message, or `None` when nothing is available right now.
    fn receive(&mut self) -> Option<Self::Message>;
}

/// Sending end of one topic.
pub trait PubSocket<M> {
    fn topic(&self) -> &str;

    fn send(&mut self, message: &M) -> Result<(), SendError>;

    /// `true` while output accepted by [`send`](PubSocket::send) has not been written yet.
    fn has_pending(&self) -> bool {
        false
    }

    /// Writes queued output without blocking and without waiting for another send.
    fn flush_pending(&mut self) -> Result<(), SendError> {
        Ok(())
    }
}

/// Waits for readiness on a fixed set of registered subscribing sockets.
pub trait Poller<S> {
    /// Adds `socket` under `handle`; `handle` indexes the slice passed to `poll`.
    fn register(&mut self, handle: SocketHandle, socket: &mut S) -> io::Result<()>;

    /// Returns the registered sockets with a message ready, waiting at most `timeout`.
    ///
    /// An empty result means the wait timed out.
    fn poll(&mut self, sockets: &mut [S], timeout: Duration) -> Vec<SocketHandle>;
}

/// One transport kind: its context, sockets and poller.
pub trait Transport {
    const NAME: &'static str;

    type Context;
    type Message;
    type SubSocket: SubSocket<Message = Self::Message>;
    type PubSocket: PubSocket<Self::Message>;
    type Poller: Poller<Self::SubSocket>;

    fn context(settings: &BridgeSettings) -> Result<Self::Context, TransportError>;

    fn poller(settings: &BridgeSettings) -> Result<Self::Poller, TransportError>;

    /// Creates the publishing socket for `topic`.
    fn pub_socket(context: &Self::Context, topic: &str) -> Result<Self::PubSocket, TransportError>;

    /// Creates the subscribing socket for `topic`, reading from `address`.
    ///
    /// With `conflate` set only the newest pending message is delivered.
    fn sub_socket(
        context: &Self::Context,
        topic: &str,
        address: &str,
        conflate: bool,
    ) -> Result<Self::SubSocket, TransportError>;
}

/// Topic names double as socket file names on the local transport.
pub(crate) fn validate_topic(topic: &str) -> Result<(), TransportError> {
    let valid = !topic.is_empty()
        && topic != "."
        && topic != ".."
        && !topic.contains(['/', '\0']);
    if valid {
        Ok(())
    } else {
        Err(TransportError::InvalidTopic(topic.to_string()))
    }
}
