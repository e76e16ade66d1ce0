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

//! Network transport: one TCP port per topic.
//!
//! Both sides derive the port from the topic name alone, so publisher and
//! subscriber agree without any discovery step.

use crate::error::TransportError;
use crate::observability::events;
use crate::settings::BridgeSettings;
use crate::transport::poller::MioPoller;
use crate::transport::stream::{
    connect_progress, StreamConnector, StreamListener, StreamPubSocket, StreamSubSocket,
};
use crate::transport::{validate_topic, Message, Transport};
use mio::net::{TcpListener, TcpStream};
use std::cell::Cell;
use std::io;
use std::net::{SocketAddr, TcpListener as BlockingTcpListener, ToSocketAddrs};
use std::time::Duration;
use tracing::trace;

const COMPONENT: &str = "tcp_transport";

/// Lowest port handed out to a topic.
pub const BASE_PORT: u16 = 8023;
const PORT_SPAN: u64 = 65535 - BASE_PORT as u64;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Port serving `topic`, in `BASE_PORT..65535`.
pub fn port_for_topic(topic: &str) -> u16 {
    // The remainder is below PORT_SPAN, so the sum stays under 65535.
    BASE_PORT + (fnv1a64(topic.as_bytes()) % PORT_SPAN) as u16
}

pub type TcpPubSocket = StreamPubSocket<TcpPeerListener>;
pub type TcpSubSocket = StreamSubSocket<TcpConnector>;

/// Network transport over TCP.
pub struct TcpTransport;

#[derive(Clone, Debug)]
pub struct TcpContext {
    bind_address: String,
    reconnect_interval: Duration,
}

pub struct TcpPeerListener {
    listener: TcpListener,
}

impl StreamListener for TcpPeerListener {
    type Stream = TcpStream;

    fn accept_peer(&self) -> io::Result<(TcpStream, String)> {
        let (stream, peer) = self.listener.accept()?;
        stream.set_nodelay(true)?;
        Ok((stream, peer.to_string()))
    }
}

/// Connects to the resolved publisher addresses in turn, one per attempt.
pub struct TcpConnector {
    addresses: Vec<SocketAddr>,
    next: Cell<usize>,
}

impl StreamConnector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self) -> io::Result<TcpStream> {
        let attempt = self.next.get();
        self.next.set(attempt.wrapping_add(1));
        let address = self
            .addresses
            .get(attempt % self.addresses.len().max(1))
            .ok_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable))?;

        let stream = TcpStream::connect(*address)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn is_established(stream: &TcpStream) -> io::Result<bool> {
        connect_progress(stream.take_error(), stream.peer_addr().map(drop))
    }
}

impl Transport for TcpTransport {
    const NAME: &'static str = "tcp";

    type Context = TcpContext;
    type Message = Message;
    type SubSocket = TcpSubSocket;
    type PubSocket = TcpPubSocket;
    type Poller = MioPoller;

    fn context(settings: &BridgeSettings) -> Result<TcpContext, TransportError> {
        Ok(TcpContext {
            bind_address: settings.bind_address.clone(),
            reconnect_interval: settings.reconnect_interval,
        })
    }

    fn poller(_settings: &BridgeSettings) -> Result<MioPoller, TransportError> {
        MioPoller::new().map_err(TransportError::Poller)
    }

    fn pub_socket(context: &TcpContext, topic: &str) -> Result<TcpPubSocket, TransportError> {
        validate_topic(topic)?;
        let port = port_for_topic(topic);
        let endpoint = format!("{}:{port}", context.bind_address);

        let listener = BlockingTcpListener::bind((context.bind_address.as_str(), port))
            .and_then(|listener| {
                listener.set_nonblocking(true)?;
                Ok(TcpListener::from_std(listener))
            })
            .map_err(|source| TransportError::Bind {
                endpoint: endpoint.clone(),
                source,
            })?;

        Ok(StreamPubSocket::new(
            topic,
            &endpoint,
            TcpPeerListener { listener },
        ))
    }

    fn sub_socket(
        context: &TcpContext,
        topic: &str,
        address: &str,
        conflate: bool,
    ) -> Result<TcpSubSocket, TransportError> {
        validate_topic(topic)?;
        let port = port_for_topic(topic);
        let addresses: Vec<SocketAddr> = (address, port)
            .to_socket_addrs()
            .map_err(|source| TransportError::InvalidAddress {
                address: address.to_string(),
                source,
            })?
            .collect();
        if addresses.is_empty() {
            return Err(TransportError::UnresolvedAddress(address.to_string()));
        }

        trace!(
            event = events::SUBSCRIBER_ADDRESS_RESOLVED,
            component = COMPONENT,
            topic,
            addresses = ?addresses,
            "resolved publisher address"
        );
        Ok(StreamSubSocket::new(
            topic,
            format!("{address}:{port}"),
            TcpConnector {
                addresses,
                next: Cell::new(0),
            },
            conflate,
            context.reconnect_interval,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{fnv1a64, port_for_topic, TcpSubSocket, TcpTransport, BASE_PORT};
    use crate::error::TransportError;
    use crate::settings::BridgeSettings;
    use crate::transport::{Message, Poller, PubSocket, SocketHandle, SubSocket, Transport};
    use std::time::{Duration, Instant};

    #[test]
    fn fnv1a64_matches_reference_vectors() {
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn topic_ports_are_stable_and_in_range() {
        for topic in ["carState", "controlsState", "gpsLocation", "x"] {
            let port = port_for_topic(topic);
            assert!(port >= BASE_PORT);
            assert!(port < u16::MAX);
            assert_eq!(port, port_for_topic(topic));
        }
        assert_ne!(port_for_topic("carState"), port_for_topic("carControl"));
    }

    #[test]
    fn unresolvable_address_is_reported() {
        let context = TcpTransport::context(&BridgeSettings::default()).expect("context");
        assert!(matches!(
            TcpTransport::sub_socket(&context, "carState", "not an address", false),
            Err(TransportError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn loopback_publisher_reaches_subscriber() {
        let settings = BridgeSettings {
            bind_address: "127.0.0.1".to_string(),
            reconnect_interval: Duration::ZERO,
            ..BridgeSettings::default()
        };
        let context = TcpTransport::context(&settings).expect("context");
        let topic = format!("tcpUnitTest{}", std::process::id());

        let mut publisher = TcpTransport::pub_socket(&context, &topic).expect("bind");
        let mut subscriber =
            TcpTransport::sub_socket(&context, &topic, "127.0.0.1", false).expect("subscribe");

        let message = Message::new(b"over tcp".to_vec());
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = None;
        while received.is_none() && Instant::now() < deadline {
            publisher.send(&message).expect("send");
            received = subscriber.receive();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(received, Some(message));
    }

    #[test]
    fn unreachable_publishers_do_not_stall_the_poll() {
        let settings = BridgeSettings {
            reconnect_interval: Duration::from_millis(10),
            ..BridgeSettings::default()
        };
        let context = TcpTransport::context(&settings).expect("context");

        let started = Instant::now();
        let mut sockets: Vec<TcpSubSocket> = (0..10)
            .map(|i| {
                TcpTransport::sub_socket(&context, &format!("silent{i}"), "10.255.255.1", false)
                    .expect("subscribe")
            })
            .collect();
        let mut poller = TcpTransport::poller(&settings).expect("poller");
        for (index, socket) in sockets.iter_mut().enumerate() {
            Poller::<TcpSubSocket>::register(&mut poller, SocketHandle::new(index), socket)
                .expect("register");
        }

        for _ in 0..5 {
            let ready = poller.poll(sockets.as_mut_slice(), Duration::from_millis(20));
            assert!(ready.is_empty());
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
