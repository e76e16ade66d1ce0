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

//! Publish/subscribe sockets over non-blocking `mio` byte streams.
//!
//! A publisher owns a listener and fans every frame out to all accepted peers;
//! output a peer cannot take right away waits in that peer's outbox until the
//! next send or [`PubSocket::flush_pending`]. A subscriber owns at most one
//! connection to its publisher, started without blocking and completed on
//! readiness, and reconnects on its own schedule. The concrete transports only
//! supply how to listen, accept and connect.

use crate::error::SendError;
use crate::observability::{events, fields};
use crate::transport::framing::{encode_header, FrameDecoder};
use crate::transport::poller::Attach;
use crate::transport::{Message, PubSocket, SubSocket};
use mio::event::Source;
use mio::{Interest, Registry, Token};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::mem;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

const PUBLISHER_COMPONENT: &str = "stream_publisher";
const SUBSCRIBER_COMPONENT: &str = "stream_subscriber";

/// Queued bytes per peer above which new frames are dropped for that peer.
pub(crate) const PEER_HIGH_WATER_MARK: usize = 32 * 1024 * 1024;
const READ_CHUNK_LEN: usize = 64 * 1024;
/// Bytes read per fill so one busy topic cannot monopolise a poll round.
const MAX_READ_PER_FILL: usize = 4 * 1024 * 1024;
/// How long a started connect may stay pending before it is abandoned.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

pub trait StreamListener {
    type Stream: Read + Write;

    /// Accepts one pending peer as a non-blocking stream, with a label for logs.
    fn accept_peer(&self) -> io::Result<(Self::Stream, String)>;
}

pub trait StreamConnector {
    type Stream: Read + Write + Source;

    /// Starts a non-blocking connect to the publisher.
    fn connect(&self) -> io::Result<Self::Stream>;

    /// `Ok(true)` once the connect has completed, `Ok(false)` while it is in flight.
    fn is_established(stream: &Self::Stream) -> io::Result<bool>;
}

/// Progress of a non-blocking connect from the socket error and the peer address lookup.
pub(crate) fn connect_progress(
    pending_error: io::Result<Option<io::Error>>,
    peer: io::Result<()>,
) -> io::Result<bool> {
    if let Some(err) = pending_error? {
        return Err(err);
    }
    match peer {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(false),
        Err(err) => Err(err),
    }
}

struct Peer<S> {
    stream: S,
    label: String,
    outbox: Vec<u8>,
    written: usize,
}

impl<S: Write> Peer<S> {
    fn new(stream: S, label: String) -> Self {
        Self {
            stream,
            label,
            outbox: Vec::new(),
            written: 0,
        }
    }

    fn queued(&self) -> usize {
        self.outbox.len() - self.written
    }

    fn enqueue(&mut self, header: &[u8], payload: &[u8]) {
        self.outbox.extend_from_slice(header);
        self.outbox.extend_from_slice(payload);
    }

    /// Writes as much of the outbox as the socket takes without blocking.
    fn flush(&mut self) -> io::Result<()> {
        while self.written < self.outbox.len() {
            match self.stream.write(&self.outbox[self.written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero)),
                Ok(n) => self.written += n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => return Err(err),
            }
        }

        if self.written == self.outbox.len() {
            self.outbox.clear();
            self.written = 0;
        } else if self.written > self.outbox.len() / 2 {
            self.outbox.drain(..self.written);
            self.written = 0;
        }
        Ok(())
    }
}

/// Logs why a peer is dropped after `result`; `true` keeps the peer.
fn keep_peer<S>(topic: &str, peer: &Peer<S>, result: io::Result<()>) -> bool {
    let err = match result {
        Ok(()) => return true,
        Err(err) => err,
    };

    if err.kind() == io::ErrorKind::BrokenPipe {
        warn!(
            event = events::PUBLISHER_PEER_BROKEN_PIPE,
            component = PUBLISHER_COMPONENT,
            topic,
            peer = peer.label.as_str(),
            "broken pipe on publisher; dropping subscriber"
        );
    } else if fields::is_peer_gone(&err) {
        debug!(
            event = events::PUBLISHER_PEER_DROPPED,
            component = PUBLISHER_COMPONENT,
            topic,
            peer = peer.label.as_str(),
            reason = fields::REASON_WRITE_ERROR,
            err = ?err,
            "subscriber went away"
        );
    } else {
        warn!(
            event = events::PUBLISHER_PEER_DROPPED,
            component = PUBLISHER_COMPONENT,
            topic,
            peer = peer.label.as_str(),
            reason = fields::REASON_WRITE_ERROR,
            err = ?err,
            "dropping subscriber after write error"
        );
    }
    false
}

/// Publishing socket fanning frames out to every connected subscriber.
pub struct StreamPubSocket<L: StreamListener> {
    topic: String,
    listener: L,
    peers: Vec<Peer<L::Stream>>,
}

impl<L: StreamListener> StreamPubSocket<L> {
    pub(crate) fn new(topic: &str, endpoint: &str, listener: L) -> Self {
        debug!(
            event = events::PUBLISHER_BOUND,
            component = PUBLISHER_COMPONENT,
            topic,
            endpoint,
            "publisher bound"
        );
        Self {
            topic: topic.to_string(),
            listener,
            peers: Vec::new(),
        }
    }

    /// Number of subscribers currently attached.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    fn accept_peers(&mut self) -> Result<(), SendError> {
        loop {
            match self.listener.accept_peer() {
                Ok((stream, label)) => {
                    debug!(
                        event = events::PUBLISHER_PEER_ACCEPTED,
                        component = PUBLISHER_COMPONENT,
                        topic = self.topic.as_str(),
                        peer = label.as_str(),
                        "subscriber attached"
                    );
                    self.peers.push(Peer::new(stream, label));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                    return Err(SendError::Interrupted)
                }
                Err(err) if err.kind() == io::ErrorKind::ConnectionAborted => continue,
                Err(err) => {
                    // Existing peers keep being served; accepting is retried on the next send.
                    warn!(
                        event = events::PUBLISHER_PEER_DROPPED,
                        component = PUBLISHER_COMPONENT,
                        topic = self.topic.as_str(),
                        err = ?err,
                        "unable to accept subscriber"
                    );
                    return Ok(());
                }
            }
        }
    }
}

impl<L: StreamListener> PubSocket<Message> for StreamPubSocket<L> {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&mut self, message: &Message) -> Result<(), SendError> {
        let header = encode_header(message.len())
            .map_err(|err| SendError::Failed(io::Error::new(io::ErrorKind::InvalidInput, err)))?;
        self.accept_peers()?;

        let topic = self.topic.as_str();
        let frame_len = header.len() + message.len();
        self.peers.retain_mut(|peer| {
            let result = peer.flush().and_then(|()| {
                if peer.queued() + frame_len > PEER_HIGH_WATER_MARK {
                    debug!(
                        event = events::PUBLISHER_PEER_HIGH_WATER_MARK,
                        component = PUBLISHER_COMPONENT,
                        topic,
                        peer = peer.label.as_str(),
                        queued = peer.queued(),
                        "subscriber is behind; dropping frame for it"
                    );
                    return Ok(());
                }
                peer.enqueue(&header, message.data());
                peer.flush()
            });
            keep_peer(topic, peer, result)
        });
        Ok(())
    }

    fn has_pending(&self) -> bool {
        self.peers.iter().any(|peer| peer.queued() > 0)
    }

    fn flush_pending(&mut self) -> Result<(), SendError> {
        let topic = self.topic.as_str();
        self.peers.retain_mut(|peer| {
            let result = peer.flush();
            keep_peer(topic, peer, result)
        });
        Ok(())
    }
}

/// Connection state of a subscriber.
enum Link<S> {
    Idle { last_attempt: Option<Instant> },
    Connecting { stream: S, started: Instant },
    Connected(S),
}

fn register<S: Source>(
    registration: &Option<(Registry, Token)>,
    stream: &mut S,
    interest: Interest,
) -> io::Result<()> {
    match registration {
        Some((registry, token)) => registry.register(stream, *token, interest),
        None => Ok(()),
    }
}

fn reregister<S: Source>(
    registration: &Option<(Registry, Token)>,
    stream: &mut S,
    interest: Interest,
) -> io::Result<()> {
    match registration {
        Some((registry, token)) => registry.reregister(stream, *token, interest),
        None => Ok(()),
    }
}

/// Subscribing socket with a single, lazily (re)established connection.
pub struct StreamSubSocket<C: StreamConnector> {
    topic: String,
    endpoint: String,
    connector: C,
    conflate: bool,
    reconnect_interval: Duration,
    link: Link<C::Stream>,
    registration: Option<(Registry, Token)>,
    decoder: FrameDecoder,
    ready: VecDeque<Vec<u8>>,
    read_buf: Vec<u8>,
    /// The last fill stopped at its read cap with input possibly left.
    read_more: bool,
}

impl<C: StreamConnector> StreamSubSocket<C> {
    pub(crate) fn new(
        topic: &str,
        endpoint: String,
        connector: C,
        conflate: bool,
        reconnect_interval: Duration,
    ) -> Self {
        let mut socket = Self {
            topic: topic.to_string(),
            endpoint,
            connector,
            conflate,
            reconnect_interval,
            link: Link::Idle { last_attempt: None },
            registration: None,
            decoder: FrameDecoder::default(),
            ready: VecDeque::new(),
            read_buf: vec![0; READ_CHUNK_LEN],
            read_more: false,
        };
        socket.ensure_connected();
        socket
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.link, Link::Connected(_))
    }

    pub fn is_conflating(&self) -> bool {
        self.conflate
    }

    /// Advances the connection without blocking; `true` once it is usable.
    fn ensure_connected(&mut self) -> bool {
        loop {
            match mem::replace(&mut self.link, Link::Idle { last_attempt: None }) {
                Link::Connected(stream) => {
                    self.link = Link::Connected(stream);
                    return true;
                }
                Link::Connecting { mut stream, started } => {
                    let progress = C::is_established(&stream).and_then(|established| {
                        if established {
                            reregister(&self.registration, &mut stream, Interest::READABLE)?;
                        }
                        Ok(established)
                    });
                    match progress {
                        Ok(true) => {
                            debug!(
                                event = events::SUBSCRIBER_CONNECTED,
                                component = SUBSCRIBER_COMPONENT,
                                topic = self.topic.as_str(),
                                endpoint = self.endpoint.as_str(),
                                "subscriber connected"
                            );
                            self.link = Link::Connected(stream);
                            return true;
                        }
                        Ok(false) if started.elapsed() < CONNECT_TIMEOUT => {
                            self.link = Link::Connecting { stream, started };
                            return false;
                        }
                        Ok(false) => {
                            self.connect_failed(Some(stream), io::ErrorKind::TimedOut.into());
                            return false;
                        }
                        Err(err) => {
                            self.connect_failed(Some(stream), err);
                            return false;
                        }
                    }
                }
                Link::Idle { last_attempt } => {
                    if last_attempt.is_some_and(|at| at.elapsed() < self.reconnect_interval) {
                        self.link = Link::Idle { last_attempt };
                        return false;
                    }
                    let started = self.connector.connect().and_then(|mut stream| {
                        let interest = Interest::READABLE | Interest::WRITABLE;
                        register(&self.registration, &mut stream, interest)?;
                        Ok(stream)
                    });
                    match started {
                        Ok(stream) => {
                            self.link = Link::Connecting {
                                stream,
                                started: Instant::now(),
                            };
                        }
                        Err(err) => {
                            self.connect_failed(None, err);
                            return false;
                        }
                    }
                }
            }
        }
    }

    fn connect_failed(&mut self, stream: Option<C::Stream>, err: io::Error) {
        trace!(
            event = events::SUBSCRIBER_CONNECT_FAILED,
            component = SUBSCRIBER_COMPONENT,
            topic = self.topic.as_str(),
            endpoint = self.endpoint.as_str(),
            err = ?err,
            "publisher not reachable yet"
        );
        if let Some(stream) = stream {
            self.release(stream);
        }
        self.link = Link::Idle {
            last_attempt: Some(Instant::now()),
        };
    }

    fn release(&self, mut stream: C::Stream) {
        if let Some((registry, _)) = &self.registration {
            let _ = registry.deregister(&mut stream);
        }
    }

    fn disconnect(&mut self, reason: &'static str) {
        debug!(
            event = events::SUBSCRIBER_DISCONNECTED,
            component = SUBSCRIBER_COMPONENT,
            topic = self.topic.as_str(),
            endpoint = self.endpoint.as_str(),
            reason,
            "subscriber disconnected"
        );
        let idle = Link::Idle {
            last_attempt: Some(Instant::now()),
        };
        if let Link::Connected(stream) | Link::Connecting { stream, .. } =
            mem::replace(&mut self.link, idle)
        {
            self.release(stream);
        }
        self.decoder.clear();
        self.read_more = false;
    }

    /// Reads whatever is available without blocking and queues complete frames.
    fn fill(&mut self) {
        self.read_more = false;
        if !self.ensure_connected() {
            return;
        }
        let Link::Connected(stream) = &mut self.link else {
            return;
        };

        let mut total = 0;
        let mut capped = false;
        let mut failure = None;
        loop {
            match stream.read(&mut self.read_buf) {
                Ok(0) => {
                    failure = Some(fields::REASON_EOF);
                    break;
                }
                Ok(n) => {
                    self.decoder.extend(&self.read_buf[..n]);
                    total += n;
                    if total >= MAX_READ_PER_FILL {
                        capped = true;
                        break;
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    trace!(
                        event = events::SUBSCRIBER_DISCONNECTED,
                        component = SUBSCRIBER_COMPONENT,
                        topic = self.topic.as_str(),
                        err = ?err,
                        "read failed"
                    );
                    failure = Some(fields::REASON_READ_ERROR);
                    break;
                }
            }
        }
        self.read_more = capped;

        // Complete frames received before a disconnect are still delivered.
        loop {
            match self.decoder.next_frame() {
                Ok(Some(frame)) => self.ready.push_back(frame),
                Ok(None) => break,
                Err(err) => {
                    warn!(
                        event = events::SUBSCRIBER_FRAME_REJECTED,
                        component = SUBSCRIBER_COMPONENT,
                        topic = self.topic.as_str(),
                        endpoint = self.endpoint.as_str(),
                        err = %err,
                        "invalid frame from publisher"
                    );
                    failure = failure.or(Some(fields::REASON_OVERSIZED_FRAME));
                    break;
                }
            }
        }

        if let Some(reason) = failure {
            self.disconnect(reason);
        }
    }
}

impl<C: StreamConnector> Attach for StreamSubSocket<C> {
    fn attach(&mut self, registry: Registry, token: Token) -> io::Result<()> {
        let registration = Some((registry, token));
        match &mut self.link {
            Link::Idle { .. } => {}
            Link::Connecting { stream, .. } => register(
                &registration,
                stream,
                Interest::READABLE | Interest::WRITABLE,
            )?,
            Link::Connected(stream) => register(&registration, stream, Interest::READABLE)?,
        }
        self.registration = registration;
        Ok(())
    }

    fn service_deadline(&self) -> Option<Instant> {
        if !self.ready.is_empty() || self.read_more {
            return Some(Instant::now());
        }
        match &self.link {
            Link::Idle { last_attempt } => Some(
                last_attempt.map_or_else(Instant::now, |at| at + self.reconnect_interval),
            ),
            Link::Connecting { started, .. } => Some(*started + CONNECT_TIMEOUT),
            Link::Connected(_) => None,
        }
    }
}

impl<C: StreamConnector> SubSocket for StreamSubSocket<C> {
    type Message = Message;

    fn topic(&self) -> &str {
        &self.topic
    }

    fn poll_ready(&mut self) -> bool {
        if self.ready.is_empty() {
            self.fill();
        }
        !self.ready.is_empty()
    }

    fn receive(&mut self) -> Option<Message> {
        if self.ready.is_empty() || self.conflate {
            self.fill();
        }
        if self.conflate {
            let newest = self.ready.pop_back();
            self.ready.clear();
            newest.map(Message::new)
        } else {
            self.ready.pop_front().map(Message::new)
        }
    }
}
