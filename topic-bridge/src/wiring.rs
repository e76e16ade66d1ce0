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

//! Per-topic socket pairs.
//!
//! Pairs live in index-aligned arenas: the subscribing socket, the publishing
//! socket and the topic name of one pair share a [`SocketHandle`].

use crate::error::{BridgeError, TransportError};
use crate::observability::events;
use crate::transport::{Poller, SocketHandle, Transport};
use tracing::{debug, error};

const COMPONENT: &str = "wiring";

/// Socket pairs indexed by [`SocketHandle`].
pub struct SocketTable<S, P> {
    topics: Vec<String>,
    subscribers: Vec<S>,
    publishers: Vec<P>,
}

impl<S, P> Default for SocketTable<S, P> {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            subscribers: Vec::new(),
            publishers: Vec::new(),
        }
    }
}

impl<S, P> SocketTable<S, P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair and returns its handle.
    pub fn insert(&mut self, topic: &str, subscriber: S, publisher: P) -> SocketHandle {
        let handle = SocketHandle::new(self.topics.len());
        self.topics.push(topic.to_string());
        self.subscribers.push(subscriber);
        self.publishers.push(publisher);
        handle
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn topic(&self, handle: SocketHandle) -> Option<&str> {
        self.topics.get(handle.index()).map(String::as_str)
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn subscribers_mut(&mut self) -> &mut [S] {
        &mut self.subscribers
    }

    pub fn publishers(&self) -> &[P] {
        &self.publishers
    }

    /// Every publisher with the topic it serves.
    pub fn publishers_mut(&mut self) -> impl Iterator<Item = (&str, &mut P)> {
        self.topics
            .iter()
            .map(String::as_str)
            .zip(self.publishers.iter_mut())
    }

    /// Both ends of one pair, borrowed together.
    pub fn pair_mut(&mut self, handle: SocketHandle) -> Option<(&str, &mut S, &mut P)> {
        let index = handle.index();
        Some((
            self.topics.get(index)?.as_str(),
            self.subscribers.get_mut(index)?,
            self.publishers.get_mut(index)?,
        ))
    }
}

/// Creates the socket pair of every topic and registers each subscriber with `poller`.
///
/// Topics are wired in order; the publisher of a topic is created before its
/// subscriber, and the subscriber is registered before the pair is stored. The
/// first failure aborts wiring and drops the pairs built so far.
pub fn wire_topics<Src, Dst>(
    topics: &[String],
    sub_context: &Src::Context,
    pub_context: &Dst::Context,
    address: &str,
    poller: &mut Src::Poller,
) -> Result<SocketTable<Src::SubSocket, Dst::PubSocket>, BridgeError>
where
    Src: Transport,
    Dst: Transport<Message = Src::Message>,
{
    let mut table = SocketTable::new();

    for topic in topics {
        let handle = SocketHandle::new(table.len());
        let wired = Dst::pub_socket(pub_context, topic).and_then(|publisher| {
            let mut subscriber = Src::sub_socket(sub_context, topic, address, false)?;
            poller
                .register(handle, &mut subscriber)
                .map_err(TransportError::Register)?;
            Ok((subscriber, publisher))
        });

        let (subscriber, publisher) = match wired {
            Ok(pair) => pair,
            Err(source) => {
                error!(
                    event = events::TOPIC_WIRING_FAILED,
                    component = COMPONENT,
                    topic = topic.as_str(),
                    err = %source,
                    "unable to wire topic"
                );
                return Err(BridgeError::Wiring {
                    topic: topic.clone(),
                    source,
                });
            }
        };

        table.insert(topic, subscriber, publisher);
        debug!(
            event = events::TOPIC_WIRED,
            component = COMPONENT,
            topic = topic.as_str(),
            handle = handle.index(),
            sub_transport = Src::NAME,
            pub_transport = Dst::NAME,
            address,
            "topic wired"
        );
    }

    Ok(table)
}
