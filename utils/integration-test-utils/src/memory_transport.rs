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

//! In-process transport for driving the relay from tests.
//!
//! All sockets created from one [`MemoryContext`] (and its clones) share a bus.
//! Tests inject payloads per topic, inspect what was published, and can script
//! send failures per topic. [`MemoryPoller`] wakes on injections instead of
//! sleeping out its timeout.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use topic_bridge::transport::{Poller, PubSocket, SocketHandle, SubSocket, Transport};
use topic_bridge::{BridgeSettings, SendError, TransportError};

type SendHook = Box<dyn FnMut(&[u8]) -> Option<SendError> + Send>;

/// Arguments one subscribing socket was created with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub topic: String,
    pub address: String,
    pub conflate: bool,
}

/// Socket creation step, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WiringStep {
    Publisher(String),
    Subscriber(String),
}

#[derive(Default)]
struct BusState {
    inbound: HashMap<String, VecDeque<Vec<u8>>>,
    published: HashMap<String, Vec<Vec<u8>>>,
    send_hooks: HashMap<String, SendHook>,
    rejected: HashSet<String>,
    subscriptions: Vec<SubscriptionRecord>,
    wiring: Vec<WiringStep>,
}

#[derive(Default)]
struct MemoryBus {
    state: Mutex<BusState>,
    injected: Condvar,
    delivered: AtomicUsize,
    released: Arc<AtomicUsize>,
}

#[derive(Clone, Default)]
pub struct MemoryContext {
    bus: Arc<MemoryBus>,
}

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.bus.state.lock().unwrap()
    }

    /// Queues `payload` for the subscriber of `topic`.
    pub fn inject(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        self.state()
            .inbound
            .entry(topic.to_string())
            .or_default()
            .push_back(payload.into());
        self.bus.injected.notify_all();
    }

    pub fn pending(&self, topic: &str) -> usize {
        self.state().inbound.get(topic).map_or(0, VecDeque::len)
    }

    /// Payloads successfully sent on the publisher of `topic`, oldest first.
    pub fn published(&self, topic: &str) -> Vec<Vec<u8>> {
        self.state().published.get(topic).cloned().unwrap_or_default()
    }

    pub fn published_count(&self) -> usize {
        self.state().published.values().map(Vec::len).sum()
    }

    /// Runs `hook` before every send on `topic`; returning an error fails that send.
    pub fn set_send_hook(
        &self,
        topic: &str,
        hook: impl FnMut(&[u8]) -> Option<SendError> + Send + 'static,
    ) {
        self.state()
            .send_hooks
            .insert(topic.to_string(), Box::new(hook));
    }

    /// Makes socket creation for `topic` fail.
    pub fn reject_topic(&self, topic: &str) {
        self.state().rejected.insert(topic.to_string());
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.state().subscriptions.clone()
    }

    pub fn wiring_steps(&self) -> Vec<WiringStep> {
        self.state().wiring.clone()
    }

    /// Messages handed out by subscribers so far.
    pub fn delivered(&self) -> usize {
        self.bus.delivered.load(Ordering::SeqCst)
    }

    /// Messages handed out by subscribers and dropped since.
    pub fn released(&self) -> usize {
        self.bus.released.load(Ordering::SeqCst)
    }

    fn check_topic(&self, topic: &str) -> Result<(), TransportError> {
        if self.state().rejected.contains(topic) {
            return Err(TransportError::Rejected {
                topic: topic.to_string(),
                reason: "rejected by test".to_string(),
            });
        }
        Ok(())
    }
}

/// Message that counts its own release on the bus it came from.
#[derive(Debug)]
pub struct TrackedMessage {
    payload: Vec<u8>,
    released: Arc<AtomicUsize>,
}

impl TrackedMessage {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl Drop for TrackedMessage {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MemorySubSocket {
    topic: String,
    context: MemoryContext,
}

impl SubSocket for MemorySubSocket {
    type Message = TrackedMessage;

    fn topic(&self) -> &str {
        &self.topic
    }

    fn poll_ready(&mut self) -> bool {
        self.context.pending(&self.topic) > 0
    }

    fn receive(&mut self) -> Option<TrackedMessage> {
        let payload = self.context.state().inbound.get_mut(&self.topic)?.pop_front()?;
        self.context.bus.delivered.fetch_add(1, Ordering::SeqCst);
        Some(TrackedMessage {
            payload,
            released: self.context.bus.released.clone(),
        })
    }
}

pub struct MemoryPubSocket {
    topic: String,
    context: MemoryContext,
}

impl PubSocket<TrackedMessage> for MemoryPubSocket {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn send(&mut self, message: &TrackedMessage) -> Result<(), SendError> {
        let mut state = self.context.state();
        if let Some(hook) = state.send_hooks.get_mut(&self.topic) {
            if let Some(err) = hook(message.payload()) {
                return Err(err);
            }
        }
        state
            .published
            .entry(self.topic.clone())
            .or_default()
            .push(message.payload().to_vec());
        Ok(())
    }
}

/// Waits on the bus of the registered sockets until one of their topics has input.
#[derive(Default)]
pub struct MemoryPoller {
    registered: Vec<SocketHandle>,
    bus: Option<Arc<MemoryBus>>,
}

impl MemoryPoller {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Poller<MemorySubSocket> for MemoryPoller {
    fn register(&mut self, handle: SocketHandle, socket: &mut MemorySubSocket) -> io::Result<()> {
        self.bus = Some(socket.context.bus.clone());
        if !self.registered.contains(&handle) {
            self.registered.push(handle);
        }
        Ok(())
    }

    fn poll(&mut self, sockets: &mut [MemorySubSocket], timeout: Duration) -> Vec<SocketHandle> {
        let Some(bus) = &self.bus else {
            thread::sleep(timeout);
            return Vec::new();
        };

        let deadline = Instant::now() + timeout;
        let mut state = bus.state.lock().unwrap();
        loop {
            let ready: Vec<SocketHandle> = self
                .registered
                .iter()
                .copied()
                .filter(|handle| {
                    sockets.get(handle.index()).is_some_and(|socket| {
                        state
                            .inbound
                            .get(&socket.topic)
                            .is_some_and(|queue| !queue.is_empty())
                    })
                })
                .collect();
            let now = Instant::now();
            if !ready.is_empty() || now >= deadline {
                return ready;
            }
            state = bus.injected.wait_timeout(state, deadline - now).unwrap().0;
        }
    }
}

pub struct MemoryTransport;

impl Transport for MemoryTransport {
    const NAME: &'static str = "memory";

    type Context = MemoryContext;
    type Message = TrackedMessage;
    type SubSocket = MemorySubSocket;
    type PubSocket = MemoryPubSocket;
    type Poller = MemoryPoller;

    fn context(_settings: &BridgeSettings) -> Result<MemoryContext, TransportError> {
        Ok(MemoryContext::new())
    }

    fn poller(_settings: &BridgeSettings) -> Result<MemoryPoller, TransportError> {
        Ok(MemoryPoller::new())
    }

    fn pub_socket(context: &MemoryContext, topic: &str) -> Result<MemoryPubSocket, TransportError> {
        context.check_topic(topic)?;
        context
            .state()
            .wiring
            .push(WiringStep::Publisher(topic.to_string()));
        Ok(MemoryPubSocket {
            topic: topic.to_string(),
            context: context.clone(),
        })
    }

    fn sub_socket(
        context: &MemoryContext,
        topic: &str,
        address: &str,
        conflate: bool,
    ) -> Result<MemorySubSocket, TransportError> {
        context.check_topic(topic)?;
        let mut state = context.state();
        state.wiring.push(WiringStep::Subscriber(topic.to_string()));
        state.subscriptions.push(SubscriptionRecord {
            topic: topic.to_string(),
            address: address.to_string(),
            conflate,
        });
        drop(state);
        Ok(MemorySubSocket {
            topic: topic.to_string(),
            context: context.clone(),
        })
    }
}
