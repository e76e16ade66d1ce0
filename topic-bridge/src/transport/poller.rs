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

//! Readiness waiting on top of `mio`.
//!
//! Each subscribing socket receives a clone of the poller's [`Registry`] and the
//! [`Token`] of its handle, and (re)registers its connection itself whenever it
//! reconnects. A poll returns when a registered connection becomes readable, when
//! a pending connect completes, or when a socket asks to be serviced at a deadline
//! (next reconnect attempt, input left over from a capped read).

use crate::observability::events;
use crate::transport::{Poller, SocketHandle, SubSocket};
use mio::{Events, Poll, Registry, Token};
use std::io;
use std::time::{Duration, Instant};
use tracing::warn;

const COMPONENT: &str = "mio_poller";

/// Maximum events processed per wait.
const MAX_EVENTS: usize = 128;

/// Subscribing socket whose connections are driven by a [`MioPoller`].
pub trait Attach {
    /// Keeps `registry` for later (re)connects and registers the current connection under `token`.
    fn attach(&mut self, registry: Registry, token: Token) -> io::Result<()>;

    /// Instant at which the socket needs servicing even if no event arrives.
    fn service_deadline(&self) -> Option<Instant>;
}

/// Poller over one `mio::Poll` instance; tokens are socket handle indices.
pub struct MioPoller {
    poll: Poll,
    events: Events,
    registered: Vec<SocketHandle>,
}

impl MioPoller {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(MAX_EVENTS),
            registered: Vec::new(),
        })
    }

    pub fn registered(&self) -> &[SocketHandle] {
        &self.registered
    }

    fn due<S: Attach>(&self, sockets: &[S], now: Instant) -> Vec<SocketHandle> {
        self.registered
            .iter()
            .copied()
            .filter(|handle| {
                sockets
                    .get(handle.index())
                    .and_then(Attach::service_deadline)
                    .is_some_and(|at| at <= now)
            })
            .collect()
    }

    fn next_deadline<S: Attach>(&self, sockets: &[S]) -> Option<Instant> {
        self.registered
            .iter()
            .filter_map(|handle| sockets.get(handle.index()))
            .filter_map(Attach::service_deadline)
            .min()
    }
}

impl<S: SubSocket + Attach> Poller<S> for MioPoller {
    fn register(&mut self, handle: SocketHandle, socket: &mut S) -> io::Result<()> {
        if self.registered.contains(&handle) {
            return Ok(());
        }
        socket.attach(self.poll.registry().try_clone()?, Token(handle.index()))?;
        self.registered.push(handle);
        Ok(())
    }

    fn poll(&mut self, sockets: &mut [S], timeout: Duration) -> Vec<SocketHandle> {
        let deadline = Instant::now() + timeout;
        let mut candidates = self.due(sockets, Instant::now());

        loop {
            let ready: Vec<SocketHandle> = candidates
                .into_iter()
                .filter(|handle| {
                    sockets
                        .get_mut(handle.index())
                        .is_some_and(|socket| socket.poll_ready())
                })
                .collect();
            let now = Instant::now();
            if !ready.is_empty() || now >= deadline {
                return ready;
            }

            let wake = self
                .next_deadline(sockets)
                .map_or(deadline, |at| at.min(deadline));
            let wait = wake.saturating_duration_since(now);
            if let Err(err) = self.poll.poll(&mut self.events, Some(wait)) {
                if err.kind() != io::ErrorKind::Interrupted {
                    warn!(
                        event = events::POLLER_WAIT_FAILED,
                        component = COMPONENT,
                        err = ?err,
                        "waiting for readiness failed"
                    );
                    return Vec::new();
                }
            }

            candidates = self
                .events
                .iter()
                .map(|event| SocketHandle::new(event.token().0))
                .filter(|handle| self.registered.contains(handle))
                .collect();
            candidates.extend(self.due(sockets, Instant::now()));
            candidates.sort();
            candidates.dedup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MioPoller;
    use crate::settings::BridgeSettings;
    use crate::transport::ipc::{IpcSubSocket, IpcTransport};
    use crate::transport::{Message, Poller, PubSocket, SocketHandle, Transport};
    use std::time::{Duration, Instant};

    fn settings(dir: &std::path::Path) -> BridgeSettings {
        BridgeSettings {
            socket_dir: dir.to_path_buf(),
            reconnect_interval: Duration::from_millis(10),
            ..BridgeSettings::default()
        }
    }

    #[test]
    fn readable_subscriber_wakes_the_poll() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = IpcTransport::context(&settings(dir.path())).expect("context");
        let mut publisher = IpcTransport::pub_socket(&context, "carState").expect("bind");
        let mut sockets =
            vec![IpcTransport::sub_socket(&context, "carState", "", false).expect("subscribe")];

        let mut poller = MioPoller::new().expect("poller");
        Poller::<IpcSubSocket>::register(&mut poller, SocketHandle::new(0), &mut sockets[0])
            .expect("register");
        Poller::<IpcSubSocket>::register(&mut poller, SocketHandle::new(0), &mut sockets[0])
            .expect("registering twice is a no-op");
        assert_eq!(poller.registered(), &[SocketHandle::new(0)]);

        publisher
            .send(&Message::new(b"wake".to_vec()))
            .expect("send");
        let ready = poller.poll(sockets.as_mut_slice(), Duration::from_secs(5));
        assert_eq!(ready, vec![SocketHandle::new(0)]);
    }

    #[test]
    fn idle_poll_times_out_with_empty_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = IpcTransport::context(&settings(dir.path())).expect("context");
        let _publisher = IpcTransport::pub_socket(&context, "quiet").expect("bind");
        let mut sockets =
            vec![IpcTransport::sub_socket(&context, "quiet", "", false).expect("subscribe")];

        let mut poller = MioPoller::new().expect("poller");
        Poller::<IpcSubSocket>::register(&mut poller, SocketHandle::new(0), &mut sockets[0])
            .expect("register");

        let started = Instant::now();
        let ready = poller.poll(sockets.as_mut_slice(), Duration::from_millis(30));
        assert!(ready.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn subscriber_attaches_once_its_publisher_appears() {
        let dir = tempfile::tempdir().expect("tempdir");
        let context = IpcTransport::context(&settings(dir.path())).expect("context");
        let mut sockets =
            vec![IpcTransport::sub_socket(&context, "late", "", false).expect("subscribe")];
        assert!(!sockets[0].is_connected());

        let mut poller = MioPoller::new().expect("poller");
        Poller::<IpcSubSocket>::register(&mut poller, SocketHandle::new(0), &mut sockets[0])
            .expect("register");
        let mut publisher = IpcTransport::pub_socket(&context, "late").expect("bind");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut ready = Vec::new();
        while ready.is_empty() && Instant::now() < deadline {
            publisher
                .send(&Message::new(b"hello".to_vec()))
                .expect("send");
            ready = poller.poll(sockets.as_mut_slice(), Duration::from_millis(20));
        }
        assert_eq!(ready, vec![SocketHandle::new(0)]);
        assert!(sockets[0].is_connected());
    }
}
