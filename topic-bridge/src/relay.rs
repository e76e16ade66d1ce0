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

//! Relay loop forwarding every ready subscriber's messages to its publisher.
//!
//! Each pass polls the subscribers, drains the ready ones, then writes output the
//! publishers still hold from earlier sends. While any publisher holds output the
//! poll waits at most the flush interval, so a frame larger than the socket buffer
//! still leaves in full when its topic goes quiet.

use crate::error::BridgeError;
use crate::observability::{events, fields};
use crate::settings::BridgeSettings;
use crate::shutdown::ShutdownFlag;
use crate::transport::{Poller, PubSocket, SocketHandle, SubSocket};
use crate::wiring::SocketTable;
use std::time::Duration;
use tracing::{debug, error, info, trace};

const COMPONENT: &str = "relay";

/// Counters accumulated over one relay run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RelayStats {
    /// Poll rounds, including rounds that timed out.
    pub polls: u64,
    pub received: u64,
    pub forwarded: u64,
    /// Sends repeated after a transient failure.
    pub send_retries: u64,
    /// Messages given up on because shutdown was in progress.
    pub abandoned: u64,
}

/// Owns every socket pair and the poller for the lifetime of the relay.
pub struct Relay<S, P, L> {
    table: SocketTable<S, P>,
    poller: L,
    poll_timeout: Duration,
    flush_interval: Duration,
    shutdown: ShutdownFlag,
    stats: RelayStats,
}

impl<S, P, L> Relay<S, P, L>
where
    S: SubSocket,
    P: PubSocket<S::Message>,
    L: Poller<S>,
{
    pub fn new(
        table: SocketTable<S, P>,
        poller: L,
        settings: &BridgeSettings,
        shutdown: ShutdownFlag,
    ) -> Self {
        Self {
            table,
            poller,
            poll_timeout: settings.poll_timeout,
            flush_interval: settings.flush_interval.min(settings.poll_timeout),
            shutdown,
            stats: RelayStats::default(),
        }
    }

    /// Relays until shutdown is requested or a send fails fatally.
    ///
    /// Sockets are closed when the relay is dropped, on either outcome.
    pub fn run(mut self) -> Result<RelayStats, BridgeError> {
        let worker_thread = fields::current_thread_name_or_default();
        info!(
            event = events::RELAY_START,
            component = COMPONENT,
            worker_thread = worker_thread.as_str(),
            topics = self.table.len(),
            poll_timeout_ms = self.poll_timeout.as_millis() as u64,
            flush_interval_ms = self.flush_interval.as_millis() as u64,
            "relay started"
        );

        while !self.shutdown.is_requested() {
            let timeout = if self.has_pending_output() {
                self.flush_interval
            } else {
                self.poll_timeout
            };
            let ready = self.poller.poll(self.table.subscribers_mut(), timeout);
            self.stats.polls += 1;

            for handle in ready {
                if self.shutdown.is_requested() {
                    break;
                }
                self.drain(handle)?;
            }
            self.flush_publishers()?;
        }

        info!(
            event = events::RELAY_STOP,
            component = COMPONENT,
            worker_thread = worker_thread.as_str(),
            reason = fields::REASON_SHUTDOWN,
            polls = self.stats.polls,
            received = self.stats.received,
            forwarded = self.stats.forwarded,
            send_retries = self.stats.send_retries,
            abandoned = self.stats.abandoned,
            "relay stopped"
        );
        Ok(self.stats)
    }

    fn drain(&mut self, handle: SocketHandle) -> Result<(), BridgeError> {
        while !self.shutdown.is_requested() {
            let Some((_, subscriber, _)) = self.table.pair_mut(handle) else {
                break;
            };
            let Some(message) = subscriber.receive() else {
                break;
            };
            self.stats.received += 1;
            self.forward(handle, message)?;
        }
        Ok(())
    }

    fn has_pending_output(&self) -> bool {
        self.table
            .publishers()
            .iter()
            .any(|publisher| publisher.has_pending())
    }

    /// Writes output the publishers queued during earlier sends.
    fn flush_publishers(&mut self) -> Result<(), BridgeError> {
        for (topic, publisher) in self.table.publishers_mut() {
            if !publisher.has_pending() {
                continue;
            }
            match publisher.flush_pending() {
                Ok(()) => {}
                Err(err) if err.is_transient() || self.shutdown.is_requested() => {}
                Err(err) => {
                    error!(
                        event = events::RELAY_FLUSH_FAILED,
                        component = COMPONENT,
                        topic,
                        err = %err,
                        "fatal failure writing queued output"
                    );
                    return Err(BridgeError::Send {
                        topic: topic.to_string(),
                        source: err,
                    });
                }
            }
        }
        Ok(())
    }

    /// Sends `message` on the publisher paired with `handle`, consuming it.
    fn forward(&mut self, handle: SocketHandle, message: S::Message) -> Result<(), BridgeError> {
        let Some((topic, _, publisher)) = self.table.pair_mut(handle) else {
            return Ok(());
        };

        loop {
            let err = match publisher.send(&message) {
                Ok(()) => {
                    self.stats.forwarded += 1;
                    return Ok(());
                }
                Err(err) => err,
            };

            if self.shutdown.is_requested() {
                self.stats.abandoned += 1;
                debug!(
                    event = events::RELAY_SEND_SUPPRESSED,
                    component = COMPONENT,
                    topic,
                    err = %err,
                    "send failed during shutdown; message dropped"
                );
                return Ok(());
            }

            if err.is_transient() {
                self.stats.send_retries += 1;
                trace!(
                    event = events::RELAY_SEND_RETRY,
                    component = COMPONENT,
                    topic,
                    "send interrupted; retrying"
                );
                continue;
            }

            error!(
                event = events::RELAY_SEND_FAILED,
                component = COMPONENT,
                topic,
                err = %err,
                "fatal send failure"
            );
            return Err(BridgeError::Send {
                topic: topic.to_string(),
                source: err,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Relay, RelayStats};
    use crate::error::{BridgeError, SendError};
    use crate::settings::BridgeSettings;
    use crate::shutdown::ShutdownFlag;
    use crate::transport::{Poller, PubSocket, SocketHandle, SubSocket};
    use crate::wiring::SocketTable;
    use std::collections::VecDeque;
    use std::io;
    use std::thread;
    use std::time::Duration;

    /// Reports the registered sockets holding messages, or sleeps out the timeout.
    #[derive(Default)]
    struct QueuePoller {
        registered: Vec<SocketHandle>,
    }

    impl Poller<QueueSub> for QueuePoller {
        fn register(&mut self, handle: SocketHandle, _: &mut QueueSub) -> io::Result<()> {
            self.registered.push(handle);
            Ok(())
        }

        fn poll(&mut self, sockets: &mut [QueueSub], timeout: Duration) -> Vec<SocketHandle> {
            let ready: Vec<SocketHandle> = self
                .registered
                .iter()
                .copied()
                .filter(|handle| sockets[handle.index()].poll_ready())
                .collect();
            if ready.is_empty() {
                thread::sleep(timeout);
            }
            ready
        }
    }

    struct QueueSub {
        topic: &'static str,
        queue: VecDeque<u32>,
    }

    impl SubSocket for QueueSub {
        type Message = u32;

        fn topic(&self) -> &str {
            self.topic
        }

        fn poll_ready(&mut self) -> bool {
            !self.queue.is_empty()
        }

        fn receive(&mut self) -> Option<u32> {
            self.queue.pop_front()
        }
    }

    /// Publisher replaying scripted failures before recording messages.
    struct ScriptedPub {
        topic: &'static str,
        failures: VecDeque<SendError>,
        sent: Vec<u32>,
        shutdown_on_send: Option<ShutdownFlag>,
        /// Messages accepted by `send` but written one per flush.
        queued: VecDeque<u32>,
        queue_sends: bool,
        flushes: usize,
        stop_when_drained: Option<ShutdownFlag>,
    }

    impl ScriptedPub {
        fn new(topic: &'static str) -> Self {
            Self {
                topic,
                failures: VecDeque::new(),
                sent: Vec::new(),
                shutdown_on_send: None,
                queued: VecDeque::new(),
                queue_sends: false,
                flushes: 0,
                stop_when_drained: None,
            }
        }
    }

    impl PubSocket<u32> for ScriptedPub {
        fn topic(&self) -> &str {
            self.topic
        }

        fn send(&mut self, message: &u32) -> Result<(), SendError> {
            if let Some(flag) = &self.shutdown_on_send {
                flag.request();
            }
            match self.failures.pop_front() {
                Some(err) => Err(err),
                None if self.queue_sends => {
                    self.queued.push_back(*message);
                    Ok(())
                }
                None => {
                    self.sent.push(*message);
                    Ok(())
                }
            }
        }

        fn has_pending(&self) -> bool {
            !self.queued.is_empty()
        }

        fn flush_pending(&mut self) -> Result<(), SendError> {
            self.flushes += 1;
            self.sent.extend(self.queued.pop_front());
            if self.queued.is_empty() {
                if let Some(flag) = &self.stop_when_drained {
                    flag.request();
                }
            }
            Ok(())
        }
    }

    fn relay(
        pairs: Vec<(QueueSub, ScriptedPub)>,
        shutdown: &ShutdownFlag,
    ) -> Relay<QueueSub, ScriptedPub, QueuePoller> {
        let mut table = SocketTable::new();
        let mut poller = QueuePoller::default();
        for (mut subscriber, publisher) in pairs {
            let handle = SocketHandle::new(table.len());
            poller
                .register(handle, &mut subscriber)
                .expect("queue poller accepts every socket");
            table.insert(subscriber.topic, subscriber, publisher);
        }
        let settings = BridgeSettings {
            poll_timeout: Duration::from_millis(10),
            flush_interval: Duration::from_millis(1),
            ..BridgeSettings::default()
        };
        Relay::new(table, poller, &settings, shutdown.clone())
    }

    #[test]
    fn fatal_failure_stops_relay_with_topic() {
        let shutdown = ShutdownFlag::new();
        let mut publisher = ScriptedPub::new("carState");
        publisher
            .failures
            .push_back(SendError::Failed(io::Error::from(io::ErrorKind::Other)));
        let subscriber = QueueSub {
            topic: "carState",
            queue: VecDeque::from([1]),
        };

        let err = relay(vec![(subscriber, publisher)], &shutdown)
            .run()
            .expect_err("fatal send failure ends the relay");
        assert!(matches!(err, BridgeError::Send { ref topic, .. } if topic == "carState"));
    }

    #[test]
    fn failure_during_shutdown_is_suppressed() {
        let shutdown = ShutdownFlag::new();
        let mut publisher = ScriptedPub::new("carState");
        publisher
            .failures
            .push_back(SendError::Failed(io::Error::from(io::ErrorKind::Other)));
        publisher.shutdown_on_send = Some(shutdown.clone());
        let subscriber = QueueSub {
            topic: "carState",
            queue: VecDeque::from([1, 2]),
        };

        let stats = relay(vec![(subscriber, publisher)], &shutdown)
            .run()
            .expect("shutdown suppresses the failure");
        assert_eq!(
            stats,
            RelayStats {
                polls: 1,
                received: 1,
                forwarded: 0,
                send_retries: 0,
                abandoned: 1,
            }
        );
    }

    #[test]
    fn transient_failures_are_retried_until_sent() {
        let shutdown = ShutdownFlag::new();
        let mut publisher = ScriptedPub::new("carState");
        publisher.failures.push_back(SendError::Interrupted);
        publisher.failures.push_back(SendError::Interrupted);
        let subscriber = QueueSub {
            topic: "carState",
            queue: VecDeque::from([7]),
        };

        let mut relay = relay(vec![(subscriber, publisher)], &shutdown);
        relay
            .drain(SocketHandle::new(0))
            .expect("transient failures are not surfaced");

        assert_eq!(relay.stats.send_retries, 2);
        assert_eq!(relay.stats.forwarded, 1);
        let (_, _, publisher) = relay
            .table
            .pair_mut(SocketHandle::new(0))
            .expect("pair exists");
        assert_eq!(publisher.sent, vec![7]);
    }

    #[test]
    fn stops_on_preset_shutdown_without_polling() {
        let shutdown = ShutdownFlag::new();
        shutdown.request();

        let stats = relay(Vec::new(), &shutdown).run().expect("clean stop");
        assert_eq!(stats, RelayStats::default());
    }

    #[test]
    fn queued_output_is_flushed_after_the_topic_goes_quiet() {
        let shutdown = ShutdownFlag::new();
        let mut publisher = ScriptedPub::new("roadEncodeData");
        publisher.queue_sends = true;
        publisher.stop_when_drained = Some(shutdown.clone());
        let subscriber = QueueSub {
            topic: "roadEncodeData",
            queue: VecDeque::from([1, 2, 3]),
        };

        let mut relay = relay(vec![(subscriber, publisher)], &shutdown);
        relay.drain(SocketHandle::new(0)).expect("sends are accepted");
        let stats = relay.run().expect("clean stop once output is written");

        assert_eq!(stats.forwarded, 3);
        assert!(stats.polls >= 1);
    }

    #[test]
    fn flush_writes_pending_output_without_new_messages() {
        let shutdown = ShutdownFlag::new();
        let mut publisher = ScriptedPub::new("carParams");
        publisher.queue_sends = true;
        let subscriber = QueueSub {
            topic: "carParams",
            queue: VecDeque::from([9]),
        };

        let mut relay = relay(vec![(subscriber, publisher)], &shutdown);
        relay.drain(SocketHandle::new(0)).expect("send is accepted");
        assert!(relay.has_pending_output());

        relay.flush_publishers().expect("flush succeeds");
        assert!(!relay.has_pending_output());
        let (_, _, publisher) = relay
            .table
            .pair_mut(SocketHandle::new(0))
            .expect("pair exists");
        assert_eq!(publisher.sent, vec![9]);
        assert_eq!(publisher.flushes, 1);
    }
}
