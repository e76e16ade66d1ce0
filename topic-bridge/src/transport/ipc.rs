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

//! Local transport: one Unix domain stream socket per topic at `<socket_dir>/<topic>`.
//!
//! The address argument of [`Transport::sub_socket`] is ignored; local subscribers
//! always read from the socket directory of the context.

use crate::error::TransportError;
use crate::observability::{events, fields};
use crate::settings::BridgeSettings;
use crate::transport::poller::MioPoller;
use crate::transport::stream::{
    connect_progress, StreamConnector, StreamListener, StreamPubSocket, StreamSubSocket,
};
use crate::transport::{validate_topic, Message, Transport};
use mio::net::{UnixListener, UnixStream};
use std::fs;
use std::io;
use std::os::unix::net::UnixStream as BlockingUnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const COMPONENT: &str = "ipc_transport";

pub type IpcPubSocket = StreamPubSocket<IpcListener>;
pub type IpcSubSocket = StreamSubSocket<IpcConnector>;

/// Local transport over Unix domain sockets.
pub struct IpcTransport;

#[derive(Clone, Debug)]
pub struct IpcContext {
    socket_dir: PathBuf,
    reconnect_interval: Duration,
}

impl IpcContext {
    pub fn socket_path(&self, topic: &str) -> PathBuf {
        self.socket_dir.join(topic)
    }
}

/// Listening socket of one publisher; removes its socket file when dropped.
pub struct IpcListener {
    listener: UnixListener,
    path: PathBuf,
}

impl StreamListener for IpcListener {
    type Stream = UnixStream;

    fn accept_peer(&self) -> io::Result<(UnixStream, String)> {
        let (stream, _) = self.listener.accept()?;
        Ok((stream, self.path.display().to_string()))
    }
}

impl Drop for IpcListener {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            debug!(
                event = events::PUBLISHER_SOCKET_REMOVE_FAILED,
                component = COMPONENT,
                path = %self.path.display(),
                err = ?err,
                "unable to remove socket file"
            );
        }
    }
}

pub struct IpcConnector {
    path: PathBuf,
}

impl StreamConnector for IpcConnector {
    type Stream = UnixStream;

    fn connect(&self) -> io::Result<UnixStream> {
        UnixStream::connect(&self.path)
    }

    fn is_established(stream: &UnixStream) -> io::Result<bool> {
        connect_progress(stream.take_error(), stream.peer_addr().map(drop))
    }
}

fn bind_listener(path: &Path) -> Result<UnixListener, TransportError> {
    let endpoint = path.display().to_string();

    if path.exists() {
        // A live publisher still accepts connections; anything else is left over.
        if BlockingUnixStream::connect(path).is_ok() {
            return Err(TransportError::AlreadyPublished { endpoint });
        }
        fs::remove_file(path).map_err(|source| TransportError::Bind {
            endpoint: endpoint.clone(),
            source,
        })?;
        info!(
            event = events::PUBLISHER_STALE_SOCKET_REMOVED,
            component = COMPONENT,
            path = endpoint.as_str(),
            "removed stale socket file"
        );
    }

    UnixListener::bind(path).map_err(|source| TransportError::Bind { endpoint, source })
}

impl Transport for IpcTransport {
    const NAME: &'static str = "ipc";

    type Context = IpcContext;
    type Message = Message;
    type SubSocket = IpcSubSocket;
    type PubSocket = IpcPubSocket;
    type Poller = MioPoller;

    fn context(settings: &BridgeSettings) -> Result<IpcContext, TransportError> {
        fs::create_dir_all(&settings.socket_dir).map_err(|source| {
            TransportError::SocketDirectory {
                path: settings.socket_dir.clone(),
                source,
            }
        })?;
        debug!(
            event = events::TRANSPORT_CONTEXT_READY,
            component = COMPONENT,
            socket_dir = %settings.socket_dir.display(),
            worker_thread = fields::current_thread_name_or_default(),
            "ipc context ready"
        );
        Ok(IpcContext {
            socket_dir: settings.socket_dir.clone(),
            reconnect_interval: settings.reconnect_interval,
        })
    }

    fn poller(_settings: &BridgeSettings) -> Result<MioPoller, TransportError> {
        MioPoller::new().map_err(TransportError::Poller)
    }

    fn pub_socket(context: &IpcContext, topic: &str) -> Result<IpcPubSocket, TransportError> {
        validate_topic(topic)?;
        let path = context.socket_path(topic);
        let listener = bind_listener(&path)?;
        let endpoint = path.display().to_string();
        Ok(StreamPubSocket::new(
            topic,
            &endpoint,
            IpcListener { listener, path },
        ))
    }

    fn sub_socket(
        context: &IpcContext,
        topic: &str,
        _address: &str,
        conflate: bool,
    ) -> Result<IpcSubSocket, TransportError> {
        validate_topic(topic)?;
        let path = context.socket_path(topic);
        let endpoint = path.display().to_string();
        Ok(StreamSubSocket::new(
            topic,
            endpoint,
            IpcConnector { path },
            conflate,
            context.reconnect_interval,
        ))
    }
}
