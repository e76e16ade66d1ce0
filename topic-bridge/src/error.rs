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

//! Error types for transport setup, per-message sends and the bridge as a whole.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while building a transport context or one of its sockets.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid topic name '{0}'")]
    InvalidTopic(String),

    #[error("unable to resolve address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("address '{0}' resolved to no socket addresses")]
    UnresolvedAddress(String),

    #[error("unable to prepare socket directory {path:?}: {source}")]
    SocketDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to bind publisher at {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("another publisher is already serving {endpoint}")]
    AlreadyPublished { endpoint: String },

    #[error("transport rejected topic '{topic}': {reason}")]
    Rejected { topic: String, reason: String },

    #[error("unable to create poller: {0}")]
    Poller(#[source] io::Error),

    #[error("unable to register subscriber with the poller: {0}")]
    Register(#[source] io::Error),
}

/// Outcome of a failed [`PubSocket::send`][crate::transport::PubSocket::send].
#[derive(Debug, Error)]
pub enum SendError {
    /// The send was interrupted before it completed and may simply be retried.
    #[error("send interrupted")]
    Interrupted,

    #[error("send failed: {0}")]
    Failed(#[source] io::Error),
}

impl SendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, SendError::Interrupted)
    }
}

impl From<io::Error> for SendError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::Interrupted {
            SendError::Interrupted
        } else {
            SendError::Failed(err)
        }
    }
}

/// Errors surfaced by [`Bridge`][crate::Bridge] setup or by the relay loop.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("unable to set up {transport} transport: {source}")]
    TransportSetup {
        transport: &'static str,
        #[source]
        source: TransportError,
    },

    #[error("unable to wire topic '{topic}': {source}")]
    Wiring {
        topic: String,
        #[source]
        source: TransportError,
    },

    #[error("fatal send failure on topic '{topic}': {source}")]
    Send {
        topic: String,
        #[source]
        source: SendError,
    },

    #[error("unable to install signal handlers: {0}")]
    Signal(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::SendError;
    use std::io;

    #[test]
    fn interrupted_io_error_maps_to_transient_send_error() {
        let err = SendError::from(io::Error::from(io::ErrorKind::Interrupted));
        assert!(err.is_transient());
    }

    #[test]
    fn other_io_errors_map_to_fatal_send_error() {
        let err = SendError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(!err.is_transient());
        assert!(matches!(
            err,
            SendError::Failed(inner) if inner.kind() == io::ErrorKind::BrokenPipe
        ));
    }
}
