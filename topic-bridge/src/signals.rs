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

//! Signal listener thread translating SIGINT/SIGTERM into a shutdown request.

use crate::error::BridgeError;
use crate::observability::events;
use crate::shutdown::ShutdownFlag;
use std::thread;
use tokio::runtime::Builder;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

pub const SIGNAL_THREAD_NAME: &str = "topic-bridge-signals";
const COMPONENT: &str = "signals";

/// Installs the handlers and spawns the thread serving them.
///
/// Handlers are registered before this returns, so a signal arriving right after
/// the call is already observed. SIGPIPE is only logged.
pub fn spawn_signal_listener(
    shutdown: ShutdownFlag,
) -> Result<thread::JoinHandle<()>, BridgeError> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(BridgeError::Signal)?;

    let (mut interrupt, mut terminate, mut broken_pipe) = {
        let _guard = runtime.enter();
        (
            signal(SignalKind::interrupt()).map_err(BridgeError::Signal)?,
            signal(SignalKind::terminate()).map_err(BridgeError::Signal)?,
            signal(SignalKind::pipe()).map_err(BridgeError::Signal)?,
        )
    };

    let spawned = thread::Builder::new()
        .name(SIGNAL_THREAD_NAME.to_string())
        .spawn(move || {
            runtime.block_on(async move {
                loop {
                    tokio::select! {
                        Some(()) = interrupt.recv() => request_shutdown(&shutdown, "SIGINT"),
                        Some(()) = terminate.recv() => request_shutdown(&shutdown, "SIGTERM"),
                        Some(()) = broken_pipe.recv() => {
                            warn!(
                                event = events::SIGNAL_BROKEN_PIPE,
                                component = COMPONENT,
                                signal = "SIGPIPE",
                                "broken pipe signal received"
                            );
                        }
                        else => break,
                    }
                }
            });
        });

    match spawned {
        Ok(handle) => {
            info!(
                event = events::RUNTIME_SPAWN_OK,
                component = COMPONENT,
                worker_thread = SIGNAL_THREAD_NAME,
                "signal listener started"
            );
            Ok(handle)
        }
        Err(err) => {
            error!(
                event = events::RUNTIME_SPAWN_FAILED,
                component = COMPONENT,
                worker_thread = SIGNAL_THREAD_NAME,
                err = ?err,
                "unable to spawn signal listener"
            );
            Err(BridgeError::Signal(err))
        }
    }
}

fn request_shutdown(shutdown: &ShutdownFlag, signal: &'static str) {
    info!(
        event = events::SIGNAL_SHUTDOWN_REQUESTED,
        component = COMPONENT,
        signal,
        already_requested = shutdown.is_requested(),
        "shutdown requested"
    );
    shutdown.request();
}

#[cfg(test)]
mod tests {
    use super::request_shutdown;
    use crate::shutdown::ShutdownFlag;

    #[test]
    fn signal_requests_shutdown_idempotently() {
        let shutdown = ShutdownFlag::new();
        request_shutdown(&shutdown, "SIGTERM");
        request_shutdown(&shutdown, "SIGTERM");
        assert!(shutdown.is_requested());
    }
}
