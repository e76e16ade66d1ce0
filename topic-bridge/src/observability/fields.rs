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

//! Canonical structured field values and formatting helpers.

use std::io;

pub const REASON_EOF: &str = "eof";
pub const REASON_READ_ERROR: &str = "read_error";
pub const REASON_OVERSIZED_FRAME: &str = "oversized_frame";
pub const REASON_WRITE_ERROR: &str = "write_error";
pub const REASON_SHUTDOWN: &str = "shutdown";
pub const DEFAULT_WORKER_THREAD: &str = "unknown-thread";

pub fn thread_name_or_default(thread_name: Option<&str>) -> String {
    thread_name.unwrap_or(DEFAULT_WORKER_THREAD).to_string()
}

pub fn current_thread_name_or_default() -> String {
    thread_name_or_default(std::thread::current().name())
}

/// Broken pipes and resets are the expected way a subscriber goes away.
pub fn is_peer_gone(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
    )
}

#[cfg(test)]
mod tests {
    use super::{is_peer_gone, thread_name_or_default, DEFAULT_WORKER_THREAD};
    use std::io;

    #[test]
    fn thread_name_or_default_falls_back_when_absent() {
        assert_eq!(thread_name_or_default(None), DEFAULT_WORKER_THREAD);
        assert_eq!(thread_name_or_default(Some("named-thread")), "named-thread");
    }

    #[test]
    fn peer_gone_covers_pipe_and_reset_only() {
        assert!(is_peer_gone(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(is_peer_gone(&io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(!is_peer_gone(&io::Error::from(io::ErrorKind::PermissionDenied)));
    }
}
