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

//! Signals are process-wide, so this file holds a single test.

use integration_test_utils::{init_logging, wait_until};
use std::process::Command;
use std::thread;
use std::time::Duration;
use topic_bridge::{spawn_signal_listener, ShutdownFlag};

fn raise(signal: &str) {
    let status = Command::new("kill")
        .args([format!("-{signal}"), std::process::id().to_string()])
        .status()
        .expect("run kill");
    assert!(status.success(), "kill -{signal} failed");
}

#[test]
fn sigpipe_is_logged_and_sigterm_requests_shutdown() {
    init_logging();
    let shutdown = ShutdownFlag::new();
    let _listener = spawn_signal_listener(shutdown.clone()).expect("listener starts");

    raise("PIPE");
    thread::sleep(Duration::from_millis(100));
    assert!(!shutdown.is_requested());

    raise("TERM");
    assert!(wait_until(Duration::from_secs(5), || shutdown.is_requested()));
}
