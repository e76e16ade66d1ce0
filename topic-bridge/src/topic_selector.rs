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

//! Resolution of a whitelist against the registry of known topics.

use crate::observability::events;
use tracing::info;

const COMPONENT: &str = "topic_selector";

/// Topics that never cross the bridge, whatever the whitelist says.
pub const EXCLUDED_TOPICS: [&str; 2] = ["plusFrame", "uiLayoutState"];

/// Selects the known topics named by `whitelist`.
///
/// Matching is substring containment against the raw whitelist string, not a
/// comparison against its comma-separated entries: a known name that is a
/// substring of any whitelisted name is selected too (`gpsLocation` is picked up
/// by a whitelist containing `gpsLocationExternal`).
///
/// The output keeps the enumeration order of `known_names`.
pub fn select_topics<I, S>(known_names: I, whitelist: &str) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selected = Vec::new();
    for name in known_names {
        let name = name.as_ref();
        if EXCLUDED_TOPICS.contains(&name) || !whitelist.contains(name) {
            continue;
        }
        info!(
            event = events::TOPIC_ALLOWED,
            component = COMPONENT,
            topic = name,
            "allowed topic"
        );
        selected.push(name.to_string());
    }
    selected
}
