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

//! Registry of the services known to the local message bus.
//!
//! The bridge only needs the names, but the table carries the same metadata the
//! bus itself uses so it can be shared with tooling that inspects it.

/// Metadata for one service on the bus.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Service {
    pub name: &'static str,
    pub should_log: bool,
    /// Nominal publish rate in Hz; `0.0` for event-driven services.
    pub frequency: f32,
    /// Every n-th message is kept in decimated logs.
    pub decimation: Option<u32>,
}

const fn service(
    name: &'static str,
    should_log: bool,
    frequency: f32,
    decimation: Option<u32>,
) -> Service {
    Service {
        name,
        should_log,
        frequency,
        decimation,
    }
}

pub static SERVICES: &[Service] = &[
    service("gyroscope", true, 104.0, Some(104)),
    service("gyroscope2", true, 100.0, Some(100)),
    service("accelerometer", true, 104.0, Some(104)),
    service("accelerometer2", true, 100.0, Some(100)),
    service("magnetometer", true, 25.0, Some(25)),
    service("lightSensor", true, 100.0, Some(100)),
    service("temperatureSensor", true, 2.0, Some(200)),
    service("temperatureSensor2", true, 2.0, Some(200)),
    service("gpsNMEA", true, 9.0, None),
    service("deviceState", true, 2.0, Some(1)),
    service("can", true, 100.0, Some(2053)),
    service("controlsState", true, 100.0, Some(10)),
    service("pandaStates", true, 10.0, Some(1)),
    service("peripheralState", true, 2.0, Some(1)),
    service("radarState", true, 20.0, Some(5)),
    service("roadEncodeIdx", false, 20.0, Some(1)),
    service("liveTracks", true, 20.0, None),
    service("sendcan", true, 100.0, Some(139)),
    service("logMessage", true, 0.0, None),
    service("errorLogMessage", true, 0.0, Some(1)),
    service("liveCalibration", true, 4.0, Some(4)),
    service("liveTorqueParameters", true, 4.0, Some(1)),
    service("androidLog", true, 0.0, None),
    service("carState", true, 100.0, Some(10)),
    service("carControl", true, 100.0, Some(10)),
    service("carOutput", true, 100.0, Some(10)),
    service("longitudinalPlan", true, 20.0, Some(5)),
    service("procLog", true, 0.5, Some(15)),
    service("gpsLocationExternal", true, 10.0, Some(10)),
    service("gpsLocation", true, 1.0, Some(1)),
    service("ubloxGnss", true, 10.0, None),
    service("qcomGnss", true, 2.0, None),
    service("gnssMeasurements", true, 10.0, Some(10)),
    service("clocks", true, 0.1, Some(1)),
    service("ubloxRaw", true, 20.0, None),
    service("liveLocationKalman", true, 20.0, Some(5)),
    service("liveParameters", true, 20.0, Some(5)),
    service("cameraOdometry", true, 20.0, Some(5)),
    service("thumbnail", true, 0.2, Some(1)),
    service("onroadEvents", true, 1.0, Some(1)),
    service("carParams", true, 0.02, Some(1)),
    service("roadCameraState", true, 20.0, Some(20)),
    service("driverCameraState", true, 20.0, Some(20)),
    service("driverEncodeIdx", false, 20.0, Some(1)),
    service("driverStateV2", true, 20.0, Some(10)),
    service("driverMonitoringState", true, 20.0, Some(10)),
    service("wideRoadEncodeIdx", false, 20.0, Some(1)),
    service("wideRoadCameraState", true, 20.0, Some(20)),
    service("modelV2", true, 20.0, Some(40)),
    service("managerState", true, 2.0, Some(1)),
    service("uploaderState", true, 0.0, Some(1)),
    service("navInstruction", true, 1.0, Some(10)),
    service("navRoute", true, 0.0, None),
    service("navThumbnail", true, 0.0, None),
    service("qRoadEncodeIdx", false, 20.0, None),
    service("userFlag", true, 0.0, Some(1)),
    service("microphone", true, 10.0, Some(10)),
    service("uiDebug", true, 0.0, Some(1)),
    service("testJoystick", true, 0.0, None),
    service("plusFrame", false, 0.0, None),
    service("uiLayoutState", true, 0.0, None),
    service("roadEncodeData", false, 20.0, None),
    service("driverEncodeData", false, 20.0, None),
    service("wideRoadEncodeData", false, 20.0, None),
    service("qRoadEncodeData", false, 20.0, None),
];

/// Enumerates every registered service name.
pub fn service_names() -> impl Iterator<Item = &'static str> {
    SERVICES.iter().map(|service| service.name)
}

pub fn lookup(name: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|service| service.name == name)
}

#[cfg(test)]
mod tests {
    use super::{lookup, service_names, SERVICES};
    use std::collections::HashSet;

    #[test]
    fn service_names_are_unique() {
        let unique: HashSet<&str> = service_names().collect();
        assert_eq!(unique.len(), SERVICES.len());
    }

    #[test]
    fn registry_covers_every_whitelisted_topic() {
        for whitelist in [
            crate::run_mode::OPERATOR_WHITELIST,
            crate::run_mode::SIMULATOR_WHITELIST,
        ] {
            for name in whitelist.split(',') {
                assert!(lookup(name).is_some(), "{name} missing from registry");
            }
        }
    }

    #[test]
    fn lookup_returns_metadata() {
        let can = lookup("can").expect("can is registered");
        assert!(can.should_log);
        assert_eq!(can.decimation, Some(2053));
        assert!(lookup("doesNotExist").is_none());
    }
}
