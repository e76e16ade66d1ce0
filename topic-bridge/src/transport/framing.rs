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

//! Length-prefixed framing shared by the stream transports.

use thiserror::Error;

pub(crate) const HEADER_LEN: usize = 4;
pub(crate) const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

#[derive(Debug, Error, Eq, PartialEq)]
pub(crate) enum FrameError {
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    TooLarge(usize),
}

pub(crate) fn encode_header(payload_len: usize) -> Result<[u8; HEADER_LEN], FrameError> {
    if payload_len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(payload_len));
    }
    // MAX_FRAME_LEN fits in u32.
    Ok((payload_len as u32).to_le_bytes())
}

/// Reassembles frames from arbitrarily split reads.
#[derive(Debug, Default)]
pub(crate) struct FrameDecoder {
    buffer: Vec<u8>,
    start: usize,
}

impl FrameDecoder {
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        if self.start > 0 && self.start == self.buffer.len() {
            self.buffer.clear();
            self.start = 0;
        }
        self.buffer.extend_from_slice(bytes);
    }

    fn pending(&self) -> &[u8] {
        &self.buffer[self.start..]
    }

    fn declared_len(&self) -> Option<usize> {
        let header: [u8; HEADER_LEN] = self.pending().get(..HEADER_LEN)?.try_into().ok()?;
        Some(u32::from_le_bytes(header) as usize)
    }

    /// Pops the next complete frame.
    ///
    /// An oversized length prefix is reported as soon as the header is buffered;
    /// the stream is unusable after that and the caller must [`clear`](Self::clear).
    pub(crate) fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        let Some(len) = self.declared_len() else {
            return Ok(None);
        };
        if len > MAX_FRAME_LEN {
            return Err(FrameError::TooLarge(len));
        }
        if self.pending().len() < HEADER_LEN + len {
            return Ok(None);
        }

        let body_start = self.start + HEADER_LEN;
        let frame = self.buffer[body_start..body_start + len].to_vec();
        self.start = body_start + len;

        // Compact once the consumed prefix dominates the buffer.
        if self.start > self.buffer.len() / 2 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
        Ok(Some(frame))
    }

    pub(crate) fn clear(&mut self) {
        self.buffer.clear();
        self.start = 0;
    }
}
