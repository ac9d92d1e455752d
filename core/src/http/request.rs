/*
 * request.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Tether, a client-side web connection library.
 *
 * Tether is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Tether is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Tether.  If not, see <http://www.gnu.org/licenses/>.
 */

//! HTTP request framing: request line, header block, optional body.

use crate::headers::{HeaderMap, RenderFormat};

/// Request method. Downloads use GET, uploads POST, stores PUT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }
}

/// One request about to go on the wire. Exists only for the duration of a
/// single transfer call; the header snapshot is taken after the connection
/// has injected its own headers.
pub struct PendingRequest<'a> {
    pub method: Method,
    /// Path including any query string.
    pub target: &'a str,
    pub headers: &'a HeaderMap,
    pub body: Option<&'a [u8]>,
}

impl PendingRequest<'_> {
    /// Serialize to wire bytes: `VERB target HTTP/1.1`, the header block in
    /// ascending key order, a blank line, then the body when present.
    pub fn encode(&self) -> Vec<u8> {
        let mut wire = format!(
            "{} {} HTTP/1.1\r\n{}\r\n",
            self.method.as_str(),
            self.target,
            self.headers.render(RenderFormat::HeaderBlock)
        )
        .into_bytes();
        if let Some(body) = self.body {
            wire.extend_from_slice(body);
        }
        wire
    }
}
