/*
 * error.rs
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

//! Connection and signing errors.

use std::fmt;

/// Errors from URL parsing, connection setup, transfers, and request signing.
///
/// Every public operation on a `Connection` also records the message of the
/// error it returns; the most recent one is retrievable via `last_error()`.
#[derive(Debug)]
pub enum ConnectionError {
    /// URL scheme is not one of http, https, ftp, gopher, or the scheme does
    /// not support the requested operation.
    UnsupportedProtocol(String),
    /// URL could not be decomposed into scheme/host/path.
    UnparsableUrl(String),
    /// Host name did not resolve to any address.
    ResolutionFailure(String),
    /// TCP connect failed or timed out.
    ConnectFailure(String),
    /// TLS handshake or certificate verification failed.
    TlsFailure(String),
    /// API misuse, e.g. transfer before connect.
    OrderError(String),
    /// Send or receive failed mid-transfer.
    IoFailure(String),
    /// Server answered with a status >= 400. The body is still delivered.
    HttpStatus(u16),
    /// OAuth signature generation failed.
    Signing(String),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::UnsupportedProtocol(m) => write!(f, "{}", m),
            ConnectionError::UnparsableUrl(url) => write!(f, "unparsable URL {}", url),
            ConnectionError::ResolutionFailure(m) => write!(f, "can't resolve {}", m),
            ConnectionError::ConnectFailure(m) => write!(f, "can't connect to {}", m),
            ConnectionError::TlsFailure(m) => write!(f, "TLS failure: {}", m),
            ConnectionError::OrderError(m) => write!(f, "{}", m),
            ConnectionError::IoFailure(m) => write!(f, "{}", m),
            ConnectionError::HttpStatus(code) => write!(f, "HTTP error {}", code),
            ConnectionError::Signing(m) => write!(f, "signature generation failed: {}", m),
        }
    }
}

impl std::error::Error for ConnectionError {}
