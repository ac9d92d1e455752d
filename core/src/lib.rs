/*
 * lib.rs
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

//! Tether: a small client-side web connection library.
//!
//! A [`Connection`] parses a URL, connects over TCP or TLS, and performs
//! buffered HTTP/1.1 transfers: [`Connection::download`] (GET),
//! [`Connection::upload`] (POST), [`Connection::store`] (PUT). Requests can
//! be signed with OAuth 1.0a by installing credentials on the connection.
//! FTP and Gopher URLs connect but have no transfer support yet.
//!
//! ```no_run
//! use tether_core::Connection;
//!
//! # async fn example() -> Result<(), tether_core::ConnectionError> {
//! let mut conn = Connection::new();
//! conn.connect("https://example.com/index.html").await?;
//! let body = conn.download().await?;
//! conn.disconnect();
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod delegate;
pub mod error;
pub mod form;
pub mod headers;
pub mod http;
pub mod mime;
pub mod net;
pub mod oauth;
pub mod url;

pub use connection::{Connection, RequestSigner, SigningRequest};
pub use delegate::{ConnectionDelegate, ConnectionStatus};
pub use error::ConnectionError;
pub use headers::{HeaderMap, RenderFormat};
pub use oauth::{OAuthCredentials, OAuthSigner, SignatureMethod};
pub use url::{ParsedUrl, Scheme};
