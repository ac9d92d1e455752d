/*
 * connection.rs
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

//! The connection engine: URL parse, resolve, connect (TCP or TLS), one
//! buffered request/response transfer at a time, disconnect.
//!
//! One `Connection` represents one logical endpoint. Each transfer drains the
//! transport to end-of-stream before parsing (`Connection: Close` is injected
//! when the caller did not say otherwise), so a transport carries exactly one
//! request/response exchange; a further transfer on the same connection needs
//! a fresh `connect()` once the peer has closed the stream.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::delegate::{ConnectionDelegate, ConnectionStatus};
use crate::error::ConnectionError;
use crate::headers::HeaderMap;
use crate::http::{parse_response, Method, PendingRequest};
use crate::net::{self, Transport};
use crate::oauth::{OAuthCredentials, OAuthSigner, SignatureMethod};
use crate::url::{self, Scheme};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
/// Receive timeout on plain sockets. The TLS path has none.
const PLAIN_READ_TIMEOUT: Duration = Duration::from_secs(30);
/// Responses are drained in increments of this size.
const READ_BLOCK: usize = 512;

/// The request a signer is asked to authorize, before it is framed.
pub struct SigningRequest<'a> {
    pub method: &'a str,
    /// `scheme://host/path`, query excluded.
    pub base_uri: &'a str,
    /// Raw query string, when the target carries one.
    pub query: Option<&'a str>,
}

/// Hook invoked by the connection before every transfer. Implementations add
/// whatever authentication headers the request needs; a no-op is fine.
pub trait RequestSigner: Send {
    fn authorize(
        &mut self,
        request: &SigningRequest<'_>,
        headers: &mut HeaderMap,
    ) -> Result<(), ConnectionError>;
}

/// A connection to one endpoint. Sequential: every operation takes `&mut
/// self` and runs to completion before the next.
pub struct Connection {
    connecting: bool,
    connected: bool,
    scheme: Option<Scheme>,
    host: String,
    port: u16,
    /// Path including any query string. Empty while disconnected.
    target: String,
    query: Option<String>,
    transport: Option<Transport>,
    read_timeout: Option<Duration>,
    headers: HeaderMap,
    delegate: Option<Arc<dyn ConnectionDelegate>>,
    signer: Option<Box<dyn RequestSigner>>,
    last_error: Option<String>,
}

fn default_user_agent() -> String {
    format!(
        "Mozilla/4.0 (compatible; {}; U; en-GB) tether/{}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    )
}

impl Connection {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A connection that reports every status transition to `delegate`.
    pub fn with_delegate(delegate: Arc<dyn ConnectionDelegate>) -> Self {
        Self::build(Some(delegate))
    }

    fn build(delegate: Option<Arc<dyn ConnectionDelegate>>) -> Self {
        Self {
            connecting: false,
            connected: false,
            scheme: None,
            host: String::new(),
            port: 0,
            target: String::new(),
            query: None,
            transport: None,
            read_timeout: None,
            headers: HeaderMap::new(),
            delegate,
            signer: None,
            last_error: None,
        }
    }

    /// The most recent error message, if any operation has failed. Not
    /// cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn scheme(&self) -> Option<Scheme> {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Set a request header. An empty value unsets it.
    pub fn header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Install OAuth credentials; all four secrets are replaced together.
    /// Passing neither a consumer key nor a token disables signing and the
    /// connection behaves exactly like an unsigned one.
    pub fn oauth_credentials(
        &mut self,
        consumer_key: Option<&str>,
        consumer_secret: Option<&str>,
        token: Option<&str>,
        token_secret: Option<&str>,
        signature_method: SignatureMethod,
    ) {
        let credentials = OAuthCredentials::new(
            consumer_key,
            consumer_secret,
            token,
            token_secret,
            signature_method,
        );
        self.signer = Some(Box::new(OAuthSigner::new(credentials)));
    }

    /// Install an arbitrary signing hook in place of OAuth.
    pub fn set_signer(&mut self, signer: Box<dyn RequestSigner>) {
        self.signer = Some(signer);
    }

    fn set_status(&self, status: ConnectionStatus) {
        if let Some(delegate) = &self.delegate {
            delegate.update_status(status);
        }
    }

    /// Record the error message, notify the delegate, hand the error back.
    fn fail(&mut self, error: ConnectionError) -> ConnectionError {
        self.last_error = Some(error.to_string());
        self.set_status(ConnectionStatus::Error);
        error
    }

    fn reset_url_state(&mut self) {
        self.scheme = None;
        self.host.clear();
        self.port = 0;
        self.target.clear();
        self.query = None;
    }

    /// Connect to a URL. An already-connected instance is disconnected first;
    /// a connect while one is already in progress fails without touching any
    /// state. On failure every partially-acquired resource (resolved
    /// addresses, transport, parsed URL fields) is released before returning.
    pub async fn connect(&mut self, url: &str) -> Result<(), ConnectionError> {
        if self.connecting {
            return Err(ConnectionError::OrderError(
                "connect already in progress".to_string(),
            ));
        }
        if self.connected {
            self.disconnect();
        }
        self.connecting = true;

        let parsed = match url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("can't parse URL {}: {}", url, e);
                self.connecting = false;
                return Err(self.fail(e));
            }
        };
        self.scheme = Some(parsed.scheme);
        self.host = parsed.host;
        self.port = parsed.port;
        self.target = parsed.target;
        self.query = parsed.query;

        match self.establish(parsed.scheme).await {
            Ok(transport) => {
                self.read_timeout = match transport {
                    Transport::Plain(_) => Some(PLAIN_READ_TIMEOUT),
                    Transport::Tls(_) => None,
                };
                self.transport = Some(transport);
                self.connecting = false;
                self.connected = true;
                self.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                self.reset_url_state();
                self.connecting = false;
                Err(self.fail(e))
            }
        }
    }

    /// Resolve and open the transport; for https this includes the TLS
    /// handshake with certificate verification.
    async fn establish(&mut self, scheme: Scheme) -> Result<Transport, ConnectionError> {
        self.set_status(ConnectionStatus::Resolving);
        let addrs = net::resolve(&self.host, self.port).await.map_err(|e| {
            log::warn!("can't resolve {}: {}", self.host, e);
            ConnectionError::ResolutionFailure(format!("{}: {}", self.host, e))
        })?;

        self.set_status(ConnectionStatus::Connecting);
        let mut last_err: Option<io::Error> = None;
        let mut tcp: Option<TcpStream> = None;
        for addr in addrs {
            match timeout(CONNECT_TIMEOUT, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    tcp = Some(stream);
                    break;
                }
                Ok(Err(e)) => last_err = Some(e),
                Err(_) => {
                    last_err = Some(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
                }
            }
        }
        let tcp = match tcp {
            Some(tcp) => tcp,
            None => {
                let detail = last_err
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| "no usable address".to_string());
                log::warn!("can't connect to {}: {}", self.host, detail);
                return Err(ConnectionError::ConnectFailure(format!(
                    "{}: {}",
                    self.host, detail
                )));
            }
        };

        if scheme == Scheme::Https {
            Transport::handshake_tls(tcp, &self.host)
                .await
                .map_err(|e| ConnectionError::TlsFailure(e.to_string()))
        } else {
            Ok(Transport::Plain(tcp))
        }
    }

    /// Close the transport and reset the parsed URL fields. `last_error` is
    /// preserved. A no-op when neither connecting nor connected.
    pub fn disconnect(&mut self) {
        if !self.connecting && !self.connected {
            return;
        }
        self.connecting = false;
        self.connected = false;
        self.transport = None;
        self.read_timeout = None;
        self.reset_url_state();
        self.set_status(ConnectionStatus::Closed);
    }

    /// GET the connected URL; the whole response body is buffered and
    /// returned. A status >= 400 still returns the body, with the failure
    /// recorded in `last_error()`.
    pub async fn download(&mut self) -> Result<Vec<u8>, ConnectionError> {
        self.transfer(Method::Get, None).await
    }

    /// POST data to the connected URL and return the response body.
    pub async fn upload(&mut self, data: &[u8]) -> Result<Vec<u8>, ConnectionError> {
        self.transfer(Method::Post, Some(data)).await
    }

    /// PUT data to the connected URL and return the response body.
    pub async fn store(&mut self, data: &[u8]) -> Result<Vec<u8>, ConnectionError> {
        self.transfer(Method::Put, Some(data)).await
    }

    async fn transfer(
        &mut self,
        method: Method,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, ConnectionError> {
        if !self.connected {
            log::warn!("{} before connect (order error)", method.as_str());
            return Err(self.fail(ConnectionError::OrderError(
                "you must be connected to transfer data".to_string(),
            )));
        }
        let scheme = match self.scheme {
            Some(scheme) if scheme.is_http() => scheme,
            Some(scheme) => {
                return Err(self.fail(ConnectionError::UnsupportedProtocol(format!(
                    "transfer is not implemented for {}",
                    scheme
                ))));
            }
            None => {
                return Err(self.fail(ConnectionError::OrderError(
                    "you must be connected to transfer data".to_string(),
                )));
            }
        };

        if let Some(mut signer) = self.signer.take() {
            let path = match self.target.find('?') {
                Some(i) => &self.target[..i],
                None => self.target.as_str(),
            };
            let base_uri = format!("{}://{}{}", scheme.as_str(), self.host, path);
            let request = SigningRequest {
                method: method.as_str(),
                base_uri: &base_uri,
                query: self.query.as_deref(),
            };
            let result = signer.authorize(&request, &mut self.headers);
            self.signer = Some(signer);
            if let Err(e) = result {
                return Err(self.fail(e));
            }
        }

        let host = self.host.clone();
        self.headers.set("Host", &host);
        if self.headers.get("User-Agent").is_none() {
            self.headers.set("User-Agent", &default_user_agent());
        }
        if self.headers.get("Connection").is_none() {
            self.headers.set("Connection", "Close");
        }
        match body {
            Some(body) => {
                if self.headers.get("Content-Type").is_none() {
                    self.headers
                        .set("Content-Type", "application/x-www-form-urlencoded");
                }
                self.headers.set("Content-Length", &body.len().to_string());
            }
            None => {
                // No entity on a GET; stale entity headers from a previous
                // upload on this connection must not leak into the request.
                self.headers.set("Content-Type", "");
                self.headers.set("Content-Length", "");
            }
        }

        let wire = PendingRequest {
            method,
            target: &self.target,
            headers: &self.headers,
            body,
        }
        .encode();

        self.set_status(ConnectionStatus::Transferring);

        let read_timeout = self.read_timeout;
        let transport = match self.transport.as_mut() {
            Some(transport) => transport,
            None => {
                return Err(self.fail(ConnectionError::OrderError(
                    "you must be connected to transfer data".to_string(),
                )));
            }
        };
        let io_result = async {
            transport.write_all(&wire).await?;
            transport.flush().await?;
            recv_to_end(&mut *transport, read_timeout).await
        }
        .await;

        let raw = match io_result {
            Ok(raw) => raw,
            Err(e) => {
                if !self.connected {
                    // The transport was torn down under us; the read saw a
                    // dead stream, not a protocol failure.
                    self.last_error = Some("operation cancelled".to_string());
                    self.set_status(ConnectionStatus::Cancelled);
                    return Err(ConnectionError::IoFailure(
                        "operation cancelled".to_string(),
                    ));
                }
                return Err(self.fail(ConnectionError::IoFailure(e.to_string())));
            }
        };

        if raw.is_empty() {
            return Err(self.fail(ConnectionError::IoFailure(
                "connection closed before any response".to_string(),
            )));
        }

        let response = parse_response(&raw);
        if response.status >= 400 {
            self.last_error = Some(ConnectionError::HttpStatus(response.status).to_string());
            self.set_status(ConnectionStatus::Error);
        } else {
            self.set_status(ConnectionStatus::Finished);
        }
        Ok(response.body)
    }
}

/// Drain the transport to end-of-stream in fixed-size increments. A timeout,
/// when given, applies to each read.
async fn recv_to_end(
    transport: &mut Transport,
    read_timeout: Option<Duration>,
) -> io::Result<BytesMut> {
    let mut collected = BytesMut::with_capacity(READ_BLOCK);
    let mut block = [0u8; READ_BLOCK];
    loop {
        let read = match read_timeout {
            Some(limit) => timeout(limit, transport.read(&mut block))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "receive timed out"))??,
            None => transport.read(&mut block).await?,
        };
        if read == 0 {
            break;
        }
        collected.extend_from_slice(&block[..read]);
    }
    Ok(collected)
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if self.connecting || self.connected {
            self.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<ConnectionStatus>>);

    impl ConnectionDelegate for Recorder {
        fn update_status(&self, status: ConnectionStatus) {
            self.0.lock().unwrap().push(status);
        }
    }

    #[tokio::test]
    async fn transfer_before_connect_is_an_order_error() {
        let mut conn = Connection::new();
        match conn.download().await {
            Err(ConnectionError::OrderError(_)) => {}
            other => panic!("expected OrderError, got {:?}", other),
        }
        assert!(conn.last_error().is_some());
        match conn.upload(b"data").await {
            Err(ConnectionError::OrderError(_)) => {}
            other => panic!("expected OrderError, got {:?}", other),
        }
        match conn.store(b"data").await {
            Err(ConnectionError::OrderError(_)) => {}
            other => panic!("expected OrderError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unparsable_url_reports_error_and_resets() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut conn = Connection::with_delegate(recorder.clone());
        let result = conn.connect("telnet://example.com/").await;
        assert!(matches!(
            result,
            Err(ConnectionError::UnsupportedProtocol(_))
        ));
        assert!(!conn.is_connected());
        assert_eq!(conn.host(), "");
        assert_eq!(
            conn.last_error(),
            Some("unrecognised protocol telnet")
        );
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            &[ConnectionStatus::Error]
        );
    }

    #[test]
    fn disconnect_is_idempotent_when_idle() {
        let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
        let mut conn = Connection::with_delegate(recorder.clone());
        conn.disconnect();
        conn.disconnect();
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn last_error_survives_disconnect() {
        let mut conn = Connection::new();
        conn.last_error = Some("boom".to_string());
        conn.connected = true;
        conn.disconnect();
        assert_eq!(conn.last_error(), Some("boom"));
    }

    #[test]
    fn header_set_and_unset() {
        let mut conn = Connection::new();
        conn.header("X-Custom", "1");
        assert_eq!(conn.headers().get("X-Custom"), Some("1"));
        conn.header("X-Custom", "");
        assert_eq!(conn.headers().get("X-Custom"), None);
    }
}
