/*
 * url.rs
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

//! URL decomposition: scheme, host, port, target path and query.
//!
//! No percent-decoding happens here; the target is sent on the wire exactly
//! as given.

use crate::error::ConnectionError;

/// Recognised URL schemes. Anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Ftp,
    Gopher,
}

impl Scheme {
    /// Parse an already lower-cased scheme name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "http" => Some(Scheme::Http),
            "https" => Some(Scheme::Https),
            "ftp" => Some(Scheme::Ftp),
            "gopher" => Some(Scheme::Gopher),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ftp => "ftp",
            Scheme::Gopher => "gopher",
        }
    }

    /// Well-known port used when the URL does not carry an explicit one.
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            Scheme::Ftp => 21,
            Scheme::Gopher => 70,
        }
    }

    /// Whether HTTP transfer semantics apply (request framing, response parse).
    pub fn is_http(&self) -> bool {
        matches!(self, Scheme::Http | Scheme::Https)
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decomposed URL. `target` is the path including any query string; `query`
/// is the part after `?`, without the `?` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub target: String,
    pub query: Option<String>,
}

/// Parse a URL string. A missing scheme defaults to http, a missing path to
/// `/`. An explicit port that is out of range or non-numeric is ignored with
/// a warning and the scheme default kept.
pub fn parse(url: &str) -> Result<ParsedUrl, ConnectionError> {
    let (scheme_name, rest) = match url.find("://") {
        Some(i) => (url[..i].to_ascii_lowercase(), &url[i + 3..]),
        None => ("http".to_string(), url),
    };
    let scheme = Scheme::parse(&scheme_name).ok_or_else(|| {
        ConnectionError::UnsupportedProtocol(format!("unrecognised protocol {}", scheme_name))
    })?;

    let (authority, path_rest) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };
    if authority.is_empty() {
        return Err(ConnectionError::UnparsableUrl(url.to_string()));
    }

    let mut port = scheme.default_port();
    let host = if authority.starts_with('[') {
        // IPv6 literal; a colon only separates a port when no ] follows it.
        match authority.rfind(':') {
            Some(i) if !authority[i..].contains(']') => {
                port = parse_port(&authority[i + 1..], port);
                &authority[..i]
            }
            _ => authority,
        }
    } else {
        match authority.rfind(':') {
            Some(i) => {
                port = parse_port(&authority[i + 1..], port);
                &authority[..i]
            }
            None => authority,
        }
    };
    if host.is_empty() {
        return Err(ConnectionError::UnparsableUrl(url.to_string()));
    }

    let target = if path_rest.is_empty() {
        "/".to_string()
    } else {
        path_rest.to_string()
    };
    let query = target.find('?').map(|i| target[i + 1..].to_string());

    Ok(ParsedUrl {
        scheme,
        host: host.to_string(),
        port,
        target,
        query,
    })
}

/// Parse an explicit port, falling back to `default` (with a warning) when
/// the value is non-numeric or exceeds 65535.
fn parse_port(s: &str, default: u16) -> u16 {
    match s.parse::<u32>() {
        Ok(p) if p <= u16::MAX as u32 => p as u16,
        Ok(p) => {
            log::warn!("port {} > 65535; defaulting to {}", p, default);
            default
        }
        Err(_) => {
            log::warn!("invalid port {:?}; defaulting to {}", s, default);
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url() {
        let u = parse("https://example.com:8443/a/b?c=d").unwrap();
        assert_eq!(u.scheme, Scheme::Https);
        assert_eq!(u.host, "example.com");
        assert_eq!(u.port, 8443);
        assert_eq!(u.target, "/a/b?c=d");
        assert_eq!(u.query.as_deref(), Some("c=d"));
    }

    #[test]
    fn missing_scheme_defaults_to_http() {
        let u = parse("example.com/index.html").unwrap();
        assert_eq!(u.scheme, Scheme::Http);
        assert_eq!(u.host, "example.com");
        assert_eq!(u.port, 80);
        assert_eq!(u.target, "/index.html");
    }

    #[test]
    fn missing_path_defaults_to_slash() {
        let u = parse("http://example.com").unwrap();
        assert_eq!(u.target, "/");
        assert_eq!(u.query, None);
    }

    #[test]
    fn scheme_is_lowercased() {
        let u = parse("HTTP://example.com/").unwrap();
        assert_eq!(u.scheme, Scheme::Http);
        let u = parse("hTtPs://example.com/").unwrap();
        assert_eq!(u.scheme, Scheme::Https);
    }

    #[test]
    fn default_ports_per_scheme() {
        assert_eq!(parse("http://h/").unwrap().port, 80);
        assert_eq!(parse("https://h/").unwrap().port, 443);
        assert_eq!(parse("ftp://h/").unwrap().port, 21);
        assert_eq!(parse("gopher://h/").unwrap().port, 70);
    }

    #[test]
    fn unrecognised_scheme_is_an_error() {
        match parse("telnet://example.com/") {
            Err(ConnectionError::UnsupportedProtocol(m)) => {
                assert_eq!(m, "unrecognised protocol telnet")
            }
            other => panic!("expected UnsupportedProtocol, got {:?}", other),
        }
    }

    #[test]
    fn ipv6_literal_with_port() {
        let u = parse("http://[::1]:8080/x").unwrap();
        assert_eq!(u.host, "[::1]");
        assert_eq!(u.port, 8080);
        assert_eq!(u.target, "/x");
    }

    #[test]
    fn ipv6_literal_without_port_keeps_default() {
        let u = parse("http://[2001:db8::1]/x").unwrap();
        assert_eq!(u.host, "[2001:db8::1]");
        assert_eq!(u.port, 80);
    }

    #[test]
    fn out_of_range_port_keeps_default() {
        let u = parse("http://example.com:70000/").unwrap();
        assert_eq!(u.port, 80);
        let u = parse("https://example.com:99999/").unwrap();
        assert_eq!(u.port, 443);
    }

    #[test]
    fn non_numeric_port_keeps_default() {
        let u = parse("http://example.com:abc/").unwrap();
        assert_eq!(u.host, "example.com");
        assert_eq!(u.port, 80);
    }

    #[test]
    fn empty_host_is_unparsable() {
        assert!(matches!(
            parse("http:///nothing"),
            Err(ConnectionError::UnparsableUrl(_))
        ));
    }

    #[test]
    fn query_without_value_pairs() {
        let u = parse("http://h/p?flag").unwrap();
        assert_eq!(u.target, "/p?flag");
        assert_eq!(u.query.as_deref(), Some("flag"));
    }
}
