/*
 * response.rs
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

//! HTTP/1.1 response parsing: status line, header block, body framing.
//!
//! The parser runs once over the fully received byte stream (the connection
//! drains the transport to end-of-stream first). Body length resolution, in
//! priority order: Content-Length, chunked transfer encoding, everything to
//! end of input. All cursor movement is bounds-checked; truncated input
//! yields a truncated body rather than a panic.

use crate::headers::HeaderMap;

/// A fully parsed response. `status` is 0 when no status line was found.
#[derive(Debug)]
pub struct ParsedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Locate the line starting at `cursor`: returns (end of line content,
/// start of the next line). Accepts `\r\n` or bare `\n`; a final line
/// without a terminator runs to end of input.
fn next_line(raw: &[u8], cursor: usize) -> (usize, usize) {
    match raw[cursor..].iter().position(|&b| b == b'\n') {
        Some(off) => {
            let nl = cursor + off;
            let end = if nl > cursor && raw[nl - 1] == b'\r' {
                nl - 1
            } else {
                nl
            };
            (end, nl + 1)
        }
        None => (raw.len(), raw.len()),
    }
}

/// Parse a complete response buffer. Malformed lines are skipped rather than
/// failing the whole response; callers decide what to do with status 0.
pub fn parse_response(raw: &[u8]) -> ParsedResponse {
    let mut status: u16 = 0;
    let mut headers = HeaderMap::new();
    let mut cursor = 0usize;
    let mut body_start = raw.len();

    while cursor < raw.len() {
        let (line_end, next) = next_line(raw, cursor);
        let line = &raw[cursor..line_end];
        if line.is_empty() {
            // Blank line: payload follows.
            body_start = next;
            break;
        }
        if line.starts_with(b"HTTP/") {
            let text = String::from_utf8_lossy(line);
            status = text
                .split_whitespace()
                .nth(1)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(0);
        } else if let Some(colon) = line.iter().position(|&b| b == b':') {
            let name = String::from_utf8_lossy(&line[..colon]);
            let rest = &line[colon + 1..];
            // One leading space after the colon is separator, not value.
            let value_bytes = match rest.first() {
                Some(b' ') => &rest[1..],
                _ => rest,
            };
            let value = String::from_utf8_lossy(value_bytes);
            headers.set(&name, &value);
        }
        cursor = next;
    }

    let body = if let Some(cl) = headers
        .get("Content-Length")
        .and_then(|v| v.trim().parse::<usize>().ok())
    {
        let end = body_start.saturating_add(cl).min(raw.len());
        raw[body_start..end].to_vec()
    } else if headers
        .get("Transfer-Encoding")
        .map(|v| v.contains("chunked"))
        .unwrap_or(false)
    {
        decode_chunked(raw, body_start)
    } else {
        raw[body_start..].to_vec()
    };

    ParsedResponse {
        status,
        headers,
        body,
    }
}

/// Reassemble a chunked body starting at `cursor`: hex size line, that many
/// data bytes, CRLF separator, repeated until a zero-size chunk.
fn decode_chunked(raw: &[u8], mut cursor: usize) -> Vec<u8> {
    let mut out = Vec::new();
    while cursor < raw.len() {
        let (line_end, next) = next_line(raw, cursor);
        let line = String::from_utf8_lossy(&raw[cursor..line_end]);
        let hex = line.split(';').next().unwrap_or("").trim();
        let size = match u64::from_str_radix(hex, 16) {
            Ok(n) => n as usize,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        cursor = next;
        let end = cursor.saturating_add(size).min(raw.len());
        out.extend_from_slice(&raw[cursor..end]);
        cursor = end;
        if raw.get(cursor) == Some(&b'\r') {
            cursor += 1;
        }
        if raw.get(cursor) == Some(&b'\n') {
            cursor += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_headers() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nServer: t\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.status, 200);
        assert_eq!(r.headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(r.headers.get("Server"), Some("t"));
        assert!(r.body.is_empty());
    }

    #[test]
    fn content_length_cuts_trailing_garbage() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\nhello worldGARBAGE";
        let r = parse_response(raw);
        assert_eq!(r.body, b"hello world");
    }

    #[test]
    fn content_length_longer_than_input_is_bounded() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort";
        let r = parse_response(raw);
        assert_eq!(r.body, b"short");
    }

    #[test]
    fn chunked_single_chunk() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.body, b"hello");
        assert_eq!(r.body.len(), 5);
    }

    #[test]
    fn chunked_multiple_chunks() {
        let raw =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.body, b"hello world");
    }

    #[test]
    fn chunk_size_extensions_are_ignored() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5;name=x\r\nhello\r\n0\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.body, b"hello");
    }

    #[test]
    fn no_framing_reads_to_end_of_input() {
        let raw = b"HTTP/1.1 200 OK\r\nServer: t\r\n\r\neverything until close";
        let r = parse_response(raw);
        assert_eq!(r.body, b"everything until close");
    }

    #[test]
    fn content_length_takes_priority_over_chunked() {
        let raw =
            b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nTransfer-Encoding: chunked\r\n\r\nbodyrest";
        let r = parse_response(raw);
        assert_eq!(r.body, b"body");
    }

    #[test]
    fn bare_lf_line_endings() {
        let raw = b"HTTP/1.1 204 No Content\nServer: t\n\n";
        let r = parse_response(raw);
        assert_eq!(r.status, 204);
        assert_eq!(r.headers.get("Server"), Some("t"));
    }

    #[test]
    fn error_status_still_delivers_body() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 16\r\n\r\n{\"error\":\"gone\"}";
        let r = parse_response(raw);
        assert_eq!(r.status, 404);
        assert_eq!(r.body, b"{\"error\":\"gone\"}");
    }

    #[test]
    fn value_loses_exactly_one_leading_space() {
        let raw = b"HTTP/1.1 200 OK\r\nX-Padded:  two\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.headers.get("X-Padded"), Some(" two"));
    }

    #[test]
    fn missing_status_line_yields_zero() {
        let raw = b"Server: odd\r\n\r\nbody";
        let r = parse_response(raw);
        assert_eq!(r.status, 0);
        assert_eq!(r.headers.get("Server"), Some("odd"));
        assert_eq!(r.body, b"body");
    }

    #[test]
    fn lines_without_colon_are_skipped() {
        let raw = b"HTTP/1.1 200 OK\r\nnot a header\r\nServer: t\r\n\r\n";
        let r = parse_response(raw);
        assert_eq!(r.headers.count(), 1);
    }
}
