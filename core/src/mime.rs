/*
 * mime.rs
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

//! MIME encoding of attachments: single part or multipart/mixed, base64
//! transfer encoding. Encodes to bytes, or straight onto a connected
//! `Connection` as an upload with the matching MIME headers set.

use std::sync::atomic::{AtomicU64, Ordering};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::connection::Connection;
use crate::error::ConnectionError;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One attachment to encode.
pub struct Attachment {
    /// File name, when the part should carry a Content-Disposition.
    pub filename: Option<String>,
    /// Content type of the part; `application/octet-stream` when absent.
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Per-process message sequence, part of every boundary.
static MESSAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A boundary that never collides within the process: monotonic sequence,
/// process id, and four random bytes.
fn boundary() -> Result<String, ConnectionError> {
    let sequence = MESSAGE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    let mut random = [0u8; 4];
    getrandom::getrandom(&mut random)
        .map_err(|e| ConnectionError::IoFailure(e.to_string()))?;
    Ok(format!(
        "{}.{}.{:02x}{:02x}{:02x}{:02x}@tether",
        sequence,
        std::process::id(),
        random[0],
        random[1],
        random[2],
        random[3]
    ))
}

/// Base64 with lines folded at 76 characters, CRLF terminated.
fn base64_body(data: &[u8]) -> String {
    let encoded = BASE64.encode(data);
    let mut out = String::with_capacity(encoded.len() + 2 * (encoded.len() / 76 + 1));
    for chunk in encoded.as_bytes().chunks(76) {
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

fn part_headers(attachment: &Attachment) -> String {
    let mut headers = format!(
        "Content-Type: {}\r\nContent-Transfer-Encoding: base64\r\n",
        attachment.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    );
    if let Some(filename) = &attachment.filename {
        headers.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{}\"\r\n",
            filename
        ));
    }
    headers
}

/// Body of a multipart/mixed message: preamble, one delimited part per
/// attachment, closing delimiter.
fn multipart_body(attachments: &[Attachment], boundary: &str) -> String {
    let mut body = String::from("This is a message in MIME format.\r\n\r\n");
    for attachment in attachments {
        body.push_str(&format!("--{}\r\n{}\r\n", boundary, part_headers(attachment)));
        body.push_str(&base64_body(&attachment.data));
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{}--\r\n", boundary));
    body
}

/// Encode attachments as a complete MIME message, headers included. One
/// attachment yields a single part; several yield multipart/mixed.
pub fn encode(attachments: &[Attachment]) -> Result<Vec<u8>, ConnectionError> {
    match attachments {
        [] => Err(ConnectionError::OrderError(
            "no attachments to encode".to_string(),
        )),
        [single] => {
            let message = format!(
                "MIME-Version: 1.0\r\n{}\r\n{}",
                part_headers(single),
                base64_body(&single.data)
            );
            Ok(message.into_bytes())
        }
        several => {
            let boundary = boundary()?;
            let message = format!(
                "MIME-Version: 1.0\r\nContent-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n{}",
                boundary,
                multipart_body(several, &boundary)
            );
            Ok(message.into_bytes())
        }
    }
}

/// Encode attachments and upload them on an already-connected connection.
/// The MIME headers go into the HTTP header set; the body is the encoded
/// content. Returns the response body from the upload.
pub async fn encode_to_connection(
    attachments: &[Attachment],
    connection: &mut Connection,
) -> Result<Vec<u8>, ConnectionError> {
    match attachments {
        [] => Err(ConnectionError::OrderError(
            "no attachments to encode".to_string(),
        )),
        [single] => {
            connection.header("MIME-Version", "1.0");
            connection.header(
                "Content-Type",
                single.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
            );
            connection.header("Content-Transfer-Encoding", "base64");
            let body = base64_body(&single.data);
            connection.upload(body.as_bytes()).await
        }
        several => {
            let boundary = boundary()?;
            connection.header("MIME-Version", "1.0");
            connection.header(
                "Content-Type",
                &format!("multipart/mixed; boundary=\"{}\"", boundary),
            );
            let body = multipart_body(several, &boundary);
            connection.upload(body.as_bytes()).await
        }
    }
}
