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

//! C FFI for tether core. Connections are identified by opaque numeric
//! handles; every call is blocking and serialized per connection. All string
//! parameters are UTF-8 NUL-terminated. Returned strings are freed with
//! tether_free_string, returned buffers with tether_free_buffer.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use libc::{c_char, c_int, c_void, size_t};

use tether_core::{Connection, ConnectionDelegate, ConnectionStatus, SignatureMethod};

/// Status callback: (status code, user_data). Codes: -1 error, 1 resolving,
/// 2 connecting, 3 connected, 4 transferring, 5 finished, 6 closed,
/// 7 cancelled. May be invoked from a runtime worker thread.
pub type StatusCallback = extern "C" fn(c_int, *mut c_void);

fn status_code(status: ConnectionStatus) -> c_int {
    match status {
        ConnectionStatus::Error => -1,
        ConnectionStatus::Resolving => 1,
        ConnectionStatus::Connecting => 2,
        ConnectionStatus::Connected => 3,
        ConnectionStatus::Transferring => 4,
        ConnectionStatus::Finished => 5,
        ConnectionStatus::Closed => 6,
        ConnectionStatus::Cancelled => 7,
    }
}

/// Bridges status transitions to a C callback. user_data is carried as usize
/// so the delegate is Send + Sync; the C side is responsible for the pointed-
/// to data staying valid for the connection's lifetime.
struct CallbackDelegate {
    callback: StatusCallback,
    user_data: usize,
}

impl ConnectionDelegate for CallbackDelegate {
    fn update_status(&self, status: ConnectionStatus) {
        (self.callback)(status_code(status), self.user_data as *mut c_void);
    }
}

/// Registry of live connections plus the shared tokio runtime driving all
/// transfers.
struct Registry {
    runtime: tokio::runtime::Runtime,
    connections: RwLock<HashMap<u64, Arc<Mutex<Connection>>>>,
    next_handle: AtomicU64,
}

fn registry() -> &'static Registry {
    static REGISTRY: once_cell::sync::OnceCell<Registry> = once_cell::sync::OnceCell::new();
    REGISTRY.get_or_init(|| {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");
        Registry {
            runtime,
            connections: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        }
    })
}

fn insert_connection(conn: Connection) -> u64 {
    let handle = registry().next_handle.fetch_add(1, Ordering::Relaxed);
    if let Ok(mut guard) = registry().connections.write() {
        guard.insert(handle, Arc::new(Mutex::new(conn)));
    }
    handle
}

fn connection(handle: u64) -> Option<Arc<Mutex<Connection>>> {
    registry()
        .connections
        .read()
        .ok()
        .and_then(|guard| guard.get(&handle).cloned())
}

fn ptr_to_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string()) }
}

/// Hand a body buffer to C: pointer + length, freed with tether_free_buffer.
fn buffer_to_c(body: Vec<u8>, length: *mut size_t) -> *mut u8 {
    if !length.is_null() {
        unsafe { *length = body.len() }
    }
    let mut boxed = body.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    std::mem::forget(boxed);
    ptr
}

/// Version string (static, do not free).
#[no_mangle]
pub extern "C" fn tether_version() -> *const c_char {
    b"0.1.0\0".as_ptr() as *const c_char
}

/// Create a connection without a delegate. Returns its handle.
#[no_mangle]
pub extern "C" fn tether_connection_new() -> u64 {
    insert_connection(Connection::new())
}

/// Create a connection whose status transitions are reported to `callback`.
#[no_mangle]
pub extern "C" fn tether_connection_new_with_delegate(
    callback: StatusCallback,
    user_data: *mut c_void,
) -> u64 {
    let delegate = Arc::new(CallbackDelegate {
        callback,
        user_data: user_data as usize,
    });
    insert_connection(Connection::with_delegate(delegate))
}

/// Connect to a URL. Returns true on success; on failure the message is
/// available from tether_connection_last_error.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_connect(handle: u64, url: *const c_char) -> bool {
    let url = match ptr_to_str(url) {
        Some(url) => url,
        None => return false,
    };
    let conn = match connection(handle) {
        Some(conn) => conn,
        None => return false,
    };
    let mut guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return false,
    };
    registry().runtime.block_on(guard.connect(&url)).is_ok()
}

/// Disconnect. A no-op when not connected.
#[no_mangle]
pub extern "C" fn tether_connection_disconnect(handle: u64) {
    if let Some(conn) = connection(handle) {
        if let Ok(mut guard) = conn.lock() {
            guard.disconnect();
        }
    }
}

/// GET the connected URL. Returns the body (free with tether_free_buffer)
/// and writes its length, or NULL on failure. A body is returned even for
/// HTTP statuses >= 400; check tether_connection_last_error.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_download(handle: u64, length: *mut size_t) -> *mut u8 {
    let conn = match connection(handle) {
        Some(conn) => conn,
        None => return ptr::null_mut(),
    };
    let mut guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return ptr::null_mut(),
    };
    match registry().runtime.block_on(guard.download()) {
        Ok(body) => buffer_to_c(body, length),
        Err(_) => ptr::null_mut(),
    }
}

unsafe fn transfer_with_body(
    handle: u64,
    data: *const u8,
    length: *mut size_t,
    store: bool,
) -> *mut u8 {
    if data.is_null() || length.is_null() {
        return ptr::null_mut();
    }
    let body = std::slice::from_raw_parts(data, *length);
    let conn = match connection(handle) {
        Some(conn) => conn,
        None => return ptr::null_mut(),
    };
    let mut guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return ptr::null_mut(),
    };
    let result = if store {
        registry().runtime.block_on(guard.store(body))
    } else {
        registry().runtime.block_on(guard.upload(body))
    };
    match result {
        Ok(response) => buffer_to_c(response, length),
        Err(_) => ptr::null_mut(),
    }
}

/// POST `*length` bytes of data to the connected URL. On success returns the
/// response body and overwrites `*length` with its size.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_upload(
    handle: u64,
    data: *const u8,
    length: *mut size_t,
) -> *mut u8 {
    transfer_with_body(handle, data, length, false)
}

/// Like tether_connection_upload but uses the PUT verb.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_store(
    handle: u64,
    data: *const u8,
    length: *mut size_t,
) -> *mut u8 {
    transfer_with_body(handle, data, length, true)
}

/// Set a request header. A NULL or empty value unsets it.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_header(
    handle: u64,
    name: *const c_char,
    value: *const c_char,
) {
    let name = match ptr_to_str(name) {
        Some(name) => name,
        None => return,
    };
    let value = ptr_to_str(value).unwrap_or_default();
    if let Some(conn) = connection(handle) {
        if let Ok(mut guard) = conn.lock() {
            guard.header(&name, &value);
        }
    }
}

/// Install OAuth credentials; all four secrets are replaced together. NULL
/// pointers mean absent. sig_method: 0 PLAINTEXT, 1 HMAC-SHA1. Returns false
/// for an unknown method or handle.
#[no_mangle]
pub unsafe extern "C" fn tether_connection_oauth_credentials(
    handle: u64,
    consumer_key: *const c_char,
    consumer_secret: *const c_char,
    token: *const c_char,
    token_secret: *const c_char,
    sig_method: c_int,
) -> bool {
    let method = match sig_method {
        0 => SignatureMethod::Plaintext,
        1 => SignatureMethod::HmacSha1,
        _ => return false,
    };
    let consumer_key = ptr_to_str(consumer_key);
    let consumer_secret = ptr_to_str(consumer_secret);
    let token = ptr_to_str(token);
    let token_secret = ptr_to_str(token_secret);
    let conn = match connection(handle) {
        Some(conn) => conn,
        None => return false,
    };
    let mut guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return false,
    };
    guard.oauth_credentials(
        consumer_key.as_deref(),
        consumer_secret.as_deref(),
        token.as_deref(),
        token_secret.as_deref(),
        method,
    );
    true
}

/// The connection's most recent error message, or NULL when no operation has
/// failed. Caller frees with tether_free_string.
#[no_mangle]
pub extern "C" fn tether_connection_last_error(handle: u64) -> *mut c_char {
    let conn = match connection(handle) {
        Some(conn) => conn,
        None => return ptr::null_mut(),
    };
    let guard = match conn.lock() {
        Ok(guard) => guard,
        Err(_) => return ptr::null_mut(),
    };
    match guard.last_error() {
        Some(message) => CString::new(message)
            .map(|s| s.into_raw())
            .unwrap_or(ptr::null_mut()),
        None => ptr::null_mut(),
    }
}

/// Release a connection. Disconnects first when still connected.
#[no_mangle]
pub extern "C" fn tether_connection_free(handle: u64) {
    if let Ok(mut guard) = registry().connections.write() {
        guard.remove(&handle);
    }
}

/// Free a string returned by tether_connection_last_error. No-op for NULL.
#[no_mangle]
pub unsafe extern "C" fn tether_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}

/// Free a buffer returned by download/upload/store. `length` must be the
/// value the call wrote back. No-op for NULL.
#[no_mangle]
pub unsafe extern "C" fn tether_free_buffer(ptr: *mut u8, length: size_t) {
    if !ptr.is_null() {
        let _ = Vec::from_raw_parts(ptr, length, length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_distinct_and_freeable() {
        let a = tether_connection_new();
        let b = tether_connection_new();
        assert_ne!(a, b);
        tether_connection_free(a);
        tether_connection_free(b);
        assert!(connection(a).is_none());
    }

    #[test]
    fn connect_with_bad_url_reports_error() {
        let handle = tether_connection_new();
        let url = CString::new("telnet://example.com/").unwrap();
        let ok = unsafe { tether_connection_connect(handle, url.as_ptr()) };
        assert!(!ok);
        let err = tether_connection_last_error(handle);
        assert!(!err.is_null());
        let message = unsafe { CStr::from_ptr(err) }.to_str().unwrap().to_string();
        assert!(message.contains("telnet"));
        unsafe { tether_free_string(err) };
        tether_connection_free(handle);
    }

    #[test]
    fn download_on_unknown_handle_is_null() {
        let mut length: size_t = 0;
        let ptr = unsafe { tether_connection_download(u64::MAX, &mut length) };
        assert!(ptr.is_null());
    }

    #[test]
    fn buffer_round_trip() {
        let mut length: size_t = 0;
        let ptr = buffer_to_c(b"abc".to_vec(), &mut length);
        assert_eq!(length, 3);
        assert!(!ptr.is_null());
        unsafe { tether_free_buffer(ptr, length) };
    }
}
