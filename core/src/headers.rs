/*
 * headers.rs
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

//! Ordered key/value collection used for HTTP headers and OAuth parameters.
//!
//! Keys are unique and case-sensitive as stored; iteration is always in
//! ascending key order, which is what makes the OAuth canonical parameter
//! string come out sorted without a separate sort pass.

use std::collections::BTreeMap;

/// Wire format for [`HeaderMap::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderFormat {
    /// `Name: Value\r\n` per entry, e.g. an HTTP header block.
    HeaderBlock,
    /// `name=value` pairs joined by `&`, no trailing separator.
    QueryPairs,
}

/// Ordered string map. Setting an empty value removes the entry.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    entries: BTreeMap<String, String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Look up a value by exact key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    /// Insert or replace an entry. An empty value unsets the key.
    pub fn set(&mut self, key: &str, value: &str) {
        if key.is_empty() {
            return;
        }
        if value.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), value.to_string());
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    /// All values, ordered by their keys.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|v| v.as_str())
    }

    /// `(key, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize the whole collection in the given wire format.
    pub fn render(&self, format: RenderFormat) -> String {
        let mut out = String::new();
        for (i, (key, value)) in self.entries.iter().enumerate() {
            match format {
                RenderFormat::HeaderBlock => {
                    out.push_str(key);
                    out.push_str(": ");
                    out.push_str(value);
                    out.push_str("\r\n");
                }
                RenderFormat::QueryPairs => {
                    if i > 0 {
                        out.push('&');
                    }
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
            }
        }
        out
    }
}
