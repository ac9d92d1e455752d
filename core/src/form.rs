/*
 * form.rs
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

//! Decoding of `application/x-www-form-urlencoded` bodies.

use percent_encoding::percent_decode_str;

use crate::headers::HeaderMap;

/// Parse a urlencoded form body into a parameter map. Values are
/// percent-decoded; names are taken as-is. A pair without `=` maps the name
/// to an empty value.
pub fn parse(form: &str) -> HeaderMap {
    let mut params = HeaderMap::new();
    for pair in form.split('&') {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((name, value)) => {
                let decoded = percent_decode_str(value).decode_utf8_lossy();
                params.set(name, &decoded);
            }
            None => params.set(pair, ""),
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_pairs() {
        let params = parse("a=1&b=2");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.get("b"), Some("2"));
        assert_eq!(params.count(), 2);
    }

    #[test]
    fn values_are_percent_decoded() {
        let params = parse("greeting=hello%20world&path=%2Ftmp");
        assert_eq!(params.get("greeting"), Some("hello world"));
        assert_eq!(params.get("path"), Some("/tmp"));
    }

    #[test]
    fn names_are_not_decoded() {
        let params = parse("a%20b=c");
        assert_eq!(params.get("a%20b"), Some("c"));
        assert_eq!(params.get("a b"), None);
    }

    #[test]
    fn empty_segments_are_skipped() {
        let params = parse("&a=1&&b=2&");
        assert_eq!(params.count(), 2);
    }

    #[test]
    fn empty_input_yields_empty_map() {
        assert!(parse("").is_empty());
    }
}
