//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `TopsyClient` builds `HttpRequest`
//! values and parses `HttpResponse` values; whoever executes the round-trip
//! (a `Transport`, or the caller directly) only moves these values across the
//! network.
//!
//! Header names keep the case they arrived with. Lookups through
//! `ResponseHeaders::get` ignore case, since transports built on the `http`
//! crate hand back lower-cased names while raw responses do not.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiError;

    /// Verbs are matched after upper-casing, so `"get"` parses as `Get`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(ApiError::InvalidMethod(s.to_string())),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the query string for GET requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response headers in the order and case they were received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(Vec<(String, String)>);

impl ResponseHeaders {
    pub fn new(headers: Vec<(String, String)>) -> Self {
        Self(headers)
    }

    /// Case-insensitive lookup. A repeated header yields its last value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(String, String)>> for ResponseHeaders {
    fn from(headers: Vec<(String, String)>) -> Self {
        Self(headers)
    }
}

/// An HTTP response described as plain data, body still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    pub body: String,
}

impl HttpResponse {
    /// Build a response from a raw header block followed by the body, as
    /// produced by transports that return the whole message as text.
    ///
    /// The block ends at the first blank line (`\r\n` or `\n` line endings).
    /// The status line is dropped and each remaining line is split on its
    /// first `:`. A message with no blank line is all headers and no body.
    pub fn from_raw(status: u16, raw: &str) -> Self {
        let (head, body) = split_head(raw);
        let headers = head
            .lines()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(|line| match line.split_once(':') {
                Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
                None => (line.trim().to_string(), String::new()),
            })
            .collect();
        Self {
            status,
            headers: ResponseHeaders(headers),
            body: body.to_string(),
        }
    }
}

/// Split `raw` at the first pair of consecutive line breaks.
fn split_head(raw: &str) -> (&str, &str) {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(first) = line_break_at(bytes, i) {
            if let Some(second) = line_break_at(bytes, i + first) {
                return (&raw[..i], &raw[i + first + second..]);
            }
            i += first;
        } else {
            i += 1;
        }
    }
    (raw, "")
}

/// Length of the line break starting at `i`, if any.
fn line_break_at(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes.get(i..) {
        Some([b'\r', b'\n', ..]) => Some(2),
        Some([b'\n', ..]) => Some(1),
        _ => None,
    }
}
