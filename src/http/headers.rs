//! Fixed response header policy
//!
//! Every response the handler produces leaves through [`apply_fixed_headers`]:
//! caching is disabled and cross-origin requests are allowed, on success and
//! error paths alike.

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, EXPIRES, PRAGMA,
};

pub static FIXED_HEADERS: [(HeaderName, &str); 6] = [
    (CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (PRAGMA, "no-cache"),
    (EXPIRES, "0"),
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
    (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
];

/// Methods the router answers, advertised on OPTIONS and 405
pub const ALLOWED_METHODS: &str = "GET, HEAD, POST, OPTIONS";

/// Insert the six fixed headers, replacing any value already present
pub fn apply_fixed_headers(headers: &mut HeaderMap) {
    for (name, value) in &FIXED_HEADERS {
        headers.insert(name.clone(), HeaderValue::from_static(*value));
    }
}
