//! Caching contracts for SPA responses.
//!
//! Hashed build assets are cached for a year and never revalidated. The entry
//! document points at the current asset filenames, so no cache may keep it.

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, PRAGMA},
    HeaderMap, HeaderName, HeaderValue,
};

pub const IMMUTABLE_CACHE_CONTROL: &str = "max-age=31536000, immutable";
pub const NO_STORE_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Content-hashed asset: any cached copy is either current or unreachable.
    Immutable,
    /// Entry document: every layer (CDN, proxy, browser) must refetch.
    NoStore,
}

impl CachePolicy {
    pub fn headers(self) -> &'static [(HeaderName, HeaderValue)] {
        static IMMUTABLE: [(HeaderName, HeaderValue); 1] = [(
            CACHE_CONTROL,
            HeaderValue::from_static(IMMUTABLE_CACHE_CONTROL),
        )];
        static NO_STORE: [(HeaderName, HeaderValue); 3] = [
            (
                CACHE_CONTROL,
                HeaderValue::from_static(NO_STORE_CACHE_CONTROL),
            ),
            (PRAGMA, HeaderValue::from_static("no-cache")),
            (EXPIRES, HeaderValue::from_static("0")),
        ];

        match self {
            CachePolicy::Immutable => &IMMUTABLE,
            CachePolicy::NoStore => &NO_STORE,
        }
    }

    /// Writes the policy's headers, replacing whatever was there.
    pub fn apply(self, headers: &mut HeaderMap) {
        for (name, value) in self.headers() {
            headers.insert(name.clone(), value.clone());
        }
    }
}

impl std::fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let output = match self {
            CachePolicy::Immutable => "immutable",
            CachePolicy::NoStore => "no-store",
        };
        write!(f, "{}", output)
    }
}
