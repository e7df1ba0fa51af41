use axum::http::HeaderValue;
use axum::response::Response;
use http::header::{CACHE_CONTROL, EXPIRES, PRAGMA, REFERRER_POLICY, X_FRAME_OPTIONS};

/// Cache-Control directives
#[derive(Debug, Clone, Default)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub must_revalidate: bool,
    pub private: bool,
}

impl CacheControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    pub fn no_store(mut self) -> Self {
        self.no_store = true;
        self
    }

    pub fn must_revalidate(mut self) -> Self {
        self.must_revalidate = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Convert to HeaderValue
    pub fn to_header_value(&self) -> HeaderValue {
        let parts: Vec<&str> = [
            (self.no_cache, "no-cache"),
            (self.no_store, "no-store"),
            (self.must_revalidate, "must-revalidate"),
            (self.private, "private"),
        ]
        .into_iter()
        .filter_map(|(set, directive)| set.then_some(directive))
        .collect();

        HeaderValue::from_str(&parts.join(", ")).unwrap_or(HeaderValue::from_static(""))
    }
}

/// Headers attached to every page and redirect that may carry a token
#[derive(Debug, Clone, Default)]
pub struct PageHeaders {
    cache_control: CacheControl,
    deny_framing: bool,
}

impl PageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_control(mut self, cache_control: CacheControl) -> Self {
        self.cache_control = cache_control;
        self
    }

    /// Forbid rendering inside frames
    pub fn deny_framing(mut self) -> Self {
        self.deny_framing = true;
        self
    }

    /// Apply headers to a response
    pub fn apply<B>(&self, response: &mut Response<B>) {
        let headers = response.headers_mut();

        headers.insert(CACHE_CONTROL, self.cache_control.to_header_value());
        if self.cache_control.no_cache {
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        }
        if self.cache_control.no_store || self.cache_control.no_cache {
            headers.insert(EXPIRES, HeaderValue::from_static("0"));
        }
        if self.deny_framing {
            headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
            headers.insert(REFERRER_POLICY, HeaderValue::from_static("no-referrer"));
        }
    }
}

/// Common header presets
pub mod presets {
    use super::*;

    /// Never cache, never frame
    pub fn auth_page() -> PageHeaders {
        PageHeaders::new()
            .cache_control(
                CacheControl::new()
                    .no_cache()
                    .no_store()
                    .must_revalidate()
                    .private(),
            )
            .deny_framing()
    }
}
