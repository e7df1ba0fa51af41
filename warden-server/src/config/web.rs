//! Host and cookie settings of the login pages

use confique::Config;
use url::Url;

#[derive(Debug, Config, Clone)]
pub struct HostsConfig {
    /// Public base URL of this service (default: http://localhost:7780)
    #[config(env = "WARDEN_HOSTS_AUTH", default = "http://localhost:7780")]
    pub auth: String,

    /// Public base URL of the website users land on after SSO (default: http://localhost:8080)
    #[config(env = "WARDEN_HOSTS_WEBSITE", default = "http://localhost:8080")]
    pub website: String,
}

impl HostsConfig {
    /// Returns true if a post-login redirect target is safe to follow.
    ///
    /// Absolute URLs must be on one of the configured hosts. Paths are resolved against the
    /// auth host the way a browser would, so `//host` or `/\host` still has to name a configured
    /// host.
    pub fn is_allowed_redirect(&self, target: &str) -> bool {
        let resolved = match Url::parse(target) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) if target.starts_with('/') => {
                match Url::parse(&self.auth).and_then(|base| base.join(target)) {
                    Ok(url) => url,
                    Err(_) => return false,
                }
            }
            Err(_) => return false,
        };

        [&self.auth, &self.website]
            .into_iter()
            .filter_map(|host| Url::parse(host).ok())
            .any(|host| host.origin() == resolved.origin())
    }
}

#[derive(Debug, Config, Clone)]
pub struct CookieConfig {
    /// Name of the session cookie (default: access_token)
    #[config(env = "WARDEN_COOKIE_NAME", default = "access_token")]
    pub name: String,

    /// Adds the Secure attribute to the session cookie (default: false)
    #[config(env = "WARDEN_COOKIE_SECURE", default = false)]
    pub secure: bool,

    /// Optional Domain attribute of the session cookie
    #[config(env = "WARDEN_COOKIE_DOMAIN")]
    pub domain: Option<String>,
}

impl CookieConfig {
    /// Builds a Set-Cookie value holding `token` for `max_age` seconds
    pub fn session(&self, token: &str, max_age: i64) -> String {
        let secure = if self.secure { " Secure;" } else { "" };
        let domain = self
            .domain
            .as_deref()
            .map(|domain| format!(" Domain={domain};"))
            .unwrap_or_default();

        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax;{}{} Max-Age={}",
            self.name,
            token,
            secure,
            domain,
            max_age.max(0)
        )
    }

    /// Builds a Set-Cookie value that removes the session cookie
    pub fn cleared(&self) -> String {
        self.session("", 0)
    }
}
