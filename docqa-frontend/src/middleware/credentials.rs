//! Cookie-backed session credential attached to every backend request.
//!
//! The backend manages the session through an opaque cookie. This store is
//! installed as the reqwest client's cookie provider, so call sites never pass
//! credentials explicitly. Cookies are only accepted from and sent to the
//! configured backend host.

use cookie::time::OffsetDateTime;
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

pub struct SessionCredentials {
    host: Option<String>,
    cookies: RwLock<BTreeMap<String, String>>,
}

impl SessionCredentials {
    pub fn new(backend_url: &Url) -> Self {
        Self {
            host: backend_url.host_str().map(str::to_string),
            cookies: RwLock::new(BTreeMap::new()),
        }
    }

    /// True while the backend has a live session cookie on record.
    pub fn is_present(&self) -> bool {
        !self
            .cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// Drop every stored cookie; later requests go out anonymous.
    pub fn clear(&self) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn same_host(&self, url: &Url) -> bool {
        self.host.as_deref() == url.host_str()
    }
}

fn is_removal(cookie: &Cookie<'_>) -> bool {
    if cookie.value().is_empty() {
        return true;
    }
    if let Some(max_age) = cookie.max_age() {
        if max_age.is_zero() || max_age.is_negative() {
            return true;
        }
    }
    matches!(cookie.expires_datetime(), Some(at) if at <= OffsetDateTime::now_utc())
}

impl CookieStore for SessionCredentials {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        if !self.same_host(url) {
            tracing::warn!(url = %url, "Ignoring cookies from unexpected host");
            return;
        }

        let mut cookies = self.cookies.write().unwrap_or_else(PoisonError::into_inner);
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            let Ok(parsed) = Cookie::parse(raw) else {
                tracing::debug!("Skipping malformed Set-Cookie header");
                continue;
            };

            if is_removal(&parsed) {
                cookies.remove(parsed.name());
            } else {
                cookies.insert(parsed.name().to_string(), parsed.value().to_string());
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        if !self.same_host(url) {
            return None;
        }

        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        if cookies.is_empty() {
            return None;
        }

        let header = cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    fn set(store: &SessionCredentials, url: &Url, headers: &[&str]) {
        let values: Vec<HeaderValue> = headers
            .iter()
            .map(|h| HeaderValue::from_str(h).unwrap())
            .collect();
        store.set_cookies(&mut values.iter(), url);
    }

    #[test]
    fn stores_and_replays_session_cookie() {
        let store = SessionCredentials::new(&backend());
        assert!(!store.is_present());

        set(
            &store,
            &backend().join("/login").unwrap(),
            &["session=abc123; Path=/; HttpOnly"],
        );

        assert!(store.is_present());
        let header = store
            .cookies(&backend().join("/protected/upload/").unwrap())
            .unwrap();
        assert_eq!(header.to_str().unwrap(), "session=abc123");
    }

    #[test]
    fn expired_cookie_removes_session() {
        let store = SessionCredentials::new(&backend());
        set(&store, &backend(), &["session=abc123", "theme=dark"]);
        set(&store, &backend(), &["session=; Max-Age=0"]);

        let header = store.cookies(&backend()).unwrap();
        assert_eq!(header.to_str().unwrap(), "theme=dark");

        set(
            &store,
            &backend(),
            &["theme=dark; Expires=Thu, 01 Jan 1970 00:00:00 GMT"],
        );
        assert!(!store.is_present());
        assert!(store.cookies(&backend()).is_none());
    }

    #[test]
    fn other_hosts_never_see_credentials() {
        let store = SessionCredentials::new(&backend());
        let elsewhere = Url::parse("https://tracker.example.com/").unwrap();

        set(&store, &elsewhere, &["session=stolen"]);
        assert!(!store.is_present());

        set(&store, &backend(), &["session=abc123"]);
        assert!(store.cookies(&elsewhere).is_none());
    }

    #[test]
    fn clear_forgets_everything() {
        let store = SessionCredentials::new(&backend());
        set(&store, &backend(), &["session=abc123"]);
        store.clear();
        assert!(!store.is_present());
    }
}
