use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::Url;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read session file: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session file: {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write session file: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// One `Set-Cookie` header, already parsed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub max_age: Option<Duration>,
    pub expires: Option<SystemTime>,
}

impl SetCookie {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }
}

impl<'a> From<reqwest::cookie::Cookie<'a>> for SetCookie {
    fn from(cookie: reqwest::cookie::Cookie<'a>) -> Self {
        Self {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
            domain: cookie.domain().map(str::to_string),
            path: cookie.path().map(str::to_string),
            max_age: cookie.max_age(),
            expires: cookie.expires(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Host that set the cookie, or the `Domain` it was scoped to.
    pub domain: String,
    #[serde(default)]
    pub host_only: bool,
    pub path: String,
    /// Unix seconds; `None` for a session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl StoredCookie {
    fn matches(&self, host: &str, path: &str, now: u64) -> bool {
        let host_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(host, &self.domain)
        };
        host_ok && path_matches(path, &self.path) && !expired_at(self.expires_at, now)
    }
}

/// Cookies the server has handed out, scoped by host and path.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CookieStore {
    cookies: Vec<StoredCookie>,
}

impl CookieStore {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// First stored value under `name`, whatever host it belongs to.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn cookies(&self) -> &[StoredCookie] {
        &self.cookies
    }

    /// Stores a host-only session cookie for `url`, as a bare `Set-Cookie: name=value` would.
    pub fn insert(&mut self, url: &Url, name: &str, value: &str) {
        let cookie = SetCookie {
            path: Some("/".to_string()),
            ..SetCookie::new(name, value)
        };
        self.apply(url, cookie);
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Value for a `Cookie` header on a request to `url`, or `None` when nothing applies.
    pub fn header_value(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();
        let now = unix_now();
        let mut matching = self
            .cookies
            .iter()
            .filter(|c| c.matches(&host, url.path(), now))
            .collect::<Vec<_>>();
        if matching.is_empty() {
            return None;
        }
        // longer paths first
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        let pairs = matching
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>();
        Some(pairs.join("; "))
    }

    /// Applies one cookie received from `url`. Returns true when the store changed.
    pub fn apply(&mut self, url: &Url, cookie: SetCookie) -> bool {
        let Some(host) = url.host_str().map(|h| h.to_ascii_lowercase()) else {
            return false;
        };
        if cookie.name.is_empty() {
            return false;
        }

        let scoped = cookie
            .domain
            .as_deref()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty());
        let (domain, host_only) = match scoped {
            Some(domain) if domain_matches(&host, &domain) => (domain, false),
            Some(domain) => {
                log::debug!(
                    "dropping cookie {} scoped to {domain}, set by {host}",
                    cookie.name
                );
                return false;
            }
            None => (host, true),
        };
        let path = cookie
            .path
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| default_path(url.path()));

        let now = unix_now();
        // Max-Age wins over Expires
        let expires_at = match (cookie.max_age, cookie.expires) {
            (Some(age), _) => Some(now.saturating_add(age.as_secs())),
            (None, Some(at)) => Some(
                at.duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs())
                    .unwrap_or(0),
            ),
            (None, None) => None,
        };

        let position = self
            .cookies
            .iter()
            .position(|c| c.name == cookie.name && c.domain == domain && c.path == path);

        if cookie.value.is_empty() || expired_at(expires_at, now) {
            return match position {
                Some(i) => {
                    self.cookies.remove(i);
                    true
                }
                None => false,
            };
        }

        let stored = StoredCookie {
            name: cookie.name,
            value: cookie.value,
            domain,
            host_only,
            path,
            expires_at,
        };
        match position {
            Some(i) if self.cookies[i] == stored => false,
            Some(i) => {
                self.cookies[i] = stored;
                true
            }
            None => {
                self.cookies.push(stored);
                true
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn expired_at(expires_at: Option<u64>, now: u64) -> bool {
    matches!(expires_at, Some(at) if at <= now)
}

fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    // IP literals only ever match themselves
    if host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return false;
    }
    host.len() > domain.len()
        && host.ends_with(domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/'))
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => request_path[..i].to_string(),
    }
}

/// A cookie store bound to a file on disk.
#[derive(Clone, Debug)]
pub struct Session {
    path: Option<PathBuf>,
    store: CookieStore,
}

impl Session {
    /// A session that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            store: CookieStore::default(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let store = match std::fs::read_to_string(path) {
            Ok(contents) if contents.trim().is_empty() => CookieStore::default(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| SessionError::Parse {
                    path: path.display().to_string(),
                    source: e,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CookieStore::default(),
            Err(e) => {
                return Err(SessionError::Read {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            store,
        })
    }

    pub fn store(&self) -> &CookieStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CookieStore {
        &mut self.store
    }

    pub fn save(&self) -> Result<(), SessionError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let write_err = |e| SessionError::Write {
            path: path.display().to_string(),
            source: e,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_vec_pretty(&self.store).unwrap_or_else(|_| b"{}".to_vec());
        std::fs::write(path, contents).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn host_only_cookie_stays_on_its_host() {
        let mut store = CookieStore::default();
        let origin = url("http://a.test/login");
        assert!(store.apply(&origin, SetCookie::new("session_id", "abc123")));

        assert_eq!(
            store.header_value(&url("http://a.test/me")).as_deref(),
            Some("session_id=abc123")
        );
        assert_eq!(store.header_value(&url("http://b.test/me")), None);
        assert_eq!(store.header_value(&url("http://sub.a.test/me")), None);
    }

    #[test]
    fn domain_attribute_covers_subdomains_only_when_it_matches() {
        let mut store = CookieStore::default();
        let origin = url("http://api.spots.test/login");
        let scoped = SetCookie {
            domain: Some(".spots.test".to_string()),
            ..SetCookie::new("session_id", "abc")
        };
        assert!(store.apply(&origin, scoped));
        assert!(store.header_value(&url("http://www.spots.test/")).is_some());
        assert!(store.header_value(&url("http://spots.test/")).is_some());
        assert_eq!(store.header_value(&url("http://evilspots.test/")), None);

        let foreign = SetCookie {
            domain: Some("other.test".to_string()),
            ..SetCookie::new("tracker", "x")
        };
        assert!(!store.apply(&origin, foreign));
        assert_eq!(store.get("tracker"), None);
    }

    #[test]
    fn path_attribute_limits_where_cookie_is_sent() {
        let mut store = CookieStore::default();
        let origin = url("http://a.test/login");
        let scoped = SetCookie {
            path: Some("/spots".to_string()),
            ..SetCookie::new("pref", "grid")
        };
        store.apply(&origin, scoped);
        assert!(store.header_value(&url("http://a.test/spots")).is_some());
        assert!(store.header_value(&url("http://a.test/spots/category/Gamta")).is_some());
        assert_eq!(store.header_value(&url("http://a.test/spotsx")), None);
        assert_eq!(store.header_value(&url("http://a.test/me")), None);
    }

    #[test]
    fn default_path_is_the_request_directory() {
        assert_eq!(default_path("/login"), "/");
        assert_eq!(default_path("/api/login"), "/api");
        assert_eq!(default_path(""), "/");
    }

    #[test]
    fn max_age_zero_removes_cookie() {
        let mut store = CookieStore::default();
        let origin = url("http://a.test/logout");
        store.insert(&origin, "session_id", "abc123");
        let clear = SetCookie {
            path: Some("/".to_string()),
            max_age: Some(Duration::ZERO),
            ..SetCookie::new("session_id", "gone")
        };
        assert!(store.apply(&origin, clear));
        assert!(store.is_empty());
        assert_eq!(store.header_value(&origin), None);
    }

    #[test]
    fn any_past_expiry_removes_cookie() {
        let mut store = CookieStore::default();
        let origin = url("http://a.test/logout");
        store.insert(&origin, "session_id", "abc123");
        // Wed, 21 Oct 2015 07:28:00 GMT
        let clear = SetCookie {
            path: Some("/".to_string()),
            expires: Some(UNIX_EPOCH + Duration::from_secs(1_445_412_480)),
            ..SetCookie::new("session_id", "gone")
        };
        assert!(store.apply(&origin, clear));
        assert_eq!(store.get("session_id"), None);
    }

    #[test]
    fn future_expiry_is_kept_and_persisted() {
        let mut store = CookieStore::default();
        let origin = url("http://a.test/login");
        let lasting = SetCookie {
            max_age: Some(Duration::from_secs(3600)),
            ..SetCookie::new("session_id", "tok")
        };
        assert!(store.apply(&origin, lasting));
        let stored = &store.cookies()[0];
        assert!(stored.expires_at.unwrap() > unix_now());
        assert!(store.header_value(&origin).is_some());
    }

    #[test]
    fn stale_persisted_cookie_is_not_sent() {
        let store: CookieStore = serde_json::from_value(serde_json::json!({
            "cookies": [{
                "name": "session_id",
                "value": "old",
                "domain": "a.test",
                "host_only": true,
                "path": "/",
                "expires_at": 1
            }]
        }))
        .unwrap();
        assert_eq!(store.header_value(&url("http://a.test/me")), None);
    }

    #[test]
    fn empty_name_is_ignored() {
        let mut store = CookieStore::default();
        assert!(!store.apply(&url("http://a.test/"), SetCookie::new("", "value")));
        assert!(store.is_empty());
    }

    #[test]
    fn session_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let origin = url("http://a.test/login");

        let mut session = Session::load(&path).unwrap();
        assert!(session.store().is_empty());
        session.store_mut().insert(&origin, "session_id", "tok");
        session.save().unwrap();

        let reloaded = Session::load(&path).unwrap();
        assert_eq!(reloaded.store().get("session_id"), Some("tok"));
        assert_eq!(
            reloaded.store().header_value(&url("http://b.test/me")),
            None
        );
    }
}
