use std::convert::Infallible;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use dashmap::DashMap;
use hkdf::Hkdf;
use sha2::Sha256;

use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "formsink_session";

const HKDF_SALT: &[u8] = b"formsink-v1";
const HKDF_INFO: &[u8] = b"session-cookie-key";

/// Derive the 64-byte cookie signing key from the configured secret.
pub fn derive_cookie_key(secret: &str) -> Key {
    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), secret.as_bytes());
    let mut okm = [0u8; 64];
    hk.expand(HKDF_INFO, &mut okm)
        .expect("64 bytes is a valid HKDF-SHA256 output length");
    Key::from(&okm[..])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

impl FlashLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug)]
struct SessionData {
    flashes: Vec<Flash>,
    pending_download: Option<PathBuf>,
    last_seen: Instant,
}

impl SessionData {
    fn new() -> Self {
        Self {
            flashes: Vec::new(),
            pending_download: None,
            last_seen: Instant::now(),
        }
    }
}

/// In-memory session data keyed by session id.
pub struct SessionStore {
    entries: DashMap<String, SessionData>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Mark an existing session as used. Unknown ids are ignored.
    pub fn refresh(&self, id: &str) {
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.last_seen = Instant::now();
        }
    }

    /// Make sure an entry exists for `id` and mark it as used.
    pub fn touch(&self, id: &str) {
        let mut entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(SessionData::new);
        entry.last_seen = Instant::now();
    }

    pub fn flash(&self, id: &str, level: FlashLevel, message: impl Into<String>) {
        self.touch(id);
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.flashes.push(Flash {
                level,
                message: message.into(),
            });
        }
    }

    /// Drain queued flashes; each one is shown once.
    pub fn take_flashes(&self, id: &str) -> Vec<Flash> {
        self.entries
            .get_mut(id)
            .map(|mut entry| std::mem::take(&mut entry.flashes))
            .unwrap_or_default()
    }

    pub fn set_download(&self, id: &str, path: Option<PathBuf>) {
        self.touch(id);
        if let Some(mut entry) = self.entries.get_mut(id) {
            entry.pending_download = path;
        }
    }

    /// Remove and return the pending download. A second call yields `None`.
    pub fn take_download(&self, id: &str) -> Option<PathBuf> {
        self.entries
            .get_mut(id)
            .and_then(|mut entry| entry.pending_download.take())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop sessions idle for longer than `max_idle`.
    pub fn cleanup(&self, max_idle: Duration) {
        let now = Instant::now();
        self.entries
            .retain(|_, data| now.duration_since(data.last_seen) < max_idle);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session_id() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// The caller's session. Return `jar` with the response so a fresh
/// session cookie reaches the browser.
pub struct Session {
    pub id: String,
    pub jar: SignedCookieJar,
}

impl FromRequestParts<SharedState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());

        // A tampered cookie fails verification and is treated as absent.
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            let id = cookie.value().to_string();
            state.sessions.refresh(&id);
            return Ok(Session { id, jar });
        }

        // Nothing is stored until the session first holds a flash or download.
        let id = new_session_id();

        let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
            .path("/")
            .http_only(true)
            .secure(state.config.cookie_secure)
            .same_site(SameSite::Lax)
            .build();

        Ok(Session {
            id,
            jar: jar.add(cookie),
        })
    }
}

impl Session {
    pub fn flash(&self, state: &SharedState, level: FlashLevel, message: impl Into<String>) {
        state.sessions.flash(&self.id, level, message);
    }

    pub fn take_flashes(&self, state: &SharedState) -> Vec<Flash> {
        state.sessions.take_flashes(&self.id)
    }
}
