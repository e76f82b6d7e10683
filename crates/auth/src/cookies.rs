//! Session cookie encoding.
//!
//! The whole session is stored client-side as `base64-` followed by the
//! URL-safe, unpadded base64 of its JSON form. Values without the prefix are
//! read as raw JSON for compatibility with older clients.
//!
//! Browsers drop cookies over 4 KB without telling anyone, so a value longer
//! than [`CHUNK_SIZE`] is split across `<name>.0`, `<name>.1`, ... and joined
//! again on read.

use authgate_core::auth::Session;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::config::AuthConfig;

const BASE64_PREFIX: &str = "base64-";

/// Largest value written to a single cookie, leaving room for the name and
/// attributes under the 4096-byte limit.
pub const CHUNK_SIZE: usize = 3180;

/// Cookie lifetime. The access token inside expires much sooner; the cookie
/// has to outlive it so the refresh token stays available.
const COOKIE_MAX_AGE_DAYS: i64 = 400;

/// Serialize a session into a cookie value.
pub fn encode_session(session: &Session) -> String {
    // Serializing plain strings and a timestamp cannot fail.
    let json = serde_json::to_vec(session).unwrap_or_default();
    format!("{BASE64_PREFIX}{}", URL_SAFE_NO_PAD.encode(json))
}

/// Parse a cookie value back into a session. Anything malformed is `None`.
pub fn decode_session(value: &str) -> Option<Session> {
    let json = match value.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => URL_SAFE_NO_PAD.decode(encoded.trim_end_matches('=')).ok()?,
        None => value.as_bytes().to_vec(),
    };
    serde_json::from_slice(&json).ok()
}

fn chunk_name(name: &str, index: usize) -> String {
    format!("{name}.{index}")
}

/// Index of `cookie_name` if it is a chunk of `name`.
fn chunk_index(cookie_name: &str, name: &str) -> Option<usize> {
    cookie_name
        .strip_prefix(name)?
        .strip_prefix('.')?
        .parse()
        .ok()
}

/// Names of the session chunks present in `jar`.
fn chunk_names(jar: &CookieJar, name: &str) -> Vec<(usize, String)> {
    jar.iter()
        .filter_map(|c| chunk_index(c.name(), name).map(|i| (i, c.name().to_string())))
        .collect()
}

/// Raw session value: the single cookie if present, otherwise the chunks
/// joined in order up to the first gap.
fn read_value(jar: &CookieJar, name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(name) {
        return Some(cookie.value().to_string());
    }
    let value: String = (0..)
        .map_while(|i| jar.get(&chunk_name(name, i)))
        .map(|c| c.value().to_string())
        .collect();
    (!value.is_empty()).then_some(value)
}

/// Whether the request carries a session cookie in either form.
pub fn has_session_cookie(jar: &CookieJar, config: &AuthConfig) -> bool {
    jar.get(&config.cookie_name).is_some()
        || jar.get(&chunk_name(&config.cookie_name, 0)).is_some()
}

/// Read the session cookie from a jar.
pub fn read_session(jar: &CookieJar, config: &AuthConfig) -> Option<Session> {
    let value = read_value(jar, &config.cookie_name)?;
    let session = decode_session(&value);
    if session.is_none() {
        tracing::debug!(cookie = %config.cookie_name, "ignoring malformed session cookie");
    }
    session
}

fn build(config: &AuthConfig, name: String, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(COOKIE_MAX_AGE_DAYS))
        .build()
}

fn removal(config: &AuthConfig, name: String) -> Cookie<'static> {
    let mut cookie = build(config, name, String::new());
    cookie.make_removal();
    cookie
}

/// Build the cookies carrying `session`: one, or several chunks when the
/// value is longer than [`CHUNK_SIZE`].
pub fn session_cookies(config: &AuthConfig, session: &Session) -> Vec<Cookie<'static>> {
    let value = encode_session(session);
    if value.len() <= CHUNK_SIZE {
        return vec![build(config, config.cookie_name.clone(), value)];
    }

    // The encoded value is ASCII, so byte chunks are valid strings.
    value
        .as_bytes()
        .chunks(CHUNK_SIZE)
        .enumerate()
        .map(|(i, chunk)| {
            build(
                config,
                chunk_name(&config.cookie_name, i),
                String::from_utf8_lossy(chunk).into_owned(),
            )
        })
        .collect()
}

/// Add the session cookies to `jar`, expiring whatever earlier layout they
/// replace.
pub fn set_session(jar: CookieJar, config: &AuthConfig, session: &Session) -> CookieJar {
    let cookies = session_cookies(config, session);
    let chunked = cookies.len() > 1;
    if chunked {
        tracing::debug!(chunks = cookies.len(), "session cookie split into chunks");
    }

    let mut jar = jar;
    if chunked && jar.get(&config.cookie_name).is_some() {
        jar = jar.add(removal(config, config.cookie_name.clone()));
    }
    for (index, name) in chunk_names(&jar, &config.cookie_name) {
        if !chunked || index >= cookies.len() {
            jar = jar.add(removal(config, name));
        }
    }
    cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie))
}

/// Expire the session cookie and any chunks. The removal of the main cookie
/// is emitted even when the request carried none, so stale copies on other
/// paths cannot survive.
pub fn clear_session(jar: CookieJar, config: &AuthConfig) -> CookieJar {
    let chunks = chunk_names(&jar, &config.cookie_name);
    let jar = jar.add(removal(config, config.cookie_name.clone()));
    chunks
        .into_iter()
        .fold(jar, |jar, (_, name)| jar.add(removal(config, name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::auth::SessionUser;
    use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
    use axum::response::IntoResponse;
    use chrono::{TimeZone, Utc};

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:54321".parse().unwrap(), "anon")
    }

    fn session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            user: SessionUser::new("u1", Some("user@example.com".to_string())),
        }
    }

    #[test]
    fn encoded_value_has_prefix_and_decodes() {
        let value = encode_session(&session());
        assert!(value.starts_with("base64-"));
        assert!(!value.contains('='));
        assert_eq!(decode_session(&value), Some(session()));
    }

    #[test]
    fn raw_json_is_accepted() {
        let json = serde_json::to_string(&session()).unwrap();
        assert_eq!(decode_session(&json), Some(session()));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(decode_session("base64-!!!"), None);
        assert_eq!(decode_session("not json"), None);
        assert_eq!(decode_session(""), None);
    }

    #[test]
    fn read_from_request_jar() {
        let config = config();
        let mut headers = HeaderMap::new();
        let cookie = format!("{}={}", config.cookie_name, encode_session(&session()));
        headers.insert("cookie", HeaderValue::from_str(&cookie).unwrap());

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(read_session(&jar, &config), Some(session()));
    }

    #[test]
    fn session_cookie_attributes() {
        let config = config();
        let jar = set_session(CookieJar::new(), &config, &session());
        let response = jar.into_response();
        let header = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();

        assert!(header.starts_with("sb-auth-token=base64-"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Secure"));
    }

    fn large_session() -> Session {
        Session {
            access_token: "a".repeat(5000),
            ..session()
        }
    }

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        jar.into_response()
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn request_jar(pairs: &[String]) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_str(&pairs.join("; ")).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn large_session_is_split_into_chunks() {
        let config = config();
        let headers = set_cookie_headers(set_session(CookieJar::new(), &config, &large_session()));

        assert!(headers.len() > 1);
        assert!(headers.iter().all(|h| h.len() < 4096));
        assert!(headers.iter().all(|h| h.starts_with("sb-auth-token.")));

        // The browser sends the chunks back; they join into the session.
        let pairs: Vec<String> = headers
            .iter()
            .map(|h| h.split(';').next().unwrap().to_string())
            .collect();
        let jar = request_jar(&pairs);
        assert!(has_session_cookie(&jar, &config));
        assert_eq!(read_session(&jar, &config), Some(large_session()));
    }

    #[test]
    fn small_session_replaces_stale_chunks() {
        let config = config();
        let jar = request_jar(&["sb-auth-token.0=abc".to_string(), "sb-auth-token.1=def".to_string()]);

        let headers = set_cookie_headers(set_session(jar, &config, &session()));

        assert!(headers
            .iter()
            .any(|h| h.starts_with("sb-auth-token=base64-")));
        for chunk in ["sb-auth-token.0=", "sb-auth-token.1="] {
            let header = headers.iter().find(|h| h.starts_with(chunk)).unwrap();
            assert!(header.contains("Max-Age=0"));
        }
    }

    #[test]
    fn clearing_removes_chunks() {
        let config = config();
        let jar = request_jar(&["sb-auth-token.0=abc".to_string()]);

        let headers = set_cookie_headers(clear_session(jar, &config));

        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }

    #[test]
    fn chunk_names_are_recognized() {
        assert_eq!(chunk_index("sb-auth-token.3", "sb-auth-token"), Some(3));
        assert_eq!(chunk_index("sb-auth-token", "sb-auth-token"), None);
        assert_eq!(chunk_index("sb-auth-token.x", "sb-auth-token"), None);
        assert_eq!(chunk_index("sb-auth-tokenx.1", "sb-auth-token"), None);
    }

    #[test]
    fn clearing_expires_the_cookie() {
        let config = config();
        let jar = clear_session(CookieJar::new(), &config);
        let response = jar.into_response();
        let header = response
            .headers()
            .get(SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();

        assert!(header.starts_with("sb-auth-token="));
        assert!(header.contains("Max-Age=0"));
    }
}
