use axum::http::HeaderMap;
use axum::http::header::COOKIE;

pub const SESSION_COOKIE: &str = "valorant_session";
pub const ACTIVE_COOKIE: &str = "valorant_active";

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|part| part.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Browser session id, if the request carries a non-empty one.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, SESSION_COOKIE).filter(|sid| !sid.is_empty())
}

pub fn session_cookie(session_id: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={session_id}; HttpOnly; SameSite=Lax; Path=/{secure}")
}

pub fn active_cookie(puuid: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{ACTIVE_COOKIE}={puuid}; SameSite=Lax; Path=/{secure}")
}

pub fn expired_cookie(name: &str) -> String {
    format!("{name}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/")
}
