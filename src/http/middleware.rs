//! Page-level auth gate. Only checks that a session cookie is present; the
//! API handlers do the real validation.

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::cookies::session_id;

const PROTECTED_PREFIXES: [&str; 5] = [
    "/store",
    "/inventory",
    "/history",
    "/accounts",
    "/settings",
];
const AUTH_PATH: &str = "/login";
const LOGIN_REDIRECT: &str = "/login";
const HOME_REDIRECT: &str = "/store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Pass,
    Redirect(&'static str),
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn gate(path: &str, has_session: bool) -> Gate {
    if matches_prefix(path, "/api") {
        return Gate::Pass;
    }

    let protected = PROTECTED_PREFIXES
        .iter()
        .any(|prefix| matches_prefix(path, prefix));

    match (has_session, protected, matches_prefix(path, AUTH_PATH)) {
        (false, true, _) => Gate::Redirect(LOGIN_REDIRECT),
        (true, _, true) => Gate::Redirect(HOME_REDIRECT),
        _ => Gate::Pass,
    }
}

pub async fn auth_gate(request: Request, next: Next) -> Response {
    let has_session = session_id(request.headers()).is_some();

    match gate(request.uri().path(), has_session) {
        Gate::Pass => next.run(request).await,
        Gate::Redirect(to) => Redirect::temporary(to).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_pages_need_a_session() {
        for path in ["/store", "/inventory", "/history/2026", "/accounts", "/settings"] {
            assert_eq!(gate(path, false), Gate::Redirect("/login"), "{path}");
            assert_eq!(gate(path, true), Gate::Pass, "{path}");
        }
    }

    #[test]
    fn login_page_redirects_signed_in_users() {
        assert_eq!(gate("/login", true), Gate::Redirect("/store"));
        assert_eq!(gate("/login", false), Gate::Pass);
    }

    #[test]
    fn other_paths_pass_through() {
        for has_session in [false, true] {
            assert_eq!(gate("/about", has_session), Gate::Pass);
            assert_eq!(gate("/", has_session), Gate::Pass);
            assert_eq!(gate("/storefront", has_session), Gate::Pass);
            assert_eq!(gate("/api/store", has_session), Gate::Pass);
            assert_eq!(gate("/api/auth/login", has_session), Gate::Pass);
        }
    }
}
