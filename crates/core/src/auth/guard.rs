//! Route guard decision logic.
//!
//! The guard is a two-state check evaluated once per request: a request is
//! UNAUTHORIZED when it has no session and targets a protected path, and
//! AUTHORIZED otherwise. There is no rule composition or precedence.

/// Query parameter carrying the originally requested path.
pub const REDIRECT_PARAM: &str = "redirectTo";

/// Path prefixes that are never guarded (static files, icons, images).
const STATIC_PREFIXES: &[&str] = &["/static/", "/dist/", "/favicon.ico"];

/// File extensions served as static assets.
const STATIC_EXTENSIONS: &[&str] = &[".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".ico"];

/// The set of protected path prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPaths {
    prefixes: Vec<String>,
}

impl ProtectedPaths {
    /// Build from a list of prefixes. Trailing slashes are dropped and empty
    /// entries ignored.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let prefixes = prefixes
            .into_iter()
            .filter_map(|p| {
                let p = p.as_ref().trim();
                let trimmed = p.trim_end_matches('/');
                match (p.is_empty(), trimmed.is_empty()) {
                    (true, _) => None,
                    // A bare "/" protects everything.
                    (false, true) => Some("/".to_string()),
                    (false, false) => Some(trimmed.to_string()),
                }
            })
            .collect();
        Self { prefixes }
    }

    /// Parse a comma-separated list, e.g. `"/protected,/account"`.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Prefix test: `/protected` matches `/protected` and `/protected/x`
    /// but not `/protectedness`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            if prefix == "/" {
                return true;
            }
            match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        })
    }
}

impl Default for ProtectedPaths {
    fn default() -> Self {
        Self::new(["/protected"])
    }
}

/// Whether a path is a static asset. Assets are never redirected to login.
pub fn is_static_asset(path: &str) -> bool {
    if STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let lowered = path.to_ascii_lowercase();
    STATIC_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}

/// Outcome of evaluating the guard for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Authorized,
    Unauthorized { redirect_to: String },
}

/// Evaluate the guard.
///
/// `original` is the requested path including any query string; it is what
/// gets recorded as the return target.
pub fn evaluate_route(
    path: &str,
    original: &str,
    has_session: bool,
    protected: &ProtectedPaths,
    login_path: &str,
) -> GuardDecision {
    if has_session || is_static_asset(path) || !protected.is_protected(path) {
        return GuardDecision::Authorized;
    }
    GuardDecision::Unauthorized {
        redirect_to: login_redirect(login_path, original),
    }
}

/// Build the login URL that records `original` as the return target.
///
/// The value is percent-encoded except for `/`, which is legal in a query
/// component and keeps the common case readable:
/// `/auth/login?redirectTo=/protected`.
pub fn login_redirect(login_path: &str, original: &str) -> String {
    let encoded = urlencoding::encode(original).replace("%2F", "/");
    format!("{login_path}?{REDIRECT_PARAM}={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN: &str = "/auth/login";

    #[test]
    fn protected_path_without_session_redirects_to_login() {
        let decision = evaluate_route(
            "/protected",
            "/protected",
            false,
            &ProtectedPaths::default(),
            LOGIN,
        );
        assert_eq!(
            decision,
            GuardDecision::Unauthorized {
                redirect_to: "/auth/login?redirectTo=/protected".to_string()
            }
        );
    }

    #[test]
    fn protected_path_with_session_is_authorized() {
        let decision = evaluate_route(
            "/protected",
            "/protected",
            true,
            &ProtectedPaths::default(),
            LOGIN,
        );
        assert_eq!(decision, GuardDecision::Authorized);
    }

    #[test]
    fn public_path_without_session_is_authorized() {
        for path in ["/", "/auth/login", "/about"] {
            let decision = evaluate_route(path, path, false, &ProtectedPaths::default(), LOGIN);
            assert_eq!(decision, GuardDecision::Authorized, "{path}");
        }
    }

    #[test]
    fn prefix_matches_subpaths_but_not_siblings() {
        let protected = ProtectedPaths::default();
        assert!(protected.is_protected("/protected"));
        assert!(protected.is_protected("/protected/"));
        assert!(protected.is_protected("/protected/notes/1"));
        assert!(!protected.is_protected("/protectedness"));
        assert!(!protected.is_protected("/"));
    }

    #[test]
    fn parse_normalizes_prefixes() {
        let protected = ProtectedPaths::parse(" /protected/ , /account,,");
        assert_eq!(protected.prefixes(), ["/protected", "/account"]);
        assert!(protected.is_protected("/account/settings"));
    }

    #[test]
    fn root_prefix_protects_everything() {
        let protected = ProtectedPaths::parse("/");
        assert!(protected.is_protected("/"));
        assert!(protected.is_protected("/anything"));
    }

    #[test]
    fn static_assets_bypass_guard() {
        let protected = ProtectedPaths::parse("/");
        for path in ["/favicon.ico", "/static/app.css", "/protected/logo.PNG"] {
            assert!(is_static_asset(path), "{path}");
            let decision = evaluate_route(path, path, false, &protected, LOGIN);
            assert_eq!(decision, GuardDecision::Authorized, "{path}");
        }
    }

    #[test]
    fn redirect_preserves_query_string() {
        let decision = evaluate_route(
            "/protected/notes",
            "/protected/notes?tab=a&x=1",
            false,
            &ProtectedPaths::default(),
            LOGIN,
        );
        let GuardDecision::Unauthorized { redirect_to } = decision else {
            panic!("expected redirect");
        };
        assert_eq!(
            redirect_to,
            "/auth/login?redirectTo=/protected/notes%3Ftab%3Da%26x%3D1"
        );
    }
}
