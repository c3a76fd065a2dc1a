//! `Set-Cookie` values for the refresh token.
//!
//! The refresh token never reaches script: the cookie is `HttpOnly`,
//! `Secure` and `SameSite=Strict`, and scoped to the auth path.

/// Where and under which name the refresh token cookie lives.
#[derive(Debug, Clone)]
pub struct RefreshCookie {
    pub name: String,
    pub path: String,
    pub domain: Option<String>,
}

impl Default for RefreshCookie {
    fn default() -> Self {
        Self {
            name: "atelier_refresh".into(),
            path: "/api/auth".into(),
            domain: None,
        }
    }
}

impl RefreshCookie {
    /// Header value that stores `token` for `max_age_secs`.
    pub fn set(&self, token: &str, max_age_secs: u64) -> String {
        self.build(token, max_age_secs)
    }

    /// Header value that removes the cookie (logout).
    pub fn clear(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age_secs: u64) -> String {
        let mut parts = vec![
            format!("{}={value}", self.name),
            format!("Max-Age={max_age_secs}"),
            format!("Path={}", self.path),
        ];
        if let Some(domain) = &self.domain {
            parts.push(format!("Domain={domain}"));
        }
        parts.extend(["HttpOnly", "Secure", "SameSite=Strict"].map(String::from));
        parts.join("; ")
    }

    /// Pull the refresh token out of a request `Cookie` header.
    pub fn extract<'a>(&self, cookie_header: &'a str) -> Option<&'a str> {
        cookie_value(cookie_header, &self.name)
    }
}

/// Value of cookie `name` in a `Cookie` header, if present and non-empty.
pub(crate) fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_cookie_is_locked_down() {
        let header = RefreshCookie::default().set("tok123", 604_800);
        assert_eq!(
            header,
            "atelier_refresh=tok123; Max-Age=604800; Path=/api/auth; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn clear_expires_immediately() {
        let cookie = RefreshCookie {
            domain: Some("studio.example".into()),
            ..Default::default()
        };
        let header = cookie.clear();
        assert!(header.starts_with("atelier_refresh=; Max-Age=0"));
        assert!(header.contains("Domain=studio.example"));
    }

    #[test]
    fn extract_finds_the_named_cookie() {
        let cookie = RefreshCookie::default();
        assert_eq!(
            cookie.extract("theme=dark; atelier_refresh=abc; other=1"),
            Some("abc")
        );
        assert_eq!(cookie.extract("theme=dark"), None);
        assert_eq!(cookie.extract("atelier_refresh="), None);
        assert_eq!(cookie.extract("xatelier_refresh=abc"), None);
    }
}
