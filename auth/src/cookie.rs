//! `Set-Cookie` rendering and `Cookie` header lookup.

use std::fmt;

/// Names the pending login attempt.
pub const NONCE_COOKIE: &str = "siwe_nonce";

/// Carries the signed session token.
pub const SESSION_COOKIE: &str = "user_info";

/// A cookie to send back to the client.
///
/// Every cookie is `HttpOnly; SameSite=Lax; Path=/`. `Secure` is added
/// outside development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    pub name: &'static str,
    pub value: String,
    pub max_age: Option<u64>,
    pub secure: bool,
}

impl SetCookie {
    /// A session-lifetime cookie (no `Max-Age`).
    pub fn new(name: &'static str, value: impl Into<String>, secure: bool) -> Self {
        Self {
            name,
            value: value.into(),
            max_age: None,
            secure,
        }
    }

    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Instructs the client to drop `name` immediately.
    pub fn removal(name: &'static str, secure: bool) -> Self {
        Self::new(name, "", secure).with_max_age(0)
    }

    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}; HttpOnly; SameSite=Lax; Path=/", self.name, self.value)?;
        if let Some(age) = self.max_age {
            write!(f, "; Max-Age={age}")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        Ok(())
    }
}

/// Find `name` in a `Cookie` request header (`a=1; b=2`).
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_attributes() {
        let c = SetCookie::new(NONCE_COOKIE, "abc", false);
        assert_eq!(c.header_value(), "siwe_nonce=abc; HttpOnly; SameSite=Lax; Path=/");

        let c = SetCookie::new(SESSION_COOKIE, "tok", true).with_max_age(604_800);
        assert_eq!(
            c.header_value(),
            "user_info=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800; Secure"
        );
    }

    #[test]
    fn removal_has_zero_max_age() {
        let c = SetCookie::removal(SESSION_COOKIE, false);
        assert!(c.header_value().starts_with("user_info=;"));
        assert!(c.header_value().contains("Max-Age=0"));
    }

    #[test]
    fn reads_from_header() {
        let header = "theme=dark; siwe_nonce=00ff; user_info=a.b";
        assert_eq!(read_cookie(header, "siwe_nonce"), Some("00ff"));
        assert_eq!(read_cookie(header, "user_info"), Some("a.b"));
        assert_eq!(read_cookie(header, "missing"), None);
        assert_eq!(read_cookie("siwe_nonce=", "siwe_nonce"), None);
    }
}
