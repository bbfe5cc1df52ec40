//! Access token wrapper.

use std::fmt;

/// An API access token. `Debug` never prints the value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in request headers.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if no token was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("AccessToken(<empty>)")
        } else {
            f.write_str("AccessToken(<redacted>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts() {
        let token = AccessToken::new("glpat-secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_expose() {
        assert_eq!(AccessToken::new("abc").expose(), "abc");
    }

    #[test]
    fn test_is_empty() {
        assert!(AccessToken::default().is_empty());
        assert!(!AccessToken::new("x").is_empty());
    }
}
