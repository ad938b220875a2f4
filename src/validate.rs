use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum password length accepted by `signup` and `passwd`.
pub const SIGNUP_MIN_PASSWORD_CHARS: usize = 8;
/// Minimum password length accepted by `login`.
pub const LOGIN_MIN_PASSWORD_CHARS: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile")
});

/// Shape check only: `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_PATTERN.is_match(candidate)
}

pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= SIGNUP_MIN_PASSWORD_CHARS
}

// Login keeps the looser length floor; it is not the same policy as signup.
pub fn meets_login_password_policy(password: &str) -> bool {
    password.chars().count() >= LOGIN_MIN_PASSWORD_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape_accepts_simple_addresses() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(is_valid_email("x+tag@y.io"));
    }

    #[test]
    fn test_email_shape_rejects_malformed_addresses() {
        for candidate in [
            "",
            "bademail",
            "a@b",
            "@b.com",
            "a@.com",
            "a@b.",
            "a b@c.com",
            "a@b@c.com",
            "a@b .com",
        ] {
            assert!(!is_valid_email(candidate), "accepted {candidate:?}");
        }
    }

    #[test]
    fn test_password_policies_have_distinct_floors() {
        assert!(!meets_login_password_policy("abcde"));
        assert!(meets_login_password_policy("abcdef"));

        assert!(!is_strong_password("abcdefg"));
        assert!(is_strong_password("abcdefgh"));
        assert!(meets_login_password_policy("abcdefg"));
    }

    #[test]
    fn test_password_length_counts_characters_not_bytes() {
        assert!(!is_strong_password("ééééééé"));
        assert!(is_strong_password("éééééééé"));
    }
}
