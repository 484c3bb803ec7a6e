use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Shape of a contributor identifier (slug)
    /// Must be lowercase alphanumeric with hyphens
    /// - Valid: "la-ligue", "troupe42", "les-improvistes-de-lyon"
    /// - Invalid: "-ligue", "ligue-", "la--ligue", "Ligue", "la_ligue"
    pub static ref CODE_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();

    /// Regex for validating username fields
    /// Must start with letter or underscore and contain only alphanumeric characters and underscores
    /// - Valid: "john_doe", "user123", "_admin", "JohnDoe"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_regex_valid() {
        assert!(CODE_REGEX.is_match("la-ligue"));
        assert!(CODE_REGEX.is_match("troupe42"));
        assert!(CODE_REGEX.is_match("les-improvistes-de-lyon"));
        assert!(CODE_REGEX.is_match("a"));
    }

    #[test]
    fn test_code_regex_invalid() {
        assert!(!CODE_REGEX.is_match("-ligue"));
        assert!(!CODE_REGEX.is_match("ligue-"));
        assert!(!CODE_REGEX.is_match("la--ligue"));
        assert!(!CODE_REGEX.is_match("Ligue"));
        assert!(!CODE_REGEX.is_match("la_ligue"));
        assert!(!CODE_REGEX.is_match(""));
    }

    #[test]
    fn test_username_regex() {
        assert!(USERNAME_REGEX.is_match("yann_loup"));
        assert!(USERNAME_REGEX.is_match("_admin"));
        assert!(!USERNAME_REGEX.is_match("42yann"));
        assert!(!USERNAME_REGEX.is_match("yann loup"));
    }
}
