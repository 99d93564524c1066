//! Masking and redaction helpers for values headed to a log sink.
//!
//! Every function here is pure and total: malformed input yields a
//! placeholder such as `[empty]` or `[invalid-email]`, never a panic. These
//! are conveniences for callers choosing what to log, not a security control.

use regex::Regex;
use std::sync::LazyLock;

pub const EMPTY: &str = "[empty]";
pub const INVALID_EMAIL: &str = "[invalid-email]";
pub const INVALID_URI: &str = "[invalid-uri]";
pub const REDACTED: &str = "[REDACTED]";
pub const MASK: &str = "***";

/// Query/fragment keys whose values are always redacted
pub const SENSITIVE_URI_KEYS: [&str; 10] = [
    "token",
    "access_token",
    "refresh_token",
    "code",
    "id_token",
    "session_token",
    "api_key",
    "key",
    "secret",
    "error_description",
];

const SECRET_PREFIXES: [&str; 12] = [
    "sk_", "sk-", "pk_live_", "rk_live_", "ghp_", "gho_", "ghs_", "github_pat_", "xoxb-", "xoxp-",
    "AKIA", "eyJ",
];

static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z][A-Za-z0-9+.\-]*://[^\s'"<>()]+"#).expect("Invalid URL regex")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}")
        .expect("Invalid email regex")
});

static UNIX_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[\s(\['"=])(~?/[^\s'"():]+)"#).expect("Invalid path regex")
});

static WINDOWS_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[A-Za-z]:\\[^\s'"():]*"#).expect("Invalid windows path regex")
});

static TOKEN_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-+/=.]+$").expect("Invalid token charset regex")
});

/// First character followed by up to three asterisks
fn mask_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => {
            let hidden = chars.count().min(3);
            format!("{}{}", first, "*".repeat(hidden))
        }
        None => String::new(),
    }
}

/// Mask an email address: `user@example.com` becomes `u***@e***.com`
pub fn mask_email(email: &str) -> String {
    let email = email.trim();
    if email.is_empty() {
        return EMPTY.to_string();
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return INVALID_EMAIL.to_string();
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || domain.is_empty() {
        return INVALID_EMAIL.to_string();
    }

    let mut labels = domain.split('.');
    let first_label = labels.next().unwrap_or_default();
    if first_label.is_empty() {
        return INVALID_EMAIL.to_string();
    }

    let mut masked = format!("{}@{}", mask_label(local), mask_label(first_label));
    for label in labels {
        masked.push('.');
        masked.push_str(label);
    }
    masked
}

/// Show only the first and last three characters of a token
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 6 {
        return MASK.to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Keep a four character prefix of long credential ids
pub fn mask_credential_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() {
        return EMPTY.to_string();
    }
    if id.chars().count() <= 8 {
        return MASK.to_string();
    }
    let prefix: String = id.chars().take(4).collect();
    format!("{}{}", prefix, MASK)
}

/// Replace a user id with its length only
pub fn mask_user_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() {
        return EMPTY.to_string();
    }
    format!("[user-id:len={}]", id.chars().count())
}

/// Keep an eight character prefix of long session ids
pub fn mask_session_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() {
        return EMPTY.to_string();
    }
    if id.chars().count() <= 12 {
        return MASK.to_string();
    }
    let prefix: String = id.chars().take(8).collect();
    format!("{}...", prefix)
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_URI_KEYS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(key.trim()))
}

fn redact_pairs(segment: &str) -> String {
    segment
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if is_sensitive_key(key) => format!("{}={}", key, REDACTED),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Redact sensitive query and fragment parameters of a URI.
///
/// `boss://auth?token=abc123&type=signup` becomes
/// `boss://auth?token=[REDACTED]&type=signup`.
pub fn mask_uri_params(uri: &str) -> String {
    let uri = uri.trim();
    if uri.is_empty() {
        return EMPTY.to_string();
    }
    if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return INVALID_URI.to_string();
    }

    let (before_fragment, fragment) = match uri.split_once('#') {
        Some((head, frag)) => (head, Some(frag)),
        None => (uri, None),
    };
    let (base, query) = match before_fragment.split_once('?') {
        Some((head, q)) => (head, Some(q)),
        None => (before_fragment, None),
    };

    let mut out = String::with_capacity(uri.len());
    out.push_str(base);
    if let Some(query) = query {
        out.push('?');
        out.push_str(&redact_pairs(query));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(&redact_pairs(fragment));
    }
    out
}

/// Heuristic check for strings that should not be logged verbatim
pub fn looks_like_secret(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }

    let len = value.chars().count();
    if len >= 20 {
        return true;
    }
    if len >= 8 && SECRET_PREFIXES.iter().any(|p| value.starts_with(p)) {
        return true;
    }

    len >= 16
        && TOKEN_CHARSET_REGEX.is_match(value)
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| c.is_ascii_alphabetic())
}

/// Replace URLs, emails and filesystem paths with placeholders
pub fn sanitize_exception_message(message: &str) -> String {
    let out = URL_REGEX.replace_all(message, "[URL]");
    let out = EMAIL_REGEX.replace_all(&out, "[EMAIL]");
    let out = WINDOWS_PATH_REGEX.replace_all(&out, "[PATH]");
    let out = UNIX_PATH_REGEX.replace_all(&out, "${1}[PATH]");
    out.into_owned()
}

/// Sanitize a multi-line stack trace line by line
pub fn sanitize_stack_trace(trace: &str) -> String {
    trace
        .split('\n')
        .map(sanitize_exception_message)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("user@example.com"), "u***@e***.com");
        assert_eq!(mask_email("a@b.co.uk"), "a@b.co.uk");
        assert_eq!(mask_email("jo@mail.example.org"), "j*@m***.example.org");
        assert_eq!(mask_email("someone@localhost"), "s***@l***");
    }

    #[test]
    fn test_mask_email_malformed() {
        assert_eq!(mask_email(""), EMPTY);
        assert_eq!(mask_email("   "), EMPTY);
        assert_eq!(mask_email("no-at-sign"), INVALID_EMAIL);
        assert_eq!(mask_email("a@b@c.com"), INVALID_EMAIL);
        assert_eq!(mask_email("@example.com"), INVALID_EMAIL);
        assert_eq!(mask_email("user@"), INVALID_EMAIL);
        assert_eq!(mask_email("user@.com"), INVALID_EMAIL);
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abc123def456ghi789"), "abc...789");
        assert_eq!(mask_token("ab"), "***");
        assert_eq!(mask_token("abcdef"), "***");
        assert_eq!(mask_token("abcdefg"), "abc...efg");
    }

    #[test]
    fn test_mask_ids() {
        assert_eq!(mask_credential_id("cred-1234567890"), "cred***");
        assert_eq!(mask_credential_id("short"), "***");
        assert_eq!(mask_credential_id(""), EMPTY);

        assert_eq!(mask_user_id("u-42-abcdef"), "[user-id:len=11]");
        assert_eq!(mask_user_id(" "), EMPTY);

        assert_eq!(mask_session_id("sess_0123456789abcdef"), "sess_012...");
        assert_eq!(mask_session_id("tiny"), "***");
    }

    #[test]
    fn test_mask_uri_params() {
        assert_eq!(
            mask_uri_params("boss://auth?token=abc123&type=signup"),
            "boss://auth?token=[REDACTED]&type=signup"
        );
        assert_eq!(
            mask_uri_params("https://x.io/cb?code=1&state=s#access_token=t&expires_in=3600"),
            "https://x.io/cb?code=[REDACTED]&state=s#access_token=[REDACTED]&expires_in=3600"
        );
        assert_eq!(
            mask_uri_params("app://open?API_KEY=k&Secret=s"),
            "app://open?API_KEY=[REDACTED]&Secret=[REDACTED]"
        );
    }

    #[test]
    fn test_mask_uri_params_passthrough_and_malformed() {
        assert_eq!(mask_uri_params("https://example.com/path"), "https://example.com/path");
        assert_eq!(mask_uri_params("app://x#section"), "app://x#section");
        assert_eq!(mask_uri_params(""), EMPTY);
        assert_eq!(mask_uri_params("boss://auth?token=a b"), INVALID_URI);
    }

    #[test]
    fn test_looks_like_secret() {
        assert!(looks_like_secret("abcdefghijklmnopqrstuvwxyz"));
        assert!(looks_like_secret("ghp_abc12345"));
        assert!(looks_like_secret("a1b2c3d4e5f6g7h8"));
        assert!(!looks_like_secret("hello"));
        assert!(!looks_like_secret("this is a normal sentence that is long"));
        assert!(!looks_like_secret(""));
        assert!(!looks_like_secret("onlylettershere"));
    }

    #[test]
    fn test_sanitize_exception_message() {
        let msg = "Failed to load https://api.example.com/v1?token=x for bob@example.com from /home/bob/.config/app.toml";
        assert_eq!(
            sanitize_exception_message(msg),
            "Failed to load [URL] for [EMAIL] from [PATH]"
        );
    }

    #[test]
    fn test_sanitize_windows_path() {
        assert_eq!(
            sanitize_exception_message(r"cannot open C:\Users\bob\app.log"),
            "cannot open [PATH]"
        );
    }

    #[test]
    fn test_sanitize_keeps_plain_text() {
        assert_eq!(sanitize_exception_message("I/O error 5"), "I/O error 5");
        assert_eq!(sanitize_exception_message(""), "");
    }

    #[test]
    fn test_sanitize_stack_trace() {
        let trace = "at load (/srv/app/main.rs:10)\nat run (app.rs:20)";
        assert_eq!(
            sanitize_stack_trace(trace),
            "at load ([PATH]:10)\nat run (app.rs:20)"
        );
    }
}
