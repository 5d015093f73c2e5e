//! Package name and version sanitizing for installp.
//!
//! installp accepts only `a-z`, `0-9`, `.`, `+` and `-` in the name component
//! and a dotted numeric VRMF version.

use regex::Regex;
use std::{borrow::Cow, sync::LazyLock};

static SAFE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[a-z0-9.+\-]+\z").expect("valid safe-name regex")
});

static UNSAFE_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^a-z0-9.+\-]+").expect("valid unsafe-run regex")
});

/// Convert `raw` into a name installp accepts.
///
/// Valid names are returned borrowed. Anything else is lower-cased and every
/// run of disallowed characters becomes a single `-`; the result is owned so
/// callers can tell a substitution happened.
///
/// ```
/// use kodegen_bundler_bff::bundler::safe_name;
///
/// assert_eq!(safe_name("hamlet"), "hamlet");
/// assert_eq!(safe_name("Hamlet Server!"), "hamlet-server-");
/// ```
pub fn safe_name(raw: &str) -> Cow<'_, str> {
    if SAFE_NAME_RE.is_match(raw) {
        Cow::Borrowed(raw)
    } else {
        let lowered = raw.to_lowercase();
        Cow::Owned(UNSAFE_RUN_RE.replace_all(&lowered, "-").into_owned())
    }
}

/// Dotted installp version for `raw` and `iteration`.
///
/// Up to the first three numeric fields of `raw` are joined with `.` and the
/// iteration is appended. A version without digits yields `".{iteration}"`.
///
/// ```
/// use kodegen_bundler_bff::bundler::derive_version;
///
/// assert_eq!(derive_version("12.3.4-rc1", 2), "12.3.4.2");
/// assert_eq!(derive_version("1.2", 5), "1.2.5");
/// ```
pub fn derive_version(raw: &str, iteration: u32) -> String {
    let fields: Vec<&str> = raw
        .split(|c: char| !c.is_ascii_digit())
        .filter(|field| !field.is_empty())
        .take(3)
        .collect();
    format!("{}.{}", fields.join("."), iteration)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &str = "abcdefghijklmnopqrstuvwxyz0123456789.+-";

    #[test]
    fn test_valid_name_is_borrowed() {
        assert!(matches!(safe_name("hamlet-1.0+aix"), Cow::Borrowed("hamlet-1.0+aix")));
    }

    #[test]
    fn test_invalid_runs_collapse_to_single_dash() {
        assert_eq!(safe_name("Hamlet   Server"), "hamlet-server");
        assert_eq!(safe_name("my_app@@v2"), "my-app-v2");
        assert_eq!(safe_name("__leading"), "-leading");
        assert!(matches!(safe_name("UPPER"), Cow::Owned(_)));
    }

    #[test]
    fn test_uppercase_only_is_lowered_without_dashes() {
        assert_eq!(safe_name("Chef"), "chef");
    }

    #[test]
    fn test_safe_name_is_idempotent_and_restricted() {
        let inputs = [
            "",
            "hamlet",
            "Hamlet Server",
            "ünïcødé naïve",
            "İstanbul",
            "tabs\tand\nnewlines",
            "a..b++c--d",
            "!!!",
            "MiXeD_123.Name",
        ];
        for input in inputs {
            let once = safe_name(input).into_owned();
            let twice = safe_name(&once).into_owned();
            assert_eq!(once, twice, "not idempotent for {input:?}");
            assert!(
                once.chars().all(|c| ALLOWED.contains(c)),
                "disallowed character in {once:?}"
            );
        }
    }

    #[test]
    fn test_derive_version_examples() {
        assert_eq!(derive_version("12.3.4-rc1", 2), "12.3.4.2");
        assert_eq!(derive_version("1.2", 5), "1.2.5");
        assert_eq!(derive_version("7", 1), "7.1");
    }

    #[test]
    fn test_derive_version_without_digits_keeps_empty_segment() {
        assert_eq!(derive_version("abc", 1), ".1");
        assert_eq!(derive_version("", 3), ".3");
    }

    #[test]
    fn test_derive_version_ignores_non_digit_runs() {
        assert_eq!(derive_version("v1..2--3.4", 9), "1.2.3.9");
        assert_eq!(derive_version("1.2.0+20240101", 1), "1.2.0.1");
    }
}
