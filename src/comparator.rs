//! Comparator classification
//!
//! Decides whether a caller-supplied comparator is a processable, upgradable
//! version range. The approach is a blacklist: anything not explicitly
//! excluded is assumed upgradable, and precise satisfaction is left to the
//! version-matching step.

use crate::alias::split_alias;

/// Whether a comparator can be processed at all.
///
/// Rejected: digit-free comparators (pure tags like `latest`), URL and git
/// references, path or GitHub shorthands (anything containing `/`), and
/// `npm:` aliases that do not resolve.
pub fn is_supported(comparator: &str) -> bool {
    let comparator = comparator.trim();

    // Aliases delegate to the alias splitter first: a scoped alias contains
    // a `/` that must not disqualify it.
    if comparator.starts_with("npm:") {
        return match split_alias(comparator) {
            Some((_, range)) => is_supported(range),
            None => false,
        };
    }

    if !comparator.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if comparator.starts_with("http") || comparator.starts_with("git") {
        return false;
    }
    !comparator.contains('/')
}

/// Whether a supported comparator is worth checking for updates.
///
/// Static comparators (only digits, dots and wildcard markers) are upgradable
/// only when they contain a wildcard or `check_static` is set. Upper-bounded
/// comparators (`<`, `<=`) never are.
pub fn is_upgradable(comparator: &str, check_static: bool) -> bool {
    if !is_supported(comparator) {
        return false;
    }

    let comparator = match split_alias(comparator.trim()) {
        Some((_, range)) => range,
        None => comparator.trim(),
    };

    let static_shape = comparator
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'x' | 'X' | '*'));
    if static_shape {
        let has_wildcard = comparator.contains(['x', 'X', '*']);
        if !has_wildcard && !check_static {
            return false;
        }
    }

    !comparator.starts_with('<')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("latest", false)] // no digit
    #[case("next", false)]
    #[case("*", false)]
    #[case("", false)]
    #[case("http://example.com/pkg-1.0.0.tgz", false)]
    #[case("git+https://github.com/user/repo", false)]
    #[case("git://github.com/user/repo#v1.0.0", false)]
    #[case("user/repo#1.0.0", false)] // GitHub shorthand
    #[case("file:../local-1.0.0", false)]
    #[case("^1.2.3", true)]
    #[case(">=1.0.0 <2.0.0", true)]
    #[case("1.x", true)]
    #[case("npm:actually@^1.2.3", true)]
    #[case("npm:@scope/name@1.2.3", true)] // scoped alias: the `/` is fine
    #[case("npm:actually", false)] // unresolvable alias
    #[case("npm:@", false)]
    fn is_supported_classifies(#[case] comparator: &str, #[case] expected: bool) {
        assert_eq!(is_supported(comparator), expected);
    }

    #[rstest]
    #[case("latest", false)] // unsupported stays non-upgradable
    #[case("1.2.3", false)] // static, no wildcard
    #[case("1.2", false)]
    #[case("1.2.x", true)] // static shape, but wildcarded
    #[case("1.x", true)]
    #[case("<2.0.0", false)]
    #[case("<=2.0.0", false)]
    #[case("^1.2.3", true)]
    #[case("~1.2.3", true)]
    #[case(">=1.0.0", true)]
    #[case("npm:actually@1.2.3", false)] // static after alias resolution
    #[case("npm:actually@^1.2.3", true)]
    fn is_upgradable_without_static_checking(#[case] comparator: &str, #[case] expected: bool) {
        assert_eq!(is_upgradable(comparator, false), expected);
    }

    #[rstest]
    #[case("1.2.3", true)]
    #[case("1.2", true)]
    #[case("<2.0.0", false)] // still never upgradable
    #[case("latest", false)] // still unsupported
    fn is_upgradable_with_static_checking(#[case] comparator: &str, #[case] expected: bool) {
        assert_eq!(is_upgradable(comparator, true), expected);
    }
}
