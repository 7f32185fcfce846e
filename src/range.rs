//! Loose semver parsing and comparator range matching
//!
//! Supports the npm comparator grammar:
//! - `1.2.3` - exact match (partial versions are padded: `1.2` -> `1.2.0`)
//! - `^1.2.3` - compatible with version (>=1.2.3 <2.0.0, special-cased for 0.x)
//! - `~1.2.3` - approximately equivalent (>=1.2.3 <1.3.0)
//! - `>=1.2.3`, `>1.2.3`, `<=1.2.3`, `<1.2.3` - comparison operators
//! - `1.2.x`, `1.x`, `*` - wildcards
//! - `1.0.0 - 2.0.0` - hyphen ranges
//! - space-separated conjunctions and `||` alternatives

use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// First version-looking token in a string: `1`, `1.2` or `1.2.3`.
static COERCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("coercion pattern is valid")
});

/// Parse a version string, tolerating `v`/`=` prefixes and partial versions.
///
/// - "1" -> 1.0.0
/// - "1.2" -> 1.2.0
/// - "v1.2.3" -> 1.2.3
pub fn parse_loose(input: &str) -> Option<Version> {
    let input = input.trim();
    let input = input.strip_prefix('=').unwrap_or(input);
    let input = input.strip_prefix('v').unwrap_or(input);

    if let Ok(version) = Version::parse(input) {
        return Some(version);
    }

    let parts: Vec<&str> = input.split('.').collect();
    let padded = match parts.as_slice() {
        [major] => format!("{major}.0.0"),
        [major, minor] => format!("{major}.{minor}.0"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

/// Coerce an arbitrary comparator string to a baseline version by extracting
/// its first run of dotted digits. `^1.2.3` -> 1.2.3, `>=2 <3` -> 2.0.0.
pub fn coerce(input: &str) -> Option<Version> {
    let captures = COERCE_RE.captures(input)?;
    let segment = |i: usize| -> Option<u64> {
        captures.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
    };
    Some(Version::new(segment(1)?, segment(2)?, segment(3)?))
}

/// Whether a version is a plain release, carrying no pre-release or build tag.
pub fn is_plain_release(version: &Version) -> bool {
    version.pre.is_empty() && version.build.is_empty()
}

/// Whether `version` is strictly newer than every clause of a comparator.
///
/// A comparator may be a space-separated conjunction of range clauses; each
/// digit-bearing clause is coerced and the version must exceed all of them.
/// Returns false when no clause can be coerced.
pub fn exceeds_every_clause(comparator: &str, version: &Version) -> bool {
    let mut seen_clause = false;
    for token in comparator.split_whitespace() {
        let Some(baseline) = coerce(token) else {
            // "||", "-", and other separators carry no version of their own
            continue;
        };
        seen_clause = true;
        if *version <= baseline {
            return false;
        }
    }
    seen_clause
}

/// The first exclusion pattern a version satisfies, if any.
pub fn matching_exclusion<'a>(version: &Version, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .find(|pattern| {
            RangeSpec::parse(pattern).is_some_and(|spec| spec.satisfies(version))
        })
        .map(String::as_str)
}

/// A single range clause.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Exact(Version),
    Caret(Version),
    Tilde(Version),
    Gte(Version),
    Gt(Version),
    Lte(Version),
    Lt(Version),
    /// `*` (or a bare `x`) matches every version
    Any,
    /// `1.x` -> >=1.0.0 <2.0.0
    WildcardMajor(u64),
    /// `1.2.x` -> >=1.2.0 <1.3.0
    WildcardMinor(u64, u64),
    /// `1.0.0 - 2.0.0` -> >=1.0.0 <=2.0.0
    Hyphen(Version, Version),
}

impl Clause {
    fn parse(token: &str) -> Option<Self> {
        let token = token.trim();

        if let Some(rest) = token.strip_prefix(">=") {
            parse_loose(rest).map(Clause::Gte)
        } else if let Some(rest) = token.strip_prefix('>') {
            parse_loose(rest).map(Clause::Gt)
        } else if let Some(rest) = token.strip_prefix("<=") {
            parse_loose(rest).map(Clause::Lte)
        } else if let Some(rest) = token.strip_prefix('<') {
            parse_loose(rest).map(Clause::Lt)
        } else if let Some(rest) = token.strip_prefix('^') {
            parse_loose(rest).map(Clause::Caret)
        } else if let Some(rest) = token.strip_prefix('~') {
            parse_loose(rest).map(Clause::Tilde)
        } else if token == "*" || token.eq_ignore_ascii_case("x") {
            Some(Clause::Any)
        } else if let Some(clause) = Self::parse_wildcard(token) {
            Some(clause)
        } else {
            parse_loose(token).map(Clause::Exact)
        }
    }

    /// Parse wildcard patterns: `1.x`, `1.2.x`, `1.*`, `2.x.x`.
    fn parse_wildcard(token: &str) -> Option<Self> {
        let is_wild = |s: &str| s == "*" || s.eq_ignore_ascii_case("x");
        let parts: Vec<&str> = token.split('.').collect();

        match parts.as_slice() {
            [major, rest @ ..] if !rest.is_empty() && rest.iter().all(|p| is_wild(p)) => {
                major.parse().ok().map(Clause::WildcardMajor)
            }
            [major, minor, x] if is_wild(x) => {
                let major = major.parse().ok()?;
                let minor = minor.parse().ok()?;
                Some(Clause::WildcardMinor(major, minor))
            }
            _ => None,
        }
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            Clause::Exact(v) => version == v,
            Clause::Caret(v) => {
                if version < v {
                    return false;
                }
                // ^1.2.3 -> <2.0.0, ^0.2.3 -> <0.3.0, ^0.0.3 -> =0.0.3
                if v.major == 0 {
                    if v.minor == 0 {
                        version.major == 0 && version.minor == 0 && version.patch == v.patch
                    } else {
                        version.major == 0 && version.minor == v.minor
                    }
                } else {
                    version.major == v.major
                }
            }
            Clause::Tilde(v) => {
                version >= v && version.major == v.major && version.minor == v.minor
            }
            Clause::Gte(v) => version >= v,
            Clause::Gt(v) => version > v,
            Clause::Lte(v) => version <= v,
            Clause::Lt(v) => version < v,
            Clause::Any => true,
            Clause::WildcardMajor(major) => version.major == *major,
            Clause::WildcardMinor(major, minor) => {
                version.major == *major && version.minor == *minor
            }
            Clause::Hyphen(from, to) => version >= from && version <= to,
        }
    }
}

/// A parsed comparator: `||`-separated alternatives, each a conjunction of
/// clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    alternatives: Vec<Vec<Clause>>,
}

impl RangeSpec {
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        let alternatives = spec
            .split("||")
            .map(Self::parse_conjunction)
            .collect::<Option<Vec<_>>>()?;
        Some(Self { alternatives })
    }

    /// Parse one space-separated conjunction, folding `from - to` triples
    /// into hyphen clauses.
    fn parse_conjunction(part: &str) -> Option<Vec<Clause>> {
        let tokens: Vec<&str> = part.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let mut clauses = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if i + 2 < tokens.len() && tokens[i + 1] == "-" {
                let from = parse_loose(tokens[i])?;
                let to = parse_loose(tokens[i + 2])?;
                clauses.push(Clause::Hyphen(from, to));
                i += 3;
            } else {
                clauses.push(Clause::parse(tokens[i])?);
                i += 1;
            }
        }
        Some(clauses)
    }

    /// Whether a version satisfies any alternative (all of its clauses).
    pub fn satisfies(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|clauses| clauses.iter().all(|c| c.satisfies(version)))
    }
}
