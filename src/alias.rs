//! Registry alias resolution
//!
//! npm manifests may declare a dependency under one name while installing
//! another: `"react-dom": "npm:@preact/compat@^17.0.0"`. Resolution must
//! operate on the aliased package and its trailing range, not the declared
//! name.

/// Split an `npm:name@range` comparator into its alias name and range.
///
/// The split happens at the **last** `@` so scoped alias names, which carry a
/// leading `@` of their own, stay intact. Returns `None` when the comparator
/// is not an alias or the alias is malformed (missing `@`, empty name, empty
/// range).
pub fn split_alias(comparator: &str) -> Option<(&str, &str)> {
    let rest = comparator.strip_prefix("npm:")?;
    let at = rest.rfind('@')?;
    let (name, range) = (&rest[..at], &rest[at + 1..]);
    if name.is_empty() || range.is_empty() {
        return None;
    }
    Some((name, range))
}

/// Rewrite an alias comparator into a real package name and comparator.
///
/// Non-alias comparators and malformed aliases pass through unchanged; a
/// malformed alias is not an error, downstream classification rejects it.
pub fn resolve_alias<'a>(name: &'a str, comparator: &'a str) -> (&'a str, &'a str) {
    match split_alias(comparator) {
        Some((alias_name, alias_comparator)) => (alias_name, alias_comparator),
        None => (name, comparator),
    }
}
