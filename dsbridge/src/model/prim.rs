//! The closed table of base types recognized in primitive declarations.

use fxhash::FxHashMap;
use once_cell::sync::Lazy;

/// A base type of the target protocol.
#[derive(Debug, PartialEq, Eq)]
pub struct BaseType {
    /// Name used by the model generator.
    pub name: &'static str,
    /// Canonical protocol identifier.
    pub dataset_id: &'static str,
    /// Numeric protocol code.
    pub code: u32,
}

const fn base(name: &'static str, dataset_id: &'static str, code: u32) -> BaseType {
    BaseType {
        name,
        dataset_id,
        code,
    }
}

pub const BASE_TYPES: &[BaseType] = &[
    base("bool", "BOOL8", 1),
    base("char", "CHAR8", 2),
    base("wchar", "UTF16", 3),
    base("int8", "INT8", 4),
    base("int16", "INT16", 5),
    base("int32", "INT32", 6),
    base("int64", "INT64", 7),
    base("uint8", "UINT8", 8),
    base("uint16", "UINT16", 9),
    base("uint32", "UINT32", 10),
    base("uint64", "UINT64", 11),
    base("float32", "REAL32", 12),
    base("float64", "REAL64", 13),
    base("timedate32", "TIMEDATE32", 14),
    base("timedate48", "TIMEDATE48", 15),
    base("timedate64", "TIMEDATE64", 16),
];

/// Target for recognized names without a width of their own (`size`).
pub fn default_width() -> &'static BaseType {
    &BASE_TYPES[5]
}

static LOOKUP: Lazy<FxHashMap<&'static str, &'static BaseType>> =
    Lazy::new(|| BASE_TYPES.iter().map(|base| (base.name, base)).collect());

/// Case-insensitive lookup of a declared primitive name. The platform
/// width `size` is recognized but maps to the default width.
pub fn lookup(name: &str) -> Option<&'static BaseType> {
    let lower = name.to_ascii_lowercase();
    if lower == "size" {
        return Some(default_width());
    }
    LOOKUP.get(lower.as_str()).copied()
}

/// Closest known name within a small edit distance, for typo suggestions.
pub fn suggest(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    BASE_TYPES
        .iter()
        .map(|base| (levenshtein::levenshtein(&lower, base.name), base.name))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("Int32").unwrap().dataset_id, "INT32");
        assert_eq!(lookup("TIMEDATE48").unwrap().code, 15);
    }

    #[test]
    fn size_falls_back_to_the_default_width() {
        let base = lookup("size").unwrap();
        assert_eq!(base.dataset_id, "INT32");
        assert_eq!(base.code, 6);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(lookup("quaternion").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn identifiers_fit_the_protocol_budget() {
        for base in BASE_TYPES {
            assert!(base.dataset_id.len() <= 11, "{}", base.dataset_id);
        }
    }

    #[test]
    fn suggestions() {
        assert_eq!(suggest("int31"), Some("int32"));
        assert_eq!(suggest("flaot32"), Some("float32"));
        assert_eq!(suggest("quaternion"), None);
    }
}
