//! Stitching namespace-qualified display names together.

/// Separator between namespace segments and leaf names.
pub const SEPARATOR: char = '_';

/// Join `prefix` and `leaf` with [`SEPARATOR`], keeping at most `budget`
/// characters. A missing prefix passes the leaf through (truncated from
/// the front); a stitched result that runs over the budget keeps the
/// *trailing* characters, since the leaf name distinguishes better than
/// outer namespace segments.
pub fn stitch(prefix: Option<&str>, leaf: &str, budget: usize) -> String {
    match prefix {
        None | Some("") => keep_head(leaf, budget),
        Some(prefix) => {
            let stitched = format!("{prefix}{SEPARATOR}{leaf}");
            keep_tail(&stitched, budget)
        }
    }
}

fn keep_head(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}

fn keep_tail(text: &str, budget: usize) -> String {
    let len = text.chars().count();
    if len <= budget {
        text.to_owned()
    } else {
        text.chars().skip(len - budget).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_passes_through() {
        assert_eq!(stitch(None, "MyStruct", 30), "MyStruct");
        assert_eq!(stitch(Some(""), "MyStruct", 30), "MyStruct");
    }

    #[test]
    fn prefix_is_joined_with_the_separator() {
        assert_eq!(stitch(Some("Pkg"), "MyStruct", 30), "Pkg_MyStruct");
        assert_eq!(stitch(Some("Pkg_Inner"), "MyStruct", 30), "Pkg_Inner_MyStruct");
    }

    #[test]
    fn long_stitches_keep_the_tail() {
        // "Outer_Middle_Inner_Deep_Telemetry" is 33 characters; the first
        // three are dropped and the leaf survives intact.
        let name = stitch(Some("Outer_Middle_Inner_Deep"), "Telemetry", 30);
        assert_eq!(name, "er_Middle_Inner_Deep_Telemetry");
        assert_eq!(name.chars().count(), 30);
    }

    #[test]
    fn long_single_names_keep_the_head() {
        assert_eq!(stitch(None, "abcdefghij", 4), "abcd");
    }

    #[test]
    fn unbounded_budget() {
        let prefix = "A".repeat(100);
        let stitched = stitch(Some(&prefix), "Leaf", usize::MAX);
        assert_eq!(stitched.len(), 105);
    }
}
