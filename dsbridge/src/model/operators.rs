//! Locating the requested operator inside the package hierarchy.

use itertools::Itertools;

use crate::markup::{NodeId, Tree};
use crate::reporting::{Message, OperatorMessage};

/// The operator name the document itself designates, from the `root`
/// option of the `config` section.
pub fn root_option(tree: &Tree, mapping: NodeId) -> Option<String> {
    let config = tree.find_child(mapping, "config")?;
    let option = tree.find_descendant_by(config, "option", "name", "root")?;
    tree.attr(option, "value").map(str::to_owned)
}

/// Resolve a scoped name of the form `seg1::seg2::...::opname` to a single
/// operator below `model`. Every package segment must match exactly one
/// child package; the final segment may match an operator anywhere below
/// the resolved package, but must match exactly one.
pub fn find(
    tree: &Tree,
    model: NodeId,
    scoped: &str,
    messages: &mut Vec<Message>,
) -> Option<NodeId> {
    let mut segments: Vec<&str> = scoped.split("::").collect();
    let leaf = segments.pop().unwrap_or("");
    if leaf.is_empty() {
        messages.push(
            OperatorMessage::NotFound {
                name: scoped.to_owned(),
            }
            .into(),
        );
        return None;
    }

    let mut scope = model;
    for &segment in &segments {
        let matches: Vec<NodeId> = tree
            .children_with_tag(scope, "package")
            .filter(|&package| tree.attr(package, "name") == Some(segment))
            .collect();
        match matches.as_slice() {
            [] => {
                messages.push(
                    OperatorMessage::UnresolvedPackage {
                        scoped: scoped.to_owned(),
                        segment: segment.to_owned(),
                    }
                    .into(),
                );
                return None;
            }
            [package] => scope = *package,
            _ => {
                messages.push(
                    OperatorMessage::AmbiguousPackage {
                        scoped: scoped.to_owned(),
                        segment: segment.to_owned(),
                    }
                    .into(),
                );
                return None;
            }
        }
    }

    let matches = operators_below(tree, scope, leaf);
    match matches.as_slice() {
        [] => {
            messages.push(
                OperatorMessage::NotFound {
                    name: scoped.to_owned(),
                }
                .into(),
            );
            None
        }
        [(operator, path)] => {
            let qualified = segments
                .iter()
                .copied()
                .chain(path.iter().map(String::as_str))
                .chain(std::iter::once(leaf))
                .join("::");
            messages.push(OperatorMessage::Resolved { path: qualified }.into());
            Some(*operator)
        }
        _ => {
            messages.push(
                OperatorMessage::Ambiguous {
                    name: scoped.to_owned(),
                    count: matches.len(),
                }
                .into(),
            );
            None
        }
    }
}

/// All operators named `leaf` at or below `scope`, with the package path
/// leading to each.
fn operators_below(tree: &Tree, scope: NodeId, leaf: &str) -> Vec<(NodeId, Vec<String>)> {
    let mut found = Vec::new();
    let mut stack: Vec<(NodeId, Vec<String>)> = vec![(scope, Vec::new())];
    while let Some((node, path)) = stack.pop() {
        for child in tree.children(node) {
            match tree.tag(child) {
                "package" => {
                    let mut path = path.clone();
                    if let Some(name) = tree.attr(child, "name") {
                        path.push(name.to_owned());
                    }
                    stack.push((child, path));
                }
                "operator" if tree.attr(child, "name") == Some(leaf) => {
                    found.push((child, path.clone()));
                }
                _ => {}
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::reporting::Message;

    const SOURCE: &str = r#"<mapping>
        <config><option name="root" value="Pkg::Main"/></config>
        <model>
          <package name="Pkg">
            <operator name="Main"/>
            <package name="Inner">
              <operator name="Step"/>
            </package>
          </package>
          <package name="Other">
            <operator name="Step"/>
          </package>
        </model>
      </mapping>"#;

    fn parsed() -> markup::Tree {
        markup::parse(0, SOURCE).unwrap()
    }

    #[test]
    fn reads_the_root_option() {
        let tree = parsed();
        assert_eq!(root_option(&tree, tree.root()).as_deref(), Some("Pkg::Main"));
    }

    #[test]
    fn resolves_scoped_names() {
        let tree = parsed();
        let model = tree.find_child(tree.root(), "model").unwrap();
        let mut messages = Vec::new();

        let operator = find(&tree, model, "Pkg::Main", &mut messages).unwrap();
        assert_eq!(tree.attr(operator, "name"), Some("Main"));
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::Resolved { path }) if path == "Pkg::Main"
        )));
    }

    #[test]
    fn descends_past_the_resolved_package() {
        let tree = parsed();
        let model = tree.find_child(tree.root(), "model").unwrap();
        let mut messages = Vec::new();

        let operator = find(&tree, model, "Pkg::Step", &mut messages).unwrap();
        assert_eq!(tree.attr(operator, "name"), Some("Step"));
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::Resolved { path }) if path == "Pkg::Inner::Step"
        )));
    }

    #[test]
    fn bare_names_can_be_ambiguous() {
        let tree = parsed();
        let model = tree.find_child(tree.root(), "model").unwrap();
        let mut messages = Vec::new();

        assert!(find(&tree, model, "Step", &mut messages).is_none());
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::Ambiguous { count: 2, .. })
        )));
    }

    #[test]
    fn unresolved_packages_fail() {
        let tree = parsed();
        let model = tree.find_child(tree.root(), "model").unwrap();
        let mut messages = Vec::new();

        assert!(find(&tree, model, "Nope::Main", &mut messages).is_none());
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::UnresolvedPackage { segment, .. }) if segment == "Nope"
        )));
    }

    #[test]
    fn missing_operators_fail() {
        let tree = parsed();
        let model = tree.find_child(tree.root(), "model").unwrap();
        let mut messages = Vec::new();

        assert!(find(&tree, model, "Pkg::Absent", &mut messages).is_none());
        assert!(messages.iter().any(|message| {
            matches!(message, Message::Operator(OperatorMessage::NotFound { .. }))
        }));
    }
}
