//! Flattening the store into protocol data-set descriptions.
//!
//! Every structure with at least one field becomes a data-set; every field
//! becomes one element whose type is found by chasing the alias chain down
//! to a primitive or another structure. The protocol allows at most one
//! array dimension per element, so a second array link in the same chain is
//! reported and only the first dimension survives.

use fxhash::FxHashSet;

use crate::markup::{NodeId, Tree};
use crate::model::{Entry, ModelId, Shape, Store};
use crate::reporting::{CompileMessage, Message};

/// Build the `data-set-list` output tree. With `include_all` set, every
/// known structure is emitted; otherwise only those marked required.
pub fn compile(store: &Store, include_all: bool) -> (Tree, Vec<Message>) {
    let mut tree = Tree::build("data-set-list");
    let mut messages = Vec::new();
    let list = tree.root();

    for (_, entry) in store.entries() {
        let Shape::Struct { fields } = &entry.shape else {
            continue;
        };
        if fields.is_empty() {
            continue;
        }
        if !include_all && entry.ref_count() == 0 {
            continue;
        }

        let dataset = tree.new_element("data-set");
        if let Some(name) = &entry.name {
            tree.set_attr(dataset, "name", name.as_str());
        }
        tree.set_attr(dataset, "id", entry.dataset_id.as_str());
        tree.append_child(list, dataset);

        for &field in fields {
            compile_element(store, &mut tree, dataset, entry, field, &mut messages);
        }
    }

    (tree, messages)
}

/// Emit one element for the field entry at `field`, resolving its base
/// type through the alias chain.
fn compile_element(
    store: &Store,
    tree: &mut Tree,
    dataset: NodeId,
    owner: &Entry,
    field: ModelId,
    messages: &mut Vec<Message>,
) {
    let element = tree.new_element("element");
    tree.append_child(dataset, element);

    let element_name = store.get(field).and_then(|entry| entry.name.clone());
    if let Some(name) = &element_name {
        tree.set_attr(element, "name", name.as_str());
    }

    let mut current = field;
    let mut first_len: Option<u32> = None;
    let mut seen = FxHashSet::default();
    seen.insert(current);

    loop {
        let Some(entry) = store.get(current) else {
            messages.push(
                CompileMessage::UnresolvedReference {
                    dataset_id: owner.dataset_id.clone(),
                    element: element_name.clone(),
                    id: current,
                }
                .into(),
            );
            return;
        };
        match &entry.shape {
            Shape::Alias { target, len } => {
                if *len > 0 {
                    match first_len {
                        None => {
                            tree.set_attr(element, "array-size", len.to_string());
                            first_len = Some(*len);
                        }
                        Some(first) => messages.push(
                            CompileMessage::NestedArray {
                                dataset_id: owner.dataset_id.clone(),
                                dataset_name: owner.name.clone(),
                                element: element_name.clone(),
                                first,
                                second: *len,
                            }
                            .into(),
                        ),
                    }
                }
                let target = *target;
                if !seen.insert(target) {
                    messages.push(
                        CompileMessage::AliasCycle {
                            dataset_id: owner.dataset_id.clone(),
                            element: element_name.clone(),
                            id: target,
                        }
                        .into(),
                    );
                    return;
                }
                current = target;
            }
            Shape::Primitive | Shape::Struct { .. } => {
                tree.set_attr(element, "type", entry.dataset_id.clone());
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::model::{reach, scan};

    fn id(raw: i64) -> ModelId {
        ModelId::new(raw).unwrap()
    }

    fn scanned(source: &str) -> Store {
        let tree = markup::parse(0, source).unwrap();
        let mut context = scan::Context::new(&tree, scan::Options::default());
        context.scan_document();
        let (store, _) = context.finish();
        store
    }

    const MODEL: &str = r#"<mapping><model>
        <predefType id="1" name="int32"/>
        <struct id="2">
          <field id="3" name="x" type="1"/>
          <field id="4" name="samples" type="6"/>
        </struct>
        <array id="6" baseType="1" size="8"/>
        <struct id="7">
          <field id="8" name="inner" type="2"/>
        </struct>
        <struct id="9"/>
      </model></mapping>"#;

    fn elements(tree: &Tree, dataset: NodeId) -> Vec<NodeId> {
        tree.children_with_tag(dataset, "element").collect()
    }

    #[test]
    fn required_only_emits_marked_structures() {
        let mut store = scanned(MODEL);
        let mut messages = Vec::new();
        reach::require(&mut store, id(2), &mut messages);

        let (tree, messages) = compile(&store, false);
        assert!(messages.is_empty());

        let datasets: Vec<NodeId> = tree.children(tree.root()).collect();
        assert_eq!(datasets.len(), 1);
        assert_eq!(tree.attr(datasets[0], "id"), Some("1002"));

        let elements = elements(&tree, datasets[0]);
        assert_eq!(elements.len(), 2);
        assert_eq!(tree.attr(elements[0], "name"), Some("x"));
        assert_eq!(tree.attr(elements[0], "type"), Some("INT32"));
        assert_eq!(tree.attr(elements[0], "array-size"), None);
        assert_eq!(tree.attr(elements[1], "name"), Some("samples"));
        assert_eq!(tree.attr(elements[1], "type"), Some("INT32"));
        assert_eq!(tree.attr(elements[1], "array-size"), Some("8"));
    }

    #[test]
    fn include_all_ignores_reference_counts() {
        let store = scanned(MODEL);
        let (tree, _) = compile(&store, true);

        let ids: Vec<&str> = tree
            .children(tree.root())
            .filter_map(|dataset| tree.attr(dataset, "id"))
            .collect();
        // the zero-field structure at id 9 is never a data-set root
        assert_eq!(ids, &["1002", "1007"]);
    }

    #[test]
    fn structure_references_use_the_dataset_code() {
        let store = scanned(MODEL);
        let (tree, _) = compile(&store, true);

        let nested = tree
            .children(tree.root())
            .find(|&dataset| tree.attr(dataset, "id") == Some("1007"))
            .unwrap();
        let elements = elements(&tree, nested);
        assert_eq!(tree.attr(elements[0], "type"), Some("1002"));
    }

    #[test]
    fn nested_arrays_keep_the_first_dimension() {
        let store = scanned(
            r#"<mapping><model>
                 <predefType id="1" name="int32"/>
                 <struct id="2"><field id="3" name="grid" type="4"/></struct>
                 <array id="4" baseType="5" size="5"/>
                 <array id="5" baseType="1" size="7"/>
               </model></mapping>"#,
        );
        let (tree, messages) = compile(&store, true);

        let dataset = tree.children(tree.root()).next().unwrap();
        let element = tree.find_child(dataset, "element").unwrap();
        assert_eq!(tree.attr(element, "array-size"), Some("5"));
        assert_eq!(tree.attr(element, "type"), Some("INT32"));
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Compile(CompileMessage::NestedArray { first: 5, second: 7, .. })
        )));
    }

    #[test]
    fn broken_references_drop_the_type_attribute() {
        let store = scanned(
            r#"<mapping><model>
                 <struct id="2"><field id="3" name="x" type="42"/></struct>
               </model></mapping>"#,
        );
        let (tree, messages) = compile(&store, true);

        let dataset = tree.children(tree.root()).next().unwrap();
        let element = tree.find_child(dataset, "element").unwrap();
        assert_eq!(tree.attr(element, "name"), Some("x"));
        assert_eq!(tree.attr(element, "type"), None);
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Compile(CompileMessage::UnresolvedReference { .. })
        )));
    }

    #[test]
    fn alias_cycles_are_cut() {
        let store = scanned(
            r#"<mapping><model>
                 <struct id="2"><field id="3" name="x" type="4"/></struct>
                 <type id="4" name="A" type="5"/>
                 <type id="5" name="B" type="4"/>
               </model></mapping>"#,
        );
        let (tree, messages) = compile(&store, true);

        let dataset = tree.children(tree.root()).next().unwrap();
        let element = tree.find_child(dataset, "element").unwrap();
        assert_eq!(tree.attr(element, "type"), None);
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Compile(CompileMessage::AliasCycle { .. })
        )));
    }
}
