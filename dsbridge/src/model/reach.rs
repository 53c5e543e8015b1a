//! Marking the types an operator's interface reaches.
//!
//! `require` bumps the reference count of an entry and of everything
//! transitively reachable from it through alias, array and structure-field
//! edges. Counts are monotonic: marking the same entry again bumps it
//! again. An in-progress set cuts reference cycles, which a well-formed
//! model cannot contain.

use fxhash::FxHashSet;

use crate::markup::{NodeId, Tree};
use crate::model::{ModelId, Shape, Store};
use crate::reporting::{Message, OperatorMessage, RequireMessage};

/// Mark `id` and its whole reachable subgraph as required. Returns whether
/// anything below the entry, itself included, carries data worth emitting:
/// a bare primitive or plain alias contributes nothing on its own.
pub fn require(store: &mut Store, id: ModelId, messages: &mut Vec<Message>) -> bool {
    let mut visiting = FxHashSet::default();
    require_inner(store, id, &mut visiting, messages) > 0
}

fn require_inner(
    store: &mut Store,
    id: ModelId,
    visiting: &mut FxHashSet<ModelId>,
    messages: &mut Vec<Message>,
) -> usize {
    let Some(entry) = store.get(id) else {
        messages.push(RequireMessage::Undefined { id }.into());
        return 0;
    };
    let shape = entry.shape.clone();
    store.bump_ref(id);

    if !visiting.insert(id) {
        messages.push(RequireMessage::Cycle { id }.into());
        return 0;
    }

    let mut sub = match &shape {
        Shape::Primitive => 0,
        Shape::Alias { len, .. } => *len as usize,
        Shape::Struct { fields } => fields.len(),
    };
    match shape {
        Shape::Primitive => {}
        Shape::Alias { target, .. } => {
            if target == id {
                messages.push(RequireMessage::SelfReference { id }.into());
            } else {
                sub += require_inner(store, target, visiting, messages);
            }
        }
        Shape::Struct { fields } => {
            for field in fields {
                sub += require_inner(store, field, visiting, messages);
            }
        }
    }

    visiting.remove(&id);
    sub
}

/// Mark everything the operator's declared inputs and outputs reach,
/// reporting per direction how many declared parameters contributed
/// data-sets.
pub fn mark_interface(
    store: &mut Store,
    tree: &Tree,
    operator: NodeId,
    messages: &mut Vec<Message>,
) {
    for direction in ["input", "output"] {
        mark_parameters(store, tree, operator, direction, messages);
    }
}

fn mark_parameters(
    store: &mut Store,
    tree: &Tree,
    operator: NodeId,
    direction: &'static str,
    messages: &mut Vec<Message>,
) {
    let mut declared = 0;
    let mut composite = 0;
    for parameter in tree.children_with_tag(operator, direction) {
        let id = match tree.attr(parameter, "type") {
            Some(text) => match text.trim().parse::<i64>().ok().and_then(ModelId::new) {
                Some(id) => id,
                None => {
                    messages.push(
                        RequireMessage::InvalidParameter {
                            node: direction,
                            value: text.to_owned(),
                            span: tree.attr_span(parameter, "type"),
                        }
                        .into(),
                    );
                    continue;
                }
            },
            None => {
                messages.push(
                    RequireMessage::InvalidParameter {
                        node: direction,
                        value: String::new(),
                        span: tree.span(parameter),
                    }
                    .into(),
                );
                continue;
            }
        };
        declared += 1;
        if require(store, id, messages) {
            composite += 1;
        }
    }
    if declared > 0 {
        messages.push(
            OperatorMessage::InterfaceSummary {
                direction,
                composite,
                declared,
            }
            .into(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;
    use crate::model::scan;

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
          <field id="4" name="y" type="6"/>
        </struct>
        <array id="6" baseType="1" size="8"/>
      </model></mapping>"#;

    #[test]
    fn structures_mark_their_whole_subgraph() {
        let mut store = scanned(MODEL);
        let mut messages = Vec::new();

        assert!(require(&mut store, id(2), &mut messages));
        assert_eq!(store.get(id(2)).unwrap().ref_count(), 1);
        assert_eq!(store.get(id(3)).unwrap().ref_count(), 1);
        assert_eq!(store.get(id(4)).unwrap().ref_count(), 1);
        assert_eq!(store.get(id(6)).unwrap().ref_count(), 1);
        // the base type is reached through both fields' chains
        assert_eq!(store.get(id(1)).unwrap().ref_count(), 2);
        assert!(messages.is_empty());
    }

    #[test]
    fn counts_are_monotonic() {
        let mut store = scanned(MODEL);
        let mut messages = Vec::new();

        require(&mut store, id(2), &mut messages);
        require(&mut store, id(2), &mut messages);
        assert_eq!(store.get(id(2)).unwrap().ref_count(), 2);
        assert_eq!(store.get(id(3)).unwrap().ref_count(), 2);
    }

    #[test]
    fn primitives_contribute_nothing() {
        let mut store = scanned(MODEL);
        let mut messages = Vec::new();

        assert!(!require(&mut store, id(1), &mut messages));
        assert_eq!(store.get(id(1)).unwrap().ref_count(), 1);
        // an array alone still carries data
        assert!(require(&mut store, id(6), &mut messages));
    }

    #[test]
    fn undefined_ids_are_reported() {
        let mut store = scanned(MODEL);
        let mut messages = Vec::new();

        assert!(!require(&mut store, id(99), &mut messages));
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Require(RequireMessage::Undefined { .. })
        )));
    }

    #[test]
    fn mutual_recursion_is_cut() {
        // two structures whose fields point at each other
        let mut store = scanned(
            r#"<mapping><model>
                 <struct id="2"><field id="3" name="a" type="4"/></struct>
                 <struct id="4"><field id="5" name="b" type="2"/></struct>
               </model></mapping>"#,
        );
        let mut messages = Vec::new();

        assert!(require(&mut store, id(2), &mut messages));
        assert!(messages.iter().any(|message| {
            matches!(message, Message::Require(RequireMessage::Cycle { .. }))
        }));
    }

    #[test]
    fn marks_operator_parameters() {
        let tree = markup::parse(
            0,
            r#"<mapping><model>
                 <predefType id="1" name="int32"/>
                 <struct id="2"><field id="3" name="x" type="1"/></struct>
                 <package name="Pkg">
                   <operator name="Main">
                     <input name="in" type="2"/>
                     <input name="tick" type="1"/>
                     <output name="out" type="2"/>
                   </operator>
                 </package>
               </model></mapping>"#,
        )
        .unwrap();
        let mut context = scan::Context::new(&tree, scan::Options::default());
        context.scan_document();
        let (mut store, _) = context.finish();

        let model = tree.find_child(tree.root(), "model").unwrap();
        let operator = tree
            .find_descendant_by(model, "operator", "name", "Main")
            .unwrap();
        let mut messages = Vec::new();
        mark_interface(&mut store, &tree, operator, &mut messages);

        assert_eq!(store.get(id(2)).unwrap().ref_count(), 2);
        assert_eq!(store.get(id(1)).unwrap().ref_count(), 3);
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::InterfaceSummary {
                direction: "input",
                composite: 1,
                declared: 2,
            })
        )));
        assert!(messages.iter().any(|message| matches!(
            message,
            Message::Operator(OperatorMessage::InterfaceSummary {
                direction: "output",
                composite: 1,
                declared: 1,
            })
        )));
    }
}
