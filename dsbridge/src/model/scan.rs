//! Scanning the model section of a mapping document into the store.
//!
//! Four sibling passes cover the declaration forms that appear directly
//! below `model` (`predefType`, `array`, `struct`, `type`), followed by a
//! recursive walk of nested `package` elements that re-runs the alias pass
//! with the accumulated namespace prefix. Passes may reference entries the
//! other passes define; resolution is deferred, so order between forms does
//! not matter.

use crate::markup::{NodeId, Tree};
use crate::model::store::{DefineError, NameError};
use crate::model::{name, prim, Entry, ModelId, Shape, Store, MAX_MODEL_ID};
use crate::reporting::{Message, ScanMessage};
use crate::source::Span;

/// Largest accepted array element count.
pub const MAX_ARRAY_LEN: u32 = 0xFFFF;

#[derive(Default)]
pub struct Options {
    /// Emit numeric protocol codes instead of canonical names as the
    /// `dataset_id` of primitives.
    pub numeric_type_ids: bool,
}

pub struct Context<'tree> {
    tree: &'tree Tree,
    options: Options,
    store: Store,
    messages: Vec<Message>,
    arrays: usize,
    structs: usize,
    aliases: usize,
}

impl<'tree> Context<'tree> {
    pub fn new(tree: &'tree Tree, options: Options) -> Context<'tree> {
        Context {
            tree,
            options,
            store: Store::new(),
            messages: Vec::new(),
            arrays: 0,
            structs: 0,
            aliases: 0,
        }
    }

    /// Scan the whole document, tolerating missing sections.
    pub fn scan_document(&mut self) {
        let tree = self.tree;
        let root = tree.root();
        if tree.tag(root) != "mapping" {
            self.push_message(ScanMessage::MissingSection {
                tag: "mapping",
                span: tree.span(root),
            });
            return;
        }
        match tree.find_child(root, "model") {
            Some(model) => self.scan_model(model),
            None => self.push_message(ScanMessage::MissingSection {
                tag: "model",
                span: tree.span(root),
            }),
        }
    }

    pub fn scan_model(&mut self, model: NodeId) {
        self.scan_primitives(model);
        self.scan_arrays(model);
        self.scan_structs(model);
        self.scan_aliases(model, None);
        self.scan_packages(model, None);

        self.push_message(ScanMessage::Summary {
            arrays: self.arrays,
            structs: self.structs,
            aliases: self.aliases,
        });
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn finish(self) -> (Store, Vec<Message>) {
        (self.store, self.messages)
    }

    fn push_message(&mut self, message: impl Into<Message>) {
        self.messages.push(message.into());
    }

    fn scan_primitives(&mut self, model: NodeId) {
        let tree = self.tree;
        for node in tree.children_with_tag(model, "predefType") {
            let Some(id) = self.attr_id(node, "id") else {
                continue;
            };
            let Some(declared) = self.attr_text(node, "name") else {
                continue;
            };
            match prim::lookup(declared) {
                Some(base) => {
                    let dataset_id = if self.options.numeric_type_ids {
                        base.code.to_string()
                    } else {
                        base.dataset_id.to_owned()
                    };
                    self.define(
                        id,
                        Entry::primitive(dataset_id, base.code),
                        tree.attr_span(node, "id"),
                    );
                }
                None => self.push_message(ScanMessage::UnknownBaseType {
                    name: declared.to_owned(),
                    span: tree.attr_span(node, "name"),
                    suggestion: prim::suggest(declared),
                }),
            }
        }
    }

    fn scan_arrays(&mut self, model: NodeId) {
        let tree = self.tree;
        for node in tree.children_with_tag(model, "array") {
            let Some(id) = self.attr_id(node, "id") else {
                continue;
            };
            let Some(target) = self.attr_id(node, "baseType") else {
                continue;
            };
            let Some(len) = self.attr_int(node, "size", 1, MAX_ARRAY_LEN as i64) else {
                continue;
            };
            let defined = self.define(
                id,
                Entry::user(
                    id,
                    Shape::Alias {
                        target,
                        len: len as u32,
                    },
                    None,
                ),
                tree.attr_span(node, "id"),
            );
            if defined {
                self.arrays += 1;
            }
        }
    }

    fn scan_structs(&mut self, model: NodeId) {
        let tree = self.tree;
        for node in tree.children_with_tag(model, "struct") {
            let Some(id) = self.attr_id(node, "id") else {
                continue;
            };
            let mut fields = Vec::new();
            for field in tree.children_with_tag(node, "field") {
                let Some(field_id) = self.attr_id(field, "id") else {
                    continue;
                };
                let Some(target) = self.attr_id(field, "type") else {
                    continue;
                };
                let field_name = tree.attr(field, "name").map(str::to_owned);
                let defined = self.define(
                    field_id,
                    Entry::user(field_id, Shape::Alias { target, len: 0 }, field_name),
                    tree.attr_span(field, "id"),
                );
                if defined {
                    fields.push(field_id);
                }
            }
            let defined = self.define(
                id,
                Entry::user(id, Shape::Struct { fields }, None),
                tree.attr_span(node, "id"),
            );
            if defined {
                self.structs += 1;
            }
        }
    }

    /// Scan `type` declarations directly below `scope`, propagating names
    /// onto the structures they point at.
    fn scan_aliases(&mut self, scope: NodeId, prefix: Option<&str>) {
        let tree = self.tree;
        for node in tree.children_with_tag(scope, "type") {
            let Some(id) = self.attr_id(node, "id") else {
                continue;
            };
            let Some(target) = self.attr_id(node, "type") else {
                continue;
            };
            let Some(alias_name) = self.attr_text(node, "name") else {
                continue;
            };
            let defined = self.define(
                id,
                Entry::user(
                    id,
                    Shape::Alias { target, len: 0 },
                    Some(alias_name.to_owned()),
                ),
                tree.attr_span(node, "id"),
            );
            if defined && self.propagate(target, alias_name, prefix, tree.attr_span(node, "name"))
            {
                self.aliases += 1;
            }
        }
    }

    fn scan_packages(&mut self, scope: NodeId, prefix: Option<&str>) {
        let tree = self.tree;
        for package in tree.children_with_tag(scope, "package") {
            let Some(package_name) = self.attr_text(package, "name") else {
                continue;
            };
            let qualified = name::stitch(prefix, package_name, usize::MAX);
            self.scan_aliases(package, Some(&qualified));
            self.scan_packages(package, Some(&qualified));
        }
    }

    fn define(&mut self, id: ModelId, entry: Entry, span: Span) -> bool {
        match self.store.define(id, entry) {
            Ok(()) => true,
            Err(DefineError::AlreadyDefined) => {
                self.push_message(ScanMessage::DuplicateDefinition { id, span });
                false
            }
        }
    }

    fn propagate(&mut self, id: ModelId, proposed: &str, prefix: Option<&str>, span: Span) -> bool {
        match self.store.propagate_name(id, proposed, prefix) {
            Ok(attached) => attached,
            Err(NameError::Conflict { existing }) => {
                self.push_message(ScanMessage::NameConflict {
                    id,
                    existing,
                    proposed: proposed.to_owned(),
                    span,
                });
                false
            }
            Err(NameError::NotDefined) => {
                self.push_message(ScanMessage::NameForUndefined { id, span });
                false
            }
        }
    }

    fn attr_text(&mut self, node: NodeId, attr: &'static str) -> Option<&'tree str> {
        let tree = self.tree;
        match tree.attr(node, attr) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                self.push_message(ScanMessage::MissingAttribute {
                    node: tree.tag(node).to_owned(),
                    attr,
                    span: tree.span(node),
                });
                None
            }
        }
    }

    fn attr_int(&mut self, node: NodeId, attr: &'static str, min: i64, max: i64) -> Option<i64> {
        let tree = self.tree;
        let text = self.attr_text(node, attr)?;
        match text.trim().parse::<i64>() {
            Ok(value) if (min..=max).contains(&value) => Some(value),
            _ => {
                self.push_message(ScanMessage::InvalidAttribute {
                    node: tree.tag(node).to_owned(),
                    attr,
                    value: text.to_owned(),
                    span: tree.attr_span(node, attr),
                });
                None
            }
        }
    }

    fn attr_id(&mut self, node: NodeId, attr: &'static str) -> Option<ModelId> {
        let raw = self.attr_int(node, attr, 1, MAX_MODEL_ID as i64)?;
        ModelId::new(raw)
    }
}
