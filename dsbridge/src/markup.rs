//! The labeled document tree that model maps are read from and data-set
//! descriptions are written into.
//!
//! Nodes live in an index-addressed arena owned by the [`Tree`]; the rest of
//! the crate only sees [`NodeId`] handles. Lookups come in sibling-only and
//! descending flavours, with an optional attribute-value filter.

pub mod parse;
pub mod pretty;

pub use self::parse::{parse, Error as ParseError};

use crate::source::Span;

/// Handle to a node in a [`Tree`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Attr {
    pub(crate) name: String,
    pub(crate) value: String,
    pub(crate) value_span: Span,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) tag: String,
    pub(crate) span: Span,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Tree {
    /// Start a new tree for output, rooted at an element with the given tag.
    pub fn build(tag: &str) -> Tree {
        Tree {
            nodes: vec![NodeData {
                tag: tag.to_owned(),
                span: Span::Empty,
                attrs: Vec::new(),
                children: Vec::new(),
            }],
            root: NodeId(0),
        }
    }

    pub(crate) fn from_parts(nodes: Vec<NodeData>, root: NodeId) -> Tree {
        Tree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attrs
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// The span of an attribute's value, or the node's own span when the
    /// attribute is absent.
    pub fn attr_span(&self, id: NodeId, name: &str) -> Span {
        self.node(id)
            .attrs
            .iter()
            .find(|attr| attr.name == name)
            .map_or(self.span(id), |attr| attr.value_span)
    }

    pub fn attrs(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.node(id)
            .attrs
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str()))
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.node(id).children.is_empty()
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id).children.iter().copied()
    }

    pub fn children_with_tag<'a>(
        &'a self,
        id: NodeId,
        tag: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).filter(move |&child| self.tag(child) == tag)
    }

    /// First direct child with the given tag.
    pub fn find_child(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.children_with_tag(id, tag).next()
    }

    /// First direct child with the given tag and attribute value.
    pub fn find_child_by(&self, id: NodeId, tag: &str, attr: &str, value: &str) -> Option<NodeId> {
        self.children_with_tag(id, tag)
            .find(|&child| self.attr(child, attr) == Some(value))
    }

    /// Pre-order traversal of everything strictly below `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack: Vec<NodeId> = self.node(id).children.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(self.node(next).children.iter().rev().copied());
            Some(next)
        })
    }

    /// Descending variant of [`Tree::find_child_by`].
    pub fn find_descendant_by(
        &self,
        id: NodeId,
        tag: &str,
        attr: &str,
        value: &str,
    ) -> Option<NodeId> {
        self.descendants(id)
            .find(|&node| self.tag(node) == tag && self.attr(node, attr) == Some(value))
    }

    /// Create a detached element; attach it with [`Tree::append_child`].
    pub fn new_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            tag: tag.to_owned(),
            span: Span::Empty,
            attrs: Vec::new(),
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.push(child);
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let node = self.node_mut(id);
        match node.attrs.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => {
                attr.value = value.into();
                attr.value_span = Span::Empty;
            }
            None => node.attrs.push(Attr {
                name: name.to_owned(),
                value: value.into(),
                value_span: Span::Empty,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tree {
        parse(
            0,
            r#"<mapping>
                 <config>
                   <option name="root" value="Main"/>
                   <option name="period" value="100"/>
                 </config>
                 <model>
                   <predefType id="1" name="int32"/>
                   <package name="Pkg">
                     <package name="Inner">
                       <operator name="Main"/>
                     </package>
                   </package>
                 </model>
               </mapping>"#,
        )
        .unwrap()
    }

    #[test]
    fn navigation() {
        let tree = sample();
        let mapping = tree.root();
        assert_eq!(tree.tag(mapping), "mapping");

        let config = tree.find_child(mapping, "config").unwrap();
        let root = tree.find_child_by(config, "option", "name", "root").unwrap();
        assert_eq!(tree.attr(root, "value"), Some("Main"));
        assert!(tree.find_child_by(config, "option", "name", "missing").is_none());

        let model = tree.find_child(mapping, "model").unwrap();
        assert!(tree.find_child(model, "operator").is_none());
        let operator = tree
            .find_descendant_by(model, "operator", "name", "Main")
            .unwrap();
        assert_eq!(tree.tag(operator), "operator");
    }

    #[test]
    fn descendants_are_preorder() {
        let tree = sample();
        let tags: Vec<&str> = tree
            .descendants(tree.root())
            .map(|node| tree.tag(node))
            .collect();
        assert_eq!(
            tags,
            &["config", "option", "option", "model", "predefType", "package", "package", "operator"],
        );
    }

    #[test]
    fn building_output() {
        let mut tree = Tree::build("data-set-list");
        let ds = tree.new_element("data-set");
        tree.set_attr(ds, "id", "1001");
        tree.set_attr(ds, "id", "1002");
        tree.append_child(tree.root(), ds);

        assert!(tree.has_children(tree.root()));
        assert_eq!(tree.attr(ds, "id"), Some("1002"));
        assert_eq!(tree.children(tree.root()).count(), 1);
    }
}
