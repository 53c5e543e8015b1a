//! Rendering document trees back to markup text.

use pretty::{DocAllocator, DocBuilder, RefDoc};

use super::{NodeId, Tree};

const INDENT: isize = 2;

type Allocator<'arena> = pretty::Arena<'arena, ()>;

pub struct Context<'arena> {
    alloc: &'arena Allocator<'arena>,
    tree: &'arena Tree,
}

impl<'arena> Context<'arena> {
    pub fn new(alloc: &'arena Allocator<'arena>, tree: &'arena Tree) -> Context<'arena> {
        Context { alloc, tree }
    }

    /// The whole document, declaration included.
    pub fn document(&self) -> RefDoc<'arena> {
        self.alloc
            .text("<?xml version=\"1.0\"?>")
            .append(self.alloc.hardline())
            .append(self.element(self.tree.root()))
            .into_doc()
    }

    pub fn element(&self, node: NodeId) -> DocBuilder<'arena, Allocator<'arena>> {
        let tag = self.tree.tag(node);
        let open = self
            .alloc
            .text("<")
            .append(self.alloc.text(tag))
            .append(self.attrs(node).nest(INDENT))
            .group();

        if !self.tree.has_children(node) {
            return open.append(self.alloc.text("/>"));
        }

        let body = self.alloc.intersperse(
            self.tree.children(node).map(|child| self.element(child)),
            self.alloc.hardline(),
        );
        open.append(self.alloc.text(">"))
            .append(self.alloc.hardline().append(body).nest(INDENT))
            .append(self.alloc.hardline())
            .append(self.alloc.text("</"))
            .append(self.alloc.text(tag))
            .append(self.alloc.text(">"))
    }

    fn attrs(&self, node: NodeId) -> DocBuilder<'arena, Allocator<'arena>> {
        self.alloc.concat(self.tree.attrs(node).map(|(name, value)| {
            self.alloc
                .line()
                .append(self.alloc.text(name))
                .append(self.alloc.text("=\""))
                .append(self.alloc.text(escape(value)))
                .append(self.alloc.text("\""))
        }))
    }
}

/// Escape markup-significant characters in attribute values.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn render(tree: &Tree, width: usize) -> String {
        let alloc = pretty::Arena::new();
        let context = Context::new(&alloc, tree);
        context.document().pretty(width).to_string()
    }

    #[test]
    fn renders_nested_elements() {
        let mut tree = Tree::build("data-set-list");
        let ds = tree.new_element("data-set");
        tree.set_attr(ds, "id", "1002");
        tree.set_attr(ds, "name", "Pkg_MyStruct");
        let el = tree.new_element("element");
        tree.set_attr(el, "name", "x");
        tree.set_attr(el, "type", "INT32");
        tree.append_child(ds, el);
        tree.append_child(tree.root(), ds);

        let rendered = render(&tree, 100);
        assert_eq!(
            rendered,
            "<?xml version=\"1.0\"?>\n\
             <data-set-list>\n\
             \x20\x20<data-set id=\"1002\" name=\"Pkg_MyStruct\">\n\
             \x20\x20\x20\x20<element name=\"x\" type=\"INT32\"/>\n\
             \x20\x20</data-set>\n\
             </data-set-list>"
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let mut tree = Tree::build("a");
        tree.set_attr(tree.root(), "name", "x < \"y\" & z");
        let rendered = render(&tree, 100);
        assert!(rendered.contains("name=\"x &lt; &quot;y&quot; &amp; z\""));
    }

    #[test]
    fn output_parses_back() {
        let mut tree = Tree::build("data-set-list");
        let ds = tree.new_element("data-set");
        tree.set_attr(ds, "id", "1001");
        tree.append_child(tree.root(), ds);

        let rendered = render(&tree, 100);
        let reparsed = markup::parse(0, &rendered).unwrap();
        assert_eq!(reparsed.tag(reparsed.root()), "data-set-list");
        let child = reparsed.find_child(reparsed.root(), "data-set").unwrap();
        assert_eq!(reparsed.attr(child, "id"), Some("1001"));
    }
}
