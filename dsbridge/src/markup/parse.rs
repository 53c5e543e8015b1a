//! Strict parsing of document text into a [`Tree`].
//!
//! The grammar is the attribute-only markup subset the model-map generator
//! emits: elements, quoted attributes, comments, processing instructions and
//! doctype/cdata sections (skipped), and the predefined entities plus
//! numeric character references in attribute values. Text content is lexed
//! and discarded. The first well-formedness violation aborts the parse.

use codespan_reporting::diagnostic::Diagnostic;
use std::iter::Peekable;
use std::str::CharIndices;

use super::{Attr, NodeData, NodeId, Tree};
use crate::source::{BytePos, ByteRange, FileId, Span};

pub fn parse(file_id: FileId, source: &str) -> Result<Tree, Error> {
    Parser::new(file_id, source).document()
}

#[derive(Clone, Debug)]
pub enum Error {
    UnexpectedEnd {
        range: ByteRange,
        expected: &'static str,
    },
    UnexpectedChar {
        range: ByteRange,
        found: char,
        expected: &'static str,
    },
    MismatchedCloseTag {
        open_tag: String,
        open_range: ByteRange,
        found: String,
        range: ByteRange,
    },
    UnclosedElement {
        open_tag: String,
        open_range: ByteRange,
    },
    UnterminatedLiteral {
        range: ByteRange,
    },
    UnterminatedComment {
        range: ByteRange,
    },
    UnknownEntity {
        range: ByteRange,
        name: String,
    },
    DuplicateAttribute {
        range: ByteRange,
        name: String,
    },
    MultipleRootElements {
        range: ByteRange,
    },
    MissingRootElement {
        range: ByteRange,
    },
}

impl Error {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Error::UnexpectedEnd { range, expected } => Diagnostic::error()
                .with_message(format!("unexpected end of document, expected {expected}"))
                .with_labels(vec![range.primary()]),
            Error::UnexpectedChar {
                range,
                found,
                expected,
            } => Diagnostic::error()
                .with_message(format!("unexpected character `{found}`, expected {expected}"))
                .with_labels(vec![range.primary()]),
            Error::MismatchedCloseTag {
                open_tag,
                open_range,
                found,
                range,
            } => Diagnostic::error()
                .with_message(format!(
                    "mismatched closing tag `{found}`, expected `{open_tag}`"
                ))
                .with_labels(vec![
                    range.primary(),
                    open_range
                        .secondary()
                        .with_message(format!("`{open_tag}` opened here")),
                ]),
            Error::UnclosedElement {
                open_tag,
                open_range,
            } => Diagnostic::error()
                .with_message(format!("unclosed element `{open_tag}`"))
                .with_labels(vec![open_range
                    .primary()
                    .with_message(format!("`{open_tag}` opened here"))]),
            Error::UnterminatedLiteral { range } => Diagnostic::error()
                .with_message("unterminated attribute value")
                .with_labels(vec![range.primary()]),
            Error::UnterminatedComment { range } => Diagnostic::error()
                .with_message("unterminated comment")
                .with_labels(vec![range.primary()]),
            Error::UnknownEntity { range, name } => Diagnostic::error()
                .with_message(format!("unknown entity `&{name};`"))
                .with_labels(vec![range.primary()]),
            Error::DuplicateAttribute { range, name } => Diagnostic::error()
                .with_message(format!("attribute `{name}` appears more than once"))
                .with_labels(vec![range.primary()]),
            Error::MultipleRootElements { range } => Diagnostic::error()
                .with_message("document has more than one root element")
                .with_labels(vec![range.primary()]),
            Error::MissingRootElement { range } => Diagnostic::error()
                .with_message("document has no root element")
                .with_labels(vec![range.primary()]),
        }
    }
}

struct Parser<'source> {
    file_id: FileId,
    source: &'source str,
    chars: Peekable<CharIndices<'source>>,
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':')
}

impl<'source> Parser<'source> {
    fn new(file_id: FileId, source: &'source str) -> Parser<'source> {
        Parser {
            file_id,
            source,
            chars: source.char_indices().peekable(),
        }
    }

    fn pos(&mut self) -> BytePos {
        self.chars
            .peek()
            .map_or(self.source.len() as BytePos, |(index, _)| *index as BytePos)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn range_from(&mut self, start: BytePos) -> ByteRange {
        let end = self.pos();
        ByteRange::new(self.file_id, start, end)
    }

    fn end_range(&self) -> ByteRange {
        let end = self.source.len() as BytePos;
        ByteRange::new(self.file_id, end, end)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char, what: &'static str) -> Result<(), Error> {
        let start = self.pos();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(Error::UnexpectedChar {
                range: ByteRange::new(self.file_id, start, start + c.len_utf8() as BytePos),
                found: c,
                expected: what,
            }),
            None => Err(Error::UnexpectedEnd {
                range: self.end_range(),
                expected: what,
            }),
        }
    }

    fn document(&mut self) -> Result<Tree, Error> {
        let mut nodes = Vec::new();
        let mut root = None;
        self.eat('\u{feff}');
        loop {
            self.skip_whitespace();
            let start = self.pos();
            match self.peek() {
                None => break,
                Some('<') => {
                    self.bump();
                    match self.peek() {
                        Some('?') => self.skip_processing_instruction()?,
                        Some('!') => self.skip_declaration(start)?,
                        _ => {
                            let id = self.element(start, &mut nodes)?;
                            if root.is_some() {
                                return Err(Error::MultipleRootElements {
                                    range: self.range_from(start),
                                });
                            }
                            root = Some(id);
                        }
                    }
                }
                Some(found) => {
                    return Err(Error::UnexpectedChar {
                        range: ByteRange::new(
                            self.file_id,
                            start,
                            start + found.len_utf8() as BytePos,
                        ),
                        found,
                        expected: "`<`",
                    });
                }
            }
        }
        match root {
            Some(root) => Ok(Tree::from_parts(nodes, root)),
            None => Err(Error::MissingRootElement {
                range: self.end_range(),
            }),
        }
    }

    /// Parse an element whose `<` is already consumed; `start` is the
    /// position of that `<`.
    fn element(&mut self, start: BytePos, nodes: &mut Vec<NodeData>) -> Result<NodeId, Error> {
        let tag = self.name("an element name")?;
        let mut attrs: Vec<Attr> = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('/') => {
                    self.bump();
                    self.expect('>', "`>`")?;
                    let span = Span::Range(self.range_from(start));
                    return Ok(push_node(nodes, tag, span, attrs, Vec::new()));
                }
                Some('>') => {
                    self.bump();
                    break;
                }
                Some(c) if is_name_start(c) => {
                    let attr_start = self.pos();
                    let attr = self.attribute()?;
                    if attrs.iter().any(|existing| existing.name == attr.name) {
                        return Err(Error::DuplicateAttribute {
                            range: self.range_from(attr_start),
                            name: attr.name,
                        });
                    }
                    attrs.push(attr);
                }
                Some(found) => {
                    let at = self.pos();
                    return Err(Error::UnexpectedChar {
                        range: ByteRange::new(self.file_id, at, at + found.len_utf8() as BytePos),
                        found,
                        expected: "an attribute name, `/>`, or `>`",
                    });
                }
                None => {
                    return Err(Error::UnexpectedEnd {
                        range: self.end_range(),
                        expected: "`>`",
                    });
                }
            }
        }

        let open_range = self.range_from(start);
        let mut children = Vec::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::UnclosedElement {
                        open_tag: tag,
                        open_range,
                    });
                }
                Some('<') => {
                    let child_start = self.pos();
                    self.bump();
                    match self.peek() {
                        Some('/') => {
                            self.bump();
                            let found = self.name("an element name")?;
                            self.skip_whitespace();
                            self.expect('>', "`>`")?;
                            if found != tag {
                                return Err(Error::MismatchedCloseTag {
                                    open_tag: tag,
                                    open_range,
                                    found,
                                    range: self.range_from(child_start),
                                });
                            }
                            let span = Span::Range(open_range);
                            return Ok(push_node(nodes, tag, span, attrs, children));
                        }
                        Some('?') => self.skip_processing_instruction()?,
                        Some('!') => self.skip_declaration(child_start)?,
                        _ => children.push(self.element(child_start, nodes)?),
                    }
                }
                // Text content is not part of the model format; skip it.
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn attribute(&mut self) -> Result<Attr, Error> {
        let name = self.name("an attribute name")?;
        self.skip_whitespace();
        self.expect('=', "`=`")?;
        self.skip_whitespace();

        let quote_start = self.pos();
        let quote = match self.bump() {
            Some(c @ ('"' | '\'')) => c,
            Some(found) => {
                return Err(Error::UnexpectedChar {
                    range: ByteRange::new(
                        self.file_id,
                        quote_start,
                        quote_start + found.len_utf8() as BytePos,
                    ),
                    found,
                    expected: "a quoted attribute value",
                });
            }
            None => {
                return Err(Error::UnexpectedEnd {
                    range: self.end_range(),
                    expected: "a quoted attribute value",
                });
            }
        };

        let value_start = self.pos();
        let mut value = String::new();
        let value_end = loop {
            let char_start = self.pos();
            match self.bump() {
                None => {
                    return Err(Error::UnterminatedLiteral {
                        range: self.range_from(quote_start),
                    });
                }
                Some(c) if c == quote => break char_start,
                Some('&') => value.push(self.entity(char_start)?),
                Some('<') => {
                    return Err(Error::UnexpectedChar {
                        range: ByteRange::new(self.file_id, char_start, char_start + 1),
                        found: '<',
                        expected: "an attribute value",
                    });
                }
                Some(c) => value.push(c),
            }
        };

        Ok(Attr {
            name,
            value,
            value_span: Span::Range(ByteRange::new(self.file_id, value_start, value_end)),
        })
    }

    /// Decode an entity or character reference whose `&` is already
    /// consumed; `start` is the position of that `&`.
    fn entity(&mut self, start: BytePos) -> Result<char, Error> {
        let mut name = String::new();
        loop {
            match self.peek() {
                Some(';') => {
                    self.bump();
                    break;
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '#' => {
                    self.bump();
                    name.push(c);
                    if name.len() > 8 {
                        return Err(Error::UnknownEntity {
                            range: self.range_from(start),
                            name,
                        });
                    }
                }
                _ => {
                    return Err(Error::UnknownEntity {
                        range: self.range_from(start),
                        name,
                    });
                }
            }
        }

        match name.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                match code.and_then(char::from_u32) {
                    Some(c) => Ok(c),
                    None => Err(Error::UnknownEntity {
                        range: self.range_from(start),
                        name,
                    }),
                }
            }
        }
    }

    fn name(&mut self, what: &'static str) -> Result<String, Error> {
        let start = self.pos();
        match self.peek() {
            Some(c) if is_name_start(c) => {}
            Some(found) => {
                return Err(Error::UnexpectedChar {
                    range: ByteRange::new(self.file_id, start, start + found.len_utf8() as BytePos),
                    found,
                    expected: what,
                });
            }
            None => {
                return Err(Error::UnexpectedEnd {
                    range: self.end_range(),
                    expected: what,
                });
            }
        }
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        Ok(name)
    }

    /// Skip `<?...?>`; the `<` is already consumed.
    fn skip_processing_instruction(&mut self) -> Result<(), Error> {
        self.bump(); // `?`
        loop {
            match self.bump() {
                Some('?') if self.eat('>') => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(Error::UnexpectedEnd {
                        range: self.end_range(),
                        expected: "`?>`",
                    });
                }
            }
        }
    }

    /// Skip `<!-- -->`, `<!DOCTYPE ...>` or `<![CDATA[...]]>`; the `<` is
    /// already consumed and `start` is its position.
    fn skip_declaration(&mut self, start: BytePos) -> Result<(), Error> {
        self.bump(); // `!`
        if self.eat('-') {
            self.expect('-', "`-`")?;
            loop {
                match self.bump() {
                    Some('-') if self.peek() == Some('-') => {
                        self.bump();
                        if self.eat('>') {
                            return Ok(());
                        }
                    }
                    Some(_) => {}
                    None => {
                        return Err(Error::UnterminatedComment {
                            range: self.range_from(start),
                        });
                    }
                }
            }
        }
        // Doctype and cdata sections: skip to the `>` that closes the
        // outermost bracket level.
        let mut depth = 0usize;
        loop {
            match self.bump() {
                Some('[') => depth += 1,
                Some(']') => depth = depth.saturating_sub(1),
                Some('>') if depth == 0 => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(Error::UnexpectedEnd {
                        range: self.end_range(),
                        expected: "`>`",
                    });
                }
            }
        }
    }
}

fn push_node(
    nodes: &mut Vec<NodeData>,
    tag: String,
    span: Span,
    attrs: Vec<Attr>,
    children: Vec<NodeId>,
) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    nodes.push(NodeData {
        tag,
        span,
        attrs,
        children,
    });
    id
}
