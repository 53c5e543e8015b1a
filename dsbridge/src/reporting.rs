//! Diagnostic messages reported while translating a model map.
//!
//! These can be converted to [`Diagnostic`]s in order to present them to
//! the user. Severity follows the pipeline's degradation policy: notes
//! confirm progress, warnings mark skipped nodes, errors mark dropped or
//! degraded output, and bugs mark conditions a well-formed generator can
//! never produce.
//!
//! [`Diagnostic`]: codespan_reporting::diagnostic::Diagnostic

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::model::ModelId;
use crate::source::{FileId, Span};

/// Global diagnostic messages.
#[derive(Debug, Clone)]
pub enum Message {
    Scan(ScanMessage),
    Operator(OperatorMessage),
    Require(RequireMessage),
    Compile(CompileMessage),
}

impl From<ScanMessage> for Message {
    fn from(message: ScanMessage) -> Message {
        Message::Scan(message)
    }
}

impl From<OperatorMessage> for Message {
    fn from(message: OperatorMessage) -> Message {
        Message::Operator(message)
    }
}

impl From<RequireMessage> for Message {
    fn from(message: RequireMessage) -> Message {
        Message::Require(message)
    }
}

impl From<CompileMessage> for Message {
    fn from(message: CompileMessage) -> Message {
        Message::Compile(message)
    }
}

impl Message {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            Message::Scan(message) => message.to_diagnostic(),
            Message::Operator(message) => message.to_diagnostic(),
            Message::Require(message) => message.to_diagnostic(),
            Message::Compile(message) => message.to_diagnostic(),
        }
    }
}

fn labels(span: &Span) -> Vec<Label<FileId>> {
    span.primary().into_iter().collect()
}

/// Messages produced while scanning the model section.
#[derive(Debug, Clone)]
pub enum ScanMessage {
    MissingSection {
        tag: &'static str,
        span: Span,
    },
    MissingAttribute {
        node: String,
        attr: &'static str,
        span: Span,
    },
    InvalidAttribute {
        node: String,
        attr: &'static str,
        value: String,
        span: Span,
    },
    DuplicateDefinition {
        id: ModelId,
        span: Span,
    },
    UnknownBaseType {
        name: String,
        span: Span,
        suggestion: Option<&'static str>,
    },
    NameConflict {
        id: ModelId,
        existing: String,
        proposed: String,
        span: Span,
    },
    NameForUndefined {
        id: ModelId,
        span: Span,
    },
    Summary {
        arrays: usize,
        structs: usize,
        aliases: usize,
    },
}

impl ScanMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            ScanMessage::MissingSection { tag, span } => Diagnostic::warning()
                .with_message(format!("document has no `{tag}` section"))
                .with_labels(labels(span)),
            ScanMessage::MissingAttribute { node, attr, span } => Diagnostic::warning()
                .with_message(format!("`{node}` element is missing the `{attr}` attribute"))
                .with_labels(labels(span)),
            ScanMessage::InvalidAttribute {
                node,
                attr,
                value,
                span,
            } => Diagnostic::warning()
                .with_message(format!("`{node}.{attr}` = \"{value}\" is invalid"))
                .with_labels(labels(span)),
            ScanMessage::DuplicateDefinition { id, span } => Diagnostic::error()
                .with_message(format!("model id {id} is already defined"))
                .with_labels(labels(span))
                .with_notes(vec!["the first definition wins".to_owned()]),
            ScanMessage::UnknownBaseType {
                name,
                span,
                suggestion,
            } => {
                let diagnostic = Diagnostic::error()
                    .with_message(format!("unknown base type `{name}`"))
                    .with_labels(labels(span));
                match suggestion {
                    Some(suggestion) => diagnostic
                        .with_notes(vec![format!("help: did you mean `{suggestion}`?")]),
                    None => diagnostic,
                }
            }
            ScanMessage::NameConflict {
                id,
                existing,
                proposed,
                span,
            } => Diagnostic::error()
                .with_message(format!("model id {id} is already named `{existing}`"))
                .with_labels(labels(span))
                .with_notes(vec![format!("ignoring rename to `{proposed}`")]),
            ScanMessage::NameForUndefined { id, span } => Diagnostic::error()
                .with_message(format!("cannot name model id {id}: it is not defined"))
                .with_labels(labels(span)),
            ScanMessage::Summary {
                arrays,
                structs,
                aliases,
            } => Diagnostic::note().with_message(format!(
                "found {arrays} arrays, {structs} structs, {aliases} type instantiations"
            )),
        }
    }
}

/// Messages produced while locating the requested operator.
#[derive(Debug, Clone)]
pub enum OperatorMessage {
    RootOptionFound {
        name: String,
    },
    RootOptionMissing,
    UnresolvedPackage {
        scoped: String,
        segment: String,
    },
    AmbiguousPackage {
        scoped: String,
        segment: String,
    },
    NotFound {
        name: String,
    },
    Ambiguous {
        name: String,
        count: usize,
    },
    Resolved {
        path: String,
    },
    InterfaceSummary {
        direction: &'static str,
        composite: usize,
        declared: usize,
    },
}

impl OperatorMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            OperatorMessage::RootOptionFound { name } => {
                Diagnostic::note().with_message(format!("identified root operator `{name}`"))
            }
            OperatorMessage::RootOptionMissing => Diagnostic::error().with_message(
                "no operator was requested and the document does not name a root operator",
            ),
            OperatorMessage::UnresolvedPackage { scoped, segment } => Diagnostic::error()
                .with_message(format!("package `{segment}` in `{scoped}` was not found")),
            OperatorMessage::AmbiguousPackage { scoped, segment } => Diagnostic::error()
                .with_message(format!(
                    "package `{segment}` in `{scoped}` matches more than one package"
                )),
            OperatorMessage::NotFound { name } => {
                Diagnostic::error().with_message(format!("operator `{name}` was not found"))
            }
            OperatorMessage::Ambiguous { name, count } => Diagnostic::error()
                .with_message(format!("`{name}` matches {count} operators"))
                .with_notes(vec![
                    "add package path segments to single out one of them".to_owned(),
                ]),
            OperatorMessage::Resolved { path } => {
                Diagnostic::note().with_message(format!("resolved operator `{path}`"))
            }
            OperatorMessage::InterfaceSummary {
                direction,
                composite,
                declared,
            } => {
                let diagnostic = if *composite > 0 {
                    Diagnostic::note()
                } else {
                    Diagnostic::warning()
                };
                diagnostic.with_message(format!(
                    "{composite} of {declared} declared {direction}s contribute data-sets"
                ))
            }
        }
    }
}

/// Messages produced while marking required types.
#[derive(Debug, Clone)]
pub enum RequireMessage {
    Undefined {
        id: ModelId,
    },
    SelfReference {
        id: ModelId,
    },
    Cycle {
        id: ModelId,
    },
    InvalidParameter {
        node: &'static str,
        value: String,
        span: Span,
    },
}

impl RequireMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            RequireMessage::Undefined { id } => Diagnostic::error()
                .with_message(format!("model id {id} is required but not defined")),
            RequireMessage::SelfReference { id } => {
                Diagnostic::bug().with_message(format!("model id {id} references itself"))
            }
            RequireMessage::Cycle { id } => Diagnostic::error()
                .with_message(format!("model id {id} is part of a reference cycle")),
            RequireMessage::InvalidParameter { node, value, span } => Diagnostic::warning()
                .with_message(format!("`{node}.type` = \"{value}\" is invalid"))
                .with_labels(labels(span)),
        }
    }
}

/// Messages produced while flattening data-sets.
#[derive(Debug, Clone)]
pub enum CompileMessage {
    NestedArray {
        dataset_id: String,
        dataset_name: Option<String>,
        element: Option<String>,
        first: u32,
        second: u32,
    },
    UnresolvedReference {
        dataset_id: String,
        element: Option<String>,
        id: ModelId,
    },
    AliasCycle {
        dataset_id: String,
        element: Option<String>,
        id: ModelId,
    },
}

fn element_name(element: &Option<String>) -> &str {
    element.as_deref().unwrap_or("<unnamed>")
}

impl CompileMessage {
    pub fn to_diagnostic(&self) -> Diagnostic<FileId> {
        match self {
            CompileMessage::NestedArray {
                dataset_id,
                dataset_name,
                element,
                first,
                second,
            } => {
                let dataset = match dataset_name {
                    Some(name) => format!("{dataset_id} ({name})"),
                    None => dataset_id.clone(),
                };
                Diagnostic::error()
                    .with_message(
                        "array of array cannot be represented; emitting the first dimension only",
                    )
                    .with_notes(vec![format!(
                        "check data-set {dataset}: element {}[{first}][{second}]",
                        element_name(element),
                    )])
            }
            CompileMessage::UnresolvedReference {
                dataset_id,
                element,
                id,
            } => Diagnostic::error().with_message(format!(
                "data-set {dataset_id}: element {} references undefined model id {id}",
                element_name(element),
            )),
            CompileMessage::AliasCycle {
                dataset_id,
                element,
                id,
            } => Diagnostic::error().with_message(format!(
                "data-set {dataset_id}: reference cycle through model id {id} while resolving element {}",
                element_name(element),
            )),
        }
    }
}
