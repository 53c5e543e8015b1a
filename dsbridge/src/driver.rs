//! The batch pipeline: read, scan, resolve, compile, write.

use codespan_reporting::diagnostic::{Diagnostic, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use std::cell::RefCell;
use std::io::Read;
use std::path::Path;

use crate::dataset;
use crate::markup;
use crate::model::{operators, reach, scan};
use crate::reporting::{Message, OperatorMessage};
use crate::source::FileId;

#[derive(Debug, Copy, Clone)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

pub struct Driver {
    files: SimpleFiles<String, String>,

    include_all: bool,
    numeric_type_ids: bool,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,

    emit_width: usize,
    emit_writer: RefCell<Box<dyn WriteColor>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),

            include_all: false,
            numeric_type_ids: false,

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                if atty::is(atty::Stream::Stderr) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),

            emit_width: usize::MAX,
            emit_writer: RefCell::new(Box::new(BufferedStandardStream::stdout(
                if atty::is(atty::Stream::Stdout) {
                    ColorChoice::Auto
                } else {
                    ColorChoice::Never
                },
            ))),
        }
    }

    /// Set to true to emit every known data-set, not just the required ones.
    pub fn set_include_all(&mut self, include_all: bool) {
        self.include_all = include_all;
    }

    /// Set to true to emit numeric protocol codes instead of canonical
    /// base-type names.
    pub fn set_numeric_type_ids(&mut self, numeric_type_ids: bool) {
        self.numeric_type_ids = numeric_type_ids;
    }

    /// Set the writer to use when rendering diagnostics.
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the width to use when emitting the output document.
    pub fn set_emit_width(&mut self, emit_width: usize) {
        self.emit_width = emit_width;
    }

    /// Set the writer to use when emitting the output document.
    pub fn set_emit_writer(&mut self, stream: impl 'static + WriteColor) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Whether any error-severity diagnostic has been emitted so far.
    pub fn seen_errors(&self) -> bool {
        *self.seen_errors.borrow()
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Translate the loaded document and emit the resulting data-set list.
    ///
    /// `operator` overrides the document's `root` option. Unparsable input
    /// is the only failing outcome; anything later degrades to a reduced or
    /// empty emission with diagnostics.
    pub fn translate_and_emit(&mut self, file_id: FileId, operator: Option<&str>) -> Status {
        let source = self.files.get(file_id).unwrap().source().clone();

        let tree = match markup::parse(file_id, &source) {
            Ok(tree) => tree,
            Err(error) => {
                self.emit_diagnostic(error.to_diagnostic());
                return Status::Error;
            }
        };

        let mut context = scan::Context::new(
            &tree,
            scan::Options {
                numeric_type_ids: self.numeric_type_ids,
            },
        );
        context.scan_document();
        let (mut store, messages) = context.finish();
        self.emit_messages(messages);

        let mut messages = Vec::new();
        let requested = match operator {
            Some(name) => Some(name.to_owned()),
            None => {
                let found = operators::root_option(&tree, tree.root());
                match &found {
                    Some(name) => {
                        messages.push(OperatorMessage::RootOptionFound { name: name.clone() }.into())
                    }
                    None => messages.push(OperatorMessage::RootOptionMissing.into()),
                }
                found
            }
        };
        if let Some(name) = &requested {
            let model = tree.find_child(tree.root(), "model");
            if let Some(model) = model {
                if let Some(operator) = operators::find(&tree, model, name, &mut messages) {
                    reach::mark_interface(&mut store, &tree, operator, &mut messages);
                }
            }
        }
        self.emit_messages(messages);

        let (output, messages) = dataset::compile(&store, self.include_all);
        self.emit_messages(messages);

        if output.has_children(output.root()) {
            self.emit_document(&output);
        } else {
            self.emit_diagnostic(Diagnostic::warning().with_message("no data-sets to export"));
        }

        Status::Ok
    }

    fn emit_document(&self, tree: &markup::Tree) {
        let alloc = pretty::Arena::new();
        let context = markup::pretty::Context::new(&alloc, tree);
        let mut emit_writer = self.emit_writer.borrow_mut();
        writeln!(emit_writer, "{}", context.document().pretty(self.emit_width)).unwrap();
        emit_writer.flush().unwrap();
    }

    fn emit_messages(&self, messages: Vec<Message>) {
        for message in messages {
            self.emit_diagnostic(message.to_diagnostic());
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic).unwrap();
        writer.flush().unwrap();

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}
