use miette::Diagnostic;
use thiserror::Error;

use crate::Path;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DocweaveError {
	#[error(transparent)]
	#[diagnostic(code(docweave::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read or write xml: {0}")]
	#[diagnostic(code(docweave::xml))]
	Xml(String),

	#[error("unsupported element `{tag}`")]
	#[diagnostic(
		code(docweave::unsupported_element),
		help("supported elements: {supported}")
	)]
	UnsupportedElement { tag: String, supported: String },

	#[error("terminal `{terminal}` is split across different atoms: {atoms:?}")]
	#[diagnostic(
		code(docweave::terminal_split),
		help("keep each template tag inside a single paragraph of the document")
	)]
	TerminalSplitAcrossAtoms { terminal: String, atoms: Vec<Path> },

	#[error("no element at {path:?}: `{parent}` has {children} child element(s)")]
	#[diagnostic(code(docweave::tree_navigation))]
	TreeNavigation {
		path: Path,
		parent: String,
		children: usize,
	},

	#[error("malformed tape: {0}")]
	#[diagnostic(
		code(docweave::malformed_tape),
		help("the rendered template must only copy, repeat or drop pieces of the tape")
	)]
	MalformedTape(String),

	#[error("document text contains the reserved character U+{0:04X}")]
	#[diagnostic(code(docweave::reserved_character))]
	ReservedCharacter(u32),

	#[error("invalid slice {start}..{stop} of a tagged string with length {length}")]
	#[diagnostic(code(docweave::invalid_slice))]
	InvalidSlice {
		start: usize,
		stop: usize,
		length: usize,
	},

	#[error("the lexer is closed and cannot accept more text")]
	#[diagnostic(code(docweave::lexer_closed))]
	LexerClosed,

	#[error("tape moved from {from:?} to {to:?} in a way no boundary explains")]
	#[diagnostic(code(docweave::unexpected_tape_move))]
	UnexpectedTapeMove { from: Path, to: Path },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(docweave::template_render))]
	TemplateRender(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(docweave::config_parse),
		help("check that docweave.toml is valid TOML with an optional [engine] section")
	)]
	ConfigParse(String),

	#[error("failed to load context file `{path}`: {reason}")]
	#[diagnostic(code(docweave::context_file))]
	ContextFile { path: String, reason: String },

	#[error("unsupported context file format: `{0}`")]
	#[diagnostic(
		code(docweave::unsupported_context_format),
		help("supported formats: json, yaml, yml, toml")
	)]
	UnsupportedContextFormat(String),
}

pub type DocweaveResult<T> = Result<T, DocweaveError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
