//! `docweave_core` fills office document templates. The text of a document is
//! scattered over many XML elements; it is flattened into a single string, run
//! through a text template engine, and the rendered string is written back
//! into the original tree topology. The template engine never sees any XML.
//!
//! ## Processing Pipeline
//!
//! ```text
//! XML part
//!   → Flattener (text nodes → lexer → Line of pointers and text)
//!   → Boundary delineator (routes between consecutive leaves)
//!   → Tape codec (Line → template string with pointer records)
//!   → Template engine (minijinja)
//!   → Tape codec (rendered string → Line)
//!   → Reconstruction driver (TreeBuilder + format text processors)
//! ```
//!
//! ## Modules
//!
//! - [`format`]: Document formats: which elements carry text (`w:r` for DOCX,
//!   `text:p` for ODT), how it is extracted and how rendered text is written
//!   back.
//! - [`tape`]: Serialization of a Line into the string given to the template
//!   engine and back.
//! - [`config`]: Configuration loading from `docweave.toml`.
//!
//! ## Key Types
//!
//! - [`Element`] / [`Document`]: The XML tree.
//! - [`TaggedStr`]: A string that remembers which element each of its bytes
//!   came from.
//! - [`ElementPointer`]: The pointer recorded on the tape for every span.
//! - [`Boundaries`]: Routes copying the structure between consecutive leaves.
//! - [`TreeBuilder`]: Incremental copier of the source tree.
//! - [`JinjaEngine`]: The minijinja backed [`TemplateEngine`].
//!
//! ## Quick Start
//!
//! ```rust
//! use docweave_core::FormatKind;
//! use docweave_core::JinjaEngine;
//! use docweave_core::render_xml;
//!
//! let source = r#"<office:text xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><text:p>Hello, {{ name }}!</text:p></office:text>"#;
//! let context = serde_json::json!({ "name": "World" });
//! let output = render_xml(source, FormatKind::Odt.handler(), &JinjaEngine::default(), &context).unwrap();
//!
//! assert!(output.contains("<text:p>Hello, World!</text:p>"));
//! ```

pub use boundary::*;
pub use builder::*;
pub use config::*;
pub use context::*;
pub use engine::*;
pub use error::*;
pub use executor::*;
pub use format::DocumentFormat;
pub use format::FormatKind;
pub use format::TextProcessor;
pub use lexer::JinjaLexer;
pub use lexer::TemplateLexer;
pub use lexer::Token;
pub use pipeline::*;
pub use pointer::*;
pub use straighten::*;
pub use tree::*;

mod boundary;
mod builder;
pub mod config;
mod context;
mod engine;
#[allow(unused_assignments)]
mod error;
mod executor;
pub mod format;
pub(crate) mod lexer;
mod pipeline;
mod pointer;
mod straighten;
pub mod tape;
mod tree;

#[cfg(test)]
mod __fixtures;
