//! Document format collaborators: which elements carry text, how their text is
//! extracted, and how rendered text is written back.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

pub use docx::Docx;
pub use odt::Odt;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::Element;
use crate::Path;

mod docx;
mod odt;

/// Sink for the rendered text of one destination leaf.
///
/// The first fed chunk replaces the leaf's original text, later chunks are
/// appended. Control characters are re-expanded into the format's markup.
pub trait TextProcessor {
	fn feed(&mut self, chunk: &str) -> DocweaveResult<()>;
	fn close(self: Box<Self>) -> DocweaveResult<()>;
}

pub trait DocumentFormat {
	fn name(&self) -> &'static str;

	/// Text-bearing elements with their atom depth. The depth is relative to
	/// the text element: `0` makes the element its own atom, `-1` its parent.
	fn text_nodes(&self) -> &'static [(&'static str, i32)];

	/// Extract `(subpath, text)` pairs from a text-bearing element.
	fn convert(&self, element: &Element) -> DocweaveResult<Vec<(Path, String)>>;

	/// Create the text sink for `parent.children[node]`.
	fn processor<'a>(
		&self,
		parent: &'a mut Element,
		node: usize,
	) -> DocweaveResult<Box<dyn TextProcessor + 'a>>;

	/// Archive entries whose XML is routed through the template pipeline.
	fn template_parts(&self) -> &'static [&'static str];

	/// Formatting elements such as paragraph or run properties. A copied
	/// container holding nothing else carries no content of its own.
	fn is_property(&self, _tag: &str) -> bool {
		false
	}

	fn atom_depth(&self, tag: &str) -> Option<i32> {
		self.text_nodes()
			.iter()
			.find(|(name, _)| *name == tag)
			.map(|(_, depth)| *depth)
	}

	fn is_template_part(&self, entry: &str) -> bool {
		self.template_parts().iter().any(|part| {
			match part.strip_suffix('*') {
				Some(prefix) => entry.starts_with(prefix) && entry.ends_with(".xml"),
				None => entry == *part,
			}
		})
	}
}

pub(crate) fn unsupported(element: &Element, format: &dyn DocumentFormat) -> DocweaveError {
	let supported = format
		.text_nodes()
		.iter()
		.map(|(tag, _)| *tag)
		.collect::<Vec<_>>()
		.join(", ");
	DocweaveError::UnsupportedElement {
		tag: element.tag.clone(),
		supported,
	}
}

/// Selects a [`DocumentFormat`] at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
	Docx,
	Odt,
}

impl FormatKind {
	pub fn handler(self) -> &'static dyn DocumentFormat {
		match self {
			Self::Docx => &Docx,
			Self::Odt => &Odt,
		}
	}
}

impl fmt::Display for FormatKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.handler().name())
	}
}

impl FromStr for FormatKind {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value.to_ascii_lowercase().as_str() {
			"docx" => Ok(Self::Docx),
			"odt" => Ok(Self::Odt),
			other => Err(format!("unknown document format `{other}`")),
		}
	}
}
