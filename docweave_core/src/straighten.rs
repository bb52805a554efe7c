use tracing::debug;
use tracing::trace;

use crate::ContentType;
use crate::DocweaveError;
use crate::DocweaveResult;
use crate::Element;
use crate::ElementPointer;
use crate::Line;
use crate::Path;
use crate::ShadowElement;
use crate::TaggedStr;
use crate::format::DocumentFormat;
use crate::lexer::TemplateLexer;
use crate::lexer::Token;

/// Flatten the text of `root` into a [`Line`].
///
/// Every element whose tag is one of the format's text nodes is converted into
/// chunks that are fed to `lexer` in document order; the children of a text
/// node are never visited on their own. Terminal spans lose their constant
/// status since the template engine replaces them.
pub fn straighten<L: TemplateLexer>(
	root: &Element,
	mut lexer: L,
	format: &dyn DocumentFormat,
) -> DocweaveResult<(ContentType, Line)> {
	let mut events = Vec::new();
	let mut walk = root.walk();
	let mut text_nodes = 0;

	while let Some((path, element)) = walk.next() {
		// The root anchors the destination tree and is never a leaf.
		if path.is_empty() {
			continue;
		}
		let Some(depth) = format.atom_depth(&element.tag) else {
			continue;
		};
		walk.skip_children(element.children.len());
		text_nodes += 1;

		for (subpath, text) in format.convert(element)? {
			let mut full = path.clone();
			full.extend_from_slice(&subpath);
			// A nested text node, such as word art in a run, is its own atom.
			let nested = if subpath.is_empty() {
				None
			} else {
				format.atom_depth(&element.find(&subpath)?.tag)
			};
			let atom = match nested {
				Some(nested) => atom_path(&full, nested),
				None => atom_path(&path, depth),
			};
			trace!(path = ?full, text, "feeding chunk");
			lexer.feed(TaggedStr::from_element(text, full, atom))?;
		}
		events.extend(lexer.read_events());
	}

	lexer.close();
	events.extend(lexer.read_events());

	let mut builder = LineBuilder::default();
	for (token, tagged) in events {
		match token {
			Token::Text => builder.push_text(tagged),
			Token::Terminal => builder.push_terminal(tagged)?,
		}
	}

	debug!(
		text_nodes,
		entries = builder.line.len(),
		leaves = builder.index,
		template = builder.is_template,
		"straightened document"
	);

	let content = if builder.is_template {
		ContentType::Template
	} else {
		ContentType::Plaintext
	};
	Ok((content, builder.line))
}

/// Path of the atom containing the text node at `path`.
pub(crate) fn atom_path(path: &[usize], depth: i32) -> Path {
	let keep = usize::try_from(path.len() as i64 + i64::from(depth)).unwrap_or_default();
	path[..keep.min(path.len())].to_vec()
}

const TRIM_BEFORE: [&str; 3] = ["{{-", "{%-", "{#-"];
const TRIM_AFTER: [&str; 3] = ["-}}", "-%}", "-#}"];

#[derive(Default)]
struct LineBuilder {
	line: Line,
	index: usize,
	last_path: Option<Path>,
	is_template: bool,
	/// Length of the line after the last terminal.
	terminal_end: usize,
	/// The last terminal strips the whitespace after it.
	trim_next: bool,
}

impl LineBuilder {
	fn push(&mut self, shadow: &ShadowElement, text: String) {
		if self.last_path.as_ref() != Some(&shadow.path) {
			self.index += 1;
			self.last_path = Some(shadow.path.clone());
		}
		let pointer = ElementPointer::from_shadow(shadow, self.index);
		self.line.push((pointer, text));
	}

	fn push_text(&mut self, tagged: TaggedStr) {
		let (text, elements) = tagged.into_parts();
		let mut cursor = 0;
		for element in &elements {
			let mut span = &text[cursor..cursor + element.length];
			cursor += element.length;
			let mut element = element.clone();
			if self.trim_next {
				let trimmed = span.trim_start();
				if trimmed.len() != span.len() {
					element.is_constant = false;
					span = trimmed;
				}
				self.trim_next = trimmed.is_empty();
			}
			self.push(&element, span.to_string());
		}
	}

	/// Strip the whitespace in front of a terminal opened with `-`. Trimmed
	/// entries become dynamic so their leaves are rewritten.
	fn trim_back(&mut self) {
		for (pointer, text) in self.line[self.terminal_end..].iter_mut().rev() {
			let trimmed = text.trim_end().len();
			if trimmed != text.len() {
				text.truncate(trimmed);
				pointer.is_constant = false;
			}
			if !text.is_empty() {
				break;
			}
		}
	}

	fn push_terminal(&mut self, tagged: TaggedStr) -> DocweaveResult<()> {
		self.is_template = true;
		let (text, elements) = tagged.into_parts();

		let mut atoms: Vec<Path> = Vec::new();
		for element in &elements {
			if !atoms.contains(&element.atom) {
				atoms.push(element.atom.clone());
			}
		}
		if atoms.len() > 1 {
			return Err(DocweaveError::TerminalSplitAcrossAtoms {
				terminal: text,
				atoms,
			});
		}

		if TRIM_BEFORE.iter().any(|marker| text.starts_with(marker)) {
			self.trim_back();
		}
		self.trim_next = TRIM_AFTER.iter().any(|marker| text.ends_with(marker));

		// The whole terminal rides on its first pointer, the others are left as
		// points at the end of their span.
		let mut terminal = Some(text);
		for element in &elements {
			let mut element = element.clone();
			element.is_constant = false;
			match terminal.take() {
				Some(text) => self.push(&element, text),
				None => {
					element.offset += element.length;
					element.length = 0;
					self.push(&element, String::new());
				}
			}
		}
		self.terminal_end = self.line.len();

		Ok(())
	}
}
