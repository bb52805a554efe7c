use crate::DocweaveResult;
use crate::Element;
use crate::Path;
use crate::XML_NAMESPACE;
use crate::format::DocumentFormat;
use crate::format::TextProcessor;
use crate::format::unsupported;

const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

macro_rules! w {
	($local:literal) => {
		concat!(
			"{http://schemas.openxmlformats.org/wordprocessingml/2006/main}",
			$local
		)
	};
}

macro_rules! m {
	($local:literal) => {
		concat!(
			"{http://schemas.openxmlformats.org/officeDocument/2006/math}",
			$local
		)
	};
}

const V_TEXTPATH: &str = "{urn:schemas-microsoft-com:vml}textpath";

/// Office Open XML word processing documents. Text lives in runs; Word splits
/// runs freely inside a paragraph, so a run's atom is its paragraph.
#[derive(Debug, Clone, Copy, Default)]
pub struct Docx;

impl DocumentFormat for Docx {
	fn name(&self) -> &'static str {
		"docx"
	}

	fn text_nodes(&self) -> &'static [(&'static str, i32)] {
		&[(w!("r"), -1), (V_TEXTPATH, 0), (m!("r"), -1)]
	}

	fn is_property(&self, tag: &str) -> bool {
		matches!(tag, w!("pPr") | w!("rPr") | m!("rPr"))
	}

	fn convert(&self, element: &Element) -> DocweaveResult<Vec<(Path, String)>> {
		if element.tag == V_TEXTPATH {
			let text = element.get("string").unwrap_or_default().to_string();
			return Ok(vec![(Vec::new(), text)]);
		}
		if element.tag != w!("r") && element.tag != m!("r") {
			return Err(unsupported(element, self));
		}

		let mut chunks = Vec::new();
		for (index, child) in element.children.iter().enumerate() {
			let text = match child.tag.as_str() {
				w!("t") | m!("t") => child.text.clone().unwrap_or_default(),
				w!("tab") => "\t".to_string(),
				w!("br") | w!("cr") => "\n".to_string(),
				_ => {
					// Word art sits inside drawings of an ordinary run.
					find_textpaths(child, vec![index], &mut chunks);
					continue;
				}
			};
			chunks.push((vec![index], text));
		}

		Ok(chunks)
	}

	fn processor<'a>(
		&self,
		parent: &'a mut Element,
		node: usize,
	) -> DocweaveResult<Box<dyn TextProcessor + 'a>> {
		let tag = parent.child(node)?.tag.clone();
		match tag.as_str() {
			V_TEXTPATH => {
				let leaf = &mut parent.children[node];
				leaf.set("string", "string", "");
				Ok(Box::new(TextPathProcessor { leaf }))
			}
			w!("t") | m!("t") => {
				parent.children[node].text = None;
				Ok(Box::new(RunProcessor {
					parent,
					first: node,
					insert_at: node + 1,
					current: Some(node),
				}))
			}
			w!("tab") | w!("br") | w!("cr") => {
				parent.children.remove(node);
				Ok(Box::new(RunProcessor {
					parent,
					first: node,
					insert_at: node,
					current: None,
				}))
			}
			_ => Err(unsupported(&parent.children[node], self)),
		}
	}

	fn template_parts(&self) -> &'static [&'static str] {
		&[
			"word/document.xml",
			"word/header*",
			"word/footer*",
			"word/footnotes.xml",
			"word/endnotes.xml",
		]
	}
}

/// Collect the `string` of every text path below `element`.
fn find_textpaths(element: &Element, path: Path, chunks: &mut Vec<(Path, String)>) {
	if element.tag == V_TEXTPATH {
		let text = element.get("string").unwrap_or_default().to_string();
		chunks.push((path, text));
		return;
	}
	for (index, child) in element.children.iter().enumerate() {
		let mut child_path = path.clone();
		child_path.push(index);
		find_textpaths(child, child_path, chunks);
	}
}

/// Writes into the text children of a run, inserting `w:tab`/`w:br` for
/// control characters.
struct RunProcessor<'a> {
	parent: &'a mut Element,
	first: usize,
	insert_at: usize,
	/// Text child currently written to.
	current: Option<usize>,
}

impl RunProcessor<'_> {
	/// Text children follow the run's namespace, glyphs are always
	/// wordprocessing elements, also inside math runs.
	fn create(&self, local: &str) -> Element {
		if local == "t" || self.parent.namespace() == Some(W_NAMESPACE) {
			return Element::create_like(self.parent, local);
		}
		let prefix = self
			.parent
			.children
			.iter()
			.find(|child| child.namespace() == Some(W_NAMESPACE))
			.and_then(|child| child.name.split_once(':'))
			.map_or("w", |(prefix, _)| prefix);
		Element::new(format!("{prefix}:{local}"), format!("{{{W_NAMESPACE}}}{local}"))
	}

	fn insert(&mut self, local: &str) -> usize {
		let element = self.create(local);
		let index = self.insert_at;
		self.parent.children.insert(index, element);
		self.insert_at += 1;
		index
	}

	fn write(&mut self, text: &str) {
		let index = match self.current {
			Some(index) => index,
			None => {
				let index = self.insert("t");
				self.current = Some(index);
				index
			}
		};
		self.parent.children[index]
			.text
			.get_or_insert_with(String::new)
			.push_str(text);
	}
}

impl TextProcessor for RunProcessor<'_> {
	fn feed(&mut self, chunk: &str) -> DocweaveResult<()> {
		let mut rest = chunk;
		while let Some(index) = rest.find(['\t', '\n']) {
			if index > 0 {
				self.write(&rest[..index]);
			}
			let glyph = if rest[index..].starts_with('\t') { "tab" } else { "br" };
			self.insert(glyph);
			self.current = None;
			rest = &rest[index + 1..];
		}
		if !rest.is_empty() {
			self.write(rest);
		}

		Ok(())
	}

	fn close(self: Box<Self>) -> DocweaveResult<()> {
		let space = format!("{{{XML_NAMESPACE}}}space");
		for child in &mut self.parent.children[self.first..self.insert_at] {
			if !matches!(child.tag.as_str(), w!("t") | m!("t")) {
				continue;
			}
			let text = child.text.as_deref().unwrap_or_default();
			let padded = text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace);
			if padded {
				child.set("xml:space", &space, "preserve");
			}
		}

		Ok(())
	}
}

/// Writes into the `string` attribute of a VML text path.
struct TextPathProcessor<'a> {
	leaf: &'a mut Element,
}

impl TextProcessor for TextPathProcessor<'_> {
	fn feed(&mut self, chunk: &str) -> DocweaveResult<()> {
		let mut value = self.leaf.get("string").unwrap_or_default().to_string();
		value.push_str(chunk);
		self.leaf.set("string", "string", value);
		Ok(())
	}

	fn close(self: Box<Self>) -> DocweaveResult<()> {
		Ok(())
	}
}
