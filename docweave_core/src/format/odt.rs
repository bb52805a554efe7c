use crate::DocweaveResult;
use crate::Element;
use crate::Path;
use crate::format::DocumentFormat;
use crate::format::TextProcessor;
use crate::format::unsupported;

const TEXT_P: &str = "{urn:oasis:names:tc:opendocument:xmlns:text:1.0}p";
const TEXT_H: &str = "{urn:oasis:names:tc:opendocument:xmlns:text:1.0}h";

/// OpenDocument text. Each paragraph or heading is its own atom and only the
/// text before its first child is templated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Odt;

impl DocumentFormat for Odt {
	fn name(&self) -> &'static str {
		"odt"
	}

	fn text_nodes(&self) -> &'static [(&'static str, i32)] {
		&[(TEXT_P, 0), (TEXT_H, 0)]
	}

	fn convert(&self, element: &Element) -> DocweaveResult<Vec<(Path, String)>> {
		if element.tag != TEXT_P && element.tag != TEXT_H {
			return Err(unsupported(element, self));
		}
		let text = element.text.clone().unwrap_or_default();
		Ok(vec![(Vec::new(), text)])
	}

	fn processor<'a>(
		&self,
		parent: &'a mut Element,
		node: usize,
	) -> DocweaveResult<Box<dyn TextProcessor + 'a>> {
		let tag = parent.child(node)?.tag.clone();
		if tag != TEXT_P && tag != TEXT_H {
			return Err(unsupported(&parent.children[node], self));
		}

		let paragraph = &mut parent.children[node];
		paragraph.text = None;
		Ok(Box::new(ParagraphProcessor {
			paragraph,
			inserted: 0,
		}))
	}

	fn template_parts(&self) -> &'static [&'static str] {
		&["content.xml", "styles.xml"]
	}
}

/// Rewrites the leading text of a paragraph. Generated `text:tab`,
/// `text:line-break` and `text:s` elements go in front of the existing
/// children.
struct ParagraphProcessor<'a> {
	paragraph: &'a mut Element,
	/// Elements inserted so far at the front of the children.
	inserted: usize,
}

impl ParagraphProcessor<'_> {
	fn write(&mut self, text: &str) {
		if text.is_empty() {
			return;
		}
		let slot = match self.inserted {
			0 => &mut self.paragraph.text,
			count => &mut self.paragraph.children[count - 1].tail,
		};
		slot.get_or_insert_with(String::new).push_str(text);
	}

	fn insert(&mut self, element: Element) {
		self.paragraph.children.insert(self.inserted, element);
		self.inserted += 1;
	}

	fn spaces(&mut self, count: usize) {
		self.write(" ");
		if count < 2 {
			return;
		}
		let mut element = Element::create_like(self.paragraph, "s");
		if count > 2 {
			let (name, key) = qualify(self.paragraph, "c");
			element.set(&name, &key, (count - 1).to_string());
		}
		self.insert(element);
	}
}

/// Qualified and expanded names of an attribute in the namespace of `like`.
fn qualify(like: &Element, local: &str) -> (String, String) {
	let named = Element::create_like(like, local);
	(named.name, named.tag)
}

impl TextProcessor for ParagraphProcessor<'_> {
	fn feed(&mut self, chunk: &str) -> DocweaveResult<()> {
		let mut run = String::new();
		let mut chars = chunk.chars().peekable();

		while let Some(character) = chars.next() {
			match character {
				'\t' | '\n' => {
					self.write(&run);
					run.clear();
					let local = if character == '\t' { "tab" } else { "line-break" };
					self.insert(Element::create_like(self.paragraph, local));
				}
				' ' => {
					let mut count = 1;
					while chars.next_if_eq(&' ').is_some() {
						count += 1;
					}
					if count == 1 {
						run.push(' ');
						continue;
					}
					self.write(&run);
					run.clear();
					self.spaces(count);
				}
				other => run.push(other),
			}
		}
		self.write(&run);

		Ok(())
	}

	fn close(self: Box<Self>) -> DocweaveResult<()> {
		Ok(())
	}
}
