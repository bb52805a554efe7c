//! In-memory XML tree in the ElementTree shape: every element owns the text
//! before its first child (`text`) and the text after its own end tag (`tail`).
//!
//! Qualified names are kept exactly as written together with their expanded
//! `{uri}local` form, so a reconstructed tree serializes with the prefixes and
//! `xmlns` declarations of the source document.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::BytesDecl;
use quick_xml::events::BytesEnd;
use quick_xml::events::BytesStart;
use quick_xml::events::BytesText;
use quick_xml::events::Event;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::Path;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	/// Qualified name as written, e.g. `xml:space`.
	pub name: String,
	/// Expanded name, e.g. `{http://www.w3.org/XML/1998/namespace}space`.
	pub key: String,
	pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	/// Qualified name as written, e.g. `w:t`.
	pub name: String,
	/// Expanded name in Clark notation, e.g. `{uri}t`.
	pub tag: String,
	pub attributes: Vec<Attribute>,
	pub text: Option<String>,
	pub tail: Option<String>,
	pub children: Vec<Element>,
}

impl Element {
	pub fn new(name: impl Into<String>, tag: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			tag: tag.into(),
			attributes: Vec::new(),
			text: None,
			tail: None,
			children: Vec::new(),
		}
	}

	/// Create an element named `local` in the same namespace and with the same
	/// prefix as `like`.
	pub fn create_like(like: &Element, local: &str) -> Self {
		let name = match like.name.split_once(':') {
			Some((prefix, _)) => format!("{prefix}:{local}"),
			None => local.to_string(),
		};
		let tag = match like.namespace() {
			Some(namespace) => format!("{{{namespace}}}{local}"),
			None => local.to_string(),
		};

		Self::new(name, tag)
	}

	/// The namespace uri of the element, if any.
	pub fn namespace(&self) -> Option<&str> {
		self.tag
			.strip_prefix('{')
			.and_then(|rest| rest.split_once('}'))
			.map(|(namespace, _)| namespace)
	}

	pub fn local_name(&self) -> &str {
		self.tag.rsplit('}').next().unwrap_or(&self.tag)
	}

	/// Look up an attribute by its expanded name.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.attributes
			.iter()
			.find(|attribute| attribute.key == key)
			.map(|attribute| attribute.value.as_str())
	}

	/// Set an attribute by its expanded name, keeping its position when it
	/// already exists.
	pub fn set(&mut self, name: &str, key: &str, value: impl Into<String>) {
		let value = value.into();
		if let Some(attribute) = self.attributes.iter_mut().find(|a| a.key == key) {
			attribute.value = value;
		} else {
			self.attributes.push(Attribute {
				name: name.to_string(),
				key: key.to_string(),
				value,
			});
		}
	}

	pub fn remove(&mut self, key: &str) {
		self.attributes.retain(|attribute| attribute.key != key);
	}

	/// Copy of the element without its children.
	pub fn shallow_copy(&self) -> Self {
		Self {
			name: self.name.clone(),
			tag: self.tag.clone(),
			attributes: self.attributes.clone(),
			text: self.text.clone(),
			tail: self.tail.clone(),
			children: Vec::new(),
		}
	}

	pub fn child(&self, index: usize) -> DocweaveResult<&Element> {
		self.children
			.get(index)
			.ok_or_else(|| self.navigation_error(vec![index]))
	}

	/// Resolve `path` by repeated indexed-child lookup from this element.
	pub fn find(&self, path: &[usize]) -> DocweaveResult<&Element> {
		let mut node = self;
		for (depth, index) in path.iter().enumerate() {
			node = node
				.children
				.get(*index)
				.ok_or_else(|| node.navigation_error(path[..=depth].to_vec()))?;
		}
		Ok(node)
	}

	pub fn find_mut(&mut self, path: &[usize]) -> DocweaveResult<&mut Element> {
		let mut node = self;
		for (depth, index) in path.iter().enumerate() {
			if *index >= node.children.len() {
				return Err(node.navigation_error(path[..=depth].to_vec()));
			}
			node = &mut node.children[*index];
		}
		Ok(node)
	}

	fn navigation_error(&self, path: Path) -> DocweaveError {
		DocweaveError::TreeNavigation {
			path,
			parent: self.name.clone(),
			children: self.children.len(),
		}
	}

	/// Pre-order traversal yielding every element with its path.
	pub fn walk(&self) -> Walk<'_> {
		Walk {
			stack: vec![(Vec::new(), self)],
		}
	}
}

pub struct Walk<'a> {
	stack: Vec<(Path, &'a Element)>,
}

impl<'a> Iterator for Walk<'a> {
	type Item = (Path, &'a Element);

	fn next(&mut self) -> Option<Self::Item> {
		let (path, element) = self.stack.pop()?;
		for (index, child) in element.children.iter().enumerate().rev() {
			let mut child_path = path.clone();
			child_path.push(index);
			self.stack.push((child_path, child));
		}
		Some((path, element))
	}
}

impl Walk<'_> {
	/// Do not descend into the children of the element returned last.
	pub fn skip_children(&mut self, count: usize) {
		let keep = self.stack.len().saturating_sub(count);
		self.stack.truncate(keep);
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
	pub version: String,
	pub encoding: Option<String>,
	pub standalone: Option<String>,
}

/// A parsed XML document: optional declaration plus the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	pub declaration: Option<Declaration>,
	pub root: Element,
}

/// Namespace scope opened by one element.
struct Scope {
	bindings: Vec<(String, String)>,
}

fn xml_error(error: impl std::fmt::Display) -> DocweaveError {
	DocweaveError::Xml(error.to_string())
}

fn utf8(bytes: &[u8]) -> DocweaveResult<&str> {
	std::str::from_utf8(bytes).map_err(xml_error)
}

fn resolve(scopes: &[Scope], qualified: &str, is_attribute: bool) -> String {
	let (prefix, local) = match qualified.split_once(':') {
		Some((prefix, local)) => (Some(prefix), local),
		None => (None, qualified),
	};

	// Unprefixed attributes never take the default namespace.
	if prefix.is_none() && is_attribute {
		return local.to_string();
	}
	if prefix == Some("xml") {
		return format!("{{{XML_NAMESPACE}}}{local}");
	}

	let wanted = prefix.unwrap_or("");
	scopes
		.iter()
		.rev()
		.flat_map(|scope| scope.bindings.iter().rev())
		.find(|(bound, _)| bound == wanted)
		.filter(|(_, uri)| !uri.is_empty())
		.map_or_else(
			|| qualified.to_string(),
			|(_, uri)| format!("{{{uri}}}{local}"),
		)
}

fn open_element(
	reader: &Reader<&[u8]>,
	start: &BytesStart<'_>,
	scopes: &mut Vec<Scope>,
) -> DocweaveResult<Element> {
	let name = utf8(start.name().as_ref())?.to_string();
	let mut raw = Vec::new();
	let mut bindings = Vec::new();

	for attribute in start.attributes() {
		let attribute = attribute.map_err(xml_error)?;
		let key = utf8(attribute.key.as_ref())?.to_string();
		let value = attribute
			.decode_and_unescape_value(reader.decoder())
			.map_err(xml_error)?
			.into_owned();
		if key == "xmlns" {
			bindings.push((String::new(), value.clone()));
		} else if let Some(prefix) = key.strip_prefix("xmlns:") {
			bindings.push((prefix.to_string(), value.clone()));
		}
		raw.push((key, value));
	}

	scopes.push(Scope { bindings });
	let mut element = Element::new(name.clone(), resolve(scopes, &name, false));
	element.attributes = raw
		.into_iter()
		.map(|(name, value)| {
			let key = if name == "xmlns" || name.starts_with("xmlns:") {
				name.clone()
			} else {
				resolve(scopes, &name, true)
			};
			Attribute { name, key, value }
		})
		.collect();

	Ok(element)
}

fn append_text(stack: &mut [Element], text: &str) {
	let Some(current) = stack.last_mut() else {
		// Character data outside the root element is not part of the tree.
		return;
	};
	let slot = match current.children.last_mut() {
		Some(last) => &mut last.tail,
		None => &mut current.text,
	};
	slot.get_or_insert_with(String::new).push_str(text);
}

fn close_element(
	stack: &mut Vec<Element>,
	root: &mut Option<Element>,
	element: Element,
) -> DocweaveResult<()> {
	match stack.last_mut() {
		Some(parent) => parent.children.push(element),
		None if root.is_none() => *root = Some(element),
		None => return Err(DocweaveError::Xml("multiple root elements".to_string())),
	}
	Ok(())
}

impl Document {
	/// Parse a document. Comments, processing instructions and the doctype
	/// are dropped; CDATA sections become plain text.
	pub fn parse(source: &str) -> DocweaveResult<Self> {
		let mut reader = Reader::from_str(source);
		reader.config_mut().trim_text(false);

		let mut declaration = None;
		let mut stack: Vec<Element> = Vec::new();
		let mut scopes: Vec<Scope> = Vec::new();
		let mut root = None;
		let mut entity = String::with_capacity(16);

		loop {
			match reader.read_event().map_err(xml_error)? {
				Event::Decl(decl) => {
					declaration = Some(read_declaration(&decl)?);
				}
				Event::Start(start) => {
					let element = open_element(&reader, &start, &mut scopes)?;
					stack.push(element);
				}
				Event::Empty(start) => {
					let element = open_element(&reader, &start, &mut scopes)?;
					scopes.pop();
					close_element(&mut stack, &mut root, element)?;
				}
				Event::End(_) => {
					scopes.pop();
					let element = stack
						.pop()
						.ok_or_else(|| DocweaveError::Xml("unbalanced end tag".to_string()))?;
					close_element(&mut stack, &mut root, element)?;
				}
				Event::Text(text) => {
					let text = text.decode().map_err(xml_error)?;
					append_text(&mut stack, &text);
				}
				Event::CData(data) => {
					let text = reader.decoder().decode(&data).map_err(xml_error)?;
					append_text(&mut stack, &text);
				}
				Event::GeneralRef(reference) => {
					let name = reference.decode().map_err(xml_error)?;
					entity.clear();
					entity.push('&');
					entity.push_str(&name);
					entity.push(';');
					let resolved = quick_xml::escape::unescape(&entity).map_err(xml_error)?;
					append_text(&mut stack, &resolved);
				}
				Event::Eof => break,
				_ => {}
			}
		}

		if !stack.is_empty() {
			return Err(DocweaveError::Xml("unclosed element at end of input".to_string()));
		}
		let root = root.ok_or_else(|| DocweaveError::Xml("document has no root element".to_string()))?;

		Ok(Self { declaration, root })
	}

	/// Serialize the document back to XML text.
	pub fn to_xml(&self) -> DocweaveResult<String> {
		let mut writer = Writer::new(Vec::new());

		if let Some(declaration) = &self.declaration {
			let decl = BytesDecl::new(
				&declaration.version,
				declaration.encoding.as_deref(),
				declaration.standalone.as_deref(),
			);
			writer.write_event(Event::Decl(decl)).map_err(xml_error)?;
			// Office documents put the root on the line after the declaration.
			writer
				.write_event(Event::Text(BytesText::new("\n")))
				.map_err(xml_error)?;
		}
		write_element(&mut writer, &self.root, false)?;

		String::from_utf8(writer.into_inner()).map_err(xml_error)
	}
}

fn read_declaration(decl: &BytesDecl<'_>) -> DocweaveResult<Declaration> {
	let owned = |value: Cow<'_, [u8]>| -> DocweaveResult<String> { Ok(utf8(&value)?.to_string()) };

	Ok(Declaration {
		version: owned(decl.version().map_err(xml_error)?)?,
		encoding: decl
			.encoding()
			.transpose()
			.map_err(xml_error)?
			.map(owned)
			.transpose()?,
		standalone: decl
			.standalone()
			.transpose()
			.map_err(xml_error)?
			.map(owned)
			.transpose()?,
	})
}

fn write_element(
	writer: &mut Writer<Vec<u8>>,
	element: &Element,
	with_tail: bool,
) -> DocweaveResult<()> {
	let mut start = BytesStart::new(element.name.as_str());
	for attribute in &element.attributes {
		start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
	}

	let text = element.text.as_deref().filter(|text| !text.is_empty());
	if text.is_none() && element.children.is_empty() {
		writer.write_event(Event::Empty(start)).map_err(xml_error)?;
	} else {
		writer.write_event(Event::Start(start)).map_err(xml_error)?;
		if let Some(text) = text {
			writer
				.write_event(Event::Text(BytesText::new(text)))
				.map_err(xml_error)?;
		}
		for child in &element.children {
			write_element(writer, child, true)?;
		}
		writer
			.write_event(Event::End(BytesEnd::new(element.name.as_str())))
			.map_err(xml_error)?;
	}

	if with_tail {
		if let Some(tail) = element.tail.as_deref().filter(|tail| !tail.is_empty()) {
			writer
				.write_event(Event::Text(BytesText::new(tail)))
				.map_err(xml_error)?;
		}
	}

	Ok(())
}
