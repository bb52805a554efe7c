use std::fmt;
use std::ops::AddAssign;
use std::ops::Range;

use derive_more::Deref;

use crate::DocweaveError;
use crate::DocweaveResult;

/// Sibling indices from the root to a node. Lexicographic order is document
/// order.
pub type Path = Vec<usize>;

/// Length of the longest common prefix of two paths.
pub fn common_prefix(left: &[usize], right: &[usize]) -> usize {
	left.iter()
		.zip(right)
		.take_while(|(left, right)| left == right)
		.count()
}

/// A located, length-bounded span of an original text representation, as
/// carried by a [`TaggedStr`] while the lexer classifies it.
///
/// `offset` and `length` select the part of the representation this pointer
/// denotes; `is_constant` holds only while that part is the whole, unmodified
/// representation. Zero-length pointers are valid and mark a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowElement {
	pub path: Path,
	/// Path of the atom container; terminals must not cross atoms.
	pub atom: Path,
	pub representation_length: usize,
	pub offset: usize,
	pub length: usize,
	pub is_constant: bool,
}

impl ShadowElement {
	/// A pointer covering the whole of a freshly extracted representation.
	pub fn whole(path: Path, atom: Path, representation_length: usize) -> Self {
		Self {
			path,
			atom,
			representation_length,
			offset: 0,
			length: representation_length,
			is_constant: true,
		}
	}

	fn narrowed(&self, skip: usize, length: usize) -> Self {
		let offset = self.offset + skip;
		Self {
			offset,
			length,
			is_constant: offset == 0 && length == self.representation_length,
			..self.clone()
		}
	}
}

/// The pointer recorded on the tape for every text span.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPointer {
	pub path: Path,
	pub is_constant: bool,
	pub representation_length: usize,
	pub offset: usize,
	pub length: usize,
	/// Ordinal of the distinct path in tape order, starting at 1. It is the key
	/// of the boundary leading to this path.
	pub index: usize,
}

impl ElementPointer {
	pub fn from_shadow(shadow: &ShadowElement, index: usize) -> Self {
		Self {
			path: shadow.path.clone(),
			is_constant: shadow.is_constant,
			representation_length: shadow.representation_length,
			offset: shadow.offset,
			length: shadow.length,
			index,
		}
	}

	/// Position of the pointer in document order.
	pub fn position(&self) -> (usize, usize) {
		(self.index, self.offset)
	}
}

impl fmt::Display for ElementPointer {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = if self.is_constant { "const" } else { "dyn" };
		write!(
			f,
			"#{} {:?} {kind} {}+{}/{}",
			self.index, self.path, self.offset, self.length, self.representation_length
		)
	}
}

/// The flat view of a document's text: pointers paired with their text.
pub type Line = Vec<(ElementPointer, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
	/// No template syntax was found; the document can be copied unchanged.
	Plaintext,
	Template,
}

/// A string paired with the contiguous pointers its characters came from.
///
/// Pointer lengths are counted in bytes and always sum to the string length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct TaggedStr {
	#[deref]
	text: String,
	elements: Vec<ShadowElement>,
}

impl TaggedStr {
	/// A string coming from a single whole representation.
	pub fn from_element(text: impl Into<String>, path: Path, atom: Path) -> Self {
		let text = text.into();
		let element = ShadowElement::whole(path, atom, text.len());
		Self {
			text,
			elements: vec![element],
		}
	}

	pub fn new(text: impl Into<String>, elements: Vec<ShadowElement>) -> DocweaveResult<Self> {
		let text = text.into();
		let covered: usize = elements.iter().map(|element| element.length).sum();
		if covered != text.len() {
			return Err(DocweaveError::InvalidSlice {
				start: 0,
				stop: covered,
				length: text.len(),
			});
		}
		Ok(Self { text, elements })
	}

	pub fn as_str(&self) -> &str {
		&self.text
	}

	pub fn elements(&self) -> &[ShadowElement] {
		&self.elements
	}

	pub fn into_parts(self) -> (String, Vec<ShadowElement>) {
		(self.text, self.elements)
	}

	/// Slice by byte range, re-partitioning the pointers.
	///
	/// A zero-length pointer at position `p` belongs to the slice
	/// `start <= p < stop`, or to the slice that ends the string when `p` is
	/// the string length.
	pub fn slice(&self, range: Range<usize>) -> DocweaveResult<Self> {
		let Range { start, end: stop } = range;
		let length = self.text.len();
		if start > stop
			|| stop > length
			|| !self.text.is_char_boundary(start)
			|| !self.text.is_char_boundary(stop)
		{
			return Err(DocweaveError::InvalidSlice {
				start,
				stop,
				length,
			});
		}

		let mut elements = Vec::new();
		let mut cursor = 0;
		for element in &self.elements {
			let (from, to) = (cursor, cursor + element.length);
			cursor = to;

			if element.length == 0 {
				if (start <= from && from < stop) || (from == stop && stop == length) {
					elements.push(element.clone());
				}
				continue;
			}

			let low = from.max(start);
			let high = to.min(stop);
			if low >= high {
				continue;
			}
			if low == from && high == to {
				elements.push(element.clone());
			} else {
				elements.push(element.narrowed(low - from, high - low));
			}
		}

		Ok(Self {
			text: self.text[start..stop].to_string(),
			elements,
		})
	}

	/// Remove the zero-length pointers sitting at position zero.
	pub fn split_leading_points(&mut self) -> Vec<ShadowElement> {
		let count = self
			.elements
			.iter()
			.take_while(|element| element.length == 0)
			.count();
		self.elements.drain(..count).collect()
	}

	/// Append zero-length pointers at the end of the string.
	pub fn push_points(&mut self, points: Vec<ShadowElement>) {
		debug_assert!(points.iter().all(|point| point.length == 0));
		self.elements.extend(points);
	}
}

impl AddAssign<TaggedStr> for TaggedStr {
	fn add_assign(&mut self, other: TaggedStr) {
		self.text.push_str(&other.text);
		self.elements.extend(other.elements);
	}
}

impl fmt::Display for TaggedStr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}
