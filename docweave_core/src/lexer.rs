use std::collections::VecDeque;

use logos::Logos;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::TaggedStr;

/// Classification of a lexed span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
	/// Literal text, copied through the template engine.
	Text,
	/// Template syntax, consumed by the template engine.
	Terminal,
}

/// Streaming classifier of template text into [`Token::Text`] and
/// [`Token::Terminal`] spans.
pub trait TemplateLexer {
	/// Append a chunk. Must not be called after [`TemplateLexer::close`].
	fn feed(&mut self, chunk: TaggedStr) -> DocweaveResult<()>;
	/// Flush: whatever is still buffered becomes trailing text.
	fn close(&mut self);
	/// Drain the classified events produced so far.
	fn read_events(&mut self) -> Vec<(Token, TaggedStr)>;
}

/// Tokens outside of any tag.
#[derive(Logos, Debug, PartialEq)]
enum OuterToken {
	#[token("{{")]
	VariableOpen,
	#[token("{%")]
	BlockOpen,
	#[token("{#")]
	CommentOpen,
	#[token("{")]
	Brace,
	#[regex(r"[^{]+")]
	Text,
}

/// Tokens inside a `{{ }}` or `{% %}` tag.
#[derive(Logos, Debug, PartialEq)]
enum InnerToken {
	#[token("}}")]
	VariableClose,
	#[token("%}")]
	BlockClose,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'([^'\\]|\\.)*'")]
	SingleQuotedString,
	#[regex(r#"[^}%"']+"#)]
	Other,
	#[regex(r"[}%]")]
	Stray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
	Variable,
	Block,
	Comment,
}

impl TagKind {
	fn close(self) -> &'static str {
		match self {
			Self::Variable => "}}",
			Self::Block => "%}",
			Self::Comment => "#}",
		}
	}
}

/// Byte offset just past the tag opened at `open_end`, if the tag is closed
/// inside `source`.
fn find_tag_end(source: &str, open_end: usize, kind: TagKind) -> Option<usize> {
	let rest = &source[open_end..];

	// Comments have no string literals; the first `#}` closes them.
	if kind == TagKind::Comment {
		return rest
			.find(kind.close())
			.map(|index| open_end + index + kind.close().len());
	}

	let mut inner = InnerToken::lexer(rest);
	while let Some(token) = inner.next() {
		let closes = match token {
			Ok(InnerToken::VariableClose) => kind == TagKind::Variable,
			Ok(InnerToken::BlockClose) => kind == TagKind::Block,
			// An unterminated quote is a stray character for the tag.
			_ => false,
		};
		if closes {
			return Some(open_end + inner.span().end);
		}
	}

	None
}

/// Byte ranges of every complete tag in `source`, in order, and the offset
/// from which `source` may still continue a tag.
fn scan_tags(source: &str) -> (Vec<(usize, usize)>, usize) {
	let mut tags = Vec::new();
	let mut outer = OuterToken::lexer(source);
	let mut pending = if source.ends_with('{') {
		source.len() - 1
	} else {
		source.len()
	};

	while let Some(token) = outer.next() {
		let kind = match token {
			Ok(OuterToken::VariableOpen) => TagKind::Variable,
			Ok(OuterToken::BlockOpen) => TagKind::Block,
			Ok(OuterToken::CommentOpen) => TagKind::Comment,
			_ => continue,
		};
		let span = outer.span();
		let Some(end) = find_tag_end(source, span.end, kind) else {
			// Unterminated: wait for more input.
			pending = span.start;
			break;
		};
		tags.push((span.start, end));
		outer = OuterToken::lexer(source);
		outer.bump(end);
	}

	(tags, pending)
}

/// Lexer compatible with the default minijinja syntax: `{{ }}` expressions,
/// `{% %}` statements and `{# #}` comments.
///
/// Only the tail that may still open a tag stays buffered, so a tag split over
/// several fed chunks is still recognized as a single terminal while plain
/// text is handed out as soon as it arrives.
#[derive(Debug, Default)]
pub struct JinjaLexer {
	buffer: TaggedStr,
	events: VecDeque<(Token, TaggedStr)>,
	is_closed: bool,
}

impl JinjaLexer {
	pub fn new() -> Self {
		Self::default()
	}

	fn push_text(&mut self, text: TaggedStr) {
		if !text.is_empty() || !text.elements().is_empty() {
			self.events.push_back((Token::Text, text));
		}
	}

	fn process(&mut self) -> DocweaveResult<()> {
		let (tags, pending) = scan_tags(self.buffer.as_str());

		let mut last = 0;
		for (start, end) in tags {
			let mut text = self.buffer.slice(last..start)?;
			let mut terminal = self.buffer.slice(start..end)?;
			// Points sitting right before a tag belong to the text in front of it.
			text.push_points(terminal.split_leading_points());
			self.push_text(text);
			self.events.push_back((Token::Terminal, terminal));
			last = end;
		}

		let length = self.buffer.len();
		if pending == length {
			// Nothing can open a tag anymore, points at the end included.
			let rest = self.buffer.slice(last..length)?;
			self.buffer = TaggedStr::default();
			self.push_text(rest);
		} else {
			if pending > last {
				self.push_text(self.buffer.slice(last..pending)?);
			}
			self.buffer = self.buffer.slice(pending..length)?;
		}

		Ok(())
	}
}

impl TemplateLexer for JinjaLexer {
	fn feed(&mut self, chunk: TaggedStr) -> DocweaveResult<()> {
		if self.is_closed {
			return Err(DocweaveError::LexerClosed);
		}
		self.buffer += chunk;
		self.process()
	}

	fn close(&mut self) {
		self.is_closed = true;
	}

	fn read_events(&mut self) -> Vec<(Token, TaggedStr)> {
		if self.is_closed {
			let rest = std::mem::take(&mut self.buffer);
			self.push_text(rest);
		}
		self.events.drain(..).collect()
	}
}
