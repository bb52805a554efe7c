//! The tape is the string handed to the template engine: every entry of a
//! [`Line`] becomes a pointer record followed by its literal text.
//!
//! A record is the packed pointer written as lowercase hex between the
//! noncharacters `U+FDD0` and `U+FDD1`. Neither the hex digits nor the
//! sentinels are template syntax, so the engine copies a record as one opaque
//! run of text whenever it copies the surrounding output.
//!
//! The packed pointer starts with a version byte followed by unsigned LEB128
//! fields: path length, path segments, constant flag, representation length,
//! offset, length and index.

use std::fmt::Write;

use tracing::debug;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::ElementPointer;
use crate::Line;

pub const RECORD_OPEN: char = '\u{FDD0}';
pub const RECORD_CLOSE: char = '\u{FDD1}';
const TAPE_VERSION: u8 = 1;

/// Serialize a line into a tape.
pub fn stringify(line: &[(ElementPointer, String)]) -> DocweaveResult<String> {
	let mut tape = String::new();

	for (pointer, text) in line {
		if let Some(reserved) = text.chars().find(|c| *c == RECORD_OPEN || *c == RECORD_CLOSE) {
			return Err(DocweaveError::ReservedCharacter(u32::from(reserved)));
		}
		tape.push(RECORD_OPEN);
		for byte in pack(pointer) {
			let _ = write!(tape, "{byte:02x}");
		}
		tape.push(RECORD_CLOSE);
		tape.push_str(text);
	}

	Ok(tape)
}

/// Read a rendered tape back into a line.
pub fn parse(tape: &str) -> DocweaveResult<Line> {
	let mut records = tape.split(RECORD_OPEN);
	let leading = records.next().unwrap_or_default();
	if !leading.is_empty() {
		return Err(malformed(format!("text `{leading}` before the first record")));
	}

	let mut line = Line::new();
	for record in records {
		let (hex, text) = record
			.split_once(RECORD_CLOSE)
			.ok_or_else(|| malformed("unterminated record".to_string()))?;
		if text.contains(RECORD_CLOSE) {
			return Err(malformed("record closed twice".to_string()));
		}
		let pointer = unpack(&decode_hex(hex)?)?;
		line.push((pointer, text.to_string()));
	}

	debug!(entries = line.len(), "parsed tape");
	Ok(line)
}

/// Human readable rendition of a tape with records shown as `⟦…⟧`.
pub fn display(line: &[(ElementPointer, String)]) -> String {
	let mut output = String::new();
	for (pointer, text) in line {
		let _ = write!(output, "⟦{pointer}⟧{text}");
	}
	output
}

fn malformed(message: String) -> DocweaveError {
	DocweaveError::MalformedTape(message)
}

fn pack(pointer: &ElementPointer) -> Vec<u8> {
	let mut bytes = vec![TAPE_VERSION];
	write_varint(&mut bytes, pointer.path.len());
	for segment in &pointer.path {
		write_varint(&mut bytes, *segment);
	}
	bytes.push(u8::from(pointer.is_constant));
	write_varint(&mut bytes, pointer.representation_length);
	write_varint(&mut bytes, pointer.offset);
	write_varint(&mut bytes, pointer.length);
	write_varint(&mut bytes, pointer.index);
	bytes
}

fn unpack(bytes: &[u8]) -> DocweaveResult<ElementPointer> {
	let mut reader = Unpacker { bytes, position: 0 };

	let version = reader.byte()?;
	if version != TAPE_VERSION {
		return Err(malformed(format!("unknown record version {version}")));
	}
	let depth = reader.varint()?;
	let mut path = Vec::with_capacity(depth.min(bytes.len()));
	for _ in 0..depth {
		path.push(reader.varint()?);
	}
	let is_constant = match reader.byte()? {
		0 => false,
		1 => true,
		other => return Err(malformed(format!("invalid constant flag {other}"))),
	};
	let pointer = ElementPointer {
		path,
		is_constant,
		representation_length: reader.varint()?,
		offset: reader.varint()?,
		length: reader.varint()?,
		index: reader.varint()?,
	};
	if reader.position != bytes.len() {
		return Err(malformed("trailing bytes in record".to_string()));
	}

	Ok(pointer)
}

fn write_varint(bytes: &mut Vec<u8>, mut value: usize) {
	loop {
		let low = (value & 0x7f) as u8;
		value >>= 7;
		if value == 0 {
			bytes.push(low);
			return;
		}
		bytes.push(low | 0x80);
	}
}

struct Unpacker<'a> {
	bytes: &'a [u8],
	position: usize,
}

impl Unpacker<'_> {
	fn byte(&mut self) -> DocweaveResult<u8> {
		let byte = self
			.bytes
			.get(self.position)
			.copied()
			.ok_or_else(|| malformed("truncated record".to_string()))?;
		self.position += 1;
		Ok(byte)
	}

	fn varint(&mut self) -> DocweaveResult<usize> {
		let mut value = 0usize;
		let mut shift = 0;
		loop {
			let byte = self.byte()?;
			if shift >= usize::BITS {
				return Err(malformed("varint overflow".to_string()));
			}
			value |= usize::from(byte & 0x7f) << shift;
			if byte & 0x80 == 0 {
				return Ok(value);
			}
			shift += 7;
		}
	}
}

fn decode_hex(hex: &str) -> DocweaveResult<Vec<u8>> {
	if hex.len() % 2 != 0 {
		return Err(malformed("odd number of hex digits".to_string()));
	}
	(0..hex.len())
		.step_by(2)
		.map(|index| {
			hex.get(index..index + 2)
				.and_then(|pair| u8::from_str_radix(pair, 16).ok())
				.ok_or_else(|| malformed(format!("invalid hex `{hex}`")))
		})
		.collect()
}
