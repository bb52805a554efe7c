use tracing::debug;
use tracing::info;

use crate::ContentType;
use crate::DocweaveResult;
use crate::Document;
use crate::Line;
use crate::TemplateEngine;
use crate::delineate_boundaries;
use crate::enforce;
use crate::format::DocumentFormat;
use crate::straighten;
use crate::tape;

/// Render one templated XML part of a document.
///
/// Documents without any template syntax are returned unchanged.
pub fn render_xml<E: TemplateEngine>(
	source: &str,
	format: &dyn DocumentFormat,
	engine: &E,
	context: &serde_json::Value,
) -> DocweaveResult<String> {
	let document = Document::parse(source)?;
	let (content, line) = straighten(&document.root, engine.lexer(), format)?;
	if content == ContentType::Plaintext {
		info!(format = format.name(), "no template syntax found");
		return Ok(source.to_string());
	}

	let boundaries = delineate_boundaries(&document.root, &line)?;
	let template = tape::stringify(&line)?;
	let rendered = engine.render(&template, context)?;
	let rendered_line = tape::parse(&rendered)?;
	debug!(
		template = line.len(),
		rendered = rendered_line.len(),
		"rendered tape"
	);

	let root = enforce(&document.root, &rendered_line, &boundaries, format)?;
	let output = Document {
		declaration: document.declaration,
		root,
	};

	output.to_xml()
}

/// Flatten an XML part without rendering it.
pub fn inspect_xml<E: TemplateEngine>(
	source: &str,
	format: &dyn DocumentFormat,
	engine: &E,
) -> DocweaveResult<(ContentType, Line)> {
	let document = Document::parse(source)?;
	straighten(&document.root, engine.lexer(), format)
}
