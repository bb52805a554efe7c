use crate::Document;
use crate::Element;
use crate::ElementPointer;
use crate::Line;
use crate::Path;
use crate::ShadowElement;

pub(crate) const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const M_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
pub(crate) const V_NAMESPACE: &str = "urn:schemas-microsoft-com:vml";
pub(crate) const OFFICE_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
pub(crate) const TEXT_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

/// A word processing document with `body` inside `w:body`.
pub(crate) fn docx_document(body: &str) -> String {
	format!(
		r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NAMESPACE}"><w:body>{body}</w:body></w:document>"#
	)
}

/// An OpenDocument content part with `body` inside `office:text`.
pub(crate) fn odt_document(body: &str) -> String {
	format!(
		r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="{OFFICE_NAMESPACE}" xmlns:text="{TEXT_NAMESPACE}"><office:body><office:text>{body}</office:text></office:body></office:document-content>"#
	)
}

/// One `w:p` with one `w:r` per entry of `texts`.
pub(crate) fn docx_paragraph(texts: &[&str]) -> String {
	let runs: String = texts
		.iter()
		.map(|text| format!("<w:r><w:t>{text}</w:t></w:r>"))
		.collect();
	format!("<w:p>{runs}</w:p>")
}

/// One `text:p` per entry of `texts`.
pub(crate) fn odt_paragraphs(texts: &[&str]) -> String {
	texts
		.iter()
		.map(|text| format!("<text:p>{text}</text:p>"))
		.collect()
}

/// A document exercising most DOCX constructs without template syntax.
pub(crate) fn docx_plain_document() -> String {
	docx_document(concat!(
		r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Title</w:t></w:r></w:p>"#,
		r#"<w:p><w:bookmarkStart w:id="0" w:name="start"/><w:r><w:t xml:space="preserve">Hello </w:t><w:tab/><w:t>world</w:t><w:br/></w:r><w:bookmarkEnd w:id="0"/></w:p>"#,
		r"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc></w:tr></w:tbl>",
		r"<w:p/>",
		r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr>"#,
	))
}

/// A document exercising most ODT constructs without template syntax.
pub(crate) fn odt_plain_document() -> String {
	odt_document(concat!(
		r#"<text:h text:outline-level="1">Heading</text:h>"#,
		r#"<text:p text:style-name="P1">Hello <text:span text:style-name="T1">bold</text:span> tail</text:p>"#,
		r"<text:p/>",
		r"<text:list><text:list-item><text:p>first</text:p></text:list-item><text:list-item><text:p>second</text:p></text:list-item></text:list>",
		r"<text:sequence-decls/>",
	))
}

/// `<r><a><x/><y/><x/></a><b><x/><y/></b><c><x/></c></r>` with the leaves
/// `y` of `a` and `b`.
pub(crate) fn boundary_tree() -> Element {
	parse_root("<r><a><x/><y/><x/></a><b><x/><y/></b><c><x/></c></r>")
}

pub(crate) fn pointer(path: &[usize], index: usize) -> ElementPointer {
	ElementPointer {
		path: path.to_vec(),
		is_constant: true,
		representation_length: 0,
		offset: 0,
		length: 0,
		index,
	}
}

/// A line visiting `paths` in order, one constant empty entry per path.
pub(crate) fn line_of(paths: &[&[usize]]) -> Line {
	paths
		.iter()
		.enumerate()
		.map(|(position, path)| (pointer(path, position + 1), String::new()))
		.collect()
}

pub(crate) fn shadow(path: &[usize], representation_length: usize) -> ShadowElement {
	let path: Path = path.to_vec();
	ShadowElement::whole(path, Vec::new(), representation_length)
}

pub(crate) fn parse_root(source: &str) -> Element {
	match Document::parse(source) {
		Ok(document) => document.root,
		Err(error) => panic!("invalid xml: {error}\n{source}"),
	}
}
