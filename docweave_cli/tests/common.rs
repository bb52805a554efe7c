#![allow(dead_code)]

use assert_cmd::Command;

pub const ODT_NAMESPACES: &str = concat!(
	r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" "#,
	r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0""#,
);

pub fn docweave_cmd() -> Command {
	let mut cmd = Command::cargo_bin("docweave").unwrap_or_else(|e| panic!("{e}"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

/// An ODT content part with one `text:p` per entry of `paragraphs`.
pub fn odt_content(paragraphs: &[&str]) -> String {
	let body: String = paragraphs
		.iter()
		.map(|text| format!("<text:p>{text}</text:p>"))
		.collect();
	format!(
		"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<office:document-content \
		 {ODT_NAMESPACES}><office:body><office:text>{body}</office:text></office:body></office:\
		 document-content>"
	)
}
