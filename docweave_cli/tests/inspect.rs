use docweave_core::AnyEmptyResult;
use predicates::prelude::*;

mod common;

use common::docweave_cmd;
use common::odt_content;

#[test]
fn inspect_prints_the_flattened_line() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, odt_content(&["Hello, {{ name }}!"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("inspect")
		.arg("--source")
		.arg(&source)
		.args(["--format", "odt"])
		.assert()
		.success()
		.stdout(predicate::str::contains("Content type: template"))
		.stdout(predicate::str::contains("Entries: 3"))
		.stdout(predicate::str::contains(
			"#1 [0, 0, 0] dyn 7+10/18  \"{{ name }}\"",
		));

	Ok(())
}

#[test]
fn inspect_reports_plaintext() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, odt_content(&["plain", "text"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("inspect")
		.arg("--source")
		.arg(&source)
		.args(["--format", "odt"])
		.assert()
		.success()
		.stdout(predicate::str::contains("Content type: plaintext"))
		.stdout(predicate::str::contains("#2 [0, 0, 1] const 0+4/4  \"text\""));

	Ok(())
}

#[test]
fn tape_shows_pointer_records() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, odt_content(&["a", "{{ b }}"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("tape")
		.arg("--source")
		.arg(&source)
		.args(["--format", "odt"])
		.assert()
		.success()
		.stdout(predicate::str::contains(
			"⟦#1 [0, 0, 0] const 0+1/1⟧a⟦#2 [0, 0, 1] dyn 0+7/7⟧{{ b }}",
		));

	Ok(())
}

#[test]
fn inspect_rejects_invalid_xml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, "<office:text><text:p>unclosed</office:text>")?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("inspect")
		.arg("--source")
		.arg(&source)
		.args(["--format", "odt"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("docweave::xml"));

	Ok(())
}

#[test]
fn missing_source_file_fails() {
	docweave_cmd()
		.arg("tape")
		.args(["--source", "does-not-exist.xml", "--format", "docx"])
		.assert()
		.code(2)
		.stderr(predicate::str::contains("failed to read does-not-exist.xml"));
}

#[test]
fn unknown_format_is_rejected_by_the_parser() {
	docweave_cmd()
		.arg("inspect")
		.args(["--source", "content.xml", "--format", "pdf"])
		.assert()
		.failure()
		.stderr(predicate::str::contains("pdf"));
}
