use docweave_core::AnyEmptyResult;

mod common;

use common::docweave_cmd;
use common::odt_content;

#[test]
fn render_with_inline_context() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	let destination = tmp.path().join("out.xml");
	std::fs::write(&source, odt_content(&["Hello, {{ name }}!"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(&destination)
		.args(["--format", "odt"])
		.args(["--context", r#"{"name": "World"}"#])
		.assert()
		.success();

	let output = std::fs::read_to_string(&destination)?;
	assert!(output.contains("<text:p>Hello, World!</text:p>"), "{output}");
	assert!(!output.contains("{{"));

	Ok(())
}

#[test]
fn render_with_yaml_context_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	let destination = tmp.path().join("out.xml");
	let context = tmp.path().join("context.yaml");
	std::fs::write(
		&source,
		odt_content(&["{% for item in items %}", "{{ item }}", "{% endfor %}"]),
	)?;
	std::fs::write(&context, "items:\n  - first\n  - second\n")?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(&destination)
		.args(["--format", "odt"])
		.arg("--context-file")
		.arg(&context)
		.assert()
		.success();

	let output = std::fs::read_to_string(&destination)?;
	assert!(output.contains("<text:p>first</text:p><text:p>second</text:p>"), "{output}");

	Ok(())
}

#[test]
fn render_copies_plain_parts_unchanged() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	let destination = tmp.path().join("out.xml");
	let content = odt_content(&["No templates here."]);
	std::fs::write(&source, &content)?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(&destination)
		.args(["--format", "odt"])
		.assert()
		.success();

	assert_eq!(std::fs::read_to_string(&destination)?, content);

	Ok(())
}

#[test]
fn render_uses_the_configured_format_and_engine() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	let destination = tmp.path().join("out.xml");
	std::fs::write(&source, odt_content(&["{{ missing }}"]))?;
	std::fs::write(
		tmp.path().join("docweave.toml"),
		"format = \"odt\"\n\n[engine]\nundefined = \"strict\"\n",
	)?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(&destination)
		.assert()
		.code(2)
		.stderr(predicates::str::contains("docweave::template_render"));

	assert!(!destination.exists());

	Ok(())
}

#[test]
fn render_with_explicit_config_path() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	let destination = tmp.path().join("out.xml");
	let config = tmp.path().join("settings.toml");
	std::fs::write(&source, odt_content(&["{{ greeting }}"]))?;
	std::fs::write(&config, "format = \"odt\"\n")?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("--config")
		.arg(&config)
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(&destination)
		.args(["--context", r#"{"greeting": "Hi"}"#])
		.assert()
		.success();

	let output = std::fs::read_to_string(&destination)?;
	assert!(output.contains("<text:p>Hi</text:p>"), "{output}");

	Ok(())
}

#[test]
fn render_without_format_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, odt_content(&["{{ name }}"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(tmp.path().join("out.xml"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("no document format given"));

	Ok(())
}

#[test]
fn render_reports_split_terminals() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = tmp.path().join("content.xml");
	std::fs::write(&source, odt_content(&["{{ na", "me }}"]))?;

	docweave_cmd()
		.current_dir(tmp.path())
		.arg("render")
		.arg("--source")
		.arg(&source)
		.arg("--destination")
		.arg(tmp.path().join("out.xml"))
		.args(["--format", "odt"])
		.assert()
		.code(2)
		.stderr(predicates::str::contains("docweave::terminal_split"));

	Ok(())
}
