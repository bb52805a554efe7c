use std::path::Path;
use std::process;

use clap::Parser;
use docweave_cli::Commands;
use docweave_cli::DocweaveCli;
use docweave_core::ContentType;
use docweave_core::DocweaveConfig;
use docweave_core::DocweaveError;
use docweave_core::FormatKind;
use docweave_core::JinjaEngine;
use docweave_core::inspect_xml;
use docweave_core::load_context_file;
use docweave_core::parse_context;
use docweave_core::render_xml;
use docweave_core::tape;
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
	let args = DocweaveCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// `RUST_LOG` wins over `--verbose`.
	let default_level = if args.verbose { "docweave_core=debug" } else { "warn" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Render {
			source,
			destination,
			format,
			context,
			context_file,
		}) => {
			run_render(
				&args,
				source,
				destination,
				*format,
				context.as_deref(),
				context_file.as_deref(),
			)
		}
		Some(Commands::Inspect { source, format }) => run_inspect(&args, source, *format),
		Some(Commands::Tape { source, format }) => run_tape(&args, source, *format),
		None => {
			eprintln!("No subcommand specified. Run `docweave --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<DocweaveError>() {
			Ok(docweave_err) => {
				let report: miette::Report = (*docweave_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn load_config(args: &DocweaveCli) -> CliResult<DocweaveConfig> {
	if let Some(path) = &args.config {
		return Ok(DocweaveConfig::load_file(path)?);
	}
	let root = std::env::current_dir()?;
	Ok(DocweaveConfig::load(&root)?.unwrap_or_default())
}

fn resolve_format(flag: Option<FormatKind>, config: &DocweaveConfig) -> CliResult<FormatKind> {
	flag.or(config.format).ok_or_else(|| {
		"no document format given, pass `--format docx|odt` or set `format` in docweave.toml".into()
	})
}

fn read_source(source: &Path) -> CliResult<String> {
	std::fs::read_to_string(source)
		.map_err(|e| format!("failed to read {}: {e}", source.display()).into())
}

fn run_render(
	args: &DocweaveCli,
	source: &Path,
	destination: &Path,
	format: Option<FormatKind>,
	context: Option<&str>,
	context_file: Option<&Path>,
) -> CliResult<()> {
	let config = load_config(args)?;
	let format = resolve_format(format, &config)?;
	let engine = JinjaEngine::new(&config.engine);

	let context = match (context, context_file) {
		(Some(inline), _) => parse_context(inline, "json", "--context")?,
		(None, Some(path)) => load_context_file(path)?,
		(None, None) => serde_json::Value::Object(serde_json::Map::new()),
	};
	debug!(%format, source = %source.display(), "rendering part");

	let xml = read_source(source)?;
	let output = render_xml(&xml, format.handler(), &engine, &context)?;
	std::fs::write(destination, output)?;

	if args.verbose {
		println!(
			"Rendered {} into {}.",
			source.display(),
			destination.display()
		);
	}

	Ok(())
}

fn run_inspect(args: &DocweaveCli, source: &Path, format: Option<FormatKind>) -> CliResult<()> {
	let config = load_config(args)?;
	let format = resolve_format(format, &config)?;
	let engine = JinjaEngine::new(&config.engine);

	let xml = read_source(source)?;
	let (content, line) = inspect_xml(&xml, format.handler(), &engine)?;

	let content = match content {
		ContentType::Plaintext => "plaintext",
		ContentType::Template => "template",
	};
	println!("{} {content}", colored!("Content type:", bold));
	println!("{} {}", colored!("Entries:", bold), line.len());
	for (pointer, text) in &line {
		println!("  {pointer}  {text:?}");
	}

	Ok(())
}

fn run_tape(args: &DocweaveCli, source: &Path, format: Option<FormatKind>) -> CliResult<()> {
	let config = load_config(args)?;
	let format = resolve_format(format, &config)?;
	let engine = JinjaEngine::new(&config.engine);

	let xml = read_source(source)?;
	let (_, line) = inspect_xml(&xml, format.handler(), &engine)?;
	println!("{}", tape::display(&line));

	Ok(())
}
