use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use docweave_core::FormatKind;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Fill DOCX and ODT templates without the template engine ever seeing XML.",
	long_about = "docweave flattens the text of an office document XML part into a single \
	              template string, renders it with a Jinja compatible engine and writes the \
	              result back into the original element tree.\n\nQuick start:\n  docweave \
	              render --source content.xml --destination out.xml --context '{\"name\": \
	              \"World\"}'\n  docweave inspect --source document.xml --format docx\n  \
	              docweave tape --source content.xml --format odt"
)]
pub struct DocweaveCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,

	/// Path to a `docweave.toml` file. When omitted the configuration is
	/// discovered in the current directory.
	#[arg(long, global = true)]
	pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render an XML part with a template context.
	///
	/// The part is written to the destination unchanged when it contains no
	/// template syntax.
	Render {
		/// XML part to read, such as `word/document.xml` or `content.xml`.
		#[arg(long, short)]
		source: PathBuf,

		/// File the rendered XML part is written to.
		#[arg(long, short)]
		destination: PathBuf,

		/// Document format of the part. Falls back to the configured format.
		#[arg(long, short)]
		format: Option<FormatKind>,

		/// Template context as inline JSON.
		#[arg(long, conflicts_with = "context_file")]
		context: Option<String>,

		/// Template context file in JSON, YAML or TOML, chosen by extension.
		#[arg(long)]
		context_file: Option<PathBuf>,
	},
	/// Print the content type and the flattened text of an XML part.
	Inspect {
		/// XML part to read.
		#[arg(long, short)]
		source: PathBuf,

		/// Document format of the part. Falls back to the configured format.
		#[arg(long, short)]
		format: Option<FormatKind>,
	},
	/// Print the template string handed to the template engine, with every
	/// pointer record shown between `⟦` and `⟧`.
	Tape {
		/// XML part to read.
		#[arg(long, short)]
		source: PathBuf,

		/// Document format of the part. Falls back to the configured format.
		#[arg(long, short)]
		format: Option<FormatKind>,
	},
}
