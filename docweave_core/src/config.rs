use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::FormatKind;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"docweave.toml",
	".docweave.toml",
	".config/docweave.toml",
];

/// Configuration loaded from a `docweave.toml` file.
///
/// ```toml
/// format = "docx"
///
/// [engine]
/// undefined = "strict"
/// keep_trailing_newline = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DocweaveConfig {
	/// Document format used when none is given on the command line.
	#[serde(default)]
	pub format: Option<FormatKind>,
	#[serde(default)]
	pub engine: EngineConfig,
}

/// Settings of the template engine.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
	#[serde(default)]
	pub undefined: UndefinedMode,
	#[serde(default = "default_keep_trailing_newline")]
	pub keep_trailing_newline: bool,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			undefined: UndefinedMode::default(),
			keep_trailing_newline: default_keep_trailing_newline(),
		}
	}
}

fn default_keep_trailing_newline() -> bool {
	true
}

/// How the template engine treats variables missing from the context.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedMode {
	/// Missing values render as empty text.
	#[default]
	Lenient,
	/// Any use of a missing value is an error.
	Strict,
	/// Attribute access on missing values is allowed and renders empty.
	Chainable,
}

impl DocweaveConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> DocweaveResult<Option<DocweaveConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		Self::load_file(&config_path).map(Some)
	}

	/// Load the config from an explicit path.
	pub fn load_file(path: &Path) -> DocweaveResult<DocweaveConfig> {
		let content = std::fs::read_to_string(path)?;
		toml::from_str(&content).map_err(|e| DocweaveError::ConfigParse(e.to_string()))
	}
}
