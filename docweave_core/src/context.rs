use std::path::Path;

use crate::DocweaveError;
use crate::DocweaveResult;

/// Read a template context from a JSON, YAML or TOML file, chosen by the file
/// extension.
pub fn load_context_file(path: &Path) -> DocweaveResult<serde_json::Value> {
	let display = path.display().to_string();
	let content = std::fs::read_to_string(path).map_err(|e| {
		DocweaveError::ContextFile {
			path: display.clone(),
			reason: e.to_string(),
		}
	})?;
	let format = path
		.extension()
		.and_then(|extension| extension.to_str())
		.unwrap_or_default()
		.to_ascii_lowercase();

	parse_context(&content, &format, &display)
}

/// Parse context `content` written in `format`.
pub fn parse_context(content: &str, format: &str, path_display: &str) -> DocweaveResult<serde_json::Value> {
	let error = |reason: String| {
		DocweaveError::ContextFile {
			path: path_display.to_string(),
			reason,
		}
	};

	match format {
		"json" => serde_json::from_str(content).map_err(|e| error(e.to_string())),
		"toml" => {
			let value: toml::Value = toml::from_str(content).map_err(|e| error(e.to_string()))?;
			Ok(toml_to_json(value))
		}
		"yaml" | "yml" => serde_yaml_ng::from_str(content).map_err(|e| error(e.to_string())),
		other => Err(DocweaveError::UnsupportedContextFormat(other.to_string())),
	}
}

/// Convert a `toml::Value` to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
	match value {
		toml::Value::String(s) => serde_json::Value::String(s),
		toml::Value::Integer(i) => serde_json::Value::from(i),
		toml::Value::Float(f) => {
			serde_json::Number::from_f64(f).map_or(serde_json::Value::Null, serde_json::Value::Number)
		}
		toml::Value::Boolean(b) => serde_json::Value::Bool(b),
		toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
		toml::Value::Array(items) => serde_json::Value::Array(items.into_iter().map(toml_to_json).collect()),
		toml::Value::Table(table) => {
			serde_json::Value::Object(
				table
					.into_iter()
					.map(|(key, value)| (key, toml_to_json(value)))
					.collect(),
			)
		}
	}
}
