use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::Value;

use crate::DocweaveError;
use crate::DocweaveResult;
use crate::EngineConfig;
use crate::UndefinedMode;
use crate::lexer::JinjaLexer;
use crate::lexer::TemplateLexer;

/// The template engine a document is rendered with, paired with a lexer that
/// recognizes the same tag delimiters.
pub trait TemplateEngine {
	type Lexer: TemplateLexer;

	fn lexer(&self) -> Self::Lexer;

	/// Render `template` against `context`.
	fn render(&self, template: &str, context: &serde_json::Value) -> DocweaveResult<String>;
}

/// [`TemplateEngine`] backed by minijinja with its default syntax.
#[derive(Debug)]
pub struct JinjaEngine {
	environment: Environment<'static>,
}

impl Default for JinjaEngine {
	fn default() -> Self {
		Self::new(&EngineConfig::default())
	}
}

impl JinjaEngine {
	pub fn new(config: &EngineConfig) -> Self {
		let mut environment = Environment::new();
		environment.set_keep_trailing_newline(config.keep_trailing_newline);
		environment.set_undefined_behavior(match config.undefined {
			UndefinedMode::Lenient => UndefinedBehavior::Lenient,
			UndefinedMode::Strict => UndefinedBehavior::Strict,
			UndefinedMode::Chainable => UndefinedBehavior::Chainable,
		});

		Self { environment }
	}
}

impl TemplateEngine for JinjaEngine {
	type Lexer = JinjaLexer;

	fn lexer(&self) -> Self::Lexer {
		JinjaLexer::new()
	}

	fn render(&self, template: &str, context: &serde_json::Value) -> DocweaveResult<String> {
		self.environment
			.render_str(template, Value::from_serialize(context))
			.map_err(|e| DocweaveError::TemplateRender(e.to_string()))
	}
}
