//! Parsing job descriptions into typed configurations.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Errors, Outcome, ScreenError};

/// A configuration type that can be loaded from a job description.
pub trait JobConfig: DeserializeOwned {
    /// Keys that must be present in the document.
    const REQUIRED_KEYS: &'static [&'static str];

    /// Semantic checks run after typing succeeded. `origin` names the document.
    fn check(&self, origin: &str) -> Outcome<()> {
        let _ = origin;
        Ok(())
    }
}

/// Turns raw text into a string-keyed document.
pub trait ConfigParser {
    /// Short name of the format, used in messages.
    fn format(&self) -> &'static str;

    /// Parse `text` into a top-level mapping.
    fn parse(&self, text: &str) -> std::result::Result<Map<String, Value>, String>;
}

/// JSON job descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConfigParser;

impl ConfigParser for JsonConfigParser {
    fn format(&self) -> &'static str {
        "json"
    }

    fn parse(&self, text: &str) -> std::result::Result<Map<String, Value>, String> {
        match serde_json::from_str::<Value>(text).map_err(|e| e.to_string())? {
            Value::Object(map) => Ok(map),
            other => Err(format!("expected an object, found {}", json_type(&other))),
        }
    }
}

/// TOML job descriptions.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlConfigParser;

impl ConfigParser for TomlConfigParser {
    fn format(&self) -> &'static str {
        "toml"
    }

    fn parse(&self, text: &str) -> std::result::Result<Map<String, Value>, String> {
        toml::from_str::<Map<String, Value>>(text).map_err(|e| e.to_string())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Loads job descriptions with a pluggable parser.
pub struct ConfigurationLoader {
    parser: Box<dyn ConfigParser>,
}

impl ConfigurationLoader {
    /// Create a loader for JSON documents.
    pub fn new() -> Self {
        Self::with_parser(JsonConfigParser)
    }

    /// Create a loader with a custom parser.
    pub fn with_parser(parser: impl ConfigParser + 'static) -> Self {
        Self {
            parser: Box::new(parser),
        }
    }

    /// Pick the parser from a file extension (`.toml`, otherwise JSON).
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::with_parser(TomlConfigParser),
            _ => Self::new(),
        }
    }

    /// Name of the parser's format.
    pub fn format(&self) -> &'static str {
        self.parser.format()
    }

    /// Load a configuration from raw text. `origin` names the text in errors.
    ///
    /// Either every required key is present and well typed, or the whole load
    /// fails; all missing keys are reported together.
    pub fn load<C: JobConfig>(&self, text: &str, origin: &str) -> Outcome<C> {
        let malformed = |message: String| ScreenError::MalformedConfiguration {
            origin: origin.to_string(),
            message,
        };

        let document = self
            .parser
            .parse(text)
            .map_err(|e| Errors::one(malformed(format!("invalid {}: {}", self.format(), e))))?;

        let missing: Vec<ScreenError> = C::REQUIRED_KEYS
            .iter()
            .filter(|key| !document.contains_key(**key))
            .map(|key| malformed(format!("missing required key '{}'", key)))
            .collect();
        if let Some(errors) = Errors::from_vec(missing) {
            return Err(errors);
        }

        let config: C = serde_json::from_value(Value::Object(document))
            .map_err(|e| Errors::one(malformed(e.to_string())))?;
        config.check(origin)?;

        debug!(origin, format = self.format(), "Configuration loaded");
        Ok(config)
    }

    /// Read and load a configuration file.
    pub fn load_file<C: JobConfig>(&self, path: impl AsRef<Path>) -> Outcome<C> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Errors::one(ScreenError::FileNotFound {
                role: "configuration".to_string(),
                path: path.to_path_buf(),
            }));
        }

        let origin = path.display().to_string();
        let text = fs::read_to_string(path).map_err(|e| {
            Errors::one(ScreenError::MalformedConfiguration {
                origin: origin.clone(),
                message: format!("could not read file: {}", e),
            })
        })?;

        self.load(&text, &origin)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"{
        "prefix": "study_001",
        "sheet": "screening",
        "index": "record_id",
        "reviewers": ["alice", "bob"]
    }"#;

    #[test]
    fn test_load_valid_json() {
        let config: Configuration = ConfigurationLoader::new().load(VALID, "inline").unwrap();
        assert_eq!(config.prefix, "study_001");
        assert_eq!(config.sheet, "screening");
        assert_eq!(config.index, "record_id");
        assert_eq!(config.reviewers, vec!["alice", "bob"]);
        assert_eq!(config.decisions, vec!["decision"]);
    }

    #[test]
    fn test_extra_keys_ignored() {
        let text = r#"{"prefix":"p","sheet":"s","index":"id","reviewers":["a"],"comment":"hi"}"#;
        let config: Configuration = ConfigurationLoader::new().load(text, "inline").unwrap();
        assert_eq!(config.reviewers, vec!["a"]);
    }

    #[test]
    fn test_missing_keys_all_reported() {
        let text = r#"{"prefix": "p", "reviewers": ["a"]}"#;
        let errors = ConfigurationLoader::new()
            .load::<Configuration>(text, "job.json")
            .unwrap_err();

        assert_eq!(errors.count(ErrorKind::MalformedConfiguration), 2);
        let messages = errors.messages();
        assert!(messages[0].contains("'sheet'"));
        assert!(messages[1].contains("'index'"));
        assert!(messages.iter().all(|m| m.contains("job.json")));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let text = r#"{"prefix":"p","sheet":"s","index":"id","reviewers":"alice"}"#;
        let errors = ConfigurationLoader::new()
            .load::<Configuration>(text, "inline")
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::MalformedConfiguration);
    }

    #[test]
    fn test_non_object_rejected() {
        let errors = ConfigurationLoader::new()
            .load::<Configuration>("[1, 2]", "inline")
            .unwrap_err();
        assert!(errors[0].to_string().contains("an array"));
    }

    #[test]
    fn test_invalid_json_rejected() {
        let result = ConfigurationLoader::new().load::<Configuration>("{not json", "inline");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_toml() {
        let text = r#"
            prefix = "study"
            sheet = "screening"
            index = "id"
            reviewers = ["a", "b"]
            decisions = ["title_decision", "abstract_decision"]
            allow_missing_reviewers = true
        "#;
        let config: Configuration = ConfigurationLoader::with_parser(TomlConfigParser)
            .load(text, "job.toml")
            .unwrap();
        assert_eq!(config.decisions.len(), 2);
        assert!(config.allow_missing_reviewers);
    }

    #[test]
    fn test_parser_from_extension() {
        assert_eq!(ConfigurationLoader::for_path("job.toml").format(), "toml");
        assert_eq!(ConfigurationLoader::for_path("job.json").format(), "json");
        assert_eq!(ConfigurationLoader::for_path("job").format(), "json");
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let config: Configuration = ConfigurationLoader::new().load_file(file.path()).unwrap();
        assert_eq!(config.reviewers.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let errors = ConfigurationLoader::new()
            .load_file::<Configuration>("/nonexistent/job.json")
            .unwrap_err();
        assert_eq!(errors[0].kind(), ErrorKind::FileNotFound);
    }
}
