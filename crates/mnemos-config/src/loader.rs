//! Reads `mnemos.toml`, substituting `${VAR}` references before parsing.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        Self::load_str(&fs::read_to_string(path)?)
    }

    /// Like [`ConfigLoader::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.expand_paths();
        Ok(config)
    }

    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let substituted = Self::expand_env_vars(content)?;
        let mut config: Config = toml::from_str(&substituted)?;
        config.expand_paths();
        Ok(config)
    }

    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let pattern =
            Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        let mut out = String::with_capacity(content.len());
        let mut tail = 0;
        for caps in pattern.captures_iter(content) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = std::env::var(name.as_str())
                .map_err(|_| ConfigError::EnvVarNotSet(name.as_str().to_string()))?;
            out.push_str(&content[tail..whole.start()]);
            out.push_str(&value);
            tail = whole.end();
        }
        out.push_str(&content[tail..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.store.embedding_dimension, 384);
        assert_eq!(config.search.hybrid_limit, 5);
    }

    #[test]
    fn every_section_is_read() {
        let toml = r#"
            [store]
            path = "/var/lib/mnemos/memory.db"
            embedding_dimension = 1536

            [search]
            vector_weight = 0.7
            keyword_weight = 0.3

            [embedding]
            provider = "openai"
            api_key = "sk-test"
            model = "text-embedding-3-large"
        "#;
        let config = ConfigLoader::load_str(toml).unwrap();
        assert_eq!(config.store.path, Path::new("/var/lib/mnemos/memory.db"));
        assert_eq!(config.store.embedding_dimension, 1536);
        assert!((config.search.vector_weight - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.embedding.model, "text-embedding-3-large");
    }

    #[test]
    fn tilde_paths_are_expanded() {
        let config = ConfigLoader::load_str("[store]\npath = \"~/notes.db\"\n").unwrap();
        assert!(!config.store.path.starts_with("~"));
        assert!(config.store.path.ends_with("notes.db"));
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[store]\nbusy_timeout_ms = 250\n").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.store.busy_timeout_ms, 250);
    }

    #[test]
    fn missing_file_is_an_error_unless_defaults_requested() {
        let absent = Path::new("/definitely/not/here/mnemos.toml");
        assert!(matches!(ConfigLoader::load(absent), Err(ConfigError::Io(_))));
        let config = ConfigLoader::load_or_default(absent).unwrap();
        assert_eq!(config.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn broken_toml_is_reported() {
        assert!(matches!(
            ConfigLoader::load_str("dimension = [1, 2"),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn variables_are_substituted() {
        // SAFETY: the variable name is unique to this test.
        unsafe {
            std::env::set_var("MNEMOS_LOADER_TEST_KEY", "sk-from-env");
        }
        let toml = "[embedding]\napi_key = \"${MNEMOS_LOADER_TEST_KEY}\"\n";
        let config = ConfigLoader::load_str(toml).unwrap();
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-from-env"));
        unsafe {
            std::env::remove_var("MNEMOS_LOADER_TEST_KEY");
        }
    }

    #[test]
    fn unset_variable_fails_with_its_name() {
        let err = ConfigLoader::expand_env_vars("key = \"${MNEMOS_UNSET_12345}\"").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet(ref name) if name == "MNEMOS_UNSET_12345"));
    }

    #[test]
    fn text_without_references_is_untouched() {
        let text = "a = \"$HOME and {braces}\"";
        assert_eq!(ConfigLoader::expand_env_vars(text).unwrap(), text);
    }
}
