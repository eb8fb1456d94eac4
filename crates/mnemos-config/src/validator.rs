//! Sanity checks run on a loaded [`Config`] before the store is opened.

use crate::error::ConfigError;
use crate::schema::{Config, EmbeddingProviderKind};

/// One problem found in the configuration, keyed by its dotted setting name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

/// Issues collected by [`ConfigValidator::validate`]. Errors abort startup,
/// warnings are only logged.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn reject(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn caution(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }

    /// First error as a [`ConfigError`], otherwise the warnings.
    pub fn into_result(self) -> Result<Vec<ValidationIssue>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(issue) => Err(ConfigError::InvalidValue {
                field: issue.field,
                message: issue.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();
        Self::check_store(config, &mut result);
        Self::check_search(config, &mut result);
        Self::check_embedding(config, &mut result);
        result
    }

    fn check_store(config: &Config, result: &mut ValidationResult) {
        if config.store.embedding_dimension == 0 {
            result.reject(
                "store.embedding_dimension",
                "embedding_dimension must be greater than 0",
            );
        }

        if config.store.path.as_os_str().is_empty() {
            result.reject("store.path", "store path is empty");
        }

        if !config.store.full_text {
            result.caution(
                "store.full_text",
                "full-text index disabled, keyword search will return no results",
            );
        }
    }

    fn check_search(config: &Config, result: &mut ValidationResult) {
        let search = &config.search;

        for (field, weight) in [
            ("search.vector_weight", search.vector_weight),
            ("search.keyword_weight", search.keyword_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                result.reject(field, "weight must be finite and non-negative");
            }
        }

        let sum = search.vector_weight + search.keyword_weight;
        if sum.is_finite() && (sum - 1.0).abs() > 1e-3 {
            result.caution(
                "search",
                format!("vector_weight + keyword_weight = {sum}, fused scores leave [0, 1]"),
            );
        }

        for (field, threshold) in [
            ("search.vector_min_score", search.vector_min_score),
            ("search.hybrid_min_score", search.hybrid_min_score),
            ("search.hybrid_vector_min_score", search.hybrid_vector_min_score),
        ] {
            if !(-1.0..=1.0).contains(&threshold) {
                result.reject(field, "threshold must lie in [-1, 1]");
            }
        }

        for (field, limit) in [
            ("search.vector_limit", search.vector_limit),
            ("search.keyword_limit", search.keyword_limit),
            ("search.hybrid_limit", search.hybrid_limit),
        ] {
            if limit == 0 {
                result.reject(field, "limit must be at least 1");
            }
        }

        if search.overfetch_factor == 0 {
            result.reject("search.overfetch_factor", "overfetch_factor must be at least 1");
        }
    }

    fn check_embedding(config: &Config, result: &mut ValidationResult) {
        let embedding = &config.embedding;
        if embedding.provider != EmbeddingProviderKind::OpenAi {
            return;
        }

        if embedding.api_key.as_deref().is_none_or(str::is_empty) {
            result.reject("embedding.api_key", "the openai provider needs an API key");
        }

        if !embedding.base_url.starts_with("http://") && !embedding.base_url.starts_with("https://")
        {
            result.reject(
                "embedding.base_url",
                "base_url must start with http:// or https://",
            );
        }

        if embedding.timeout_secs == 0 {
            result.caution(
                "embedding.timeout_secs",
                "timeout_secs is 0, requests will fail immediately",
            );
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
