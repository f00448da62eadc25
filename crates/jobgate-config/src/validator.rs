//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{Config, StoreBackend};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_approval(config, &mut result);
        Self::validate_store(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    /// Validate and turn the first error into a `ConfigError`.
    pub fn ensure_valid(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = Self::validate(config);
        if result.errors.is_empty() {
            return Ok(result);
        }
        let first = result.errors.remove(0);
        Err(ConfigError::InvalidValue {
            field: first.path,
            message: first.message,
        })
    }

    fn validate_approval(config: &Config, result: &mut ValidationResult) {
        let approval = &config.approval;

        for (path, value) in [
            ("approval.approval_queue", &approval.approval_queue),
            ("approval.pending_bucket", &approval.pending_bucket),
            ("approval.default_queue", &approval.default_queue),
        ] {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "must not be empty"));
            }
        }

        // Approved jobs must leave the approval queue.
        if approval.default_queue == approval.approval_queue {
            result.add_error(ValidationError::new(
                "approval.default_queue",
                "must differ from approval.approval_queue",
            ));
        }

        let mut classes: Vec<&String> = approval.routes.keys().collect();
        classes.sort();
        for class in classes {
            let queue = &approval.routes[class];
            let path = format!("approval.routes.{}", class);
            if queue.trim().is_empty() {
                result.add_error(ValidationError::new(path, "queue must not be empty"));
            } else if *queue == approval.approval_queue {
                result.add_error(ValidationError::new(
                    path,
                    "must not route to the approval queue",
                ));
            }
        }

        if !approval.delayed_enabled {
            result.add_warning(ValidationWarning::new(
                "approval.delayed_enabled",
                "approval timeouts will never release jobs",
            ));
        }
    }

    fn validate_store(config: &Config, result: &mut ValidationResult) {
        match config.store.backend {
            StoreBackend::Memory => {
                result.add_warning(ValidationWarning::new(
                    "store.backend",
                    "memory backend loses pending jobs on exit",
                ));
            }
            StoreBackend::File => {
                if config.store.path.as_os_str().is_empty() {
                    result.add_error(ValidationError::new("store.path", "must not be empty"));
                }
            }
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.trim().to_ascii_lowercase();
        // Full filter directives (e.g. "jobgate=debug") are passed through as-is.
        if !level.contains('=') && !LOG_LEVELS.contains(&level.as_str()) {
            result.add_warning(ValidationWarning::new(
                "logging.level",
                format!("unknown level '{}', falling back to info", config.logging.level),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
