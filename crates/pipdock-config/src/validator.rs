//! Configuration validation.

use pipdock_protocols::PositionPreset;
use url::Url;

use crate::error::ConfigError;
use crate::schema::Config;

/// Popup width range accepted by placement; values outside it get clamped.
const WIDTH_RANGE: (u32, u32) = (200, 2000);
const HEIGHT_RANGE: (u32, u32) = (150, 1500);

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
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_popup(config, &mut result);
        Self::validate_bridge(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_browser(config: &Config, result: &mut ValidationResult) {
        match Url::parse(&config.browser.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https" | "ws" | "wss") => {}
            Ok(url) => result.add_error(ValidationError::new(
                "browser.endpoint",
                format!("Unsupported scheme '{}', expected http(s) or ws(s)", url.scheme()),
            )),
            Err(e) => result.add_error(ValidationError::new(
                "browser.endpoint",
                format!("Invalid endpoint URL: {}", e),
            )),
        }

        if config.browser.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "browser.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_popup(config: &Config, result: &mut ValidationResult) {
        let popup = &config.popup;

        if !(0.0..=1.0).contains(&popup.volume) {
            result.add_error(ValidationError::new(
                "popup.volume",
                format!("Volume {} is outside [0, 1]", popup.volume),
            ));
        }

        if popup.position.parse::<PositionPreset>().is_err() {
            result.add_error(ValidationError::new(
                "popup.position",
                format!(
                    "Unknown position '{}', valid values: {:?}",
                    popup.position,
                    PositionPreset::ALL.map(|p| p.as_str())
                ),
            ));
        }

        if popup.width < WIDTH_RANGE.0 || popup.width > WIDTH_RANGE.1 {
            result.add_warning(ValidationWarning::new(
                "popup.width",
                format!(
                    "Width {} will be clamped to [{}, {}]",
                    popup.width, WIDTH_RANGE.0, WIDTH_RANGE.1
                ),
            ));
        }

        if popup.height < HEIGHT_RANGE.0 || popup.height > HEIGHT_RANGE.1 {
            result.add_warning(ValidationWarning::new(
                "popup.height",
                format!(
                    "Height {} will be clamped to [{}, {}]",
                    popup.height, HEIGHT_RANGE.0, HEIGHT_RANGE.1
                ),
            ));
        }

        if popup.load_timeout_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "popup.load_timeout_ms",
                "load_timeout_ms is 0, injection will not wait for the page to load",
            ));
        }
    }

    fn validate_bridge(config: &Config, result: &mut ValidationResult) {
        if config.bridge.ready_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "bridge.ready_timeout_ms",
                "ready_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        if config.logging.max_files == 0 {
            result.add_warning(ValidationWarning::new(
                "logging.max_files",
                "max_files is 0, old log files will never be removed",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
