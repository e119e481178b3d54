//! Syntax checks for editor content, chosen by file extension

use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    pub message: String,
}

impl ValidationReport {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Check that `content` parses as the format implied by `path`.
///
/// Never fails; problems are reported in the returned value.
pub fn validate(path: &str, content: &str) -> ValidationReport {
    let ext = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let parsed: Result<&str, String> = match ext.as_str() {
        "json" => serde_json::from_str::<serde_json::Value>(content)
            .map(|_| "Valid JSON")
            .map_err(|e| e.to_string()),
        "toml" => toml::from_str::<toml::Value>(content)
            .map(|_| "Valid TOML")
            .map_err(|e| e.to_string()),
        "yaml" | "yml" => serde_yaml::from_str::<serde_yaml::Value>(content)
            .map(|_| "Valid YAML")
            .map_err(|e| e.to_string()),
        "md" | "css" => {
            if content.trim().is_empty() {
                return ValidationReport::fail("Content is empty");
            }
            Ok(if ext == "md" {
                "Markdown looks fine"
            } else {
                "CSS looks fine"
            })
        }
        _ => {
            if content.trim().is_empty() {
                return ValidationReport::fail("Content is empty");
            }
            return ValidationReport::fail("Validation is not supported for this file type");
        }
    };

    match parsed {
        Ok(message) => ValidationReport::ok(message),
        Err(e) => ValidationReport::fail(format!("Validation error: {}", e)),
    }
}
