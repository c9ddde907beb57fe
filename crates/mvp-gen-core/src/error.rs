//! Error types for mvp-gen-core

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using mvp-gen-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level problem found while validating a configuration document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the offending field (`templates.0.priority`), empty for the root
    pub path: String,
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

fn render_list<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_hint(hint: &Option<String>) -> String {
    hint.as_deref()
        .map(|h| format!("\n{}", h))
        .unwrap_or_default()
}

fn render_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Scaffolding error types
#[derive(Error, Debug)]
pub enum Error {
    /// No configuration document could be located
    #[error("{kind} configuration not found: {location}")]
    ConfigNotFound { kind: &'static str, location: String },

    /// Document text is not valid YAML/JSON
    #[error("Failed to parse {kind} configuration from {location}: {message}")]
    ConfigParseFailed {
        kind: &'static str,
        location: String,
        message: String,
    },

    /// Document parsed but does not match its schema
    #[error("Invalid {kind} configuration:\n{}", render_list(.errors))]
    ConfigValidationFailed {
        kind: &'static str,
        errors: Vec<FieldError>,
    },

    /// Template could not be found in any attempted location
    #[error("Template \"{template}\" not found. Tried:\n{}", render_list(.attempted))]
    TemplateNotFound {
        template: String,
        attempted: Vec<String>,
    },

    /// Remote content could not be fetched
    #[error("Failed to fetch {url}: {message}")]
    RemoteFetchFailed { url: String, message: String },

    /// Cloning the template repository failed
    #[error("Failed to clone repository {url}: {message}{}", render_hint(.hint))]
    RepositoryCheckoutFailed {
        url: String,
        message: String,
        hint: Option<String>,
    },

    /// Target directory exists and contains files outside the allow-list
    #[error("Current directory is not empty! Found files: {}\nPlease use an empty directory or specify a new project name.", .files.join(", "))]
    DirectoryNotEmpty { files: Vec<String> },

    /// Target directory already exists
    #[error("Directory \"{}\" already exists!", .path.display())]
    DirectoryAlreadyExists { path: PathBuf },

    /// A post-processing script exited unsuccessfully
    #[error("Script failed: {script} (exit code {})", render_code(.code))]
    PostProcessScriptFailed { script: String, code: Option<i32> },

    /// A choice-type prompt step has no choices to offer
    #[error("Template step requires choices: step \"{step}\" has neither templates configuration nor static choices")]
    ChoicesRequired { step: String },

    /// Interactive prompt failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// The user cancelled an interactive prompt
    #[error("Operation cancelled")]
    Cancelled,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive error
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    pub fn template_not_found(template: impl Into<String>, attempted: Vec<String>) -> Self {
        Self::TemplateNotFound {
            template: template.into(),
            attempted,
        }
    }

    pub fn validation(kind: &'static str, errors: Vec<FieldError>) -> Self {
        Self::ConfigValidationFailed { kind, errors }
    }

    /// Build a checkout failure, adding a credentials hint for SSH-style URLs
    pub fn checkout_failed(url: &str, message: impl Into<String>) -> Self {
        let hint = if url.starts_with("git@") || url.starts_with("ssh://") {
            Some(format!(
                "SSH access may not be configured for this host. Check your SSH keys or use the HTTPS URL instead: {}",
                crate::remote::to_https_url(url).unwrap_or_else(|| "https://<host>/<owner>/<repo>.git".to_string())
            ))
        } else {
            None
        };
        Self::RepositoryCheckoutFailed {
            url: url.to_string(),
            message: message.into(),
            hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_display() {
        assert_eq!(
            FieldError::new("templates.0.path", "must not be empty").to_string(),
            "templates.0.path: must not be empty"
        );
        assert_eq!(FieldError::new("", "bad").to_string(), "bad");
    }

    #[test]
    fn test_checkout_failed_ssh_hint() {
        let err = Error::checkout_failed("git@github.com:acme/templates.git", "denied");
        let msg = err.to_string();
        assert!(msg.contains("SSH"));
        assert!(msg.contains("https://github.com/acme/templates.git"));

        let err = Error::checkout_failed("https://github.com/acme/templates.git", "denied");
        assert!(!err.to_string().contains("SSH"));
    }

    #[test]
    fn test_template_not_found_lists_attempts() {
        let err = Error::template_not_found(
            "express-api",
            vec!["git: a".to_string(), "local: b".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.contains("express-api"));
        assert!(msg.contains("git: a"));
        assert!(msg.contains("local: b"));
    }
}
