//! Named prompt functions referenced from workflow documents
//!
//! Steps are data, so they refer to behavior by name. The registry maps those
//! names to functions; it is populated with built-ins and can be extended
//! before a workflow is validated.

use super::PromptAnswers;
use crate::config::PromptStep;
use crate::error::FieldError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Checks an answer; `Err` carries the message shown to the user
pub type ValidateFn = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Decides from previous answers whether a step runs
pub type ConditionFn = Arc<dyn Fn(&PromptAnswers) -> bool + Send + Sync>;

/// Transforms an answer before it is validated and recorded
pub type FilterFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Name -> function tables for `validate`, `when` and `filter`
#[derive(Clone)]
pub struct FunctionRegistry {
    validators: BTreeMap<String, ValidateFn>,
    conditions: BTreeMap<String, ConditionFn>,
    filters: BTreeMap<String, FilterFn>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_builtins();
        registry
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("validators", &self.validator_names())
            .field("conditions", &self.condition_names())
            .field("filters", &self.filter_names())
            .finish()
    }
}

impl FunctionRegistry {
    /// A registry without built-ins
    pub fn empty() -> Self {
        Self {
            validators: BTreeMap::new(),
            conditions: BTreeMap::new(),
            filters: BTreeMap::new(),
        }
    }

    fn register_builtins(&mut self) {
        self.register_validator("required", required);
        self.register_validator("isValidProjectName", is_valid_project_name);
        self.register_validator("minLength3", min_length(3));

        self.register_condition("hasTypeScript", |a: &PromptAnswers| is_true(a, "typescript"));
        self.register_condition("hasESBuild", |a: &PromptAnswers| is_true(a, "esbuild"));
        self.register_condition("hasDatabase", |a: &PromptAnswers| {
            a.get("features")
                .and_then(Value::as_array)
                .is_some_and(|features| features.iter().any(|f| f == "database"))
        });
        self.register_condition("isExpressTemplate", |a: &PromptAnswers| {
            matches!(
                a.get("template").and_then(Value::as_str),
                Some("express-hbs") | Some("express-api")
            )
        });

        self.register_filter("trim", |v| map_str(v, |s| s.trim().to_string()));
        self.register_filter("toLowerCase", |v| map_str(v, |s| s.to_lowercase()));
        self.register_filter("toKebabCase", |v| map_str(v, to_kebab_case));
    }

    pub fn register_validator<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(f));
    }

    pub fn register_condition<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&PromptAnswers) -> bool + Send + Sync + 'static,
    {
        self.conditions.insert(name.into(), Arc::new(f));
    }

    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(f));
    }

    pub fn validator(&self, name: &str) -> Option<ValidateFn> {
        self.validators.get(name).cloned()
    }

    pub fn condition(&self, name: &str) -> Option<ConditionFn> {
        self.conditions.get(name).cloned()
    }

    pub fn filter(&self, name: &str) -> Option<FilterFn> {
        self.filters.get(name).cloned()
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.keys().map(String::as_str).collect()
    }

    pub fn condition_names(&self) -> Vec<&str> {
        self.conditions.keys().map(String::as_str).collect()
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.keys().map(String::as_str).collect()
    }

    /// Unresolvable function references of a step, reported under `path`
    pub fn check_references(&self, step: &PromptStep, path: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(name) = &step.validate {
            if !self.validators.contains_key(name) {
                errors.push(FieldError::new(
                    format!("{}.validate", path),
                    format!("Validation function \"{}\" not found", name),
                ));
            }
        }
        if let Some(name) = &step.when {
            if !self.conditions.contains_key(name) {
                errors.push(FieldError::new(
                    format!("{}.when", path),
                    format!("Condition function \"{}\" not found", name),
                ));
            }
        }
        if let Some(name) = &step.filter {
            if !self.filters.contains_key(name) {
                errors.push(FieldError::new(
                    format!("{}.filter", path),
                    format!("Filter function \"{}\" not found", name),
                ));
            }
        }
        errors
    }
}

/// Validator factory: strings shorter than `min` characters are rejected
pub fn min_length(min: usize) -> impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static {
    move |value: &Value| match value.as_str() {
        Some(s) if s.chars().count() < min => Err(format!("Minimum length is {} characters", min)),
        _ => Ok(()),
    }
}

fn required(value: &Value) -> Result<(), String> {
    let missing = match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if missing {
        Err("This field is required".to_string())
    } else {
        Ok(())
    }
}

fn is_valid_project_name(value: &Value) -> Result<(), String> {
    let valid = value.as_str().is_some_and(|s| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });
    if valid {
        Ok(())
    } else {
        Err("Project name can only contain letters, numbers, hyphens, and underscores".to_string())
    }
}

fn is_true(answers: &PromptAnswers, key: &str) -> bool {
    answers.get(key) == Some(&Value::Bool(true))
}

fn map_str(value: Value, f: impl Fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

fn to_kebab_case(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_validators() {
        let registry = FunctionRegistry::default();
        let required = registry.validator("required").unwrap();
        assert!(required(&json!("")).is_err());
        assert!(required(&json!("   ")).is_err());
        assert!(required(&Value::Null).is_err());
        assert!(required(&json!("x")).is_ok());

        let name = registry.validator("isValidProjectName").unwrap();
        assert!(name(&json!("my-app_2")).is_ok());
        assert!(name(&json!("My-App")).is_ok());
        assert!(name(&json!("my app")).is_err());
        assert!(name(&json!("app!")).is_err());

        let min3 = registry.validator("minLength3").unwrap();
        assert!(min3(&json!("ab")).is_err());
        assert!(min3(&json!("abc")).is_ok());
    }

    #[test]
    fn test_builtin_conditions() {
        let registry = FunctionRegistry::default();
        let mut answers = PromptAnswers::new();
        let has_ts = registry.condition("hasTypeScript").unwrap();
        assert!(!has_ts(&answers));
        answers.insert("typescript".to_string(), json!(true));
        assert!(has_ts(&answers));

        let has_db = registry.condition("hasDatabase").unwrap();
        answers.insert("features".to_string(), json!(["auth", "database"]));
        assert!(has_db(&answers));

        let express = registry.condition("isExpressTemplate").unwrap();
        answers.insert("template".to_string(), json!("express-api"));
        assert!(express(&answers));
        answers.insert("template".to_string(), json!("node-cli"));
        assert!(!express(&answers));
    }

    #[test]
    fn test_builtin_filters() {
        let registry = FunctionRegistry::default();
        let kebab = registry.filter("toKebabCase").unwrap();
        assert_eq!(kebab(json!("My  Cool App")), json!("my-cool-app"));
        let trim = registry.filter("trim").unwrap();
        assert_eq!(trim(json!("  x ")), json!("x"));
        assert_eq!(trim(json!(true)), json!(true));
    }

    #[test]
    fn test_runtime_registration() {
        let mut registry = FunctionRegistry::default();
        assert!(registry.validator("isEven").is_none());
        registry.register_validator("isEven", |v: &Value| match v.as_i64() {
            Some(n) if n % 2 == 0 => Ok(()),
            _ => Err("must be even".to_string()),
        });
        assert!(registry.validator_names().contains(&"isEven"));
        assert!(registry.validator("isEven").unwrap()(&json!(4)).is_ok());
    }

    #[test]
    fn test_check_references() {
        let registry = FunctionRegistry::default();
        let mut step = PromptStep::new(crate::config::StepKind::Input, "name", "Name?");
        step.validate = Some("required".to_string());
        step.filter = Some("nope".to_string());
        let errors = registry.check_references(&step, "steps.0");
        assert_eq!(errors, vec![FieldError::new("steps.0.filter", "Filter function \"nope\" not found")]);
    }
}
