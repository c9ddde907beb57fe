//! Runs declarative workflow steps as interactive prompts

use super::registry::{ConditionFn, FilterFn, FunctionRegistry, ValidateFn};
use super::PromptAnswers;
use crate::config::{
    template_choices, Choice, PromptStep, StepKind, TemplatesConfig, WorkflowConfig,
};
use crate::error::{Error, FieldError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Answer key whose choices come from the templates catalog
pub const TEMPLATE_STEP: &str = "template";

/// Filter-then-validate check attached to a question
pub type CheckFn = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// A fully resolved prompt handed to a backend
pub struct Question<'a> {
    pub kind: StepKind,
    pub name: &'a str,
    pub message: &'a str,
    /// Empty for non-choice kinds
    pub choices: Vec<Choice>,
    pub default: Option<&'a Value>,
    pub page_size: Option<u32>,
    pub loop_choices: Option<bool>,
    check: Option<CheckFn>,
}

impl Question<'_> {
    /// Run the step's filter and validator against a candidate answer
    pub fn check(&self, value: &Value) -> std::result::Result<(), String> {
        match &self.check {
            Some(check) => check(value),
            None => Ok(()),
        }
    }

    /// Shareable handle on the check, for backends that validate while typing
    pub fn checker(&self) -> Option<CheckFn> {
        self.check.clone()
    }
}

/// Interactive prompt backend: asks one question and returns the raw answer
///
/// List answers are the selected choice's value, checkbox answers an array of
/// values, confirm answers a bool, input/password answers a string.
pub trait PromptBackend {
    fn ask(&mut self, question: &Question<'_>) -> Result<Value>;
}

/// A step with its named functions resolved
struct CompiledStep<'w> {
    step: &'w PromptStep,
    validate: Vec<ValidateFn>,
    when: Option<ConditionFn>,
    filter: Option<FilterFn>,
}

/// Executes workflow steps against a prompt backend
pub struct PromptEngine<'a> {
    registry: &'a FunctionRegistry,
    templates: Option<&'a TemplatesConfig>,
}

impl<'a> PromptEngine<'a> {
    pub fn new(registry: &'a FunctionRegistry) -> Self {
        Self {
            registry,
            templates: None,
        }
    }

    /// Use a templates catalog for the choices of the `template` step
    pub fn with_templates(mut self, templates: &'a TemplatesConfig) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Run every step in order, returning the answers of the steps that ran
    pub fn run(&self, workflow: &WorkflowConfig, backend: &mut dyn PromptBackend) -> Result<PromptAnswers> {
        // Resolve every function reference before the first question is asked
        let compiled = workflow
            .steps
            .iter()
            .enumerate()
            .map(|(idx, step)| self.compile(step, &format!("steps.{}", idx)))
            .collect::<std::result::Result<Vec<_>, Vec<FieldError>>>()
            .map_err(|errors| Error::validation("workflow", errors))?;

        debug!("Starting workflow: {} ({} steps)", workflow.name, compiled.len());

        let mut answers = PromptAnswers::new();
        for step in &compiled {
            if let Some(answer) = self.execute(step, &answers, backend)? {
                answers.insert(step.step.name.clone(), answer);
            }
        }
        Ok(answers)
    }

    /// Run a single step against the answers collected so far
    /// Returns `None` when the step's condition skips it
    pub fn run_step(
        &self,
        step: &PromptStep,
        answers: &PromptAnswers,
        backend: &mut dyn PromptBackend,
    ) -> Result<Option<Value>> {
        let compiled = self
            .compile(step, &step.name)
            .map_err(|errors| Error::validation("workflow", errors))?;
        self.execute(&compiled, answers, backend)
    }

    fn compile<'w>(
        &self,
        step: &'w PromptStep,
        path: &str,
    ) -> std::result::Result<CompiledStep<'w>, Vec<FieldError>> {
        let errors = self.registry.check_references(step, path);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut validate = Vec::new();
        if step.required {
            validate.extend(self.registry.validator("required"));
        }
        if let Some(name) = &step.validate {
            validate.extend(self.registry.validator(name));
        }

        Ok(CompiledStep {
            step,
            validate,
            when: step.when.as_deref().and_then(|n| self.registry.condition(n)),
            filter: step.filter.as_deref().and_then(|n| self.registry.filter(n)),
        })
    }

    fn execute(
        &self,
        compiled: &CompiledStep<'_>,
        answers: &PromptAnswers,
        backend: &mut dyn PromptBackend,
    ) -> Result<Option<Value>> {
        let step = compiled.step;

        if let Some(when) = &compiled.when {
            if !when(answers) {
                debug!("Skipping step '{}': condition is false", step.name);
                return Ok(None);
            }
        }

        let choices = self.resolve_choices(step)?;

        // Validators see the filtered answer
        let check = (!compiled.validate.is_empty()).then(|| {
            let validate = compiled.validate.clone();
            let filter = compiled.filter.clone();
            Arc::new(move |value: &Value| {
                let value = match &filter {
                    Some(filter) => filter(value.clone()),
                    None => value.clone(),
                };
                validate.iter().try_for_each(|v| v(&value))
            }) as CheckFn
        });

        let question = Question {
            kind: step.kind,
            name: &step.name,
            message: &step.message,
            choices,
            default: step.default.as_ref(),
            page_size: step.page_size,
            loop_choices: step.loop_choices,
            check,
        };

        let answer = backend.ask(&question)?;
        let answer = match &compiled.filter {
            Some(filter) => filter(answer),
            None => answer,
        };
        Ok(Some(answer))
    }

    /// Catalog choices for the `template` step win over static ones
    fn resolve_choices(&self, step: &PromptStep) -> Result<Vec<Choice>> {
        if !step.kind.needs_choices() {
            return Ok(Vec::new());
        }

        let choices = match (step.name == TEMPLATE_STEP, self.templates) {
            (true, Some(templates)) => {
                let display = step.template_display.clone().unwrap_or_default();
                let choices = template_choices(templates, &display);
                debug!(
                    "Template choices: {} of {} catalog entries",
                    choices.len(),
                    templates.templates.len()
                );
                choices
            }
            _ => step.choices.clone().unwrap_or_default(),
        };

        if choices.is_empty() {
            return Err(Error::ChoicesRequired {
                step: step.name.clone(),
            });
        }
        Ok(choices)
    }
}
