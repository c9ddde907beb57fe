//! Prompt backend rendering workflow steps with cliclack

use crate::config::StepKind;
use crate::error::{Error, Result};
use crate::prompts::{PromptBackend, Question};
use serde_json::Value;

/// Interactive terminal prompts
#[derive(Debug, Default, Clone, Copy)]
pub struct ClackPrompts;

/// Esc and Ctrl+C surface from cliclack as `Interrupted`
fn prompt_err(e: std::io::Error) -> Error {
    match e.kind() {
        std::io::ErrorKind::Interrupted => Error::Cancelled,
        _ => Error::Prompt(e.to_string()),
    }
}

impl PromptBackend for ClackPrompts {
    fn ask(&mut self, question: &Question<'_>) -> Result<Value> {
        match question.kind {
            StepKind::List => select(question),
            StepKind::Checkbox => multiselect(question),
            StepKind::Confirm => {
                let initial = question.default.and_then(Value::as_bool).unwrap_or(false);
                let answer: bool = cliclack::confirm(question.message)
                    .initial_value(initial)
                    .interact()
                    .map_err(prompt_err)?;
                Ok(Value::Bool(answer))
            }
            StepKind::Input => text(question, false),
            StepKind::Password => text(question, true),
        }
    }
}

fn select(question: &Question<'_>) -> Result<Value> {
    // Values are JSON, so items are keyed by index
    let mut select = cliclack::select(question.message);
    for (idx, choice) in question.choices.iter().enumerate() {
        select = select.item(idx, &choice.name, choice.description.as_deref().unwrap_or(""));
    }
    if let Some(idx) = question
        .default
        .and_then(|d| question.choices.iter().position(|c| &c.value == d))
    {
        select = select.initial_value(idx);
    }
    if let Some(rows) = question.page_size {
        select = select.max_rows(rows as usize);
    }

    loop {
        let idx: usize = select.interact().map_err(prompt_err)?;
        let value = question.choices[idx].value.clone();
        match question.check(&value) {
            Ok(()) => return Ok(value),
            Err(message) => cliclack::log::error(message).map_err(prompt_err)?,
        }
    }
}

fn multiselect(question: &Question<'_>) -> Result<Value> {
    let mut multi = cliclack::multiselect(question.message);
    for (idx, choice) in question.choices.iter().enumerate() {
        multi = multi.item(idx, &choice.name, choice.description.as_deref().unwrap_or(""));
    }
    if let Some(Value::Array(defaults)) = question.default {
        let initial: Vec<usize> = question
            .choices
            .iter()
            .enumerate()
            .filter(|(_, c)| defaults.contains(&c.value))
            .map(|(idx, _)| idx)
            .collect();
        multi = multi.initial_values(initial);
    }
    if let Some(rows) = question.page_size {
        multi = multi.max_rows(rows as usize);
    }
    multi = multi.required(false);

    loop {
        let picked: Vec<usize> = multi.interact().map_err(prompt_err)?;
        let value = Value::Array(
            picked
                .into_iter()
                .map(|idx| question.choices[idx].value.clone())
                .collect(),
        );
        match question.check(&value) {
            Ok(()) => return Ok(value),
            Err(message) => cliclack::log::error(message).map_err(prompt_err)?,
        }
    }
}

fn text(question: &Question<'_>, masked: bool) -> Result<Value> {
    let answer: String = if masked {
        let mut prompt = cliclack::password(question.message).mask('▪');
        if let Some(check) = question.checker() {
            prompt = prompt.validate(move |input: &String| check(&Value::String(input.clone())));
        }
        prompt.interact().map_err(prompt_err)?
    } else {
        // Emptiness is decided by the step's own validators
        let mut prompt = cliclack::input(question.message).required(false);
        if let Some(default) = question.default {
            let default = match default {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            prompt = prompt.default_input(&default).placeholder(&default);
        }
        if let Some(check) = question.checker() {
            prompt = prompt.validate(move |input: &String| check(&Value::String(input.clone())));
        }
        prompt.interact().map_err(prompt_err)?
    };
    Ok(Value::String(answer))
}
