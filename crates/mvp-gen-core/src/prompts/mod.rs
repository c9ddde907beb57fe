//! Declarative prompt workflows
//!
//! - `registry`: named validate/when/filter functions
//! - `engine`: runs workflow steps against a [`PromptBackend`]
//! - `post_process`: custom scripts run after generation

pub mod engine;
pub mod post_process;
pub mod registry;

use serde_json::Value;
use std::collections::BTreeMap;

/// Step name -> answer, accumulated across one workflow run
pub type PromptAnswers = BTreeMap<String, Value>;

pub use engine::{CheckFn, PromptBackend, PromptEngine, Question, TEMPLATE_STEP};
pub use post_process::{answer_env, run_post_process};
pub use registry::{min_length, ConditionFn, FilterFn, FunctionRegistry, ValidateFn};
