//! Template catalog lookups and choice rendering

use super::{Choice, TemplateConfig, TemplateDisplay, TemplateOption, TemplatesConfig};
use serde_json::Value;

/// Marker prepended to experimental templates
pub const EXPERIMENTAL_MARKER: &str = "🧪 ";

/// Find a template by display name or locator
pub fn find_template<'a>(templates: &'a TemplatesConfig, name: &str) -> Option<&'a TemplateConfig> {
    templates
        .templates
        .iter()
        .find(|t| t.name == name || t.path == name)
}

/// Templates supporting every option in `required`
pub fn filter_templates_by_options<'a>(
    templates: &'a TemplatesConfig,
    required: &[TemplateOption],
) -> Vec<&'a TemplateConfig> {
    templates
        .templates
        .iter()
        .filter(|t| required.iter().all(|o| t.has_option(*o)))
        .collect()
}

/// Choices for the template step: deprecated entries dropped, highest priority
/// first (ties keep catalog order), values are template locators
pub fn template_choices(templates: &TemplatesConfig, display: &TemplateDisplay) -> Vec<Choice> {
    let mut entries: Vec<&TemplateConfig> =
        templates.templates.iter().filter(|t| !t.deprecated).collect();
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));

    entries
        .into_iter()
        .map(|t| Choice {
            name: choice_label(t, display),
            value: Value::String(t.path.clone()),
            description: t.description.clone().filter(|_| display.show_description),
        })
        .collect()
}

fn choice_label(template: &TemplateConfig, display: &TemplateDisplay) -> String {
    let mut label = String::new();
    if display.show_category {
        if let Some(category) = &template.category {
            label.push_str(&format!("[{}] ", category.to_uppercase()));
        }
    }
    if template.experimental {
        label.push_str(EXPERIMENTAL_MARKER);
    }
    label.push_str(&template.name);

    if display.show_options && !template.options.is_empty() {
        let summary = template
            .options
            .iter()
            .map(|o| o.display_name())
            .collect::<Vec<_>>()
            .join(" + ");
        label.push_str(&format!(" ({})", summary));
    }

    truncate(label, display.max_width)
}

fn truncate(label: String, max_width: usize) -> String {
    if max_width == 0 || label.chars().count() <= max_width {
        return label;
    }
    let mut cut: String = label.chars().take(max_width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
