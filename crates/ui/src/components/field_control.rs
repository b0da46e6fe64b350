//! Field Control
//!
//! Draws one [`ControlSpec`] with the input matching its control type and
//! turns what the user typed back into a draft value.

use confdesk_core::{Value, display_value};
use confdesk_schema::ControlType;
use dioxus::prelude::*;

use crate::components::inputs::{
    Checkbox, FieldFrame, Select, SelectOption, TextArea, TextInput,
};
use crate::render::ControlSpec;

#[derive(Props, Clone, PartialEq)]
pub struct FieldControlProps {
    pub spec: ControlSpec,

    /// Disables every input while a save is in flight
    #[props(default = false)]
    pub locked: bool,

    #[props(default)]
    pub on_change: EventHandler<(String, Value)>,
}

/// One dialog field
#[component]
pub fn FieldControl(props: FieldControlProps) -> Element {
    let spec = props.spec.clone();
    if !spec.visible {
        return rsx! {};
    }

    let disabled = props.locked || !spec.enabled;
    let has_error = spec.error.is_some();
    let field = spec.field.clone();
    let current = spec.value.clone();
    let on_change = props.on_change;

    let on_text = {
        let field = field.clone();
        let current = current.clone();
        move |text: String| on_change.call((field.clone(), parse_input(&current, text)))
    };

    let input = match spec.control {
        ControlType::Textarea => rsx! {
            TextArea {
                id: spec.element_id.clone(),
                value: display_value(&spec.value),
                error: has_error,
                disabled,
                on_change: on_text,
            }
        },
        ControlType::SingleSelect | ControlType::MultipleSelect | ControlType::Radio => rsx! {
            Select {
                id: spec.element_id.clone(),
                value: display_value(&spec.value),
                options: select_options(&spec),
                multiple: spec.control == ControlType::MultipleSelect,
                error: has_error,
                disabled,
                on_change: move |text: String| on_change.call((field.clone(), Value::String(text))),
            }
        },
        ControlType::Checkbox => rsx! {
            Checkbox {
                id: spec.element_id.clone(),
                checked: is_checked(&spec.value),
                disabled,
                on_change: move |checked: bool| {
                    on_change.call((field.clone(), Value::Bool(checked)))
                },
            }
        },
        _ => rsx! {
            TextInput {
                id: spec.element_id.clone(),
                value: display_value(&spec.value),
                placeholder: spec
                    .options
                    .get("placeholder")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                error: has_error,
                disabled,
                readonly: spec.readonly,
                shadow_password_id: spec.shadow_password_id.clone(),
                on_change: on_text,
            }
        },
    };

    rsx! {
        FieldFrame {
            input_id: spec.element_id.clone(),
            label: spec.label.clone(),
            required: spec.required,
            help_link: spec.help_link.clone(),
            help_text: spec.display_text.clone(),
            error: spec.error.clone(),
            {input}
        }
    }
}

/// Draft value for typed text, keeping numbers numeric
fn parse_input(current: &Value, text: String) -> Value {
    if current.is_number() {
        if let Ok(n) = text.trim().parse::<i64>() {
            return Value::from(n);
        }
        if let Some(n) = text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
        {
            return Value::Number(n);
        }
    }
    Value::String(text)
}

fn is_checked(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "true" | "True"),
        _ => false,
    }
}

/// Choices from the descriptor's `items` option
///
/// Items are either plain strings or `{value, label}` objects.
fn select_options(spec: &ControlSpec) -> Vec<SelectOption> {
    spec.options
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(SelectOption::new(s.clone(), s.clone())),
                    Value::Object(o) => {
                        let value = o.get("value").map(display_value)?;
                        let label = o
                            .get("label")
                            .map(display_value)
                            .unwrap_or_else(|| value.clone());
                        Some(SelectOption::new(value, label))
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use confdesk_core::Attributes;
    use serde_json::json;

    fn spec(options: Value) -> ControlSpec {
        ControlSpec {
            field: "mode".into(),
            label: "Mode".into(),
            control: ControlType::SingleSelect,
            element_id: "account-mode".into(),
            widget_id: "#account-mode".into(),
            value: Value::Null,
            password: false,
            shadow_password_id: None,
            display_text: None,
            help_link: None,
            required: false,
            readonly: false,
            visible: true,
            enabled: true,
            options: options.as_object().cloned().unwrap_or_else(Attributes::new),
            error: None,
        }
    }

    #[test]
    fn test_parse_input_keeps_numbers() {
        assert_eq!(parse_input(&json!(8089), "9000".into()), json!(9000));
        assert_eq!(parse_input(&json!(1.5), "2.5".into()), json!(2.5));
        assert_eq!(parse_input(&json!(1), "abc".into()), json!("abc"));
        assert_eq!(parse_input(&json!("x"), "42".into()), json!("42"));
    }

    #[test]
    fn test_is_checked() {
        assert!(is_checked(&json!(true)));
        assert!(is_checked(&json!("1")));
        assert!(!is_checked(&json!(0)));
        assert!(!is_checked(&Value::Null));
    }

    #[test]
    fn test_select_options() {
        let options = select_options(&spec(json!({
            "items": ["basic", {"value": "oauth", "label": "OAuth 2.0"}, 3]
        })));
        assert_eq!(
            options,
            vec![
                SelectOption::new("basic", "basic"),
                SelectOption::new("oauth", "OAuth 2.0"),
            ]
        );
        assert!(select_options(&spec(json!({}))).is_empty());
    }
}
