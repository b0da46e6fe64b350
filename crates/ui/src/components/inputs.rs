//! # Input Components
//!
//! Form inputs used by the entity dialog:
//! - **TextInput**: single-line text, optionally masked
//! - **TextArea**: multi-line text
//! - **Select**: dropdown selection
//! - **Checkbox**: boolean checkbox
//!
//! Every input renders its label, help link, display text and inline
//! error the same way through [`FieldFrame`].

use confdesk_schema::HelpLink;
use dioxus::prelude::*;

// ============================================================================
// Field Frame
// ============================================================================

/// Properties shared by every input's frame
#[derive(Props, Clone, PartialEq)]
pub struct FieldFrameProps {
    /// Id of the input the label points at
    pub input_id: String,

    pub label: String,

    #[props(default = false)]
    pub required: bool,

    #[props(default)]
    pub help_link: Option<HelpLink>,

    /// Help text shown below the input
    #[props(default)]
    pub help_text: Option<String>,

    /// Inline validation message for this field
    #[props(default)]
    pub error: Option<String>,

    pub children: Element,
}

/// Label, input, then help or error line
#[component]
pub fn FieldFrame(props: FieldFrameProps) -> Element {
    rsx! {
        div {
            class: "input-group mb-4",

            label {
                class: "block text-sm font-medium text-slate-300 mb-1.5",
                r#for: "{props.input_id}",
                "{props.label}"
                if props.required {
                    span { class: "text-rose-400 ml-0.5", "*" }
                }
            }

            {props.children}

            if let Some(error) = &props.error {
                p {
                    class: "mt-1 text-xs text-rose-400",
                    "{error}"
                }
            } else if let Some(help) = &props.help_text {
                p {
                    class: "mt-1 text-xs text-slate-500",
                    "{help}"
                }
            }

            if let Some(link) = &props.help_link {
                a {
                    class: "mt-1 text-xs text-indigo-400 hover:underline",
                    href: "{link.link}",
                    target: "_blank",
                    "{link.text}"
                }
            }
        }
    }
}

// ============================================================================
// Text Input Component
// ============================================================================

/// Text input props
#[derive(Props, Clone, PartialEq)]
pub struct TextInputProps {
    pub id: String,

    pub value: String,

    #[props(default)]
    pub placeholder: Option<String>,

    #[props(default = false)]
    pub error: bool,

    #[props(default = false)]
    pub disabled: bool,

    #[props(default = false)]
    pub readonly: bool,

    /// Masked input preceded by a hidden shadow password input
    #[props(default)]
    pub shadow_password_id: Option<String>,

    #[props(default)]
    pub on_change: EventHandler<String>,
}

/// Single-line text control, masked for encrypted fields
#[component]
pub fn TextInput(props: TextInputProps) -> Element {
    let input_class = build_input_class(props.error, props.disabled || props.readonly);
    let input_type = if props.shadow_password_id.is_some() {
        "password"
    } else {
        "text"
    };

    rsx! {
        // Browsers autofill the first password input they find
        if let Some(shadow) = &props.shadow_password_id {
            input {
                r#type: "password",
                id: "{shadow}",
                style: "display: none;",
                tabindex: "-1",
                autocomplete: "off",
            }
        }

        input {
            class: "{input_class}",
            id: "{props.id}",
            r#type: "{input_type}",
            value: "{props.value}",
            placeholder: props.placeholder.as_deref().unwrap_or(""),
            disabled: props.disabled,
            readonly: props.readonly,
            autocomplete: if props.shadow_password_id.is_some() { "new-password" } else { "off" },
            oninput: move |e| props.on_change.call(e.value()),
        }
    }
}

// ============================================================================
// Text Area Component
// ============================================================================

/// Text area props
#[derive(Props, Clone, PartialEq)]
pub struct TextAreaProps {
    pub id: String,

    pub value: String,

    #[props(default = 3)]
    pub rows: usize,

    #[props(default = false)]
    pub error: bool,

    #[props(default = false)]
    pub disabled: bool,

    #[props(default)]
    pub on_change: EventHandler<String>,
}

/// Multi-line text control
#[component]
pub fn TextArea(props: TextAreaProps) -> Element {
    let textarea_class = format!("{} resize-y", build_input_class(props.error, props.disabled));

    rsx! {
        textarea {
            class: "{textarea_class}",
            id: "{props.id}",
            rows: "{props.rows}",
            disabled: props.disabled,
            oninput: move |e| props.on_change.call(e.value()),
            "{props.value}"
        }
    }
}

// ============================================================================
// Select Component
// ============================================================================

/// Option for Select component
#[derive(Clone, PartialEq, Debug)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Select props
#[derive(Props, Clone, PartialEq)]
pub struct SelectProps {
    pub id: String,

    /// Selected value
    pub value: String,

    pub options: Vec<SelectOption>,

    /// Allow picking several values (joined with `|`)
    #[props(default = false)]
    pub multiple: bool,

    #[props(default = false)]
    pub error: bool,

    #[props(default = false)]
    pub disabled: bool,

    #[props(default)]
    pub on_change: EventHandler<String>,
}

/// Select bound to a field with `options.items`
#[component]
pub fn Select(props: SelectProps) -> Element {
    let select_class = build_input_class(props.error, props.disabled);
    let selected: Vec<&str> = if props.multiple {
        props.value.split('|').collect()
    } else {
        vec![props.value.as_str()]
    };

    rsx! {
        select {
            class: "{select_class}",
            id: "{props.id}",
            multiple: props.multiple,
            disabled: props.disabled,
            onchange: move |e| props.on_change.call(e.value()),

            if !props.multiple {
                option {
                    value: "",
                    selected: props.value.is_empty(),
                    "Select a value"
                }
            }

            for option in &props.options {
                option {
                    key: "{option.value}",
                    value: "{option.value}",
                    selected: selected.contains(&option.value.as_str()),
                    "{option.label}"
                }
            }
        }
    }
}

// ============================================================================
// Checkbox Component
// ============================================================================

/// Checkbox props
#[derive(Props, Clone, PartialEq)]
pub struct CheckboxProps {
    pub id: String,

    pub checked: bool,

    #[props(default = false)]
    pub disabled: bool,

    #[props(default)]
    pub on_change: EventHandler<bool>,
}

/// Boolean checkbox component
#[component]
pub fn Checkbox(props: CheckboxProps) -> Element {
    rsx! {
        input {
            class: "h-4 w-4 rounded border-slate-600 bg-slate-800 text-indigo-500",
            class: if props.disabled { "opacity-50 cursor-not-allowed" } else { "cursor-pointer" },
            id: "{props.id}",
            r#type: "checkbox",
            checked: props.checked,
            disabled: props.disabled,
            onchange: move |_| {
                if !props.disabled {
                    props.on_change.call(!props.checked);
                }
            },
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_input_class(has_error: bool, disabled: bool) -> String {
    let mut classes = vec![
        "w-full",
        "px-3",
        "py-2",
        "bg-slate-800",
        "border",
        "rounded-lg",
        "text-sm",
        "text-slate-100",
        "placeholder-slate-500",
        "transition-colors",
        "focus:outline-none",
        "focus:ring-2",
    ];

    if has_error {
        classes.push("border-rose-500");
        classes.push("focus:ring-rose-500/30");
    } else {
        classes.push("border-slate-700");
        classes.push("focus:ring-indigo-500/30");
    }

    if disabled {
        classes.push("opacity-50");
        classes.push("cursor-not-allowed");
    }

    classes.join(" ")
}
