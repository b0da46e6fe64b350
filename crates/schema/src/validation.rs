//! Field validation for Confdesk
//!
//! Declarative constraints are compiled once, when a component is resolved,
//! into a [`ValidatorSet`] that checks a draft's attributes before they are
//! handed to persistence.

use crate::field::FieldDescriptor;
use confdesk_core::messages::{
    MSG_DATE, MSG_EMAIL, MSG_IPV4, MSG_MAX_LENGTH, MSG_MIN_LENGTH, MSG_NOT_A_NUMBER, MSG_PATTERN,
    MSG_RANGE, MSG_REQUIRED, MSG_URL,
};
use confdesk_core::{
    Attributes, DialogError, DialogResult, Value, display_value, formatted_message, is_blank,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const URL_PATTERN: &str = r"^(?:https?|ftp)://[^\s/?#]+[^\s]*$";

// ============================================================================
// Validation (declarative)
// ============================================================================

/// A declarative constraint as written in a field descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Validation {
    /// String length bounds
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// Numeric range, inclusive
    Number {
        range: [f64; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// Regular expression the value must match
    Regex {
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// Email address
    Email {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// Dotted-quad IPv4 address
    Ipv4 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// Absolute http(s)/ftp URL
    Url {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
    /// ISO 8601 date or date-time
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_msg: Option<String>,
    },
}

impl Validation {
    /// Create a string length constraint
    pub fn length(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Validation::String {
            min_length,
            max_length,
            error_msg: None,
        }
    }

    /// Create a numeric range constraint
    pub fn range(min: f64, max: f64) -> Self {
        Validation::Number {
            range: [min, max],
            error_msg: None,
        }
    }

    /// Create a regex constraint
    pub fn pattern(pattern: impl Into<String>, error_msg: Option<&str>) -> Self {
        Validation::Regex {
            pattern: pattern.into(),
            error_msg: error_msg.map(str::to_string),
        }
    }

    fn error_msg(&self) -> Option<&str> {
        match self {
            Validation::String { error_msg, .. }
            | Validation::Number { error_msg, .. }
            | Validation::Regex { error_msg, .. }
            | Validation::Email { error_msg }
            | Validation::Ipv4 { error_msg }
            | Validation::Url { error_msg }
            | Validation::Date { error_msg } => error_msg.as_deref(),
        }
    }
}

// ============================================================================
// Compiled rules
// ============================================================================

#[derive(Debug, Clone)]
enum Rule {
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    Range {
        min: f64,
        max: f64,
    },
    Pattern {
        regex: Regex,
        code: u32,
    },
    Ipv4,
    Date,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: Rule,
    error_msg: Option<String>,
}

impl CompiledRule {
    fn compile(field: &str, validation: &Validation) -> DialogResult<Self> {
        let rule = match validation {
            Validation::String {
                min_length,
                max_length,
                ..
            } => Rule::Length {
                min: *min_length,
                max: *max_length,
            },
            Validation::Number { range, .. } => Rule::Range {
                min: range[0],
                max: range[1],
            },
            Validation::Regex { pattern, .. } => Rule::Pattern {
                regex: compile_pattern(field, pattern)?,
                code: MSG_PATTERN,
            },
            Validation::Email { .. } => Rule::Pattern {
                regex: compile_pattern(field, EMAIL_PATTERN)?,
                code: MSG_EMAIL,
            },
            Validation::Url { .. } => Rule::Pattern {
                regex: compile_pattern(field, URL_PATTERN)?,
                code: MSG_URL,
            },
            Validation::Ipv4 { .. } => Rule::Ipv4,
            Validation::Date { .. } => Rule::Date,
        };

        Ok(Self {
            rule,
            error_msg: validation.error_msg().map(str::to_string),
        })
    }

    /// Check a non-blank value
    fn check(&self, label: &str, value: &Value) -> Option<ValidationError> {
        let text = display_value(value);
        let (code, message) = match &self.rule {
            Rule::Length { min, max } => {
                let len = text.chars().count();
                match (min, max) {
                    (Some(min), _) if len < *min => (
                        ValidationErrorCode::TooShort,
                        formatted_message(MSG_MIN_LENGTH, &[label, &min.to_string()]),
                    ),
                    (_, Some(max)) if len > *max => (
                        ValidationErrorCode::TooLong,
                        formatted_message(MSG_MAX_LENGTH, &[label, &max.to_string()]),
                    ),
                    _ => return None,
                }
            }
            Rule::Range { min, max } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    _ => text.trim().parse::<f64>().ok(),
                };
                match number {
                    None => (
                        ValidationErrorCode::NotANumber,
                        formatted_message(MSG_NOT_A_NUMBER, &[label]),
                    ),
                    Some(n) if n < *min || n > *max => (
                        ValidationErrorCode::OutOfRange,
                        formatted_message(
                            MSG_RANGE,
                            &[label, &format_bound(*min), &format_bound(*max)],
                        ),
                    ),
                    Some(_) => return None,
                }
            }
            Rule::Pattern { regex, code } => {
                if regex.is_match(&text) {
                    return None;
                }
                let error_code = match *code {
                    MSG_EMAIL => ValidationErrorCode::InvalidEmail,
                    MSG_URL => ValidationErrorCode::InvalidUrl,
                    _ => ValidationErrorCode::PatternMismatch,
                };
                (error_code, formatted_message(*code, &[label]))
            }
            Rule::Ipv4 => {
                if text.parse::<Ipv4Addr>().is_ok() {
                    return None;
                }
                (
                    ValidationErrorCode::InvalidIpv4,
                    formatted_message(MSG_IPV4, &[label]),
                )
            }
            Rule::Date => {
                if is_iso_date(&text) {
                    return None;
                }
                (
                    ValidationErrorCode::InvalidDate,
                    formatted_message(MSG_DATE, &[label]),
                )
            }
        };

        let message = self.error_msg.clone().unwrap_or(message);
        Some(ValidationError::new(code, message))
    }
}

fn compile_pattern(field: &str, pattern: &str) -> DialogResult<Regex> {
    Regex::new(pattern).map_err(|e| DialogError::InvalidPattern {
        field: field.to_string(),
        message: e.to_string(),
    })
}

fn format_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

fn is_iso_date(text: &str) -> bool {
    let text = text.trim();
    chrono::DateTime::parse_from_rfc3339(text).is_ok()
        || chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
        || chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").is_ok()
}

// ============================================================================
// FieldValidator / ValidatorSet
// ============================================================================

/// Compiled validator for one field
#[derive(Debug, Clone)]
pub struct FieldValidator {
    field: String,
    label: String,
    required: bool,
    rules: Vec<CompiledRule>,
}

impl FieldValidator {
    /// Compile the constraints declared by a descriptor
    pub fn compile(descriptor: &FieldDescriptor) -> DialogResult<Self> {
        let rules = descriptor
            .validators
            .iter()
            .map(|v| CompiledRule::compile(&descriptor.field, v))
            .collect::<DialogResult<Vec<_>>>()?;

        Ok(Self {
            field: descriptor.field.clone(),
            label: descriptor.display_label(),
            required: descriptor.required,
            rules,
        })
    }

    /// Field this validator checks
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether the field must be set
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Check the field's value; the first failing rule wins
    pub fn check(&self, form: &Attributes, label: Option<&str>) -> Option<ValidationError> {
        let label = label.unwrap_or(&self.label);
        let value = form.get(&self.field);

        if is_blank(value) {
            if self.required {
                return Some(
                    ValidationError::new(
                        ValidationErrorCode::Required,
                        formatted_message(MSG_REQUIRED, &[label]),
                    )
                    .with_field(&self.field),
                );
            }
            return None;
        }

        let value = value?;
        self.rules
            .iter()
            .find_map(|rule| rule.check(label, value))
            .map(|e| e.with_field(&self.field))
    }
}

/// All field validators of one component
#[derive(Debug, Clone, Default)]
pub struct ValidatorSet {
    validators: Vec<FieldValidator>,
}

impl ValidatorSet {
    /// Number of fields with a validator
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether no field carries any constraint
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Get the validator for a field
    pub fn get(&self, field: &str) -> Option<&FieldValidator> {
        self.validators.iter().find(|v| v.field == field)
    }

    /// Validate a form, using `labels` to name fields in messages
    pub fn validate(&self, form: &Attributes, labels: &BTreeMap<String, String>) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for validator in &self.validators {
            let label = labels.get(&validator.field).map(String::as_str);
            if let Some(error) = validator.check(form, label) {
                result.add_error(error);
            }
        }
        result
    }
}

/// Compile validators for every descriptor that declares a constraint
pub fn generate_validators(fields: &[FieldDescriptor]) -> DialogResult<ValidatorSet> {
    let validators = fields
        .iter()
        .filter(|f| f.required || !f.validators.is_empty())
        .map(FieldValidator::compile)
        .collect::<DialogResult<Vec<_>>>()?;

    Ok(ValidatorSet { validators })
}

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of validating a form
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    /// Create a failed validation result with an error
    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// First error message per field
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for error in &self.errors {
            if let Some(field) = &error.field {
                out.entry(field.clone())
                    .or_insert_with(|| error.message.clone());
            }
        }
        out
    }

    /// Messages not tied to a single field
    pub fn form_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .filter(|e| e.field.is_none())
            .map(|e| e.message.clone())
            .collect()
    }

    /// Convert to DialogResult (fails if any errors)
    pub fn to_result(self) -> DialogResult<()> {
        if self.valid {
            return Ok(());
        }
        match self.errors.as_slice() {
            [single] => match &single.field {
                Some(field) => Err(DialogError::field_validation(field, &single.message)),
                None => Err(DialogError::validation(&single.message)),
            },
            errors => {
                let msg = errors
                    .iter()
                    .map(|e| e.message.clone())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(DialogError::validation(msg))
            }
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError
// ============================================================================

/// A validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error code for programmatic handling
    pub code: ValidationErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Field the error belongs to (`None` for form-level errors)
    pub field: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Attach the error to a field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(field) = &self.field {
            write!(f, "[{}] {}", field, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

// ============================================================================
// ValidationErrorCode
// ============================================================================

/// Error codes for validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    // Field errors
    Required,
    TooShort,
    TooLong,
    NotANumber,
    OutOfRange,
    PatternMismatch,
    InvalidEmail,
    InvalidIpv4,
    InvalidUrl,
    InvalidDate,

    // Form errors
    MissingIdentity,
    FormRejected,

    // Generic
    Custom,
}

// ============================================================================
// Tests
// ============================================================================
