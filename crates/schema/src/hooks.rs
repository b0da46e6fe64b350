//! Hook registry and hook source parser
//!
//! Components name their hooks with a small call syntax:
//!
//! ```text
//! name
//! name(arg, arg, ...)
//! ```
//!
//! Arguments are bare words or single/double quoted strings. Each name is
//! looked up in a [`HookRegistry`] whose factories build the typed hook
//! from its arguments. Nothing is evaluated: an unknown name is an error.

use confdesk_core::{
    Attributes, ControlCommands, DialogError, DialogResult, OnChangeHook, OnLoadHook,
    SaveValidator, WidgetIds, display_value, is_blank,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds an on-change hook from its call arguments
pub type OnChangeFactory = Arc<dyn Fn(&[String]) -> Result<Arc<dyn OnChangeHook>, String>>;

/// Builds an on-load hook from its call arguments
pub type OnLoadFactory = Arc<dyn Fn(&[String]) -> Result<Arc<dyn OnLoadHook>, String>>;

/// Builds a save validator from its call arguments
pub type SaveValidatorFactory = Arc<dyn Fn(&[String]) -> Result<Arc<dyn SaveValidator>, String>>;

const ON_CHANGE: &str = "onChange";
const ON_LOAD: &str = "onLoad";
const SAVE_VALIDATOR: &str = "saveValidator";

// ============================================================================
// HookCall
// ============================================================================

/// A parsed hook source string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookCall {
    pub name: String,
    pub args: Vec<String>,
}

impl HookCall {
    /// Parse `name` or `name(arg, ...)`
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut parser = Parser {
            chars: source.chars().collect(),
            pos: 0,
        };
        parser.skip_ws();
        let name = parser.ident()?;
        parser.skip_ws();

        let mut args = Vec::new();
        if parser.eat('(') {
            parser.skip_ws();
            if !parser.eat(')') {
                loop {
                    parser.skip_ws();
                    args.push(parser.arg()?);
                    parser.skip_ws();
                    if parser.eat(',') {
                        continue;
                    }
                    if parser.eat(')') {
                        break;
                    }
                    return Err(parser.unexpected("',' or ')'"));
                }
            }
            parser.skip_ws();
        }

        if let Some(c) = parser.peek() {
            return Err(format!("unexpected '{}' at position {}", c, parser.pos));
        }

        Ok(Self { name, args })
    }
}

impl fmt::Display for HookCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(", "))
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &str) -> String {
        match self.peek() {
            Some(c) => format!("expected {} at position {}, found '{}'", expected, self.pos, c),
            None => format!("expected {} at end of input", expected),
        }
    }

    fn ident(&mut self) -> Result<String, String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.pos += 1,
            _ => return Err(self.unexpected("a hook name")),
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':'))
        {
            self.pos += 1;
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn arg(&mut self) -> Result<String, String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let mut out = String::new();
                loop {
                    match self.peek() {
                        None => return Err("unterminated string".to_string()),
                        Some('\\') => {
                            self.pos += 1;
                            match self.peek() {
                                Some(c) => out.push(c),
                                None => return Err("unterminated string".to_string()),
                            }
                        }
                        Some(c) if c == quote => {
                            self.pos += 1;
                            return Ok(out);
                        }
                        Some(c) => out.push(c),
                    }
                    self.pos += 1;
                }
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !matches!(c, ',' | ')' | '(' | '"' | '\''))
                {
                    self.pos += 1;
                }
                let word: String = self.chars[start..self.pos].iter().collect();
                let word = word.trim();
                if word.is_empty() {
                    return Err(self.unexpected("an argument"));
                }
                Ok(word.to_string())
            }
        }
    }
}

// ============================================================================
// HookRegistry
// ============================================================================

/// Named hook factories a component may refer to
#[derive(Clone, Default)]
pub struct HookRegistry {
    on_change: HashMap<String, OnChangeFactory>,
    on_load: HashMap<String, OnLoadFactory>,
    save_validators: HashMap<String, SaveValidatorFactory>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("on_change", &sorted_names(&self.on_change))
            .field("on_load", &sorted_names(&self.on_load))
            .field("save_validators", &sorted_names(&self.save_validators))
            .finish()
    }
}

fn sorted_names<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut names: Vec<&str> = map.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

impl HookRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in hooks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_on_change("show_when", |args| {
            Ok(Arc::new(ShowWhen::from_args(args)?) as Arc<dyn OnChangeHook>)
        });
        registry.register_on_load("show_when", |args| {
            Ok(Arc::new(ShowWhen::from_args(args)?) as Arc<dyn OnLoadHook>)
        });
        registry.register_save_validator("require_one_of", |args| {
            Ok(Arc::new(RequireOneOf::from_args(args)?) as Arc<dyn SaveValidator>)
        });
        registry.register_save_validator("require_together", |args| {
            Ok(Arc::new(RequireTogether::from_args(args)?) as Arc<dyn SaveValidator>)
        });

        registry
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register an on-change hook factory
    pub fn register_on_change<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[String]) -> Result<Arc<dyn OnChangeHook>, String> + 'static,
    {
        self.on_change.insert(name.into(), Arc::new(factory));
    }

    /// Register an on-load hook factory
    pub fn register_on_load<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[String]) -> Result<Arc<dyn OnLoadHook>, String> + 'static,
    {
        self.on_load.insert(name.into(), Arc::new(factory));
    }

    /// Register a save validator factory
    pub fn register_save_validator<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&[String]) -> Result<Arc<dyn SaveValidator>, String> + 'static,
    {
        self.save_validators.insert(name.into(), Arc::new(factory));
    }

    /// Register an argument-less on-change hook
    pub fn register_on_change_hook(
        &mut self,
        name: impl Into<String>,
        hook: Arc<dyn OnChangeHook>,
    ) {
        self.register_on_change(name, move |args| {
            expect_no_args(args)?;
            Ok(hook.clone())
        });
    }

    /// Register an argument-less save validator
    pub fn register_save_validator_hook(
        &mut self,
        name: impl Into<String>,
        validator: Arc<dyn SaveValidator>,
    ) {
        self.register_save_validator(name, move |args| {
            expect_no_args(args)?;
            Ok(validator.clone())
        });
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Resolve an on-change hook source
    pub fn parse_on_change(&self, source: &str) -> DialogResult<Arc<dyn OnChangeHook>> {
        build(ON_CHANGE, source, &self.on_change)
    }

    /// Resolve an on-load hook source
    pub fn parse_on_load(&self, source: &str) -> DialogResult<Arc<dyn OnLoadHook>> {
        build(ON_LOAD, source, &self.on_load)
    }

    /// Resolve a save validator source
    pub fn parse_save_validator(&self, source: &str) -> DialogResult<Arc<dyn SaveValidator>> {
        build(SAVE_VALIDATOR, source, &self.save_validators)
    }
}

fn build<T: ?Sized>(
    hook: &str,
    source: &str,
    factories: &HashMap<String, Arc<dyn Fn(&[String]) -> Result<Arc<T>, String>>>,
) -> DialogResult<Arc<T>> {
    let call = HookCall::parse(source).map_err(|e| DialogError::hook_parse(hook, source, e))?;
    let factory = factories
        .get(&call.name)
        .ok_or_else(|| DialogError::UnknownHook {
            hook: hook.to_string(),
            name: call.name.clone(),
        })?;

    tracing::debug!("Resolved {} hook {}", hook, call);
    factory(&call.args).map_err(|e| DialogError::hook_parse(hook, source, e))
}

fn expect_no_args(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(format!("takes no arguments, got {}", args.len()))
    }
}

// ============================================================================
// Built-in hooks
// ============================================================================

/// `show_when(field, value, target...)`
///
/// Shows the target controls while `field` equals `value`, hides them
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowWhen {
    pub field: String,
    pub value: String,
    pub targets: Vec<String>,
}

impl ShowWhen {
    fn from_args(args: &[String]) -> Result<Self, String> {
        match args {
            [field, value, targets @ ..] if !targets.is_empty() => Ok(Self {
                field: field.clone(),
                value: value.clone(),
                targets: targets.to_vec(),
            }),
            _ => Err("show_when expects (field, value, target...)".to_string()),
        }
    }

    fn apply(&self, form: &Attributes, widgets: &WidgetIds, controls: &mut ControlCommands) {
        let matches = form
            .get(&self.field)
            .is_some_and(|v| display_value(v) == self.value);

        for target in &self.targets {
            let Some(widget) = widgets.get(target) else {
                continue;
            };
            if matches {
                controls.show(widget.clone());
            } else {
                controls.hide(widget.clone());
            }
        }
    }
}

impl OnChangeHook for ShowWhen {
    fn on_change(
        &self,
        form: &Attributes,
        changed: &Attributes,
        widgets: &WidgetIds,
        controls: &mut ControlCommands,
    ) {
        if changed.contains_key(&self.field) {
            self.apply(form, widgets, controls);
        }
    }
}

impl OnLoadHook for ShowWhen {
    fn on_load(&self, form: &Attributes, widgets: &WidgetIds, controls: &mut ControlCommands) {
        self.apply(form, widgets, controls);
    }
}

/// `require_one_of(field...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireOneOf {
    pub fields: Vec<String>,
}

impl RequireOneOf {
    fn from_args(args: &[String]) -> Result<Self, String> {
        if args.is_empty() {
            return Err("require_one_of expects at least one field".to_string());
        }
        Ok(Self {
            fields: args.to_vec(),
        })
    }
}

impl SaveValidator for RequireOneOf {
    fn validate(&self, form: &Attributes) -> Result<(), String> {
        if self.fields.iter().any(|f| !is_blank(form.get(f))) {
            Ok(())
        } else {
            Err(format!(
                "At least one of {} is required",
                self.fields.join(", ")
            ))
        }
    }
}

/// `require_together(field...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireTogether {
    pub fields: Vec<String>,
}

impl RequireTogether {
    fn from_args(args: &[String]) -> Result<Self, String> {
        if args.len() < 2 {
            return Err("require_together expects at least two fields".to_string());
        }
        Ok(Self {
            fields: args.to_vec(),
        })
    }
}

impl SaveValidator for RequireTogether {
    fn validate(&self, form: &Attributes) -> Result<(), String> {
        let set = self
            .fields
            .iter()
            .filter(|f| !is_blank(form.get(f.as_str())))
            .count();
        if set == 0 || set == self.fields.len() {
            Ok(())
        } else {
            Err(format!(
                "Fields {} must be provided together",
                self.fields.join(", ")
            ))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use confdesk_core::{ControlAction, Value};
    use serde_json::json;

    fn form(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn widgets() -> WidgetIds {
        let mut w = WidgetIds::new();
        w.insert("password".into(), "#account-password".into());
        w.insert("token".into(), "#account-token".into());
        w
    }

    #[test]
    fn test_parse_bare_name() {
        let call = HookCall::parse("  refresh ").unwrap();
        assert_eq!(call.name, "refresh");
        assert!(call.args.is_empty());
        assert_eq!(HookCall::parse("refresh()").unwrap().args.len(), 0);
    }

    #[test]
    fn test_parse_args() {
        let call = HookCall::parse(r#"show_when(auth, "basic auth", 'pass\'word')"#).unwrap();
        assert_eq!(call.name, "show_when");
        assert_eq!(call.args, vec!["auth", "basic auth", "pass'word"]);
        assert_eq!(call.to_string(), "show_when(auth, basic auth, pass'word)");
    }

    #[test]
    fn test_parse_errors() {
        assert!(HookCall::parse("").is_err());
        assert!(HookCall::parse("1abc").is_err());
        assert!(HookCall::parse("f(a,").is_err());
        assert!(HookCall::parse("f(a b").is_err());
        assert!(HookCall::parse("f(a) extra").is_err());
        assert!(HookCall::parse("f('open)").is_err());
        assert!(HookCall::parse("f(,)").is_err());
    }

    #[test]
    fn test_unknown_hook() {
        let registry = HookRegistry::with_builtins();
        let err = registry.parse_on_change("explode()").err().unwrap();
        assert!(matches!(err, DialogError::UnknownHook { ref name, .. } if name == "explode"));
        assert!(err.is_schema());
    }

    #[test]
    fn test_malformed_hook_is_parse_error() {
        let registry = HookRegistry::with_builtins();
        let err = registry.parse_save_validator("require_one_of(a").err().unwrap();
        assert!(matches!(err, DialogError::HookParse { .. }));

        let err = registry.parse_on_change("show_when(auth)").err().unwrap();
        assert!(matches!(err, DialogError::HookParse { .. }));
    }

    #[test]
    fn test_show_when_on_change() {
        let registry = HookRegistry::with_builtins();
        let hook = registry
            .parse_on_change("show_when(auth, basic, password)")
            .unwrap();

        let mut controls = ControlCommands::new();
        hook.on_change(
            &form(json!({"auth": "basic"})),
            &form(json!({"auth": "basic"})),
            &widgets(),
            &mut controls,
        );
        let commands = controls.into_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].widget_id, "#account-password");
        assert_eq!(commands[0].action, ControlAction::Show);

        // unrelated change leaves controls alone
        let mut controls = ControlCommands::new();
        hook.on_change(
            &form(json!({"auth": "oauth", "host": "h"})),
            &form(json!({"host": "h"})),
            &widgets(),
            &mut controls,
        );
        assert!(controls.is_empty());
    }

    #[test]
    fn test_show_when_on_load_hides() {
        let registry = HookRegistry::with_builtins();
        let hook = registry
            .parse_on_load("show_when(auth, oauth, token, missing)")
            .unwrap();

        let mut controls = ControlCommands::new();
        hook.on_load(&form(json!({"auth": "basic"})), &widgets(), &mut controls);
        let commands = controls.into_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].action, ControlAction::Hide);
    }

    #[test]
    fn test_require_one_of() {
        let registry = HookRegistry::with_builtins();
        let validator = registry
            .parse_save_validator("require_one_of(password, token)")
            .unwrap();
        assert_eq!(
            validator.validate(&form(json!({"password": ""}))),
            Err("At least one of password, token is required".to_string())
        );
        assert!(validator.validate(&form(json!({"token": "t"}))).is_ok());
    }

    #[test]
    fn test_require_together() {
        let registry = HookRegistry::with_builtins();
        let validator = registry
            .parse_save_validator("require_together(proxy_user, proxy_password)")
            .unwrap();
        assert!(validator.validate(&Attributes::new()).is_ok());
        assert!(validator.validate(&form(json!({"proxy_user": "u"}))).is_err());
        assert!(
            validator
                .validate(&form(json!({"proxy_user": "u", "proxy_password": "p"})))
                .is_ok()
        );
    }

    #[test]
    fn test_register_custom_hook() {
        let mut registry = HookRegistry::new();
        registry.register_save_validator_hook(
            "no_admin",
            Arc::new(|form: &Attributes| {
                if form.get("name") == Some(&json!("admin")) {
                    Err("admin is reserved".to_string())
                } else {
                    Ok(())
                }
            }),
        );

        let validator = registry.parse_save_validator("no_admin").unwrap();
        assert!(validator.validate(&form(json!({"name": "admin"}))).is_err());
        assert!(registry.parse_save_validator("no_admin(x)").is_err());
    }
}
