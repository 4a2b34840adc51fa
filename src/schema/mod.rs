//! Declarative attribute schemas shared by resources and data sources.
//!
//! A [`Schema`] carries the attribute flags, per-attribute [`Validator`]s,
//! cross-attribute [`ConfigValidator`]s and the plan modifiers that decide
//! when a change forces replacement.

pub mod validators;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};

pub use validators::Validator;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Int64,
    List { element: Box<AttributeKind> },
    Object { attributes: Vec<Attribute> },
    ObjectList { attributes: Vec<Attribute> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    RequiresReplace,
    RequiresReplaceIfConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttributeKind,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
}

impl Attribute {
    fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
        }
    }

    pub fn string(name: &'static str) -> Self {
        Self::new(name, AttributeKind::String)
    }

    pub fn int64(name: &'static str) -> Self {
        Self::new(name, AttributeKind::Int64)
    }

    pub fn string_list(name: &'static str) -> Self {
        Self::new(
            name,
            AttributeKind::List {
                element: Box::new(AttributeKind::String),
            },
        )
    }

    pub fn object(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeKind::Object { attributes })
    }

    pub fn object_list(name: &'static str, attributes: Vec<Attribute>) -> Self {
        Self::new(name, AttributeKind::ObjectList { attributes })
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn validate_with(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn requires_replace(mut self) -> Self {
        self.plan_modifiers.push(PlanModifier::RequiresReplace);
        self
    }

    pub fn requires_replace_if_configured(mut self) -> Self {
        self.plan_modifiers
            .push(PlanModifier::RequiresReplaceIfConfigured);
        self
    }

    fn computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Rule spanning several attributes, addressed by dotted path.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "paths", rename_all = "snake_case")]
pub enum ConfigValidator {
    ExactlyOneOf(Vec<&'static str>),
    Conflicting(Vec<&'static str>),
    AtLeastOneOf(Vec<&'static str>),
}

impl ConfigValidator {
    pub fn check(&self, config: &Value) -> Option<Diagnostic> {
        let (paths, set) = match self {
            ConfigValidator::ExactlyOneOf(paths)
            | ConfigValidator::Conflicting(paths)
            | ConfigValidator::AtLeastOneOf(paths) => {
                let set = paths
                    .iter()
                    .filter(|path| !lookup(config, path).is_null())
                    .count();
                (paths, set)
            }
        };
        let listed = paths.join(", ");
        let detail = match self {
            ConfigValidator::ExactlyOneOf(_) if set == 0 => format!(
                "No attribute specified when one (and only one) of [{listed}] is required"
            ),
            ConfigValidator::ExactlyOneOf(_) if set > 1 => format!(
                "{set} attributes specified when one (and only one) of [{listed}] is required"
            ),
            ConfigValidator::Conflicting(_) if set > 1 => {
                format!("These attributes cannot be configured together: [{listed}]")
            }
            ConfigValidator::AtLeastOneOf(_) if set == 0 => {
                format!("At least one attribute out of [{listed}] must be specified")
            }
            _ => return None,
        };
        Some(Diagnostic::error("Invalid Attribute Combination", detail).at(paths[0]))
    }
}

/// Resolves a dotted path in a JSON object, yielding `Null` when any segment is absent.
pub fn lookup<'a>(value: &'a Value, path: &str) -> &'a Value {
    path.split('.')
        .try_fold(value, |current, segment| current.get(segment))
        .unwrap_or(&Value::Null)
}

#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub version: i64,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub config_validators: Vec<ConfigValidator>,
}

impl Schema {
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            version: 0,
            description: "",
            attributes,
            config_validators: Vec::new(),
        }
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn with_config_validator(mut self, validator: ConfigValidator) -> Self {
        self.config_validators.push(validator);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Validates practitioner configuration: presence, types, value validators
    /// and cross-attribute rules.
    pub fn validate(&self, config: &Value) -> Diagnostics {
        let mut diagnostics = self.validate_values(config, false);
        for validator in &self.config_validators {
            if let Some(diagnostic) = validator.check(config) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }

    /// Validates a planned state, which may already carry computed values.
    /// Cross-attribute rules only apply to configuration.
    pub fn validate_planned(&self, planned: &Value) -> Diagnostics {
        self.validate_values(planned, true)
    }

    fn validate_values(&self, value: &Value, allow_computed: bool) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let empty = Map::new();
        let fields = match value {
            Value::Null => &empty,
            Value::Object(fields) => fields,
            _ => {
                diagnostics.add_error("invalid configuration", "configuration must be an object");
                return diagnostics;
            }
        };
        validate_attributes(
            &self.attributes,
            fields,
            "",
            allow_computed,
            &mut diagnostics,
        );
        diagnostics
    }

    /// Lists the attribute paths whose change from `prior` to `proposed`
    /// forces the resource to be replaced.
    pub fn requires_replace(&self, prior: &Value, proposed: &Value) -> Vec<String> {
        let mut paths = Vec::new();
        if prior.is_null() || proposed.is_null() {
            return paths;
        }
        collect_replacements(&self.attributes, prior, proposed, "", &mut paths);
        paths
    }

    /// Proposed state with computed-but-unset values carried over from `prior`.
    pub fn plan(&self, prior: &Value, proposed: &Value) -> Value {
        let (Value::Object(prior_fields), Value::Object(proposed_fields)) = (prior, proposed)
        else {
            return proposed.clone();
        };
        let mut planned = proposed_fields.clone();
        for attribute in self.attributes.iter().filter(|a| a.computed) {
            let unset = planned
                .get(attribute.name)
                .map(Value::is_null)
                .unwrap_or(true);
            if unset {
                if let Some(previous) = prior_fields.get(attribute.name) {
                    planned.insert(attribute.name.to_string(), previous.clone());
                }
            }
        }
        Value::Object(planned)
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn validate_attributes(
    attributes: &[Attribute],
    fields: &Map<String, Value>,
    prefix: &str,
    allow_computed: bool,
    diagnostics: &mut Diagnostics,
) {
    for name in fields.keys() {
        if !attributes.iter().any(|attribute| attribute.name == name) {
            diagnostics.add_attribute_error(
                join(prefix, name),
                "unsupported attribute",
                format!("an attribute named {name:?} is not expected here"),
            );
        }
    }

    for attribute in attributes {
        let path = join(prefix, attribute.name);
        let value = fields.get(attribute.name).unwrap_or(&Value::Null);
        if value.is_null() {
            if attribute.required {
                diagnostics.add_attribute_error(
                    path,
                    "missing required argument",
                    format!("the argument {:?} is required", attribute.name),
                );
            }
            continue;
        }
        if attribute.computed_only() && !allow_computed {
            diagnostics.add_attribute_error(
                path,
                "invalid configuration",
                format!("{:?} is computed and cannot be configured", attribute.name),
            );
            continue;
        }
        validate_value(
            attribute,
            &attribute.kind,
            value,
            &path,
            allow_computed,
            diagnostics,
        );
    }
}

fn validate_value(
    attribute: &Attribute,
    kind: &AttributeKind,
    value: &Value,
    path: &str,
    allow_computed: bool,
    diagnostics: &mut Diagnostics,
) {
    let type_error = |diagnostics: &mut Diagnostics, expected: &str| {
        diagnostics.add_attribute_error(
            path,
            "incorrect attribute value type",
            format!("expected {expected}, got: {value}"),
        );
    };
    match kind {
        AttributeKind::String => match value.as_str() {
            Some(text) => {
                for validator in &attribute.validators {
                    if let Some(detail) = validator.check(text) {
                        diagnostics.add_attribute_error(path, "invalid attribute value", detail);
                    }
                }
            }
            None => type_error(diagnostics, "a string"),
        },
        AttributeKind::Int64 => {
            if value.as_i64().is_none() {
                type_error(diagnostics, "a number");
            }
        }
        AttributeKind::List { element } => match value.as_array() {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_null() {
                        let item_path = format!("{path}[{index}]");
                        validate_value(
                            attribute,
                            element,
                            item,
                            &item_path,
                            allow_computed,
                            diagnostics,
                        );
                    }
                }
            }
            None => type_error(diagnostics, "a list"),
        },
        AttributeKind::Object { attributes } => match value.as_object() {
            Some(fields) => {
                validate_attributes(attributes, fields, path, allow_computed, diagnostics)
            }
            None => type_error(diagnostics, "an object"),
        },
        AttributeKind::ObjectList { attributes } => match value.as_array() {
            Some(items) => {
                for (index, item) in items.iter().enumerate() {
                    match item.as_object() {
                        Some(fields) => validate_attributes(
                            attributes,
                            fields,
                            &format!("{path}[{index}]"),
                            allow_computed,
                            diagnostics,
                        ),
                        None => type_error(diagnostics, "a list of objects"),
                    }
                }
            }
            None => type_error(diagnostics, "a list of objects"),
        },
    }
}

fn collect_replacements(
    attributes: &[Attribute],
    prior: &Value,
    proposed: &Value,
    prefix: &str,
    paths: &mut Vec<String>,
) {
    for attribute in attributes {
        let path = join(prefix, attribute.name);
        let before = prior.get(attribute.name).unwrap_or(&Value::Null);
        let after = proposed.get(attribute.name).unwrap_or(&Value::Null);

        // Unset computed values keep their prior state.
        if after.is_null() && attribute.computed {
            continue;
        }

        if let AttributeKind::Object { attributes: nested } = &attribute.kind {
            if before.is_object() && after.is_object() {
                collect_replacements(nested, before, after, &path, paths);
                continue;
            }
        }

        if before == after {
            continue;
        }
        let replace = attribute.plan_modifiers.iter().any(|modifier| match modifier {
            PlanModifier::RequiresReplace => true,
            PlanModifier::RequiresReplaceIfConfigured => !after.is_null(),
        });
        if replace {
            paths.push(path);
        }
    }
}
