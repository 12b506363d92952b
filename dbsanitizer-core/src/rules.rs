//! Sanitization rules: which columns get rewritten, and with what.
//!
//! A [`SanitizationRuleSet`] maps column names to [`ValueRule`]s. A rule is
//! a static value assigned verbatim to every row, a `{column}` template, or a
//! derived value computed per row from the row's current (pre-update)
//! contents and the run's shared [`FakeData`] source.

use crate::error::SanitizerError;
use crate::fake::{FakeData, FakeKind};
use crate::models::{Row, Value};
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Signature of a derived rule.
///
/// Implementations must only read the row they are given; they are called
/// once per row with no state carried between calls.
pub type DeriveFn = dyn Fn(&Row, &mut FakeData) -> Value + Send + Sync;

/// Replacement rule for one column.
#[derive(Clone)]
pub enum ValueRule {
    /// The same value for every row
    Static(Value),
    /// Computed from the current row and the fake-data source
    Derived(Arc<DeriveFn>),
    /// Text with `{column}` placeholders filled from the current row
    Template(Template),
}

impl ValueRule {
    /// Creates a static rule.
    pub fn fixed(value: impl Into<Value>) -> Self {
        ValueRule::Static(value.into())
    }

    /// Creates a derived rule from a closure.
    pub fn derived<F>(f: F) -> Self
    where
        F: Fn(&Row, &mut FakeData) -> Value + Send + Sync + 'static,
    {
        ValueRule::Derived(Arc::new(f))
    }

    /// Derived rule drawing from a named fake-data generator.
    pub fn fake(kind: FakeKind) -> Self {
        Self::derived(move |_, fake| fake.generate(kind))
    }

    /// Rule rendering a template with `{column}` placeholders
    /// replaced by the row's values. `{{` and `}}` escape literal braces.
    ///
    /// Placeholders are checked against the table's columns when the
    /// sweep reads its first row.
    ///
    /// # Errors
    /// Returns a configuration error for unbalanced braces.
    pub fn template(template: &str) -> Result<Self> {
        Ok(ValueRule::Template(Template {
            source: template.to_string(),
            parts: parse_template(template)?,
        }))
    }

    /// Evaluates the rule for one row.
    pub fn evaluate(&self, row: &Row, fake: &mut FakeData) -> Value {
        match self {
            ValueRule::Static(value) => value.clone(),
            ValueRule::Derived(derive) => derive(row, fake),
            ValueRule::Template(template) => template.render(row),
        }
    }

    /// Columns the rule reads from the row, when known.
    pub fn referenced_columns(&self) -> impl Iterator<Item = &str> {
        let parts: &[TemplatePart] = match self {
            ValueRule::Template(template) => &template.parts,
            ValueRule::Static(_) | ValueRule::Derived(_) => &[],
        };
        parts.iter().filter_map(|part| match part {
            TemplatePart::Column(column) => Some(column.as_str()),
            TemplatePart::Literal(_) => None,
        })
    }
}

/// Parsed `{column}` template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    parts: Vec<TemplatePart>,
}

impl Template {
    /// The template text as configured.
    pub fn source(&self) -> &str {
        &self.source
    }

    fn render(&self, row: &Row) -> Value {
        let mut rendered = String::new();
        for part in &self.parts {
            match part {
                TemplatePart::Literal(text) => rendered.push_str(text),
                // NULL renders empty
                TemplatePart::Column(column) => {
                    if let Some(value) = row.get(column) {
                        rendered.push_str(&value.to_string());
                    }
                }
            }
        }
        Value::Text(rendered)
    }
}

impl fmt::Debug for ValueRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRule::Static(value) => f.debug_tuple("Static").field(value).finish(),
            ValueRule::Derived(_) => f.write_str("Derived(..)"),
            ValueRule::Template(template) => {
                f.debug_tuple("Template").field(&template.source).finish()
            }
        }
    }
}

/// Ordered column → rule mapping with unique column names.
#[derive(Debug, Clone, Default)]
pub struct SanitizationRuleSet {
    rules: Vec<(String, ValueRule)>,
}

impl SanitizationRuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for a column.
    ///
    /// # Errors
    /// Returns a configuration error if the column already has a rule.
    pub fn insert(&mut self, column: impl Into<String>, rule: ValueRule) -> Result<()> {
        let column = column.into();
        if self.rules.iter().any(|(name, _)| *name == column) {
            return Err(SanitizerError::configuration(format!(
                "Duplicate sanitization rule for column '{}'",
                column
            )));
        }
        self.rules.push((column, rule));
        Ok(())
    }

    /// Builder form of [`SanitizationRuleSet::insert`].
    pub fn with_rule(mut self, column: impl Into<String>, rule: ValueRule) -> Result<Self> {
        self.insert(column, rule)?;
        Ok(self)
    }

    /// Looks up the rule for a column.
    pub fn get(&self, column: &str) -> Option<&ValueRule> {
        self.rules
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, rule)| rule)
    }

    /// Column names, in rule order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(column, rule)` pairs in rule order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueRule)> {
        self.rules.iter().map(|(name, rule)| (name.as_str(), rule))
    }

    /// Checks every target column and template placeholder against the
    /// columns of a row read from `table`.
    ///
    /// # Errors
    /// Returns `UnknownColumn` for the first name the row does not have.
    pub fn check_columns(&self, table: &str, row: &Row) -> Result<()> {
        for (column, rule) in self.iter() {
            if row.get(column).is_none() {
                return Err(SanitizerError::unknown_column(table, column));
            }
            if let Some(missing) = rule.referenced_columns().find(|c| row.get(c).is_none()) {
                return Err(SanitizerError::unknown_column(table, missing));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TemplatePart {
    Literal(String),
    Column(String),
}

fn parse_template(template: &str) -> Result<Vec<TemplatePart>> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut column = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => column.push(ch),
                        None => {
                            return Err(SanitizerError::configuration(format!(
                                "Unclosed placeholder in template '{}'",
                                template
                            )));
                        }
                    }
                }
                let column = column.trim();
                if column.is_empty() {
                    return Err(SanitizerError::configuration(format!(
                        "Empty placeholder in template '{}'",
                        template
                    )));
                }
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                parts.push(TemplatePart::Column(column.to_string()));
            }
            '}' => {
                return Err(SanitizerError::configuration(format!(
                    "Unmatched '}}' in template '{}'",
                    template
                )));
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }
    Ok(parts)
}
