/// Indentation-aware SQL text buffer with a parameter registry.
///
/// Generators write clause by clause; nested selects are indented one
/// level (four spaces) inside their parentheses. Parameters are recorded in
/// the order their placeholders first appear in the text.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ir::{Literal, SqlType};

const INDENT: &str = "    ";

/// Values known at compile time, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValues(BTreeMap<String, Literal>);

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Literal>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parameter value as handed to the execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Resolved(Literal),
    /// Bound later by the caller.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    pub name: String,
    pub placeholder: String,
    pub ty: SqlType,
    pub value: ParameterValue,
}

/// Output of a generator: SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub parameters: Vec<SqlParameter>,
}

struct Registered {
    name: String,
    placeholder: String,
    ty: SqlType,
}

pub struct CommandBuilder {
    text: String,
    level: usize,
    line_start: bool,
    parameters: Vec<Registered>,
    path: Vec<String>,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandBuilder {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            level: 0,
            line_start: true,
            parameters: Vec::new(),
            path: vec!["select".to_string()],
        }
    }

    pub fn append(&mut self, text: &str) -> &mut Self {
        if text.is_empty() {
            return self;
        }
        if self.line_start {
            for _ in 0..self.level {
                self.text.push_str(INDENT);
            }
            self.line_start = false;
        }
        self.text.push_str(text);
        self
    }

    pub fn append_line(&mut self, text: &str) -> &mut Self {
        self.append(text);
        self.text.push('\n');
        self.line_start = true;
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.level += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.level = self.level.saturating_sub(1);
        self
    }

    /// Record a parameter and return its placeholder text.
    ///
    /// With `reuse` set, a name seen before returns its first placeholder
    /// and is not registered again. `placeholder` receives the 1-based
    /// ordinal of a newly registered parameter.
    pub fn register_parameter(
        &mut self,
        name: &str,
        ty: SqlType,
        reuse: bool,
        placeholder: impl FnOnce(usize) -> String,
    ) -> String {
        if reuse {
            if let Some(existing) = self.parameters.iter().find(|p| p.name == name) {
                return existing.placeholder.clone();
            }
        }
        let text = placeholder(self.parameters.len() + 1);
        self.parameters.push(Registered {
            name: name.to_string(),
            placeholder: text.clone(),
            ty,
        });
        text
    }

    pub fn enter(&mut self, segment: impl Into<String>) {
        self.path.push(segment.into());
    }

    pub fn leave(&mut self) {
        if self.path.len() > 1 {
            self.path.pop();
        }
    }

    /// Slash-separated tree location of the node being generated.
    pub fn location(&self) -> String {
        self.path.join("/")
    }

    pub fn finish(self, values: &ParameterValues) -> GeneratedSql {
        let parameters = self
            .parameters
            .into_iter()
            .map(|p| SqlParameter {
                value: values
                    .get(&p.name)
                    .cloned()
                    .map(ParameterValue::Resolved)
                    .unwrap_or(ParameterValue::Deferred),
                name: p.name,
                placeholder: p.placeholder,
                ty: p.ty,
            })
            .collect();
        GeneratedSql {
            sql: self.text.trim_end().to_string(),
            parameters,
        }
    }
}
