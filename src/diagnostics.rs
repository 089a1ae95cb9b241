// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use std::collections::BTreeSet;

use crate::error::ForEachError;
use crate::marks::Mark;
use crate::scope::EvalContext;
use crate::source::Span;
use crate::value::Value;
use crate::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Structured reason attached to a diagnostic so that callers can tell
/// "try again once more values are known" apart from "always invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    /// Caused by a value that is not known yet.
    Unknown,
    /// Caused by a sensitive value.
    Sensitive,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Source range the diagnostic points at.
    pub subject: Option<Span>,
    /// Text of the expression that produced the diagnostic.
    pub expression: Option<String>,
    /// Addresses the expression refers to.
    pub references: Vec<Rc<str>>,
    /// Values that were in scope when the expression was evaluated.
    pub eval_context: Option<Rc<EvalContext>>,
    pub cause: Option<Cause>,
    pub code: Option<&'static str>,
}

impl Diagnostic {
    pub fn error<S: Into<String>, D: Into<String>>(summary: S, detail: D) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            subject: None,
            expression: None,
            references: vec![],
            eval_context: None,
            cause: None,
            code: None,
        }
    }

    pub fn warning<S: Into<String>, D: Into<String>>(summary: S, detail: D) -> Diagnostic {
        Diagnostic {
            severity: Severity::Warning,
            ..Diagnostic::error(summary, detail)
        }
    }

    pub fn with_subject(mut self, subject: Span) -> Diagnostic {
        self.subject = Some(subject);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn caused_by_unknown(&self) -> bool {
        self.cause == Some(Cause::Unknown)
    }

    pub fn caused_by_sensitive(&self) -> bool {
        self.cause == Some(Cause::Sensitive)
    }

    // Lines describing the in-scope values that the expression refers to.
    fn caused_by(&self) -> Vec<String> {
        let Some(ctx) = &self.eval_context else {
            return vec![];
        };
        let mut seen = BTreeSet::new();
        self.references
            .iter()
            .filter(|address| seen.insert(address.clone()))
            .filter_map(|address| {
                ctx.get(address)
                    .map(|value| format!("{address} {}", describe(value)))
            })
            .collect()
    }
}

// Describes a value without ever echoing sensitive content.
fn describe(value: &Value) -> String {
    if value.has_mark(&Mark::Sensitive) {
        "has a sensitive value".to_string()
    } else if !value.is_known() {
        format!(
            "is a {}, known only after apply",
            value.ty().friendly_name()
        )
    } else if value.is_null() {
        "is null".to_string()
    } else if value.ty().is_collection() || value.ty().is_object() {
        match value.length() {
            1 => format!("is {} with 1 element", value.ty().friendly_name()),
            n => format!("is {} with {n} elements", value.ty().friendly_name()),
        }
    } else {
        format!("is {value}")
    }
}

impl From<ForEachError> for Diagnostic {
    fn from(err: ForEachError) -> Self {
        Diagnostic {
            cause: err.cause(),
            code: Some(err.code()),
            ..Diagnostic::error(err.summary(), err.to_string())
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.severity.to_string();
        match &self.subject {
            Some(span) => write!(
                f,
                "{}",
                span.message(&kind, &format!("{}\n\n{}", self.summary, self.detail))
            )?,
            None => write!(f, "{kind}: {}\n\n{}", self.summary, self.detail)?,
        }
        let caused_by = self.caused_by();
        if !caused_by.is_empty() {
            write!(f, "\n    ├────────────────")?;
            for line in caused_by {
                write!(f, "\n    │ {line}")?;
            }
        }
        Ok(())
    }
}

/// Diagnostics returned explicitly by every evaluator operation.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push<D: Into<Diagnostic>>(&mut self, diag: D) {
        self.0.push(diag.into());
    }

    /// Appends all diagnostics from `other`.
    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Converts into an error when any diagnostic is an error.
    pub fn into_result(self) -> anyhow::Result<Diagnostics> {
        if self.has_errors() {
            Err(anyhow::anyhow!("{self}"))
        } else {
            Ok(self)
        }
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Diagnostics(vec![diag])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, diag) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{diag}")?;
        }
        Ok(())
    }
}
