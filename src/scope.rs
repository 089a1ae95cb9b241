// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::expr::Reference;
use crate::value::Value;
use crate::Rc;

/// Values an expression is evaluated against, keyed by reference address
/// (for example `var.regions` or `local.names`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    variables: BTreeMap<Rc<str>, Value>,
}

impl EvalContext {
    pub fn new() -> EvalContext {
        EvalContext::default()
    }

    pub fn insert<K: Into<Rc<str>>>(&mut self, address: K, value: Value) {
        self.variables.insert(address.into(), value);
    }

    pub fn get(&self, address: &str) -> Option<&Value> {
        self.variables.get(address)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.variables.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// Builds the evaluation context for a set of references.
///
/// Implementations report references they cannot resolve as diagnostics and
/// still return whatever context they managed to build.
pub trait Scope {
    fn eval_context(&self, refs: &[Reference]) -> (EvalContext, Diagnostics);
}

/// The caller's evaluation state.
///
/// A context may have no scope to offer, in which case expressions are
/// evaluated against an empty context.
pub trait EvaluationContext {
    fn evaluation_scope(&self) -> Option<&dyn Scope>;
}

/// A scope backed by a fixed table of values.
#[derive(Debug, Clone, Default)]
pub struct StaticScope {
    values: BTreeMap<Rc<str>, Value>,
}

impl StaticScope {
    pub fn new() -> StaticScope {
        StaticScope::default()
    }

    pub fn with<K: Into<Rc<str>>>(mut self, address: K, value: Value) -> StaticScope {
        self.insert(address, value);
        self
    }

    pub fn insert<K: Into<Rc<str>>>(&mut self, address: K, value: Value) {
        self.values.insert(address.into(), value);
    }

    /// Builds a scope from the attributes of an object or map value.
    pub fn from_value(values: &Value) -> anyhow::Result<StaticScope> {
        let mut scope = StaticScope::new();
        for (address, value) in values.as_entries()?.iter() {
            scope.insert(address.clone(), value.clone());
        }
        Ok(scope)
    }
}

impl Scope for StaticScope {
    fn eval_context(&self, refs: &[Reference]) -> (EvalContext, Diagnostics) {
        let mut ctx = EvalContext::new();
        let mut diags = Diagnostics::new();
        for r in refs {
            match self.values.get(r.address.as_ref()) {
                Some(value) => ctx.insert(r.address.clone(), value.clone()),
                None => diags.push(
                    Diagnostic::error(
                        "Reference to undeclared value",
                        format!(
                            "No value named \"{}\" has been declared in this scope.",
                            r.address
                        ),
                    )
                    .with_subject(r.span.clone()),
                ),
            }
        }
        (ctx, diags)
    }
}

impl EvaluationContext for StaticScope {
    fn evaluation_scope(&self) -> Option<&dyn Scope> {
        Some(self)
    }
}

/// An evaluation context with no scope at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unscoped;

impl EvaluationContext for Unscoped {
    fn evaluation_scope(&self) -> Option<&dyn Scope> {
        None
    }
}
