// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::scope::EvalContext;
use crate::source::Span;
use crate::types::Type;
use crate::value::Value;
use crate::Rc;

/// A named value read by an expression, such as `var.regions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub address: Rc<str>,
    pub span: Span,
}

impl Reference {
    pub fn new<A: Into<Rc<str>>>(address: A, span: Span) -> Reference {
        Reference {
            address: address.into(),
            span,
        }
    }
}

/// An already-parsed expression.
pub trait Expression: fmt::Debug {
    /// Source range of the whole expression.
    fn range(&self) -> Span;

    /// Named values the expression reads.
    fn references(&self) -> (Vec<Reference>, Diagnostics);

    /// Evaluates the expression against `ctx`.
    fn value(&self, ctx: &EvalContext) -> (Value, Diagnostics);
}

/// A minimal expression tree: literals, references and `toset(...)`.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: Value, span: Span },
    Ref { address: Rc<str>, span: Span },
    ToSet { arg: Box<Expr>, span: Span },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Literal { span, .. } | Expr::Ref { span, .. } | Expr::ToSet { span, .. } => span,
        }
    }

    fn collect_references(&self, refs: &mut Vec<Reference>, diags: &mut Diagnostics) {
        match self {
            Expr::Literal { .. } => (),
            Expr::Ref { address, span } => {
                if is_valid_address(address) {
                    refs.push(Reference::new(address.clone(), span.clone()));
                } else {
                    diags.push(
                        Diagnostic::error(
                            "Invalid reference",
                            format!(
                                "\"{address}\" is not a valid reference. A reference is a sequence of names separated by dots, such as var.example."
                            ),
                        )
                        .with_subject(span.clone()),
                    );
                }
            }
            Expr::ToSet { arg, .. } => arg.collect_references(refs, diags),
        }
    }
}

fn is_valid_address(address: &str) -> bool {
    let mut parts = address.split('.');
    let valid_name = |p: &str| {
        p.chars()
            .next()
            .map(|c| c.is_ascii_alphabetic() || c == '_')
            .unwrap_or(false)
            && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    match (parts.next(), parts.next()) {
        (Some(root), Some(name)) => valid_name(root) && valid_name(name) && parts.all(valid_name),
        _ => false,
    }
}

impl Expression for Expr {
    fn range(&self) -> Span {
        self.span().clone()
    }

    fn references(&self) -> (Vec<Reference>, Diagnostics) {
        let mut refs = vec![];
        let mut diags = Diagnostics::new();
        self.collect_references(&mut refs, &mut diags);
        (refs, diags)
    }

    fn value(&self, ctx: &EvalContext) -> (Value, Diagnostics) {
        match self {
            Expr::Literal { value, .. } => (value.clone(), Diagnostics::new()),
            Expr::Ref { address, span } => match ctx.get(address) {
                Some(value) => (value.clone(), Diagnostics::new()),
                None => (
                    Value::dynamic(),
                    Diagnostic::error(
                        "Unknown variable",
                        format!("There is no variable named \"{address}\"."),
                    )
                    .with_subject(span.clone())
                    .into(),
                ),
            },
            Expr::ToSet { arg, span } => {
                let (value, mut diags) = arg.value(ctx);
                if diags.has_errors() {
                    return (Value::unknown(Type::set(Type::Dynamic)), diags);
                }
                match to_set(value) {
                    Ok(set) => (set, diags),
                    Err(detail) => {
                        diags.push(
                            Diagnostic::error("Invalid function argument", detail)
                                .with_subject(span.clone()),
                        );
                        (Value::unknown(Type::set(Type::Dynamic)), diags)
                    }
                }
            }
        }
    }
}

// Converts a list or set into a set, keeping the marks of the input.
fn to_set(value: Value) -> Result<Value, String> {
    let element = match value.ty() {
        Type::List(t) | Type::Set(t) => t.as_ref().clone(),
        Type::Dynamic => Type::Dynamic,
        ty => {
            return Err(format!(
                "Invalid value for \"v\" parameter: cannot convert {} to set of any single type.",
                ty.friendly_name()
            ))
        }
    };

    let (value, marks) = value.unmark();
    let set = if value.is_null() {
        Value::null(Type::set(element))
    } else if !value.is_known() {
        Value::unknown(Type::set(element))
    } else {
        let items: Vec<Value> = value.elements().map(|(_, v)| v.clone()).collect();
        Value::set_of(element, items)
    };
    Ok(set.with_marks(marks))
}
