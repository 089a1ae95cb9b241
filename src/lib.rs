// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]

#[cfg(feature = "arc")]
pub use std::sync::Arc as Rc;
#[cfg(not(feature = "arc"))]
pub use std::rc::Rc;

mod diagnostics;
mod encoding;
mod error;
mod expr;
mod for_each;
mod marks;
mod number;
mod rules;
mod scope;
mod source;
mod types;
mod value;

pub use diagnostics::{Cause, Diagnostic, Diagnostics, Severity};
pub use encoding::{decode_expr, decode_value};
pub use error::ForEachError;
pub use expr::{Expr, Expression, Reference};
pub use for_each::{evaluate_for_each_expression, ForEachEvaluator, RepetitionData};
pub use marks::{Mark, Marks};
pub use number::Number;
pub use scope::{EvalContext, EvaluationContext, Scope, StaticScope, Unscoped};
pub use source::{Source, Span};
pub use types::Type;
pub use value::{Elements, Knowability, Known, Repr, Value};

/// Items in `unstable` are likely to change.
pub mod unstable {
    pub use crate::rules::{validate, Outcome};
}

#[cfg(test)]
mod test_utils;

#[cfg(test)]
mod tests;
