// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;

use log::debug;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ForEachError;
use crate::expr::Expression;
use crate::rules;
use crate::scope::{EvalContext, EvaluationContext};
use crate::types::Type;
use crate::value::Value;
use crate::Rc;

/// Key and value of one instance produced by import expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct RepetitionData {
    pub each_key: Value,
    pub each_value: Value,
}

/// Evaluates a known `for_each` expression for resource expansion.
///
/// Shorthand for [`ForEachEvaluator::resource_value`].
pub fn evaluate_for_each_expression(
    expr: Option<&dyn Expression>,
    ctx: &dyn EvaluationContext,
) -> (BTreeMap<Rc<str>, Value>, Diagnostics) {
    ForEachEvaluator::new(expr, ctx).resource_value()
}

/// Interprets the expression given for a `for_each` argument on a resource,
/// module or import, applying the rules of the requested use.
///
/// An evaluator is meant for a single use. It keeps the evaluation context
/// built for the expression so that diagnostics can describe the values the
/// expression referred to.
pub struct ForEachEvaluator<'a> {
    ctx: &'a dyn EvaluationContext,
    expr: Option<&'a dyn Expression>,
    eval_context: Option<Rc<EvalContext>>,
}

impl<'a> ForEachEvaluator<'a> {
    pub fn new(expr: Option<&'a dyn Expression>, ctx: &'a dyn EvaluationContext) -> Self {
        Self {
            ctx,
            expr,
            eval_context: None,
        }
    }

    /// Returns a key to value mapping appropriate for resource and module
    /// expansion. The value must be known, although a known map may hold
    /// unknown values.
    pub fn resource_value(&mut self) -> (BTreeMap<Rc<str>, Value>, Diagnostics) {
        let res = BTreeMap::new();

        // no expression always results in an empty map
        let Some(expr) = self.expr else {
            return (res, Diagnostics::new());
        };
        debug!("evaluating for_each for resource expansion at {:?}", expr.range());

        let (value, mut diags) = self.value();
        if diags.has_errors() {
            return (res, diags);
        }

        diags.append(self.ensure_known_for_resource(&value));
        if diags.has_errors() {
            return (res, diags);
        }

        diags.append(self.validate_resource(&value));
        if diags.has_errors() {
            return (res, diags);
        }

        // Empty containers must take this branch: they are valid and expand
        // to no instances, and are never handed to the map conversion below.
        if value.is_null() || !value.is_known() || value.mark_safe_length() == 0 {
            return (res, diags);
        }

        // Marks on the container move onto every value of the mapping.
        let (value, marks) = value.unmark();
        match value.as_value_map() {
            Ok(map) => {
                let res = map
                    .into_iter()
                    .map(|(k, v)| (k, v.with_marks(marks.iter().cloned())))
                    .collect::<BTreeMap<_, _>>();
                debug!("for_each expands to {} instances", res.len());
                (res, diags)
            }
            Err(e) => {
                diags.push(self.annotate(Diagnostic::error(
                    "Invalid for_each argument",
                    format!("The given \"for_each\" argument value is unsuitable: {e}."),
                )));
                (res, diags)
            }
        }
    }

    /// Returns the `for_each` elements for use within an import block,
    /// enumerated as individual repetitions.
    ///
    /// The value must be entirely known. No type, sensitivity or emptiness
    /// check is made here: the configuration is expected to have been
    /// validated already, and this operation only enumerates it. Marks on the
    /// container are carried onto every element value.
    pub fn import_values(&mut self) -> (Vec<RepetitionData>, Diagnostics) {
        let mut res = vec![];
        let Some(expr) = self.expr else {
            return (res, Diagnostics::new());
        };
        debug!("evaluating for_each for import expansion at {:?}", expr.range());

        let (value, mut diags) = self.value();
        if diags.has_errors() {
            return (res, diags);
        }

        diags.append(self.ensure_known_for_import(&value));
        if diags.has_errors() {
            return (res, diags);
        }

        if value.is_null() {
            return (res, diags);
        }

        let (value, marks) = value.unmark();
        for (key, item) in value.elements() {
            res.push(RepetitionData {
                each_key: key,
                each_value: item.clone().with_marks(marks.iter().cloned()),
            });
        }
        debug!("for_each enumerates {} import repetitions", res.len());

        (res, diags)
    }

    /// Returns the raw value of the `for_each` expression.
    ///
    /// An absent expression yields a null `map(dynamic)`. When the evaluation
    /// scope cannot be built the expression is not evaluated at all and the
    /// dynamic unknown value is returned with the diagnostics explaining why.
    pub fn value(&mut self) -> (Value, Diagnostics) {
        let Some(expr) = self.expr else {
            // a missing expression always results in a null value
            return (Value::null(Type::map(Type::Dynamic)), Diagnostics::new());
        };

        let (refs, mut diags) = expr.references();
        let eval_context = match self.ctx.evaluation_scope() {
            Some(scope) => {
                let (eval_context, more_diags) = scope.eval_context(&refs);
                diags.append(more_diags);
                eval_context
            }
            None => EvalContext::new(),
        };
        let eval_context = Rc::new(eval_context);
        self.eval_context = Some(eval_context.clone());

        // Can't continue if we don't even have a valid scope
        if diags.has_errors() {
            return (Value::dynamic(), diags);
        }

        let (value, more_diags) = expr.value(&eval_context);
        diags.append(more_diags);
        (value, diags)
    }

    /// Validates the `for_each` value during a validation pass, where unknown
    /// values and undetermined types are allowed.
    ///
    /// An absent expression is a valid declaration of no repetition and
    /// produces no diagnostics.
    pub fn validate_resource_value(&mut self) -> Diagnostics {
        let Some(expr) = self.expr else {
            return Diagnostics::new();
        };
        debug!("validating for_each at {:?}", expr.range());

        let (value, mut diags) = self.value();
        if diags.has_errors() {
            return diags;
        }

        diags.append(self.validate_resource(&value));
        diags
    }

    // Checks that the value is entirely known for use within import
    // expansion.
    fn ensure_known_for_import(&self, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        if !value.is_wholly_known() {
            diags.push(self.reject(ForEachError::PartiallyUnknownForbidden));
        }
        diags
    }

    // Checks that the value is known within the rules of resource and module
    // expansion: the value itself must be known, and a set may not hold
    // unknown elements because they would become instance keys.
    fn ensure_known_for_resource(&self, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let is_set = value.ty().is_set();

        if !value.is_known() {
            diags.push(self.reject(if is_set {
                ForEachError::UnknownSetValues
            } else {
                ForEachError::UnknownMapKeys
            }));
            return diags;
        }

        if is_set && !value.is_wholly_known() {
            diags.push(self.reject(ForEachError::UnknownSetValues));
        }
        diags
    }

    fn validate_resource(&self, value: &Value) -> Diagnostics {
        match rules::validate(value) {
            Some(err) => self.reject(err).into(),
            None => Diagnostics::new(),
        }
    }

    fn reject(&self, err: ForEachError) -> Diagnostic {
        self.annotate(Diagnostic::from(err))
    }

    // Attaches the expression, its range, its references and the evaluation
    // context.
    fn annotate(&self, mut diag: Diagnostic) -> Diagnostic {
        if let Some(expr) = self.expr {
            let range = expr.range();
            diag.expression = Some(range.text().to_string());
            diag.references = expr.references().0.into_iter().map(|r| r.address).collect();
            diag.subject = Some(range);
        }
        diag.eval_context = self.eval_context.clone();
        diag
    }
}
