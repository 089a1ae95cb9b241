// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Structural checks applied to a resolved `for_each` value.
//!
//! The rules run in a fixed order and the first rule that does not return
//! [`Outcome::Continue`] decides the result. Sensitivity is checked before
//! anything that could inspect or print the content of the value.

use log::trace;

use crate::error::ForEachError;
use crate::marks::Mark;
use crate::types::Type;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to report; the next rule decides.
    Continue,
    /// The value is acceptable and no further rule applies.
    Accept,
    Reject(ForEachError),
}

type Rule = fn(&Value) -> Outcome;

const RULES: &[(&str, Rule)] = &[
    ("sensitivity", sensitivity),
    ("nullness", nullness),
    ("indeterminate type", indeterminate_type),
    ("container kind", container_kind),
    ("knowability", knowability),
    ("emptiness", emptiness),
    ("set depth", set_depth),
    ("set element type", set_element_type),
    ("set element nullness", set_element_nullness),
];

/// Runs the rule chain and returns the first rejection, if any.
///
/// Unknown values and values of undetermined type are accepted without any
/// check that needs concrete content, so the chain can run during a
/// validation pass where nothing is known yet.
pub fn validate(value: &Value) -> Option<ForEachError> {
    for (name, rule) in RULES {
        match rule(value) {
            Outcome::Continue => continue,
            Outcome::Accept => {
                trace!("for_each rule `{name}` accepted value of type {}", value.ty());
                return None;
            }
            Outcome::Reject(err) => {
                trace!("for_each rule `{name}` rejected value: {}", err.code());
                return Some(err);
            }
        }
    }
    None
}

fn sensitivity(value: &Value) -> Outcome {
    if value.has_mark(&Mark::Sensitive) {
        Outcome::Reject(ForEachError::SensitiveValueForbidden)
    } else {
        Outcome::Continue
    }
}

fn nullness(value: &Value) -> Outcome {
    if value.is_null() {
        Outcome::Reject(ForEachError::NullValueForbidden)
    } else {
        Outcome::Continue
    }
}

// Only reachable while validating: during planning unknown values are
// rejected before the rules run.
fn indeterminate_type(value: &Value) -> Outcome {
    if value.ty().is_dynamic() {
        Outcome::Accept
    } else {
        Outcome::Continue
    }
}

fn container_kind(value: &Value) -> Outcome {
    let ty = value.ty();
    if ty.is_map() || ty.is_set() || ty.is_object() {
        Outcome::Continue
    } else {
        Outcome::Reject(ForEachError::WrongContainerKind {
            ty: ty.friendly_name(),
        })
    }
}

fn knowability(value: &Value) -> Outcome {
    if value.is_known() {
        Outcome::Continue
    } else {
        Outcome::Accept
    }
}

// Empty containers stop here so that callers can return their canonical
// empty result without converting the value.
fn emptiness(value: &Value) -> Outcome {
    if value.mark_safe_length() == 0 {
        Outcome::Accept
    } else {
        Outcome::Continue
    }
}

// Unknown set elements make the whole set unknown.
fn set_depth(value: &Value) -> Outcome {
    if value.ty().is_set() && !value.is_wholly_known() {
        Outcome::Accept
    } else {
        Outcome::Continue
    }
}

fn set_element_type(value: &Value) -> Outcome {
    match value.ty() {
        Type::Set(element) if **element != Type::String => {
            Outcome::Reject(ForEachError::SetElementWrongType {
                ty: element.friendly_name(),
            })
        }
        _ => Outcome::Continue,
    }
}

fn set_element_nullness(value: &Value) -> Outcome {
    if value.ty().is_set() && value.elements().any(|(_, item)| item.is_null()) {
        Outcome::Reject(ForEachError::SetElementNull)
    } else {
        Outcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rc;
    use std::collections::BTreeMap;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::map(
            pairs
                .iter()
                .map(|(k, v)| (Rc::from(*k), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn sensitivity_is_checked_first() {
        // Sensitive and null: sensitivity wins.
        let v = Value::null(Type::map(Type::String)).mark(Mark::Sensitive);
        assert_eq!(validate(&v), Some(ForEachError::SensitiveValueForbidden));

        // Sensitive and of the wrong kind: sensitivity wins.
        let v = Value::string("x").mark(Mark::Sensitive);
        assert_eq!(validate(&v), Some(ForEachError::SensitiveValueForbidden));

        // Sensitive and unknown.
        let v = Value::unknown(Type::map(Type::String)).mark(Mark::Sensitive);
        assert_eq!(validate(&v), Some(ForEachError::SensitiveValueForbidden));
    }

    #[test]
    fn null_is_rejected() {
        assert_eq!(
            validate(&Value::null(Type::map(Type::String))),
            Some(ForEachError::NullValueForbidden)
        );
        assert_eq!(
            validate(&Value::null(Type::Dynamic)),
            Some(ForEachError::NullValueForbidden)
        );
    }

    #[test]
    fn dynamic_type_is_accepted() {
        assert_eq!(validate(&Value::dynamic()), None);
    }

    #[test]
    fn wrong_kinds_name_the_type() {
        assert_eq!(
            validate(&Value::list(vec![Value::string("a")])),
            Some(ForEachError::WrongContainerKind {
                ty: "list of string".to_string()
            })
        );
        assert_eq!(
            validate(&Value::string("a")),
            Some(ForEachError::WrongContainerKind {
                ty: "string".to_string()
            })
        );
        // Kind is checked even when the value is unknown.
        assert_eq!(
            validate(&Value::unknown(Type::Number)),
            Some(ForEachError::WrongContainerKind {
                ty: "number".to_string()
            })
        );
    }

    #[test]
    fn unknown_containers_are_accepted() {
        assert_eq!(validate(&Value::unknown(Type::map(Type::String))), None);
        assert_eq!(validate(&Value::unknown(Type::set(Type::Number))), None);
    }

    #[test]
    fn empty_containers_are_accepted() {
        assert_eq!(validate(&Value::set_of(Type::Number, vec![])), None);
        assert_eq!(validate(&Value::empty_object()), None);
    }

    #[test]
    fn sets_with_unknown_elements_are_accepted() {
        let set = Value::set(vec![Value::string("a"), Value::unknown(Type::String)]);
        assert_eq!(validate(&set), None);
        // Even with the wrong element type: the set counts as unknown.
        let set = Value::set(vec![Value::number(1u64), Value::unknown(Type::Number)]);
        assert_eq!(validate(&set), None);
    }

    #[test]
    fn set_element_checks() {
        let set = Value::set(vec![Value::number(1u64)]);
        assert_eq!(
            validate(&set),
            Some(ForEachError::SetElementWrongType {
                ty: "number".to_string()
            })
        );

        let set = Value::set(vec![Value::string("a"), Value::null(Type::String)]);
        assert_eq!(validate(&set), Some(ForEachError::SetElementNull));
    }

    #[test]
    fn maps_with_unknown_values_are_accepted() {
        let v = map(&[("a", Value::string("x")), ("b", Value::unknown(Type::String))]);
        assert_eq!(validate(&v), None);
    }

    #[test]
    fn nested_sensitive_values_are_not_rejected() {
        let v = map(&[("a", Value::string("x").mark(Mark::Sensitive))]);
        assert_eq!(validate(&v), None);
    }
}
