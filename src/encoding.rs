// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoding of annotated JSON/YAML documents into dynamic values.
//!
//! Plain JSON can only describe known values. The following encodings
//! describe the rest:
//!
//! ```yaml
//! "#unknown"                    # unknown value of undetermined type
//! unknown!: set(string)         # unknown value of the given type
//! null!: map(string)            # null value of the given type
//! set!: [a, b]                  # set; an optional `type` key gives the element type
//! list!: [a, b]                 # list; an optional `type` key gives the element type
//! map!: { a: x }                # map (plain objects decode as objects)
//! sensitive!: value             # value marked sensitive
//! marks!: [ephemeral, audit]    # value carrying the given marks
//! value: ...
//! ```
//!
//! Expressions use `ref!: var.name`, `toset!: <expression>` and
//! `literal!: <value>`; anything else is a literal.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::expr::Expr;
use crate::marks::Mark;
use crate::source::Span;
use crate::types::Type;
use crate::value::Value;
use crate::Rc;

/// The single annotation key of an annotated object, if it is one.
fn annotation(v: &Value) -> Option<&str> {
    let entries = v.as_entries().ok()?;
    entries
        .keys()
        .find(|k| k.ends_with('!'))
        .map(|k| k.as_ref())
}

fn element_type(v: &Value) -> Result<Option<Type>> {
    match v.get("type") {
        Some(t) => Ok(Some(Type::from_str(t.as_str()?)?)),
        None => Ok(None),
    }
}

fn decode_items(items: &Value) -> Result<Vec<Value>> {
    items
        .as_list()
        .context("expected a sequence")?
        .iter()
        .map(decode_value)
        .collect()
}

fn decode_entries(entries: &Value) -> Result<BTreeMap<Rc<str>, Value>> {
    entries
        .as_entries()
        .context("expected a mapping")?
        .iter()
        .map(|(k, v)| -> Result<(Rc<str>, Value)> { Ok((k.clone(), decode_value(v)?)) })
        .collect()
}

/// Decodes an annotated document into the value it describes.
pub fn decode_value(v: &Value) -> Result<Value> {
    if let Ok(s) = v.as_str() {
        if s.as_ref() == "#unknown" {
            return Ok(Value::dynamic());
        }
    }

    match annotation(v) {
        Some("unknown!") => {
            let ty = v.get("unknown!").map(Value::as_str).transpose()?;
            let ty = ty.map(|t| Type::from_str(t)).transpose()?;
            Ok(Value::unknown(ty.unwrap_or(Type::Dynamic)))
        }
        Some("null!") => {
            let ty = v.get("null!").map(Value::as_str).transpose()?;
            let ty = ty.map(|t| Type::from_str(t)).transpose()?;
            Ok(Value::null(ty.unwrap_or(Type::Dynamic)))
        }
        Some("set!") => {
            let items = decode_items(v.get("set!").context("missing set! items")?)?;
            Ok(match element_type(v)? {
                Some(ty) => Value::set_of(ty, items),
                None => Value::set(items),
            })
        }
        Some("list!") => {
            let items = decode_items(v.get("list!").context("missing list! items")?)?;
            Ok(match element_type(v)? {
                Some(ty) => Value::list_of(ty, items),
                None => Value::list(items),
            })
        }
        Some("map!") => {
            let entries = decode_entries(v.get("map!").context("missing map! entries")?)?;
            Ok(match element_type(v)? {
                Some(ty) => Value::map_of(ty, entries),
                None => Value::map(entries),
            })
        }
        Some("sensitive!") => {
            let inner = decode_value(v.get("sensitive!").context("missing sensitive! value")?)?;
            Ok(inner.mark(Mark::Sensitive))
        }
        Some("marks!") => {
            let marks = v
                .get("marks!")
                .context("missing marks!")?
                .as_list()?
                .iter()
                .map(|m| Mark::from_str(m.as_str()?))
                .collect::<Result<Vec<_>>>()?;
            let inner = decode_value(v.get("value").context("marks! requires a value")?)?;
            Ok(inner.with_marks(marks))
        }
        Some(other) => bail!("unsupported annotation `{other}`"),
        None if v.ty().is_object() => Ok(Value::object(decode_entries(v)?)),
        None if v.ty().is_list() => Ok(Value::list(decode_items(v)?)),
        None => Ok(v.clone()),
    }
}

/// Decodes an annotated expression document. Every node gets `span`.
pub fn decode_expr(v: &Value, span: &Span) -> Result<Expr> {
    match annotation(v) {
        Some("ref!") => Ok(Expr::Ref {
            address: v.get("ref!").context("missing ref!")?.as_str()?.clone(),
            span: span.clone(),
        }),
        Some("toset!") => Ok(Expr::ToSet {
            arg: Box::new(decode_expr(
                v.get("toset!").context("missing toset! argument")?,
                span,
            )?),
            span: span.clone(),
        }),
        Some("literal!") => Ok(Expr::Literal {
            value: decode_value(v.get("literal!").context("missing literal!")?)?,
            span: span.clone(),
        }),
        _ => Ok(Expr::Literal {
            value: decode_value(v)?,
            span: span.clone(),
        }),
    }
}
