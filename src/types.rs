// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::Rc;

/// The type of a dynamic value.
///
/// Null and unknown are not types: they are states of a value, and a null or
/// unknown value still carries the type it would have once known.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// The type is not determined yet.
    Dynamic,
    String,
    Number,
    Bool,
    List(Box<Type>),
    Set(Box<Type>),
    Map(Box<Type>),
    Object(BTreeMap<Rc<str>, Type>),
}

impl Type {
    pub fn list(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    pub fn set(element: Type) -> Type {
        Type::Set(Box::new(element))
    }

    pub fn map(element: Type) -> Type {
        Type::Map(Box::new(element))
    }

    pub fn empty_object() -> Type {
        Type::Object(BTreeMap::new())
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Dynamic)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Type::Set(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Type::Map(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Type::Object(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Type::List(_) | Type::Set(_) | Type::Map(_))
    }

    /// Human readable name used in diagnostics, e.g. `list of string`.
    pub fn friendly_name(&self) -> String {
        match self {
            Type::Dynamic => "dynamic".to_string(),
            Type::String => "string".to_string(),
            Type::Number => "number".to_string(),
            Type::Bool => "bool".to_string(),
            Type::List(t) => format!("list of {}", t.friendly_name()),
            Type::Set(t) => format!("set of {}", t.friendly_name()),
            Type::Map(t) => format!("map of {}", t.friendly_name()),
            Type::Object(_) => "object".to_string(),
        }
    }

    /// Common type of a sequence of element types; `dynamic` when they differ.
    pub fn unify<'a, I>(types: I) -> Type
    where
        I: IntoIterator<Item = &'a Type>,
    {
        let mut iter = types.into_iter();
        let first = match iter.next() {
            Some(t) => t,
            None => return Type::Dynamic,
        };
        if iter.all(|t| t == first) {
            first.clone()
        } else {
            Type::Dynamic
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Dynamic => f.write_str("dynamic"),
            Type::String => f.write_str("string"),
            Type::Number => f.write_str("number"),
            Type::Bool => f.write_str("bool"),
            Type::List(t) => write!(f, "list({t})"),
            Type::Set(t) => write!(f, "set({t})"),
            Type::Map(t) => write!(f, "map({t})"),
            Type::Object(attrs) => {
                f.write_str("object({")?;
                for (idx, (name, t)) in attrs.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={t}")?;
                }
                f.write_str("})")
            }
        }
    }
}

/// Parses the constraint syntax produced by `Display`:
/// `string`, `list(number)`, `set(string)`, `map(dynamic)`,
/// `object` and `object({a=string, b=bool})`.
impl FromStr for Type {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = TypeParser { text: s, pos: 0 };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            bail!("unexpected trailing characters in type `{s}`");
        }
        Ok(ty)
    }
}

struct TypeParser<'a> {
    text: &'a str,
    pos: usize,
}

impl TypeParser<'_> {
    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            bail!("expected `{ch}` at offset {} in type `{}`", self.pos, self.text)
        }
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&str> {
        self.skip_ws();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(self.rest().len());
        if len == 0 {
            bail!("expected a name at offset {} in type `{}`", start, self.text);
        }
        self.pos += len;
        Ok(&self.text[start..self.pos])
    }

    fn parse_type(&mut self) -> Result<Type> {
        let name = self.ident()?.to_string();
        Ok(match name.as_str() {
            "dynamic" | "any" => Type::Dynamic,
            "string" => Type::String,
            "number" => Type::Number,
            "bool" => Type::Bool,
            "list" | "set" | "map" => {
                self.expect('(')?;
                let element = self.parse_type()?;
                self.expect(')')?;
                match name.as_str() {
                    "list" => Type::list(element),
                    "set" => Type::set(element),
                    _ => Type::map(element),
                }
            }
            "object" => {
                let mut attrs = BTreeMap::new();
                if self.eat('(') {
                    self.expect('{')?;
                    if !self.eat('}') {
                        loop {
                            let attr: Rc<str> = self.ident()?.into();
                            self.expect('=')?;
                            attrs.insert(attr, self.parse_type()?);
                            if self.eat('}') {
                                break;
                            }
                            self.expect(',')?;
                        }
                    }
                    self.expect(')')?;
                }
                Type::Object(attrs)
            }
            _ => bail!("unknown type `{name}`"),
        })
    }
}
