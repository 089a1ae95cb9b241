// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::marks::{Mark, Marks};
use crate::number::Number;
use crate::types::Type;
use crate::Rc;

use core::fmt;
use std::collections::{btree_map, btree_set, BTreeMap, BTreeSet};
use std::iter::Enumerate;
use std::slice;

use anyhow::{anyhow, bail, Result};
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// How much of a value's content is available now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Knowability {
    Known,
    /// A known container holding at least one unknown value at some depth.
    PartiallyKnown,
    Unknown,
}

/// Concrete content of a known value.
///
/// Maps and objects share the same representation; the value's type tells
/// them apart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Known {
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    List(Rc<Vec<Value>>),
    Set(Rc<BTreeSet<Value>>),
    Map(Rc<BTreeMap<Rc<str>, Value>>),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Repr {
    Null,
    Unknown,
    Known(Known),
}

/// A dynamic value: a type, a three-state representation and a set of marks.
///
/// Values are immutable. Every operation that takes marks off a value hands
/// them back to the caller so they can be re-attached to derived values.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Value {
    ty: Type,
    repr: Repr,
    marks: Marks,
}

impl Value {
    fn new(ty: Type, repr: Repr) -> Value {
        Value {
            ty,
            repr,
            marks: Marks::new(),
        }
    }

    pub fn null(ty: Type) -> Value {
        Value::new(ty, Repr::Null)
    }

    pub fn unknown(ty: Type) -> Value {
        Value::new(ty, Repr::Unknown)
    }

    /// The maximally unknown value: unknown content of undetermined type.
    pub fn dynamic() -> Value {
        Value::unknown(Type::Dynamic)
    }

    pub fn string<S: Into<Rc<str>>>(s: S) -> Value {
        Value::new(Type::String, Repr::Known(Known::String(s.into())))
    }

    pub fn number<N: Into<Number>>(n: N) -> Value {
        Value::new(Type::Number, Repr::Known(Known::Number(n.into())))
    }

    pub fn bool(b: bool) -> Value {
        Value::new(Type::Bool, Repr::Known(Known::Bool(b)))
    }

    /// A list whose element type is the common type of `items`.
    pub fn list(items: Vec<Value>) -> Value {
        let element = Type::unify(items.iter().map(Value::ty));
        Value::list_of(element, items)
    }

    pub fn list_of(element: Type, items: Vec<Value>) -> Value {
        Value::new(Type::list(element), Repr::Known(Known::List(Rc::new(items))))
    }

    /// A set whose element type is the common type of `items`.
    ///
    /// Set elements never carry marks: marks found anywhere inside an element
    /// are moved onto the set itself.
    pub fn set(items: Vec<Value>) -> Value {
        let element = Type::unify(items.iter().map(Value::ty));
        Value::set_of(element, items)
    }

    pub fn set_of(element: Type, items: Vec<Value>) -> Value {
        let mut hoisted = Marks::new();
        let mut set = BTreeSet::new();
        for item in items {
            let (item, marks) = item.unmark_deep();
            hoisted.extend(marks);
            set.insert(item);
        }
        Value::new(Type::set(element), Repr::Known(Known::Set(Rc::new(set)))).with_marks(hoisted)
    }

    /// A map whose element type is the common type of its values.
    pub fn map(entries: BTreeMap<Rc<str>, Value>) -> Value {
        let element = Type::unify(entries.values().map(Value::ty));
        Value::map_of(element, entries)
    }

    pub fn map_of(element: Type, entries: BTreeMap<Rc<str>, Value>) -> Value {
        Value::new(Type::map(element), Repr::Known(Known::Map(Rc::new(entries))))
    }

    pub fn object(attrs: BTreeMap<Rc<str>, Value>) -> Value {
        let ty = Type::Object(
            attrs
                .iter()
                .map(|(name, v)| (name.clone(), v.ty.clone()))
                .collect(),
        );
        Value::new(ty, Repr::Known(Known::Map(Rc::new(attrs))))
    }

    pub fn empty_object() -> Value {
        Value::object(BTreeMap::new())
    }
}

impl Value {
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    /// Whether the top level of the value is known. A known container may
    /// still hold unknown elements.
    pub fn is_known(&self) -> bool {
        !matches!(self.repr, Repr::Unknown)
    }

    /// Whether the value and everything nested inside it is known.
    pub fn is_wholly_known(&self) -> bool {
        match &self.repr {
            Repr::Unknown => false,
            Repr::Null => true,
            Repr::Known(Known::List(items)) => items.iter().all(Value::is_wholly_known),
            Repr::Known(Known::Set(items)) => items.iter().all(Value::is_wholly_known),
            Repr::Known(Known::Map(entries)) => entries.values().all(Value::is_wholly_known),
            Repr::Known(_) => true,
        }
    }

    pub fn knowability(&self) -> Knowability {
        if !self.is_known() {
            Knowability::Unknown
        } else if self.is_wholly_known() {
            Knowability::Known
        } else {
            Knowability::PartiallyKnown
        }
    }

    pub fn as_str(&self) -> Result<&Rc<str>> {
        match &self.repr {
            Repr::Known(Known::String(s)) => Ok(s),
            _ => Err(anyhow!("not a known string")),
        }
    }

    pub fn as_number(&self) -> Result<&Number> {
        match &self.repr {
            Repr::Known(Known::Number(n)) => Ok(n),
            _ => Err(anyhow!("not a known number")),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match &self.repr {
            Repr::Known(Known::Bool(b)) => Ok(*b),
            _ => Err(anyhow!("not a known bool")),
        }
    }

    pub fn as_list(&self) -> Result<&Vec<Value>> {
        match &self.repr {
            Repr::Known(Known::List(items)) => Ok(items),
            _ => Err(anyhow!("not a known list")),
        }
    }

    pub fn as_set(&self) -> Result<&BTreeSet<Value>> {
        match &self.repr {
            Repr::Known(Known::Set(items)) => Ok(items),
            _ => Err(anyhow!("not a known set")),
        }
    }

    /// Entries of a known map or object.
    pub fn as_entries(&self) -> Result<&BTreeMap<Rc<str>, Value>> {
        match &self.repr {
            Repr::Known(Known::Map(entries)) => Ok(entries),
            _ => Err(anyhow!("not a known map or object")),
        }
    }

    /// Looks up a map key or object attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_entries().ok().and_then(|entries| entries.get(key))
    }

    /// Number of elements of a known list, set, map or object.
    ///
    /// Null, unknown and primitive values have no elements and report zero.
    pub fn length(&self) -> usize {
        match &self.repr {
            Repr::Known(Known::List(items)) => items.len(),
            Repr::Known(Known::Set(items)) => items.len(),
            Repr::Known(Known::Map(entries)) => entries.len(),
            _ => 0,
        }
    }

    /// Element count computed on the deeply unmarked value.
    pub fn mark_safe_length(&self) -> usize {
        let (value, _) = self.clone().unmark_deep();
        value.length()
    }

    /// Iterates the elements of a known container in a deterministic order.
    ///
    /// Keys are the map keys or object attribute names for maps and objects,
    /// the element itself for sets and the index for lists. Sets iterate in
    /// value order, which for strings is lexical order.
    pub fn elements(&self) -> Elements<'_> {
        match &self.repr {
            Repr::Known(Known::List(items)) => Elements::List(items.iter().enumerate()),
            Repr::Known(Known::Set(items)) => Elements::Set(items.iter()),
            Repr::Known(Known::Map(entries)) => Elements::Map(entries.iter()),
            _ => Elements::Empty,
        }
    }

    /// Converts a known map, object or set of strings into a key to value
    /// mapping. Set elements become both key and value.
    ///
    /// An empty container converts into an empty mapping.
    pub fn as_value_map(&self) -> Result<BTreeMap<Rc<str>, Value>> {
        match &self.repr {
            Repr::Known(Known::Map(entries)) => Ok(entries.as_ref().clone()),
            Repr::Known(Known::Set(items)) => {
                let mut res = BTreeMap::new();
                for item in items.iter() {
                    match &item.repr {
                        Repr::Known(Known::String(s)) => {
                            res.insert(s.clone(), item.clone());
                        }
                        _ => bail!("set element of type {} is not a known string", item.ty),
                    }
                }
                Ok(res)
            }
            Repr::Null => bail!("cannot convert null value to a map"),
            Repr::Unknown => bail!("cannot convert unknown value to a map"),
            Repr::Known(_) => bail!("cannot convert {} to a map", self.ty.friendly_name()),
        }
    }
}

/// Mark handling.
impl Value {
    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn is_marked(&self) -> bool {
        !self.marks.is_empty()
    }

    /// Whether the value itself carries `mark`. Nested values are not
    /// inspected.
    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }

    /// Whether `mark` appears on the value or anywhere inside it.
    pub fn has_mark_deep(&self, mark: &Mark) -> bool {
        if self.has_mark(mark) {
            return true;
        }
        match &self.repr {
            Repr::Known(Known::List(items)) => items.iter().any(|v| v.has_mark_deep(mark)),
            Repr::Known(Known::Set(items)) => items.iter().any(|v| v.has_mark_deep(mark)),
            Repr::Known(Known::Map(entries)) => entries.values().any(|v| v.has_mark_deep(mark)),
            _ => false,
        }
    }

    pub fn mark(mut self, mark: Mark) -> Value {
        self.marks.insert(mark);
        self
    }

    /// Adds `marks` to the marks already present on the value.
    pub fn with_marks<I>(mut self, marks: I) -> Value
    where
        I: IntoIterator<Item = Mark>,
    {
        self.marks.extend(marks);
        self
    }

    /// Removes the top level marks and returns them alongside the value.
    pub fn unmark(mut self) -> (Value, Marks) {
        let marks = core::mem::take(&mut self.marks);
        (self, marks)
    }

    /// Removes marks at every depth and returns their union.
    pub fn unmark_deep(self) -> (Value, Marks) {
        let (mut value, mut marks) = self.unmark();
        value.repr = match value.repr {
            Repr::Known(Known::List(items)) => {
                let items = items
                    .iter()
                    .map(|v| {
                        let (v, m) = v.clone().unmark_deep();
                        marks.extend(m);
                        v
                    })
                    .collect();
                Repr::Known(Known::List(Rc::new(items)))
            }
            Repr::Known(Known::Set(items)) => {
                let items = items
                    .iter()
                    .map(|v| {
                        let (v, m) = v.clone().unmark_deep();
                        marks.extend(m);
                        v
                    })
                    .collect();
                Repr::Known(Known::Set(Rc::new(items)))
            }
            Repr::Known(Known::Map(entries)) => {
                let entries = entries
                    .iter()
                    .map(|(k, v)| {
                        let (v, m) = v.clone().unmark_deep();
                        marks.extend(m);
                        (k.clone(), v)
                    })
                    .collect();
                Repr::Known(Known::Map(Rc::new(entries)))
            }
            repr => repr,
        };
        (value, marks)
    }
}

/// Element iterator returned by [`Value::elements`].
pub enum Elements<'a> {
    Empty,
    List(Enumerate<slice::Iter<'a, Value>>),
    Set(btree_set::Iter<'a, Value>),
    Map(btree_map::Iter<'a, Rc<str>, Value>),
}

impl<'a> Iterator for Elements<'a> {
    type Item = (Value, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Elements::Empty => None,
            Elements::List(it) => it.next().map(|(idx, v)| (Value::number(idx), v)),
            Elements::Set(it) => it.next().map(|v| (v.clone(), v)),
            Elements::Map(it) => it.next().map(|(k, v)| (Value::string(k.clone()), v)),
        }
    }
}

const SENSITIVE_PLACEHOLDER: &str = "<sensitive>";
const UNKNOWN_PLACEHOLDER: &str = "<unknown>";

// Sensitive values are redacted on serialization so that neither Display,
// diagnostics nor logs can echo their content.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.has_mark(&Mark::Sensitive) {
            return serializer.serialize_str(SENSITIVE_PLACEHOLDER);
        }
        match &self.repr {
            Repr::Null => serializer.serialize_none(),
            Repr::Unknown => serializer.serialize_str(UNKNOWN_PLACEHOLDER),
            Repr::Known(Known::Bool(b)) => serializer.serialize_bool(*b),
            Repr::Known(Known::Number(n)) => n.serialize(serializer),
            Repr::Known(Known::String(s)) => serializer.serialize_str(s),
            Repr::Known(Known::List(items)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            // display set as an array
            Repr::Known(Known::Set(items)) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Repr::Known(Known::Map(entries)) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries.iter() {
                    map.serialize_entry(k.as_ref(), v)?;
                }
                map.end()
            }
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a value")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::null(Type::Dynamic))
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::null(Type::Dynamic))
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::bool(v))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::number(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::number(v))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if !v.is_finite() {
            return Err(de::Error::custom(format!("{v} is not a valid number")));
        }
        Ok(Value::number(v))
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::string(s))
    }

    fn visit_string<E>(self, s: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Value::string(s))
    }

    fn visit_seq<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut items = vec![];
        while let Some(v) = visitor.next_element()? {
            items.push(v);
        }
        Ok(Value::list(items))
    }

    fn visit_map<V>(self, mut visitor: V) -> Result<Self::Value, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut attrs = BTreeMap::new();
        while let Some((key, value)) = visitor.next_entry::<String, Value>()? {
            attrs.insert(Rc::from(key), value);
        }
        Ok(Value::object(attrs))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{s}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.repr {
            _ if self.has_mark(&Mark::Sensitive) => write!(f, "{SENSITIVE_PLACEHOLDER}")?,
            Repr::Null => write!(f, "null({})", self.ty)?,
            Repr::Unknown => write!(f, "unknown({})", self.ty)?,
            Repr::Known(Known::Bool(b)) => write!(f, "{b}")?,
            Repr::Known(Known::Number(n)) => write!(f, "{n}")?,
            Repr::Known(Known::String(s)) => write!(f, "{s:?}")?,
            Repr::Known(Known::List(items)) => f.debug_list().entries(items.iter()).finish()?,
            Repr::Known(Known::Set(items)) => f.debug_set().entries(items.iter()).finish()?,
            Repr::Known(Known::Map(entries)) => f.debug_map().entries(entries.iter()).finish()?,
        }
        if self.is_marked() {
            let names: Vec<String> = self.marks.iter().map(ToString::to_string).collect();
            write!(f, "@[{}]", names.join(","))?;
        }
        Ok(())
    }
}

impl Value {
    pub fn from_json_str(json: &str) -> Result<Value> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_str(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Value> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_file(path: &str) -> Result<Value> {
        match std::fs::read_to_string(path) {
            Ok(c) => Self::from_yaml_str(c.as_str()),
            Err(e) => bail!("Failed to read {path}. {e}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::bool(b)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::number(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::number(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::number(n)
    }
}
