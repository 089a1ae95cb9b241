// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;

use anyhow::Result;
use repetition::*;

#[test]
fn serialize_redacts_sensitive_values() -> Result<()> {
    let mut attrs = BTreeMap::new();
    attrs.insert(Rc::from("password"), Value::string("hunter2").mark(Mark::Sensitive));
    attrs.insert(Rc::from("id"), Value::unknown(Type::String));
    attrs.insert(Rc::from("count"), Value::number(2u64));
    let obj = Value::object(attrs);

    let json = serde_json::to_string(&obj)?;
    assert_eq!(
        json,
        r#"{"count":2,"id":"<unknown>","password":"<sensitive>"}"#
    );
    assert!(!format!("{obj:?}").contains("hunter2"));
    Ok(())
}

#[test]
fn serialize_number() -> Result<()> {
    // Integral floats are written without a fractional part.
    assert_eq!(serde_json::to_string(&Value::from(1.0))?, "1");
    assert_eq!(serde_json::to_string(&Value::from(-1.0))?, "-1");
    assert_eq!(serde_json::to_string(&Value::from(1.5))?, "1.5");
    Ok(())
}

#[test]
fn set_elements_are_ordered_and_unique() {
    let set = Value::set(vec![
        Value::string("b"),
        Value::string("a"),
        Value::string("b"),
    ]);
    assert_eq!(set.length(), 2);
    assert_eq!(set.to_string(), r#"["a","b"]"#);
}

#[test]
fn marks_on_set_elements_move_to_the_set() -> Result<()> {
    let set = Value::set(vec![
        Value::string("a"),
        Value::string("b").mark(Mark::Sensitive),
    ]);
    assert!(set.has_mark(&Mark::Sensitive));
    assert!(set.as_set()?.iter().all(|v| !v.is_marked()));
    Ok(())
}

#[test]
fn knowability_levels() {
    let partial = Value::list(vec![Value::string("a"), Value::unknown(Type::String)]);
    assert_eq!(partial.knowability(), Knowability::PartiallyKnown);
    assert_eq!(Value::dynamic().knowability(), Knowability::Unknown);
    assert_eq!(Value::string("a").knowability(), Knowability::Known);
    assert_eq!(Value::null(Type::String).knowability(), Knowability::Known);
}

#[test]
fn value_map_requires_string_keys() -> Result<()> {
    let strings = Value::set(vec![Value::string("x")]);
    let map = strings.as_value_map()?;
    assert_eq!(map.get("x"), Some(&Value::string("x")));

    let numbers = Value::set(vec![Value::number(1u64)]);
    assert!(numbers.as_value_map().is_err());
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn load_yaml_file() -> Result<()> {
    let doc = Value::from_yaml_file("demos/regions.yaml")?;
    let vars = decode_value(doc.get("variables").expect("variables"))?;
    let regions = vars.get("var.regions").expect("var.regions");
    assert_eq!(regions.ty(), &Type::map(Type::String));
    assert_eq!(regions.length(), 2);

    assert!(Value::from_yaml_file("demos/missing.yaml").is_err());
    Ok(())
}
