// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;

use anyhow::Result;
use repetition::*;

fn source() -> Result<Source> {
    Source::from_contents(
        "main.tf".to_string(),
        "for_each = var.regions".to_string(),
    )
}

fn regions(value: Value) -> Result<(Expr, StaticScope)> {
    let span = source()?.span(11, 22)?;
    let expr = Expr::Ref {
        address: "var.regions".into(),
        span,
    };
    Ok((expr, StaticScope::new().with("var.regions", value)))
}

fn entries(pairs: &[(&str, &str)]) -> BTreeMap<Rc<str>, Value> {
    pairs
        .iter()
        .map(|(k, v)| (Rc::from(*k), Value::string(*v)))
        .collect()
}

#[test]
fn resource_expansion_of_a_map() -> Result<()> {
    let (expr, scope) = regions(Value::map(entries(&[
        ("east", "us-east-1"),
        ("west", "us-west-2"),
    ])))?;

    let (map, diags) = evaluate_for_each_expression(Some(&expr), &scope);
    assert!(diags.is_empty());
    assert_eq!(map.len(), 2);
    assert_eq!(map.get("east"), Some(&Value::string("us-east-1")));
    Ok(())
}

#[test]
fn absent_expression_is_empty_everywhere() {
    let (map, diags) = evaluate_for_each_expression(None, &Unscoped);
    assert!(map.is_empty() && diags.is_empty());

    let (records, diags) = ForEachEvaluator::new(None, &Unscoped).import_values();
    assert!(records.is_empty() && diags.is_empty());

    assert!(ForEachEvaluator::new(None, &Unscoped)
        .validate_resource_value()
        .is_empty());
}

#[test]
fn resource_and_import_agree_on_known_values() -> Result<()> {
    let value = Value::set(vec![Value::string("b"), Value::string("a")]);
    let (expr, scope) = regions(value)?;

    let (map, diags) = ForEachEvaluator::new(Some(&expr), &scope).resource_value();
    diags.into_result()?;
    let (records, diags) = ForEachEvaluator::new(Some(&expr), &scope).import_values();
    diags.into_result()?;

    let from_import: BTreeMap<Rc<str>, Value> = records
        .into_iter()
        .map(|r| -> Result<(Rc<str>, Value)> { Ok((r.each_key.as_str()?.clone(), r.each_value)) })
        .collect::<Result<_>>()?;
    assert_eq!(map, from_import);
    Ok(())
}

#[test]
fn sensitive_values_are_never_echoed() -> Result<()> {
    let secret = Value::map(entries(&[("hunter2", "hunter2")])).mark(Mark::Sensitive);
    let (expr, scope) = regions(secret)?;

    let (map, diags) = evaluate_for_each_expression(Some(&expr), &scope);
    assert!(map.is_empty());

    let diag = diags.errors().next().expect("a sensitivity error");
    assert!(diag.caused_by_sensitive());
    assert_eq!(diag.code, Some("SensitiveValueForbidden"));

    let rendered = diags.to_string();
    assert!(rendered.contains("var.regions has a sensitive value"));
    assert!(!rendered.contains("hunter2"));
    assert!(!format!("{diag:?}").contains("hunter2"));
    Ok(())
}

#[test]
fn unknown_values_point_at_the_reference() -> Result<()> {
    let (expr, scope) = regions(Value::unknown(Type::map(Type::String)))?;

    let (_, diags) = evaluate_for_each_expression(Some(&expr), &scope);
    let diag = diags.errors().next().expect("an unknown value error");
    assert!(diag.caused_by_unknown());

    let subject = diag.subject.as_ref().expect("a subject range");
    assert_eq!(subject.text(), "var.regions");
    assert_eq!((subject.line, subject.col), (1, 12));

    let rendered = diag.to_string();
    assert!(rendered.contains("var.regions is a map of string, known only after apply"));
    Ok(())
}

#[test]
fn validation_accepts_what_planning_defers() -> Result<()> {
    let (expr, scope) = regions(Value::unknown(Type::set(Type::String)))?;

    let diags = ForEachEvaluator::new(Some(&expr), &scope).validate_resource_value();
    assert!(diags.is_empty());

    let (_, diags) = ForEachEvaluator::new(Some(&expr), &scope).resource_value();
    assert_eq!(diags.len(), 1);
    Ok(())
}

#[test]
fn rules_are_usable_on_their_own() {
    use repetition::unstable::validate;

    assert_eq!(validate(&Value::set(vec![Value::string("a")])), None);
    assert_eq!(
        validate(&Value::list(vec![Value::string("a")])),
        Some(ForEachError::WrongContainerKind {
            ty: "list of string".to_string()
        })
    );
    assert_eq!(validate(&Value::dynamic()), None);
}

#[test]
fn decoded_documents_evaluate() -> Result<()> {
    let doc = Value::from_json_str(r#"{"toset!": {"ref!": "var.names"}}"#)?;
    let expr = decode_expr(&doc, &source()?.full_span())?;
    let names = decode_value(&Value::from_json_str(r#"["a", "b", "a"]"#)?)?;
    let scope = StaticScope::new().with("var.names", names);

    let (map, diags) = evaluate_for_each_expression(Some(&expr), &scope);
    diags.into_result()?;
    assert_eq!(
        map.keys().map(|k| k.as_ref()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    Ok(())
}

#[cfg(feature = "yaml")]
#[test]
fn evaluate_document_from_file() -> Result<()> {
    let source = Source::from_file("demos/regions.yaml")?;
    assert_eq!(source.file(), "demos/regions.yaml");

    let doc = Value::from_yaml_str(source.contents())?;
    let scope = StaticScope::from_value(&decode_value(doc.get("variables").expect("variables"))?)?;
    let expr = decode_expr(doc.get("for_each").expect("for_each"), &source.full_span())?;

    let (map, diags) = evaluate_for_each_expression(Some(&expr), &scope);
    diags.into_result()?;
    assert_eq!(map.get("west"), Some(&Value::string("us-west-2")));

    assert!(Source::from_file("demos/missing.yaml").is_err());
    Ok(())
}
