// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::panic, clippy::unwrap_used)] // test harness asserts and unwraps to validate evaluator behavior

use std::env;

use crate::test_utils::{check_errors, check_output};
use crate::*;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use test_generator::test_resources;

#[derive(Serialize, Deserialize, PartialEq, Debug, Default)]
#[serde(deny_unknown_fields)]
struct Expectation {
    want_result: Option<Value>,
    want_error_code: Option<String>,
    want_summary: Option<String>,
    want_cause: Option<String>,
    want_detail: Option<String>,
}

impl Expectation {
    fn check_errors(&self, diags: &Diagnostics) -> Result<()> {
        check_errors(
            diags,
            self.want_error_code.as_deref(),
            self.want_summary.as_deref(),
            self.want_cause.as_deref(),
            self.want_detail.as_deref(),
        )
    }
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    /// Annotated expression; absent means no `for_each` argument.
    for_each: Option<Value>,
    /// Values in scope, keyed by reference address.
    variables: Option<Value>,
    /// Evaluate without any scope.
    #[serde(default)]
    no_scope: bool,
    resource: Option<Expectation>,
    import: Option<Expectation>,
    validate: Option<Expectation>,
    skip: Option<bool>,
}

#[derive(Serialize, Deserialize, PartialEq, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn run_case(case: &TestCase, file: &str) -> Result<()> {
    let source = Source::from_contents(
        format!("{file}:{}", case.note),
        serde_yaml::to_string(&case.for_each)?,
    )?;
    let expr = match &case.for_each {
        Some(doc) => Some(decode_expr(doc, &source.full_span())?),
        None => None,
    };
    let expr_ref = expr.as_ref().map(|e| e as &dyn Expression);

    let scope = match &case.variables {
        Some(vars) => StaticScope::from_value(&decode_value(vars)?)?,
        None => StaticScope::new(),
    };
    let ctx: &dyn EvaluationContext = if case.no_scope { &Unscoped } else { &scope };

    if let Some(want) = &case.resource {
        let (map, diags) = ForEachEvaluator::new(expr_ref, ctx).resource_value();
        want.check_errors(&diags)?;
        if let Some(expected) = &want.want_result {
            check_output(&[Value::object(map)], &[expected.clone()])?;
        } else if !map.is_empty() {
            bail!("expected an empty mapping alongside the error");
        }
    }

    if let Some(want) = &case.import {
        let (records, diags) = ForEachEvaluator::new(expr_ref, ctx).import_values();
        want.check_errors(&diags)?;
        let computed: Vec<Value> = records
            .into_iter()
            .map(|r| {
                let mut record = std::collections::BTreeMap::new();
                record.insert(Rc::from("key"), r.each_key);
                record.insert(Rc::from("value"), r.each_value);
                Value::object(record)
            })
            .collect();
        match &want.want_result {
            Some(expected) => check_output(&computed, expected.as_list()?)?,
            None if !computed.is_empty() => {
                bail!("expected no import repetitions, got {}", computed.len())
            }
            None => (),
        }
    }

    if let Some(want) = &case.validate {
        let diags = ForEachEvaluator::new(expr_ref, ctx).validate_resource_value();
        want.check_errors(&diags)?;
    }

    Ok(())
}

fn yaml_test_impl(file: &str) -> Result<()> {
    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    println!("running {file}");

    for case in &test.cases {
        print!("case {} ", case.note);
        if case.skip == Some(true) {
            println!("skipped");
            continue;
        }

        match run_case(case, file) {
            Ok(()) => println!("passed"),
            Err(e) => {
                println!("failed");
                bail!("{}: {e}", case.note);
            }
        }
    }

    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{}", e);
        }
    }
}

#[test]
fn yaml_test_basic() -> Result<()> {
    yaml_test("tests/for_each/cases/basic.yaml")
}

#[test]
#[ignore = "intended for running a single yaml file passed on the command line"]
fn one_yaml() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut file = String::default();
    for a in env::args() {
        if a.ends_with(".yaml") {
            file = a;
        }
    }

    if file.is_empty() {
        bail!("missing <test.yaml>");
    }

    yaml_test(file.as_str())
}

#[test_resources("tests/for_each/cases/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
