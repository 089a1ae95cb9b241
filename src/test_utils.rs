// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for YAML-driven tests.

use crate::*;
use anyhow::{bail, Result};

/// Diff-friendly equality helper used by the YAML suites.
pub fn match_values(computed: &Value, expected: &Value) -> Result<()> {
    if computed != expected {
        // Debug output keeps types, knowability and marks visible.
        bail!("expected:\n{expected:#?}\ncomputed:\n{computed:#?}");
    }
    Ok(())
}

/// Compare computed values with annotated expected values.
pub fn check_output(computed_results: &[Value], expected_results: &[Value]) -> Result<()> {
    if computed_results.len() != expected_results.len() {
        bail!(
            "the number of computed results ({}) and expected results ({}) is not equal",
            computed_results.len(),
            expected_results.len()
        );
    }

    for (computed, expected) in computed_results.iter().zip(expected_results.iter()) {
        match_values(computed, &decode_value(expected)?)?;
    }

    Ok(())
}

/// Check the error diagnostics of an operation against expectations.
///
/// With neither an expected code nor summary, the diagnostics must hold
/// no error at all.
pub fn check_errors(
    diags: &Diagnostics,
    want_error_code: Option<&str>,
    want_summary: Option<&str>,
    want_cause: Option<&str>,
    want_detail: Option<&str>,
) -> Result<()> {
    if want_error_code.is_none() && want_summary.is_none() {
        if diags.has_errors() {
            bail!("unexpected errors:\n{diags}");
        }
        return Ok(());
    }

    let errors: Vec<&Diagnostic> = diags.errors().collect();
    let [diag] = errors.as_slice() else {
        bail!("expected exactly one error, got {}:\n{diags}", errors.len());
    };

    if want_error_code.is_some() && diag.code != want_error_code {
        bail!("expected error code {want_error_code:?}, got {:?}:\n{diag}", diag.code);
    }

    if let Some(summary) = want_summary {
        if diag.summary != summary {
            bail!("expected summary `{summary}`, got `{}`", diag.summary);
        }
    }

    let cause = match diag.cause {
        Some(Cause::Unknown) => Some("unknown"),
        Some(Cause::Sensitive) => Some("sensitive"),
        None => None,
    };
    if cause != want_cause {
        bail!("expected cause {want_cause:?}, got {cause:?}");
    }

    if let Some(fragment) = want_detail {
        if !diag.detail.contains(fragment) {
            bail!("detail does not contain `{fragment}`:\n{}", diag.detail);
        }
    }
    Ok(())
}
