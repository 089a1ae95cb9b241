// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use repetition::{
    decode_expr, decode_value, Diagnostics, EvaluationContext, Expression, ForEachEvaluator,
    Source, StaticScope, Value,
};

#[derive(Clone, Copy)]
enum Mode {
    Resource,
    Import,
    Validate,
}

// Reads a document with optional `variables` and a `for_each` expression.
fn read_document(file: &str) -> Result<(Source, Value)> {
    let source = Source::from_file(file).with_context(|| format!("Failed to read {file}"))?;

    let doc = if file.ends_with(".json") {
        Value::from_json_str(source.contents())?
    } else if file.ends_with(".yaml") {
        Value::from_yaml_str(source.contents())?
    } else {
        bail!("Unsupported document `{file}`. Must be json or yaml.")
    };

    Ok((source, doc))
}

fn print_diagnostics(diags: &Diagnostics) {
    if !diags.is_empty() {
        eprintln!("{diags}");
    }
}

fn for_each_eval(mode: Mode, file: &str) -> Result<()> {
    let (source, doc) = read_document(file)?;

    let scope = match doc.get("variables") {
        Some(vars) => StaticScope::from_value(&decode_value(vars)?)?,
        None => StaticScope::new(),
    };
    let expr = match doc.get("for_each") {
        Some(node) => Some(decode_expr(node, &source.full_span())?),
        None => None,
    };
    let expr = expr.as_ref().map(|e| e as &dyn Expression);
    let ctx: &dyn EvaluationContext = &scope;

    let mut evaluator = ForEachEvaluator::new(expr, ctx);
    let diags = match mode {
        Mode::Resource => {
            let (map, diags) = evaluator.resource_value();
            println!("{}", serde_json::to_string_pretty(&map)?);
            diags
        }
        Mode::Import => {
            let (records, diags) = evaluator.import_values();
            for record in records {
                println!("{} => {}", record.each_key, record.each_value);
            }
            diags
        }
        Mode::Validate => evaluator.validate_resource_value(),
    };

    print_diagnostics(&diags);
    if diags.has_errors() {
        bail!("for_each evaluation failed");
    }
    Ok(())
}

#[derive(Subcommand)]
enum ForEachCommand {
    /// Expand a for_each argument into resource instances.
    Resource {
        /// Document with `variables` and `for_each`.
        #[arg(value_name = "doc.yaml")]
        file: String,
    },

    /// Enumerate a for_each argument for an import block.
    Import {
        /// Document with `variables` and `for_each`.
        #[arg(value_name = "doc.yaml")]
        file: String,
    },

    /// Validate a for_each argument, allowing unknown values.
    Validate {
        /// Document with `variables` and `for_each`.
        #[arg(value_name = "doc.yaml")]
        file: String,
    },
}

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log evaluation steps. RUST_LOG selects the level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: ForEachCommand,
}

fn main() -> Result<()> {
    // Parse and dispatch command.
    let cli = Cli::parse();
    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
            .init();
    }

    match cli.command {
        ForEachCommand::Resource { file } => for_each_eval(Mode::Resource, &file),
        ForEachCommand::Import { file } => for_each_eval(Mode::Import, &file),
        ForEachCommand::Validate { file } => for_each_eval(Mode::Validate, &file),
    }
}
