use std::path::PathBuf;

use anyhow::Context;
use colored::Colorize;
use mvs_expr::{render_template, Expression};
use mvs_persist::{FileLocalStore, LocalStore};
use mvs_types::StoreConfig;
use serde_json::{json, Value};

use crate::cli::*;
use crate::demo;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref())?;
    match cli.command {
        Command::Demo(args) => cmd_demo(args, config, cli.format),
        Command::Show(args) => cmd_show(args, config, cli.format),
        Command::Eval(args) => cmd_eval(args, cli.format),
        Command::Deps(args) => cmd_deps(args, cli.format),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<StoreConfig> {
    match path {
        Some(path) => Ok(StoreConfig::load(path)?),
        None => Ok(StoreConfig::default()),
    }
}

fn read_data(input: &DataArgs) -> anyhow::Result<Value> {
    let text = match (&input.data, &input.file) {
        (Some(data), _) => data.clone(),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?,
        (None, None) => return Ok(json!({})),
    };
    serde_json::from_str(&text).context("input is not valid JSON")
}

fn pretty(value: &Value) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn cmd_demo(args: DemoArgs, config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let tasks = demo::run(&args, config)?;
    let state = tasks.app.state()?;
    let summary = tasks.property(&tasks.app_element, "summary");
    let remaining = tasks.property(&tasks.list_element, "remaining");

    if format == OutputFormat::Json {
        let report = json!({
            "state": state,
            "summary": summary,
            "remaining": remaining,
        });
        println!("{}", pretty(&report)?);
        return Ok(());
    }

    let title = tasks.property(&tasks.list_element, "title");
    let title = title.as_str().filter(|t| !t.is_empty()).unwrap_or("(untitled)");
    println!("{} {}", "Task list".bold(), title.yellow().bold());
    if let Some(description) = tasks.property(&tasks.list_element, "description").as_str() {
        if !description.is_empty() {
            println!("  {}", description.dimmed());
        }
    }
    let items = tasks.property(&tasks.list_element, "tasks");
    match items.as_array() {
        Some(items) if !items.is_empty() => {
            for item in items {
                let done = item["completed"].as_bool().unwrap_or(false);
                let mark = if done { "✓".green() } else { "·".normal() };
                let id = item["value"].as_str().unwrap_or("?");
                let text = item["task"].as_str().unwrap_or("");
                println!("  {} {} {}", mark, format!("#{id}").cyan(), text);
            }
        }
        _ => println!("  No tasks."),
    }
    println!("{} remaining", remaining.to_string().bold());
    if let Some(summary) = summary.as_str() {
        println!("{}", summary.green());
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, config: StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or(config.local_dir);
    let store = FileLocalStore::new(&dir);
    let Some(text) = store.read(&args.key)? else {
        anyhow::bail!("no snapshot for {} in {}", args.key, dir.display());
    };
    let snapshot: Value = serde_json::from_str(&text)
        .with_context(|| format!("snapshot {} is not valid JSON", args.key))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&snapshot)?),
        OutputFormat::Text => {
            println!("{} {}", "Snapshot".bold(), args.key.yellow());
            println!("{}", pretty(&snapshot)?);
        }
    }
    Ok(())
}

fn cmd_eval(args: EvalArgs, format: OutputFormat) -> anyhow::Result<()> {
    let data = read_data(&args.input)?;
    let expr = Expression::compile(&args.expression)?;
    let result = expr.evaluate(&data)?;
    match (result, format) {
        (Some(value), OutputFormat::Json) => println!("{}", serde_json::to_string(&value)?),
        (Some(value), OutputFormat::Text) => println!("{}", pretty(&value)?),
        (None, _) => println!("{}", "undefined".dimmed()),
    }
    Ok(())
}

fn cmd_deps(args: DepsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let expr = Expression::compile(&args.expression)?;
    let deps = expr.dependency_paths();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(deps)?);
    } else if deps.is_empty() {
        println!("No state dependencies.");
    } else {
        for dep in deps {
            println!("  {}", dep.cyan());
        }
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let data = read_data(&args.input)?;
    println!("{}", render_template(&args.template, &data)?);
    Ok(())
}
