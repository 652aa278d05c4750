//! `copyright-sieve` — batch driver over the classification and declutter engine.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]).
//! 2. Set up logging on stderr.
//! 3. Load config ([`load_config`]) and apply `--model` / `--no-bundled`.
//! 4. Read the input records ([`records`]).
//! 5. Run one [`Agent`] operation, in chunks behind a progress bar for large inputs.
//! 6. Write JSON Lines and/or render a terminal report ([`terminal`]).

mod cli;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use copyright_sieve::agent::{Agent, ModelSource};
use copyright_sieve::config::{load_config, Config};
use copyright_sieve::records::{self, FieldNames, Record};
use copyright_sieve::report::terminal::{self, PredictionRow};

use cli::{Cli, Command, InputArgs, LabelledArgs, PredictArgs, ReportFormat, TrainArgs};

/// Records per agent call; inputs shorter than this run without a progress bar.
const CHUNK_SIZE: usize = 256;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;
    if let Some(dir) = &cli.model {
        config.model.dir = Some(dir.clone());
    }
    if cli.no_bundled {
        config.model.bundled = false;
    }

    match &cli.command {
        Command::Preprocess(args) => preprocess(config, args, &cli),
        Command::Declutter(args) => declutter(config, args, &cli),
        Command::Train(args) => train(config, args, &cli),
        Command::Predict(args) => predict(config, args, &cli),
        Command::Evaluate(args) => evaluate(config, args, &cli),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default = match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "copyright_sieve=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn preprocess(config: Config, args: &InputArgs, cli: &Cli) -> Result<()> {
    let records = read_unlabelled(&config, args)?;
    let texts = texts_of(&records);
    let agent = Agent::new(config, ModelSource::None)?;

    let notices = chunked(&texts, cli.quiet, "normalizing", |chunk| {
        Ok(agent.preprocess_data(chunk))
    })?;

    let values = notices.iter().map(|n| Value::String(n.to_text()));
    emit(args, &records, "normalized", values)?;
    if args.report == ReportFormat::Terminal && !cli.quiet {
        println!(" {} Normalized {} notices", "✓".green(), notices.len());
    }
    Ok(())
}

fn declutter(config: Config, args: &InputArgs, cli: &Cli) -> Result<()> {
    let records = read_unlabelled(&config, args)?;
    let texts = texts_of(&records);
    let agent = Agent::new(config, ModelSource::None)?;

    let results = chunked(&texts, cli.quiet, "decluttering", |chunk| {
        Ok(agent.declutter(chunk, &[])?)
    })?;

    let values = results
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    emit(args, &records, "decluttered", values)?;
    if args.report == ReportFormat::Terminal {
        terminal::render_extractions(&texts, &results, &args.input, cli.verbose > 0, cli.quiet);
    }
    Ok(())
}

fn train(config: Config, args: &TrainArgs, cli: &Cli) -> Result<()> {
    let (records, labels) = read_labelled(&config, &args.data)?;
    let texts = texts_of(&records);
    let save_to = args.save.clone().or_else(|| config.model.dir.clone());
    let mut agent = Agent::new(config, ModelSource::None)?;

    let spinner = spinner(cli.quiet, format!("training on {} records", texts.len()));
    let trained = agent.train_false_positive_detector_model(&texts, &labels);
    spinner.finish_and_clear();
    trained?;

    if let Some(dir) = &save_to {
        agent
            .save(dir)
            .with_context(|| format!("saving model to {}", dir.display()))?;
    }

    let info = agent.model_info()?;
    match args.data.report {
        ReportFormat::Terminal => {
            terminal::render_training(&info, &args.data.input, save_to.as_deref(), cli.quiet)
        }
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "model": info, "saved_to": save_to }))?
        ),
    }
    Ok(())
}

fn predict(config: Config, args: &PredictArgs, cli: &Cli) -> Result<()> {
    let records = read_unlabelled(&config, &args.input)?;
    let texts = texts_of(&records);
    let mut agent = Agent::from_config(config)?;

    let labels = chunked(&texts, cli.quiet, "classifying", |chunk| Ok(agent.predict(chunk)?))?;
    let wants_probabilities = args.probabilities || args.input.report == ReportFormat::Terminal;
    let probabilities = if wants_probabilities {
        agent.predict_proba(&texts)?
    } else {
        Vec::new()
    };

    let encoding = agent.label_encoding();
    let values: Vec<Value> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let token = encoding.encode(*label);
            if args.probabilities {
                json!({ "label": token, "probability": probabilities[i] })
            } else {
                json!(token)
            }
        })
        .collect();
    emit(&args.input, &records, "prediction", values)?;

    if args.input.report == ReportFormat::Terminal {
        let rows: Vec<PredictionRow<'_>> = texts
            .iter()
            .copied()
            .zip(&labels)
            .zip(&probabilities)
            .map(|((text, label), probability)| PredictionRow {
                text,
                label: *label,
                probability: *probability,
            })
            .collect();
        terminal::render_predictions(&rows, &args.input.input, cli.verbose > 0, cli.quiet);
    }
    Ok(())
}

fn evaluate(config: Config, args: &LabelledArgs, cli: &Cli) -> Result<()> {
    let (records, labels) = read_labelled(&config, args)?;
    let texts = texts_of(&records);
    let mut agent = Agent::from_config(config)?;

    let spinner = spinner(cli.quiet, format!("evaluating {} records", texts.len()));
    let report = agent.evaluate(&texts, &labels);
    spinner.finish_and_clear();
    let report = report?;
    let info = agent.model_info()?;

    match args.report {
        ReportFormat::Terminal => terminal::render_evaluation(&report, &info, &args.input, cli.quiet),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "evaluation": report, "model": info }))?
        ),
    }
    Ok(())
}

fn read_unlabelled(config: &Config, args: &InputArgs) -> Result<Vec<Record>> {
    let fields = FieldNames {
        text: args.text_field.as_deref().unwrap_or(&config.input.content_field),
        label: None,
    };
    records::read_records(&args.input, fields)
}

fn read_labelled(config: &Config, args: &LabelledArgs) -> Result<(Vec<Record>, Vec<String>)> {
    let label_field = args.label_field.as_deref().unwrap_or(&config.input.label_field);
    let fields = FieldNames {
        text: args.text_field.as_deref().unwrap_or(&config.input.text_field),
        label: Some(label_field),
    };
    let records = records::read_records(&args.input, fields)?;
    let labels = records::require_labels(&records, label_field)?;
    Ok((records, labels))
}

fn texts_of(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.text.as_str()).collect()
}

/// JSON Lines go to `--output` when given, otherwise to stdout for `--report json`.
fn emit<I>(args: &InputArgs, rows: &[Record], field: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = Value>,
{
    if args.output.is_none() && args.report == ReportFormat::Terminal {
        return Ok(());
    }
    records::with_output(args.output.as_deref(), |out| {
        records::write_annotated(out, rows, field, values)
    })?;
    if let Some(path) = args.output.as_deref().filter(|_| args.report == ReportFormat::Terminal) {
        print_written(path, rows.len());
    }
    Ok(())
}

fn print_written(path: &Path, count: usize) {
    println!(" {} Wrote {} records to {}", "→".cyan(), count, path.display());
}

/// Run `f` over `CHUNK_SIZE` slices of `texts`, preserving order.
fn chunked<T, F>(texts: &[&str], quiet: bool, message: &'static str, mut f: F) -> Result<Vec<T>>
where
    F: FnMut(&[&str]) -> Result<Vec<T>>,
{
    let pb = if quiet || texts.len() <= CHUNK_SIZE {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(texts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        pb.set_message(message);
        pb
    };

    let mut out = Vec::with_capacity(texts.len());
    for chunk in texts.chunks(CHUNK_SIZE) {
        out.extend(f(chunk)?);
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();
    Ok(out)
}

fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
