use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "copyright-sieve",
    about = "Separate genuine copyright notices from scanner false positives and declutter them",
    version
)]
pub struct Cli {
    /// Config file [default: ./.copyright-sieve/config.toml, fallback ~/.config/copyright-sieve/config.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Trained model directory; overrides `[model].dir`
    #[arg(long, global = true, value_name = "DIR")]
    pub model: Option<PathBuf>,

    /// Never fall back to the bundled model
    #[arg(long, global = true)]
    pub no_bundled: bool,

    /// More log output on stderr (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print summary lines and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize notices into lemma sequences
    Preprocess(InputArgs),
    /// Extract year/holder pairs and license clauses
    Declutter(InputArgs),
    /// Train the false-positive detector on labelled records
    Train(TrainArgs),
    /// Label notices as genuine or false positive
    Predict(PredictArgs),
    /// Score the model against labelled records
    Evaluate(LabelledArgs),
}

/// Unlabelled input shared by the record-transforming commands.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// JSON array or JSON Lines file of records
    pub input: PathBuf,

    /// Record field holding the notice text [default: `[input].content_field`]
    #[arg(long, value_name = "NAME")]
    pub text_field: Option<String>,

    /// Write JSON Lines here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub report: ReportFormat,
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Also emit the false-positive probability of each record
    #[arg(long)]
    pub probabilities: bool,
}

/// Labelled input for training and evaluation.
#[derive(Args, Debug)]
pub struct LabelledArgs {
    /// JSON array or JSON Lines file of labelled records
    pub input: PathBuf,

    /// Record field holding the notice text [default: `[input].text_field`]
    #[arg(long, value_name = "NAME")]
    pub text_field: Option<String>,

    /// Record field holding the label token [default: `[input].label_field`]
    #[arg(long, value_name = "NAME")]
    pub label_field: Option<String>,

    /// Report format
    #[arg(long, default_value = "terminal", value_name = "FORMAT")]
    pub report: ReportFormat,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: LabelledArgs,

    /// Save the trained model here [default: --model]
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Terminal,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_predict() {
        let cli = Cli::parse_from([
            "copyright-sieve",
            "predict",
            "notices.jsonl",
            "--model",
            "models/current",
            "--probabilities",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.model, Some(PathBuf::from("models/current")));
        match cli.command {
            Command::Predict(args) => {
                assert!(args.probabilities);
                assert_eq!(args.input.input, PathBuf::from("notices.jsonl"));
                assert_eq!(args.input.report, ReportFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_train() {
        let cli = Cli::parse_from([
            "copyright-sieve",
            "train",
            "train.json",
            "--label-field",
            "fp",
            "--save",
            "out",
            "-q",
        ]);
        assert!(cli.quiet);
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.data.label_field.as_deref(), Some("fp"));
                assert_eq!(args.save, Some(PathBuf::from("out")));
                assert_eq!(args.data.report, ReportFormat::Terminal);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
