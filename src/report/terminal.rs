use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::agent::ModelInfo;
use crate::metrics::EvaluationReport;
use crate::models::{ExtractionResult, Label};

/// Longest notice excerpt shown in a table cell.
const EXCERPT_CHARS: usize = 60;

/// One classified notice as shown in the prediction table.
pub struct PredictionRow<'a> {
    pub text: &'a str,
    pub label: Label,
    pub probability: f64,
}

/// Header line shared by every command.
fn banner(action: &str, path: &Path) {
    println!(
        "\n {} v{}",
        "copyright-sieve".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(" {}: {}\n", action, path.display());
}

/// Summary after training.
pub fn render_training(info: &ModelInfo, input: &Path, saved_to: Option<&Path>, quiet: bool) {
    if quiet {
        println!(
            "Trained on {} examples ({} genuine, {} false positive)",
            info.examples, info.genuine, info.false_positive
        );
        return;
    }

    banner("Training on", input);
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "MODEL".bold());
    println!(" │  {:<48} │", format!("Examples           : {}", info.examples));
    println!(" │  {:<48} │", format!("  genuine          : {}", info.genuine));
    println!(" │  {:<48} │", format!("  false positive   : {}", info.false_positive));
    println!(" │  {:<48} │", format!("Features           : {}", info.dimensions));
    println!(" │  {:<48} │", format!("Normalization      : {}", info.normalization_model));
    println!(" └────────────────────────────────────────────────────┘\n");

    match saved_to {
        Some(dir) => println!(" {} Saved to {}\n", "✓".green(), dir.display()),
        None => println!(" {} Model was not saved (pass --save DIR)\n", "⚠".yellow()),
    }
}

/// Label counts, plus every row when `verbose`.
pub fn render_predictions(rows: &[PredictionRow<'_>], input: &Path, verbose: bool, quiet: bool) {
    let total = rows.len();
    let fp_count = rows.iter().filter(|r| r.label.is_false_positive()).count();
    let genuine_count = total - fp_count;

    if quiet {
        println!(
            "Total: {}  Genuine: {}  False positive: {}",
            total,
            genuine_count.to_string().green(),
            fp_count.to_string().yellow(),
        );
        return;
    }

    banner("Classifying", input);
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total notices      : {}", total));
    println!(
        " │  {:<48} │",
        format!("{}  Genuine         : {:>4}", "✓".green(), genuine_count)
    );
    println!(
        " │  {:<48} │",
        format!("{}  False positive  : {:>4}", "✗".yellow(), fp_count)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if verbose && total > 0 {
        let mut table = new_table(&["Notice", "Label", "P(false positive)"]);
        for row in rows {
            let color = label_color(row.label);
            table.add_row(vec![
                Cell::new(excerpt(row.text)),
                Cell::new(row.label.to_string())
                    .fg(color)
                    .set_alignment(CellAlignment::Center),
                Cell::new(format!("{:.3}", row.probability)).set_alignment(CellAlignment::Right),
            ]);
        }
        println!("{}\n", table);
    }
}

/// Extraction coverage, plus every non-empty result when `verbose`.
pub fn render_extractions(
    texts: &[&str],
    results: &[ExtractionResult],
    input: &Path,
    verbose: bool,
    quiet: bool,
) {
    let total = results.len();
    let with_copyright = results.iter().filter(|r| !r.copyrights.is_empty()).count();
    let with_license = results.iter().filter(|r| !r.licenses.is_empty()).count();
    let empty = results.iter().filter(|r| r.is_empty()).count();

    if quiet {
        println!(
            "Total: {}  With copyright: {}  With license: {}",
            total, with_copyright, with_license
        );
        return;
    }

    banner("Decluttering", input);
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total notices      : {}", total));
    println!(" │  {:<48} │", format!("With copyright     : {}", with_copyright));
    println!(" │  {:<48} │", format!("With license       : {}", with_license));
    println!(" │  {:<48} │", format!("Nothing extracted  : {}", empty));
    println!(" └────────────────────────────────────────────────────┘\n");

    if verbose {
        let mut table = new_table(&["Notice", "Year", "Holder", "License"]);
        for (text, result) in texts.iter().zip(results).filter(|(_, r)| !r.is_empty()) {
            let years: Vec<&str> = result.copyrights.iter().map(|c| c.year_span.as_str()).collect();
            let holders: Vec<&str> = result.copyrights.iter().map(|c| c.holder.as_str()).collect();
            table.add_row(vec![
                Cell::new(excerpt(text)),
                Cell::new(years.join("\n")),
                Cell::new(holders.join("\n")),
                Cell::new(result.licenses.join("\n")),
            ]);
        }
        println!("{}\n", table);
    }
}

/// Metrics summary and confusion matrix.
pub fn render_evaluation(report: &EvaluationReport, info: &ModelInfo, input: &Path, quiet: bool) {
    if quiet {
        println!(
            "Accuracy: {:.3}  Precision: {:.3}  Recall: {:.3}  F1: {:.3}",
            report.accuracy, report.precision, report.recall, report.f1
        );
        return;
    }

    banner("Evaluating on", input);
    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "EVALUATION".bold());
    println!(" │  {:<48} │", format!("Examples           : {}", report.total));
    println!(" │  {:<48} │", format!("Accuracy           : {:.3}", report.accuracy));
    println!(" │  {:<48} │", format!("Precision (FP)     : {:.3}", report.precision));
    println!(" │  {:<48} │", format!("Recall (FP)        : {:.3}", report.recall));
    println!(" │  {:<48} │", format!("F1 (FP)            : {:.3}", report.f1));
    println!(
        " │  {:<48} │",
        format!("Model trained on   : {} examples", info.examples)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    let c = &report.confusion;
    let mut table = new_table(&["Gold \\ Predicted", "genuine", "false-positive", "Support"]);
    table.add_row(vec![
        Cell::new("genuine").fg(label_color(Label::Genuine)),
        Cell::new(c.true_negative).set_alignment(CellAlignment::Right),
        Cell::new(c.false_positive).set_alignment(CellAlignment::Right),
        Cell::new(report.support_genuine).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("false-positive").fg(label_color(Label::FalsePositive)),
        Cell::new(c.false_negative).set_alignment(CellAlignment::Right),
        Cell::new(c.true_positive).set_alignment(CellAlignment::Right),
        Cell::new(report.support_false_positive).set_alignment(CellAlignment::Right),
    ]);
    println!("{}\n", table);

    let verdict = if report.accuracy >= 0.5 {
        "[OK]".green().bold()
    } else {
        "[POOR]".red().bold()
    };
    println!(
        " {} {} of {} predictions correct\n",
        verdict,
        c.true_positive + c.true_negative,
        report.total
    );
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        );
    table
}

fn label_color(label: Label) -> Color {
    match label {
        Label::Genuine => Color::Green,
        Label::FalsePositive => Color::Yellow,
    }
}

/// First line of `text`, cut to [`EXCERPT_CHARS`] characters.
fn excerpt(text: &str) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or("");
    if line.chars().count() <= EXCERPT_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(EXCERPT_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt() {
        assert_eq!(excerpt("  \n Copyright 2001 Foo\nmore"), "Copyright 2001 Foo");
        assert_eq!(excerpt(""), "");
        let long = "x".repeat(100);
        let short = excerpt(&long);
        assert_eq!(short.chars().count(), EXCERPT_CHARS);
        assert!(short.ends_with('…'));
    }
}
