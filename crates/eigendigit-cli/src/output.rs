//! Output formatting utilities

use colored::Colorize;
use eigendigit::metrics::MulticlassReport;
use eigendigit::primitives::Matrix;
use serde::Serialize;

/// Print a section header
pub(crate) fn section(title: &str) {
    println!("\n{}", format!("=== {title} ===").cyan().bold());
}

/// Print a key-value pair
pub(crate) fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

/// Print a success message
pub(crate) fn success(msg: &str) {
    println!("{} {}", "[PASS]".green().bold(), msg);
}

/// Print a warning message
pub(crate) fn warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// Print any serializable value as pretty JSON on stdout
pub(crate) fn json<T: Serialize>(value: &T) -> crate::error::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| crate::error::CliError::InvalidFormat(e.to_string()))?;
    println!("{text}");
    Ok(())
}

/// Format a fraction as a percentage with two decimals
pub(crate) fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Print the confusion matrix with true classes as rows
pub(crate) fn confusion(matrix: &Matrix<usize>) {
    let width = matrix
        .as_slice()
        .iter()
        .map(|v| v.to_string().len())
        .max()
        .unwrap_or(1)
        .max(3);

    let header: String = (0..matrix.n_cols())
        .map(|c| format!("{c:>width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("  {:>5} {}", "true", header.dimmed());
    for r in 0..matrix.n_rows() {
        let cells: Vec<String> = matrix
            .row_slice(r)
            .iter()
            .enumerate()
            .map(|(c, v)| {
                let cell = format!("{v:>width$}");
                if c == r {
                    cell.green().to_string()
                } else if *v > 0 {
                    cell.red().to_string()
                } else {
                    cell
                }
            })
            .collect();
        println!("  {r:>5} {}", cells.join(" "));
    }
}

/// Print the headline numbers of an evaluation report
pub(crate) fn report(report: &MulticlassReport) {
    kv("Accuracy", percent(report.accuracy));
    kv("Precision (macro)", format!("{:.4}", report.precision_macro));
    kv("Recall (macro)", format!("{:.4}", report.recall_macro));
    kv("F1 (macro)", format!("{:.4}", report.f1_macro));
}
