// Output formatting and display for CLI

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Counters gathered by a stress run
#[derive(Debug, Clone)]
pub struct StressReport {
    pub submitted: u64,
    pub written: u64,
    pub dropped: u64,
    pub elapsed: Duration,
}

impl StressReport {
    /// Every submitted entry is either written or counted as dropped
    pub fn is_consistent(&self) -> bool {
        self.written + self.dropped == self.submitted
    }
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a success message
pub fn print_success_msg(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_masked(kind: &str, masked: &str) {
    println!("{} {}", format!("{}:", kind).bold(), masked.cyan());
}

/// Print a TOML document with section headers highlighted
pub fn print_config(toml: &str) {
    for line in toml.lines() {
        if line.starts_with('[') {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
    }
}

/// Print a stress run summary table
pub fn print_stress_report(report: &StressReport, path: &Path) {
    #[derive(Tabled)]
    struct StatRow {
        #[tabled(rename = "Metric")]
        metric: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows = vec![
        StatRow {
            metric: "Submitted".to_string(),
            value: format_count(report.submitted),
        },
        StatRow {
            metric: "Written".to_string(),
            value: format_count(report.written).green().to_string(),
        },
        StatRow {
            metric: "Dropped".to_string(),
            value: format_dropped(report.dropped),
        },
        StatRow {
            metric: "Elapsed".to_string(),
            value: format_elapsed(&report.elapsed),
        },
    ];

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    println!("\n{}\n", table);
    println!(
        "{}",
        format!("Log file: {}", path.display()).dimmed().italic()
    );

    if report.is_consistent() {
        print_success_msg("dropped = submitted - written");
    } else {
        print_error(&format!(
            "{} written + {} dropped != {} submitted",
            report.written, report.dropped, report.submitted
        ));
    }
}

fn format_dropped(dropped: u64) -> String {
    if dropped == 0 {
        "0".to_string()
    } else {
        format_count(dropped).yellow().bold().to_string()
    }
}

/// Group digits in thousands: 1234567 becomes 1,234,567
fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn format_elapsed(duration: &Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.2}s", duration.as_secs_f64())
    }
}

/// Create a progress bar for long operations
pub fn create_progress_bar(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with success
pub fn finish_progress_success(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// Finish a progress bar with error
pub fn finish_progress_error(pb: ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✗".red(), message));
}
