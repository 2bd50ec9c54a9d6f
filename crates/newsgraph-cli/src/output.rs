//! Terminal output formatting.

use colored::Colorize;

use newsgraph_graph::{GraphCounts, LoadReport, ReporterPerformance};

/// Print the summary of a finished load.
pub fn print_load_report(report: &LoadReport) {
    println!("\n{}", "Load complete:".green().bold());
    println!("  Run:           {}", report.run_id.to_string().dimmed());
    println!(
        "  Started:       {}",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Attempts:      {}", report.attempts);
    println!("  Constraints:   {}", report.constraints);
    println!("  Article rows:  {}", report.article_rows);
    println!("  Traffic rows:  {}", report.traffic_rows);
    println!("  Elapsed:       {:.2}s", report.elapsed.as_secs_f64());
}

/// Print node and relationship counts per kind.
pub fn print_counts(counts: &GraphCounts) {
    println!("{}", "Knowledge Graph Status".bold());
    println!("{}", "─".repeat(40));
    println!("  {:<14} {}", "Article", counts.articles.to_string().cyan());
    println!("  {:<14} {}", "Reporter", counts.reporters.to_string().cyan());
    println!("  {:<14} {}", "Category", counts.categories.to_string().cyan());
    println!("  {:<14} {}", "Traffic", counts.traffic.to_string().cyan());
    println!("  {:<14} {}", "WROTE", counts.wrote.to_string().yellow());
    println!("  {:<14} {}", "CONTAIN", counts.contain.to_string().yellow());
    println!("  {:<14} {}", "GAIN", counts.gain.to_string().yellow());
    println!("{}", "─".repeat(40));
    println!(
        "  {} nodes, {} relationships",
        counts.nodes().to_string().bold(),
        counts.relationships().to_string().bold()
    );
}

pub fn print_performance(performance: &ReporterPerformance) {
    println!(
        "{} {} sessions",
        performance.reporter_name.cyan().bold(),
        performance.total_sessions.to_string().green()
    );
}
