//! Terminal rendering for catalog entries and run reports.

use colored::Colorize;
use job_harvester::{CatalogEntry, CatalogStats, JobStatus, RunReport, StopReason};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

pub fn print_header(title: &str) {
    println!("\n{}", RULE);
    println!("{}", title.bold());
    println!("{}", RULE);
}

pub fn print_stats(stats: &CatalogStats) {
    println!("  Total jobs in DB:    {}", stats.total);
    println!("  Active jobs:         {}", stats.active.to_string().green());
    println!("  Expired jobs:        {}", stats.expired.to_string().dimmed());
    println!("  Applied to:          {}", stats.applied.to_string().cyan());
    println!("  Not yet applied:     {}", stats.not_applied.to_string().yellow());
}

pub fn print_run_report(report: &RunReport) {
    print_header("Summary");
    println!("  Run:                 {}", report.run_id.to_string().dimmed());
    for query in &report.queries {
        let stop = match &query.stop {
            StopReason::FetchFailed(reason) => format!("fetch failed: {}", reason).red(),
            StopReason::EndOfResults => "end of results".normal(),
            StopReason::PageLimit => "page limit".normal(),
        };
        println!(
            "  {} records, {} pages ({})  {}",
            query.records,
            query.pages_fetched,
            stop,
            query.query_url.dimmed()
        );
        if query.anomalies > 0 {
            println!(
                "    {} page(s) had no recognizable listings or only rejected cards",
                query.anomalies.to_string().yellow()
            );
        }
    }

    println!("{}", THIN_RULE);
    println!("  Scraped (unique):    {}", report.batch_size);
    println!(
        "  New jobs added:      {}",
        report.reconcile.inserted.len().to_string().green()
    );
    println!("  Jobs updated:        {}", report.reconcile.touched.len());
    if !report.reconcile.reactivated.is_empty() {
        println!(
            "  Reactivated:         {}",
            report.reconcile.reactivated.len()
        );
    }
    println!(
        "  Jobs expired:        {}",
        report.reconcile.expired.len().to_string().dimmed()
    );
    println!("{}", THIN_RULE);
    print_stats(&report.stats);
    println!("{}\n", RULE);

    if !report.is_complete() {
        println!(
            "{}",
            "Some searches were incomplete; expirations may be premature.".yellow()
        );
    }
}

pub fn print_entry(entry: &CatalogEntry, compact: bool) {
    let status = match entry.status {
        JobStatus::Active => "active".green(),
        JobStatus::Expired => "expired".dimmed(),
    };
    let applied = match entry.applied_on {
        Some(date) => format!(" applied {}", date).cyan(),
        None => "".normal(),
    };

    if compact {
        println!(
            "{:<12} {:<45} {:<25} {}{}",
            entry.job_id,
            truncate(&entry.title, 45),
            truncate(&entry.company, 25),
            status,
            applied
        );
        return;
    }

    println!("{} {}{}", entry.title.bold(), status, applied);
    println!("  {} | {}", entry.company, entry.location);
    println!("  {}", entry.link.blue());
    println!(
        "  id {}  first seen {}  last seen {}",
        entry.job_id, entry.first_seen, entry.last_seen
    );
    if let Some(posted) = &entry.date_posted {
        println!("  posted {}", posted);
    }
    println!();
}

pub fn print_entries(entries: &[CatalogEntry], compact: bool) {
    if entries.is_empty() {
        println!("{}", "No jobs found.".dimmed());
        return;
    }
    for entry in entries {
        print_entry(entry, compact);
    }
    println!("{}", format!("{} job(s)", entries.len()).dimmed());
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", cut)
}
