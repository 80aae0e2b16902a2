use biextract_core::model::DocumentResult;
use biextract_core::trace::{DocumentSummary, RunReport};
use colored::Colorize;

pub fn print_report(report: &RunReport) {
    for summary in &report.documents {
        print_summary(summary, false);
        println!();
    }

    for failure in &report.failures {
        println!(
            "{} {}: {}",
            "Failed".red().bold(),
            failure.source.display(),
            failure.reason
        );
    }

    match &report.output {
        Some(path) => println!(
            "{} {} record(s) from {} document(s) to {}",
            "Saved".green().bold(),
            report.total_records(),
            report.documents.len(),
            path.display()
        ),
        None => println!("{}", "Nothing written".yellow()),
    }
}

pub fn print_summary(summary: &DocumentSummary, show_skipped: bool) {
    println!("{}", format!("=== {} ===", summary.name).cyan().bold());
    if let Some(source) = &summary.source {
        println!("  {}: {}", "Source".bold(), source.display());
    }
    println!("  {}: {}", "Records".bold(), summary.records);

    if !summary.devices.is_empty() {
        let width = summary
            .devices
            .iter()
            .map(|d| d.device.chars().count())
            .max()
            .unwrap_or(6)
            .max(6);
        for d in &summary.devices {
            let device = if d.device.is_empty() { "-" } else { d.device.as_str() };
            println!(
                "    {:<width$}  {:<10}  {} record(s)",
                device,
                d.model.as_str(),
                d.records,
                width = width
            );
        }
    }

    if summary.unresolved_model {
        println!(
            "  {} no supported device model found, rows marked Unknown for review",
            "warning:".yellow()
        );
    }

    if !summary.skipped_rows.is_empty() {
        println!(
            "  {}: {}",
            "Skipped".bold(),
            summary.skipped_rows.len().to_string().yellow()
        );
        if show_skipped {
            for row in &summary.skipped_rows {
                println!("    p.{:<3} {:<40}  {}", row.page, row.line_text, row.reason);
            }
        }
    }
}

pub fn print_records(result: &DocumentResult) {
    if result.is_empty() {
        println!("{}", "No binary inputs found".yellow());
        return;
    }

    let id_width = result
        .records
        .iter()
        .map(|r| r.input_id.len())
        .max()
        .unwrap_or(5);
    let mut current = None;

    for rec in &result.records {
        let block = (&rec.device, rec.model, &rec.board_slot);
        if current != Some(block) {
            println!(
                "\n{} {} {}",
                rec.device.bold(),
                format!("({})", rec.model.product_name()).dimmed(),
                rec.board_slot
            );
            current = Some(block);
        }
        let review = if rec.needs_review { " (?)" } else { "" };
        println!(
            "  p.{:<3} {:<width$}  {:>4}  {}{}",
            rec.page,
            rec.input_id,
            rec.input_number.to_string(),
            rec.full_description.replace('\n', " / "),
            review,
            width = id_width
        );
    }
}
