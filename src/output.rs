use comfy_table::{
    modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Attribute, Cell, Color,
    ContentArrangement, Table,
};
use yansi::Paint;

use vqa_eval::report::RunReport;
use vqa_eval::types::{SampleStatus, Verdict};

/// Map a verdict to its display label and color.
fn verdict_label(v: &Verdict) -> (&'static str, Color) {
    match (v.status, v.correct) {
        (SampleStatus::Failed, _) => ("failed", Color::Red),
        (SampleStatus::Scored, true) => ("correct", Color::Green),
        (SampleStatus::Scored, false) => ("incorrect", Color::Yellow),
    }
}

/// Print the report header and one accuracy line per strategy.
pub fn print_report(report: &RunReport) {
    println!("\n--- Evaluation Report ---");
    let lines = report.summary_lines();
    if report.is_empty() {
        for line in lines {
            println!("{}", line.yellow());
        }
        return;
    }
    for ((_, r), line) in report.iter().zip(lines) {
        if r.accuracy.is_some() {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.yellow());
        }
    }
}

/// Per-sample verdict table across all strategies.
pub fn details_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("STRATEGY").add_attribute(Attribute::Bold),
            Cell::new("SAMPLE").add_attribute(Attribute::Bold),
            Cell::new("VERDICT").add_attribute(Attribute::Bold),
        ]);

    for (kind, r) in report.iter() {
        for v in &r.verdicts {
            let (label, color) = verdict_label(v);
            table.add_row(vec![
                Cell::new(kind),
                Cell::new(v.sample_id),
                Cell::new(label).fg(color),
            ]);
        }
    }
    table
}
