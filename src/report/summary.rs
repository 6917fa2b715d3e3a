//! Stage summary tables

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::extract::ExtractReport;
use crate::pipeline::predict::PredictReport;
use crate::pipeline::train::TrainReport;
use crate::utils::display_path;

fn metric_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);
    table
}

fn print_table(title: &str, table: &Table) {
    println!();
    println!(
        "    {} {}",
        style("📋").cyan(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    println!();

    // Indent the table
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn format_bytes(bytes: u64) -> String {
    match bytes {
        b if b >= 1 << 20 => format!("{:.1} MiB", b as f64 / (1u64 << 20) as f64),
        b if b >= 1 << 10 => format!("{:.1} KiB", b as f64 / 1024.0),
        b => format!("{} B", b),
    }
}

pub fn extract_summary_table(report: &ExtractReport) -> Table {
    let mut table = metric_table();
    table.add_row(vec![Cell::new("🗄️  Table"), Cell::new(&report.table)]);
    table.add_row(vec![
        Cell::new("📦 Batches"),
        Cell::new(report.batches),
    ]);
    table.add_row(vec![
        Cell::new("✅ Rows"),
        Cell::new(report.rows)
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("📐 Columns"), Cell::new(report.columns)]);
    table.add_row(vec![
        Cell::new("💾 Output"),
        Cell::new(display_path(&report.output)),
    ]);
    table.add_row(vec![
        Cell::new("📏 File Size"),
        Cell::new(format_bytes(report.file_size)),
    ]);
    table
}

pub fn display_extract_summary(report: &ExtractReport) {
    print_table("EXTRACTION SUMMARY", &extract_summary_table(report));
}

pub fn train_summary_table(report: &TrainReport) -> Table {
    let mut table = metric_table();
    table.add_row(vec![
        Cell::new("📁 Usable Records"),
        Cell::new(report.usable_rows),
    ]);
    table.add_row(vec![
        Cell::new("🗑️  Ignored Records"),
        Cell::new(report.ignored_rows).fg(if report.ignored_rows == 0 {
            Color::White
        } else {
            Color::Yellow
        }),
    ]);
    table.add_row(vec![
        Cell::new("🩹 Imputed Cells"),
        Cell::new(report.imputed_cells()).fg(if report.imputed_cells() == 0 {
            Color::White
        } else {
            Color::Yellow
        }),
    ]);
    table.add_row(vec![
        Cell::new("✂️  Train / Test"),
        Cell::new(format!("{} / {}", report.split.train.len(), report.split.test.len())),
    ]);
    table.add_row(vec![
        Cell::new("⚖️  Before Resampling"),
        Cell::new(report.counts_before),
    ]);
    table.add_row(vec![
        Cell::new("⚖️  After Resampling"),
        Cell::new(if report.resampled {
            report.counts_after.to_string()
        } else {
            "skipped".to_string()
        }),
    ]);
    table.add_row(vec![
        Cell::new("🌲 Training Samples"),
        Cell::new(report.training_samples),
    ]);
    table.add_row(vec![
        Cell::new("📉 Test Churn Rate"),
        Cell::new(format!("{:.1}%", report.test_churn_rate * 100.0)),
    ]);

    let accuracy = report.evaluation.accuracy;
    let color = if accuracy > 0.8 {
        Color::Green
    } else if accuracy > 0.6 {
        Color::Yellow
    } else {
        Color::Red
    };
    table.add_row(vec![
        Cell::new("🎯 Test Accuracy"),
        Cell::new(format!("{:.1}%", accuracy * 100.0))
            .fg(color)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn display_train_summary(report: &TrainReport) {
    print_table("TRAINING SUMMARY", &train_summary_table(report));
}

pub fn predict_summary_table(report: &PredictReport) -> Table {
    let mut table = metric_table();
    table.add_row(vec![Cell::new("📁 Rows Scored"), Cell::new(report.rows)]);
    table.add_row(vec![Cell::new("📐 Columns"), Cell::new(report.columns)]);
    for (status, count) in &report.status_counts {
        let color = if status == "Churned" {
            Color::Red
        } else {
            Color::Green
        };
        table.add_row(vec![
            Cell::new(format!("🔮 {}", status)),
            Cell::new(count).fg(color).add_attribute(Attribute::Bold),
        ]);
    }
    table.add_row(vec![
        Cell::new("💾 Output"),
        Cell::new(display_path(&report.output)),
    ]);
    table
}

pub fn display_predict_summary(report: &PredictReport) {
    print_table("PREDICTION SUMMARY", &predict_summary_table(report));
}
