//! Binary classification metrics for the held-out partition

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::labels::status_for_prediction;

/// Precision, recall and F1 of one class (or an average over classes)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class scores for labels 0 and 1 plus summary rows
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    /// Indexed by label
    pub classes: [ClassScores; 2],
    pub accuracy: f64,
    pub macro_avg: ClassScores,
    pub weighted_avg: ClassScores,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ClassificationReport {
    /// Score `y_pred` against `y_true`. Undefined ratios are reported as 0.
    pub fn compute(y_true: &[u8], y_pred: &[u8]) -> Self {
        assert_eq!(y_true.len(), y_pred.len(), "label vectors differ in length");

        // confusion[actual][predicted]
        let mut confusion = [[0usize; 2]; 2];
        for (&t, &p) in y_true.iter().zip(y_pred) {
            confusion[t as usize][p as usize] += 1;
        }

        let mut classes = [ClassScores::default(); 2];
        for (c, scores) in classes.iter_mut().enumerate() {
            let tp = confusion[c][c];
            let predicted = confusion[0][c] + confusion[1][c];
            let support = confusion[c][0] + confusion[c][1];

            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            *scores = ClassScores {
                precision,
                recall,
                f1,
                support,
            };
        }

        let total = y_true.len();
        let accuracy = ratio(confusion[0][0] + confusion[1][1], total);

        let macro_avg = ClassScores {
            precision: (classes[0].precision + classes[1].precision) / 2.0,
            recall: (classes[0].recall + classes[1].recall) / 2.0,
            f1: (classes[0].f1 + classes[1].f1) / 2.0,
            support: total,
        };

        let weight = |c: usize| ratio(classes[c].support, total);
        let weighted_avg = ClassScores {
            precision: weight(0) * classes[0].precision + weight(1) * classes[1].precision,
            recall: weight(0) * classes[0].recall + weight(1) * classes[1].recall,
            f1: weight(0) * classes[0].f1 + weight(1) * classes[1].f1,
            support: total,
        };

        Self {
            classes,
            accuracy,
            macro_avg,
            weighted_avg,
        }
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Class").add_attribute(Attribute::Bold),
            Cell::new("Precision").add_attribute(Attribute::Bold),
            Cell::new("Recall").add_attribute(Attribute::Bold),
            Cell::new("F1").add_attribute(Attribute::Bold),
            Cell::new("Support").add_attribute(Attribute::Bold),
        ]);

        let score_row = |name: &str, s: &ClassScores, color: Color| {
            vec![
                Cell::new(name).fg(color),
                Cell::new(format!("{:.2}", s.precision)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2}", s.recall)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.2}", s.f1)).set_alignment(CellAlignment::Right),
                Cell::new(s.support).set_alignment(CellAlignment::Right),
            ]
        };

        table.add_row(score_row(status_for_prediction(0), &self.classes[0], Color::Green));
        table.add_row(score_row(status_for_prediction(1), &self.classes[1], Color::Red));
        table.add_row(vec![
            Cell::new("accuracy").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format!("{:.2}", self.accuracy))
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Bold),
            Cell::new(self.macro_avg.support).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(score_row("macro avg", &self.macro_avg, Color::Cyan));
        table.add_row(score_row("weighted avg", &self.weighted_avg, Color::Cyan));
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📊").cyan(),
            style("CLASSIFICATION REPORT").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());

        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }
    }
}
