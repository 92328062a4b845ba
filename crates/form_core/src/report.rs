use chrono::{DateTime, Local};
use shared::{domain::AnswerRecord, questionnaire::QUESTIONS};

use crate::clock::format_timestamp;

pub const REPORT_TITLE: &str = "Case Report Submission";

/// Renders the numbered report sent to the recipient. The layout is read by
/// people downstream, so line labels and separators must not drift.
///
/// The body starts directly at the title line and ends with a single newline
/// after the `Submitted at:` line. There is no leading blank line and no
/// trailing indentation.
pub fn format_report(record: &AnswerRecord, submitted_at: &DateTime<Local>) -> String {
    let mut lines = Vec::with_capacity(QUESTIONS.len() + 4);
    lines.push(REPORT_TITLE.to_string());
    lines.push(String::new());

    for question in &QUESTIONS {
        let mut line = format!(
            "{}. {}: {}",
            question.number,
            question.report_label,
            question.primary_answer(record)
        );

        if let Some(satellite) = question.satellite {
            let extra = record.text(satellite.field);
            if !extra.is_empty() && question.satellite_active(record) {
                line.push_str(&format!(" - {}: {}", satellite.label, extra));
            }
        }

        lines.push(line);
    }

    lines.push(String::new());
    lines.push(format!("Submitted at: {}", format_timestamp(submitted_at)));

    let mut report = lines.join("\n");
    report.push('\n');
    report
}
