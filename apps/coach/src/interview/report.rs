//! Report Exporter: question/feedback/rewrite triples into a downloadable Word document.
//!
//! `build_report` is the pure part (ordering, headings, paragraph splitting);
//! `render_docx` turns that model into `.docx` bytes.

use std::io::Cursor;

use anyhow::{anyhow, Result};
use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};
use serde::Serialize;

use crate::interview::workflow::{FeedbackRecord, Recommendation};

pub const REPORT_TITLE: &str = "InterviewCoach Pro - Feedback Report";
pub const REPORT_FILENAME: &str = "InterviewCoach_Feedback.docx";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    /// One per successfully critiqued question, in question order.
    pub sections: Vec<ReportSection>,
    /// Average score and recommendation, appended after the question sections.
    pub closing: Option<ReportSection>,
}

/// The plain-text block for one question, as shown in the UI and split into paragraphs here.
pub fn export_block(record: &FeedbackRecord) -> String {
    format!(
        "Q{}: {}\n\nFEEDBACK:\n{}\n\nSUGGESTED REWRITE:\n{}\n",
        record.index + 1,
        record.question,
        record.feedback,
        record.rewrite
    )
}

pub fn build_report(
    records: &[FeedbackRecord],
    average: Option<f64>,
    recommendation: Option<Recommendation>,
) -> Report {
    // Headings count critiqued questions; the `Q{n}:` line keeps the original number.
    let sections = records
        .iter()
        .enumerate()
        .map(|(position, record)| ReportSection {
            heading: format!("Question {}", position + 1),
            paragraphs: split_paragraphs(&export_block(record)),
        })
        .collect();

    let closing = recommendation.map(|recommendation| {
        let average_line = match average {
            Some(avg) => format!("Average STAR Answer Score: {avg:.1}/10"),
            None => "Average Score: Not available".to_string(),
        };
        ReportSection {
            heading: "Summary".to_string(),
            paragraphs: vec![average_line, recommendation.message().to_string()],
        }
    });

    Report {
        title: REPORT_TITLE.to_string(),
        sections,
        closing,
    }
}

fn split_paragraphs(block: &str) -> Vec<String> {
    block
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Renders the report: level-1 title, then a page break and level-2 heading per section.
pub fn render_docx(report: &Report) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    build_docx(report)
        .build()
        .pack(&mut buffer)
        .map_err(|e| anyhow!("Failed to write feedback report: {e}"))?;
    Ok(buffer.into_inner())
}

fn build_docx(report: &Report) -> Docx {
    let mut docx = Docx::new()
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_style(
            Style::new("Heading2", StyleType::Paragraph)
                .name("Heading 2")
                .size(26)
                .bold(),
        )
        .add_paragraph(heading(&report.title, "Heading1"));

    for section in report.sections.iter().chain(report.closing.iter()) {
        docx = docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            .add_paragraph(heading(&section.heading, "Heading2"));
        for paragraph in &section.paragraphs {
            docx = docx.add_paragraph(body_paragraph(paragraph));
        }
    }
    docx
}

fn heading(text: &str, style: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text)).style(style)
}

/// Keeps single line breaks inside a paragraph as Word line breaks.
fn body_paragraph(text: &str) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: usize, feedback: &str) -> FeedbackRecord {
        FeedbackRecord::new(
            index,
            format!("Question text {}", index + 1),
            "answer".to_string(),
            feedback.to_string(),
            format!("Rewrite {}", index + 1),
        )
    }

    #[test]
    fn test_export_block_layout() {
        let block = export_block(&record(0, "Solid.\nScore: 8/10"));
        assert_eq!(
            block,
            "Q1: Question text 1\n\nFEEDBACK:\nSolid.\nScore: 8/10\n\nSUGGESTED REWRITE:\nRewrite 1\n"
        );
    }

    #[test]
    fn test_one_section_per_record_in_order() {
        let records = vec![record(0, "a"), record(2, "b"), record(3, "c")];
        let report = build_report(&records, Some(7.5), Some(Recommendation::PracticeMore));

        assert_eq!(report.title, REPORT_TITLE);
        assert_eq!(report.sections.len(), 3);
        let headings: Vec<&str> = report.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["Question 1", "Question 2", "Question 3"]);
        // The body still names the question as it was asked.
        assert_eq!(report.sections[1].paragraphs[0], "Q3: Question text 3");
    }

    #[test]
    fn test_paragraphs_split_on_blank_lines() {
        let report = build_report(&[record(0, "STAR breakdown.\n\nScore: 6/10")], None, None);
        assert_eq!(
            report.sections[0].paragraphs,
            vec![
                "Q1: Question text 1",
                "FEEDBACK:\nSTAR breakdown.",
                "Score: 6/10",
                "SUGGESTED REWRITE:\nRewrite 1",
            ]
        );
    }

    #[test]
    fn test_empty_report_has_no_sections() {
        let report = build_report(&[], None, None);
        assert!(report.sections.is_empty());
        assert!(report.closing.is_none());
    }

    #[test]
    fn test_closing_section_reports_average_or_unavailable() {
        let scored = build_report(&[], Some(8.26), Some(Recommendation::Proceed));
        let closing = scored.closing.unwrap();
        assert_eq!(closing.paragraphs[0], "Average STAR Answer Score: 8.3/10");
        assert_eq!(closing.paragraphs[1], "Recommendation: Proceed to interview");

        let unscored = build_report(&[], None, Some(Recommendation::NotReady));
        assert_eq!(unscored.closing.unwrap().paragraphs[0], "Average Score: Not available");
    }

    #[test]
    fn test_render_docx_produces_zip_package() {
        let report = build_report(
            &[record(0, "Good.\n\nScore: 9/10"), record(1, "Fine.")],
            Some(9.0),
            Some(Recommendation::Proceed),
        );
        let bytes = render_docx(&report).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_document_has_page_break_and_heading_per_section() {
        let records = vec![record(0, "a"), record(1, "b"), record(4, "c")];
        let report = build_report(&records, Some(6.0), Some(Recommendation::NotReady));
        let xml = String::from_utf8(build_docx(&report).build().document).unwrap();

        // Three questions plus the closing summary.
        assert_eq!(xml.matches(r#"w:type="page""#).count(), 4);
        assert_eq!(xml.matches(r#"w:val="Heading2""#).count(), 4);
        assert_eq!(xml.matches(r#"w:val="Heading1""#).count(), 1);

        let positions: Vec<usize> = ["Question 1<", "Question 2<", "Question 3<", "Summary<"]
            .iter()
            .map(|heading| xml.find(heading).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(xml.find(REPORT_TITLE).unwrap() < positions[0]);
    }
}
