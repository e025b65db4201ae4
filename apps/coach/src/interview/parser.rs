//! Response Parser: best-effort extraction from free-text completions.
//!
//! Model output format is not guaranteed, so nothing here returns an error:
//! a miss degrades to `None`, an empty list, or a fixed placeholder.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const STAR_PLACEHOLDER: &str = "STAR structure not detected.";
pub const ENHANCEMENT_PLACEHOLDER: &str = "No enhancement advice provided.";

static QUESTION_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\s(.+)$").expect("valid regex"));

static SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)score:\s*(\d+(?:\.\d+)?)\s*/\s*10\b").expect("valid regex")
});

/// A line that opens a new block: a markdown heading, a bold-only label, or `Label:` alone.
static BLOCK_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s+.*|\*\*[^*]+\*\*:?|\*\*[^*]+:\*\*|[A-Za-z][A-Za-z0-9 /&()\-]{0,58}:)\s*$")
        .expect("valid regex")
});

static FIT_TOTAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}(?:\.\d+)?)\s*/\s*50\b").expect("valid regex"));

static PERCENTAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3}(?:\.\d+)?)\s*%").expect("valid regex"));

static DIMENSION_PATTERNS: Lazy<Vec<(FitDimension, Regex)>> = Lazy::new(|| {
    FitDimension::ALL
        .iter()
        .map(|dim| {
            // The score is the value after the label's colon, not a `(1-10)` range before it.
            let pattern = format!(
                r"(?im)^[^\w\n]*(?:\d+\.\s*)?{}[^:\n]*:[\s*]*(\d{{1,2}})\b",
                dim.pattern()
            );
            (*dim, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

// ────────────────────────────────────────────────────────────────────────────
// Questions
// ────────────────────────────────────────────────────────────────────────────

/// Keeps lines shaped like `N. question`, strips the marker, and caps the list at `limit`.
/// Fewer usable lines than requested just yields a shorter list.
pub fn parse_questions(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .filter_map(|line| QUESTION_LINE.captures(line))
        .filter_map(|caps| {
            let question = caps[1].trim();
            (!question.is_empty()).then(|| question.to_string())
        })
        .take(limit)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Scores
// ────────────────────────────────────────────────────────────────────────────

/// Finds the first `Score: X/10` (any case). Values above 10 are treated as malformed.
pub fn extract_score(text: &str) -> Option<f64> {
    let caps = SCORE.captures(text)?;
    let score: f64 = caps[1].parse().ok()?;
    (0.0..=10.0).contains(&score).then_some(score)
}

/// Arithmetic mean, or `None` when nothing was scored.
pub fn average_score(scores: &[f64]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

// ────────────────────────────────────────────────────────────────────────────
// STAR sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSections {
    pub star_feedback: String,
    pub enhancement: String,
}

/// Splits feedback into its "STAR Feedback" and "Resume-Based Enhancement" blocks.
///
/// The STAR block runs until the next labelled block, score line, or the enhancement
/// label; the enhancement block runs to the end of the text.
pub fn extract_star_sections(text: &str) -> StarSections {
    let lines: Vec<&str> = text.lines().collect();

    let star_feedback = find_label(&lines, STAR_LABELS)
        .map(|(idx, inline)| {
            let mut block = inline;
            for &line in &lines[idx + 1..] {
                if ends_star_block(line) {
                    break;
                }
                block.push(line);
            }
            join_block(&block)
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| STAR_PLACEHOLDER.to_string());

    let enhancement = find_label(&lines, ENHANCEMENT_LABELS)
        .map(|(idx, mut block)| {
            block.extend_from_slice(&lines[idx + 1..]);
            join_block(&block)
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ENHANCEMENT_PLACEHOLDER.to_string());

    StarSections {
        star_feedback,
        enhancement,
    }
}

const STAR_LABELS: &[&str] = &["star feedback", "star breakdown"];
const ENHANCEMENT_LABELS: &[&str] = &["resume-based enhancement", "resume based enhancement"];

/// Returns the first line carrying one of `labels`, plus any text after the label on that line.
fn find_label<'a>(lines: &[&'a str], labels: &[&str]) -> Option<(usize, Vec<&'a str>)> {
    lines.iter().enumerate().find_map(|(idx, line)| {
        let lower = line.to_ascii_lowercase();
        let end = labels
            .iter()
            .find_map(|label| lower.find(label).map(|start| start + label.len()))?;
        let rest = line[end..]
            .trim_start_matches(|c: char| c == ':' || c == '*' || c == '#' || c.is_whitespace())
            .trim_end();
        let inline = if rest.is_empty() { Vec::new() } else { vec![rest] };
        Some((idx, inline))
    })
}

fn ends_star_block(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    if ENHANCEMENT_LABELS.iter().any(|label| lower.contains(label)) {
        return true;
    }
    let bare = lower.trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace());
    if bare.starts_with("score:") || bare.starts_with("final score") {
        return true;
    }
    if !BLOCK_LABEL.is_match(line) {
        return false;
    }
    // Situation/Task/Action/Result sub-labels belong inside the STAR block.
    !["situation", "task", "action", "result"]
        .iter()
        .any(|part| bare.starts_with(part))
}

fn join_block(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Fit assessment
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitDimension {
    TechnicalTools,
    DomainExperience,
    ProblemSolving,
    Communication,
    Leadership,
}

impl FitDimension {
    pub const ALL: [FitDimension; 5] = [
        FitDimension::TechnicalTools,
        FitDimension::DomainExperience,
        FitDimension::ProblemSolving,
        FitDimension::Communication,
        FitDimension::Leadership,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FitDimension::TechnicalTools => "Technical Tools",
            FitDimension::DomainExperience => "Domain Experience",
            FitDimension::ProblemSolving => "Problem Solving",
            FitDimension::Communication => "Communication",
            FitDimension::Leadership => "Leadership/Initiative",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            FitDimension::TechnicalTools => r"technical\s+tools",
            FitDimension::DomainExperience => r"domain\s+experience",
            FitDimension::ProblemSolving => r"problem[\s-]+solving",
            FitDimension::Communication => r"communication",
            FitDimension::Leadership => r"leadership(?:\s*/\s*initiative)?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension: FitDimension,
    pub score: u8,
}

/// Structured fields pulled out of a fit-assessment completion. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFit {
    pub dimensions: Vec<DimensionScore>,
    pub total: Option<f64>,
    pub percentage: Option<f64>,
    pub recommendation: Option<String>,
}

pub fn parse_fit_assessment(text: &str) -> ParsedFit {
    let dimensions = DIMENSION_PATTERNS
        .iter()
        .filter_map(|(dimension, re)| {
            let score: u8 = re.captures(text)?[1].parse().ok()?;
            (1..=10).contains(&score).then_some(DimensionScore {
                dimension: *dimension,
                score,
            })
        })
        .collect();

    let total = FIT_TOTAL
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|t| (0.0..=50.0).contains(t));

    let percentage = text
        .lines()
        .filter(|line| line.to_lowercase().contains("percent"))
        .find_map(|line| PERCENTAGE.captures(line))
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|p| (0.0..=100.0).contains(p));

    let recommendation = text
        .lines()
        .rev()
        .find(|line| line.to_lowercase().contains("recommend"))
        .map(|line| line.trim().trim_matches(|c| c == '*' || c == '#').trim().to_string())
        .filter(|line| !line.is_empty());

    ParsedFit {
        dimensions,
        total,
        percentage,
        recommendation,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_strips_markers_and_preamble() {
        let text = "Here are your questions:\n\n1. Tell me about a launch you led.\n2. Describe a conflict.\n\nGood luck!";
        assert_eq!(
            parse_questions(text, 5),
            vec!["Tell me about a launch you led.", "Describe a conflict."]
        );
    }

    #[test]
    fn test_parse_questions_truncates_to_limit() {
        let text = "1. A\n2. B\n3. C\n4. D";
        assert_eq!(parse_questions(text, 3), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_parse_questions_preserves_order_across_blocks() {
        let text = "Job description questions:\n1. JD one\n2. JD two\nResume questions:\n3. CV one";
        assert_eq!(parse_questions(text, 3), vec!["JD one", "JD two", "CV one"]);
    }

    #[test]
    fn test_parse_questions_rejects_non_matching_lines() {
        let text = "1.No space\n- bullet\n  2. indented\nQ3. prefixed\n10) paren\n4. \n5. Kept";
        assert_eq!(parse_questions(text, 10), vec!["Kept"]);
    }

    #[test]
    fn test_parse_questions_no_matches_is_empty() {
        assert!(parse_questions("I cannot help with that.", 4).is_empty());
        assert!(parse_questions("", 4).is_empty());
    }

    #[test]
    fn test_parse_questions_zero_limit() {
        assert!(parse_questions("1. A\n2. B", 0).is_empty());
    }

    #[test]
    fn test_parse_questions_handles_crlf() {
        assert_eq!(parse_questions("1. A\r\n2. B\r\n", 5), vec!["A", "B"]);
    }

    #[test]
    fn test_extract_score_decimal_any_case() {
        assert_eq!(extract_score("SCORE: 7.5/10 – Strong action"), Some(7.5));
        assert_eq!(extract_score("final score: 9 / 10"), Some(9.0));
        assert_eq!(extract_score("Score:8/10"), Some(8.0));
    }

    #[test]
    fn test_extract_score_first_match_wins() {
        assert_eq!(extract_score("Score: 6/10\n...\nScore: 9/10"), Some(6.0));
    }

    #[test]
    fn test_extract_score_absent_or_malformed() {
        assert_eq!(extract_score("Great answer overall."), None);
        assert_eq!(extract_score("Score: seven/10"), None);
        assert_eq!(extract_score("Score: 7.5/100"), None);
        assert_eq!(extract_score("Score: 12/10"), None);
        assert_eq!(extract_score("Rating: 8/10"), None);
    }

    #[test]
    fn test_average_score() {
        assert_eq!(average_score(&[9.0, 7.0]), Some(8.0));
        assert_eq!(average_score(&[7.5]), Some(7.5));
    }

    #[test]
    fn test_average_score_empty_is_unavailable() {
        assert_eq!(average_score(&[]), None);
    }

    #[test]
    fn test_star_sections_labelled_blocks() {
        let text = "STAR Feedback:\nSituation: vague.\nResult: no numbers.\n\nScore: 6/10\n\nResume-Based Enhancement:\nMention the 30% churn reduction.";
        let sections = extract_star_sections(text);
        assert_eq!(sections.star_feedback, "Situation: vague.\nResult: no numbers.");
        assert_eq!(sections.enhancement, "Mention the 30% churn reduction.");
    }

    #[test]
    fn test_star_sections_markdown_headings() {
        let text = "## STAR Feedback\n- Task unclear\n## Final Score\nScore: 7/10\n## Resume-Based Enhancement\nUse the Acme launch.\nAlso cite SQL work.";
        let sections = extract_star_sections(text);
        assert_eq!(sections.star_feedback, "- Task unclear");
        assert_eq!(sections.enhancement, "Use the Acme launch.\nAlso cite SQL work.");
    }

    #[test]
    fn test_star_sections_inline_label_text() {
        let text = "**STAR Feedback:** Strong action, weak result.\n**Resume-Based Enhancement:** Reference the pricing project.";
        let sections = extract_star_sections(text);
        assert_eq!(sections.star_feedback, "Strong action, weak result.");
        assert_eq!(sections.enhancement, "Reference the pricing project.");
    }

    #[test]
    fn test_star_sections_placeholders_when_missing() {
        let sections = extract_star_sections("Score: 8/10 – nice.");
        assert_eq!(sections.star_feedback, STAR_PLACEHOLDER);
        assert_eq!(sections.enhancement, ENHANCEMENT_PLACEHOLDER);
    }

    #[test]
    fn test_star_sections_empty_label_uses_placeholder() {
        let sections = extract_star_sections("STAR Feedback:\n\nResume-Based Enhancement:\n");
        assert_eq!(sections.star_feedback, STAR_PLACEHOLDER);
        assert_eq!(sections.enhancement, ENHANCEMENT_PLACEHOLDER);
    }

    #[test]
    fn test_star_sections_from_step_headings() {
        let text = "## Step 1: STAR Breakdown\n### Situation\nClear context.\n### Result\nNo metric.\n\n## Step 2: Final Score (out of 10)\nScore: 6.5/10 – Needs impact.\n\n## Step 3: Resume-Based Enhancement\nCite the CRM migration.";
        let sections = extract_star_sections(text);
        assert_eq!(
            sections.star_feedback,
            "### Situation\nClear context.\n### Result\nNo metric."
        );
        assert_eq!(sections.enhancement, "Cite the CRM migration.");
        assert_eq!(extract_score(text), Some(6.5));
    }

    #[test]
    fn test_parse_fit_assessment_dimensions_and_totals() {
        let text = "Technical Tools: 8\nUses SQL and Tableau.\n\n**Domain Experience**: 6\nSome overlap.\n\nProblem Solving: 7\n\nCommunication: 9\n\nLeadership/Initiative: 5\n\nTotal: 35/50\nPercentage: 70%\nFinal recommendation: Proceed with a second-round interview.";
        let fit = parse_fit_assessment(text);
        let scores: Vec<(FitDimension, u8)> =
            fit.dimensions.iter().map(|d| (d.dimension, d.score)).collect();
        assert_eq!(
            scores,
            vec![
                (FitDimension::TechnicalTools, 8),
                (FitDimension::DomainExperience, 6),
                (FitDimension::ProblemSolving, 7),
                (FitDimension::Communication, 9),
                (FitDimension::Leadership, 5),
            ]
        );
        assert_eq!(fit.total, Some(35.0));
        assert_eq!(fit.percentage, Some(70.0));
        assert_eq!(
            fit.recommendation.as_deref(),
            Some("Final recommendation: Proceed with a second-round interview.")
        );
    }

    #[test]
    fn test_parse_fit_assessment_ignores_out_of_range_dimension() {
        let fit = parse_fit_assessment("Communication: 42\nTechnical Tools: 0");
        assert!(fit.dimensions.is_empty());
    }

    #[test]
    fn test_parse_fit_assessment_reads_value_after_range_hint() {
        let text = "Technical Tools (1-10): 8\nCommunication (1–10): 9\n**Problem Solving:** 7";
        let fit = parse_fit_assessment(text);
        let scores: Vec<(FitDimension, u8)> =
            fit.dimensions.iter().map(|d| (d.dimension, d.score)).collect();
        assert_eq!(
            scores,
            vec![
                (FitDimension::TechnicalTools, 8),
                (FitDimension::ProblemSolving, 7),
                (FitDimension::Communication, 9),
            ]
        );
    }

    #[test]
    fn test_fit_total_needs_a_whole_number() {
        assert_eq!(parse_fit_assessment("Total: 135/50").total, None);
        assert_eq!(parse_fit_assessment("Total: 38.5/50").total, Some(38.5));
    }

    #[test]
    fn test_parse_fit_assessment_free_text_yields_nothing() {
        let fit = parse_fit_assessment("The candidate seems fine.");
        assert_eq!(fit, ParsedFit::default());
    }
}
