//! Workflow State Machine: the four-step interview session.
//!
//! `Intake -> QuestionGeneration -> Feedback -> Summary`, forward only.
//! `WorkflowState` is the only thing that mutates session data; every mutation checks
//! the current step first and every transition checks its completion precondition.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::interview::parser::{
    average_score, extract_score, extract_star_sections, parse_fit_assessment, DimensionScore,
    StarSections,
};

pub const MAX_QUESTIONS_PER_SOURCE: u8 = 10;
pub const DEFAULT_QUESTIONS_PER_SOURCE: u8 = 2;

/// Average at or above this → ready to interview.
pub const PROCEED_THRESHOLD: f64 = 8.0;
/// Average below this → not ready. Between the two → practice more.
pub const NOT_READY_THRESHOLD: f64 = 7.0;

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    #[error("Session is at step {actual}, but this action belongs to step {expected}")]
    WrongStep { expected: Step, actual: Step },

    #[error("Job description cannot be empty")]
    EmptyJobDescription,

    #[error("Resume text cannot be empty")]
    EmptyResume,

    #[error("{field} must be between 0 and 10, got {value}")]
    QuestionCountOutOfRange { field: &'static str, value: u32 },

    #[error("Job description and resume must be submitted before continuing")]
    MissingIntake,

    #[error("Questions have already been generated for this session")]
    QuestionsAlreadyGenerated,

    #[error("Questions have not been generated yet")]
    QuestionsNotGenerated,

    #[error("Question {index} does not exist (session has {total} questions)")]
    QuestionOutOfRange { index: usize, total: usize },

    #[error("Questions still unanswered: {}", one_based(.0))]
    Unanswered(Vec<usize>),

    #[error("Feedback for question {} was already recorded", .0 + 1)]
    AlreadyAttempted(usize),

    #[error("Feedback attempted for {attempted} of {total} questions")]
    FeedbackIncomplete { attempted: usize, total: usize },

    #[error("Fit assessment was already recorded")]
    FitAlreadyRecorded,
}

impl WorkflowError {
    /// Whether the error means "wrong moment" rather than "bad input".
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            WorkflowError::WrongStep { .. }
                | WorkflowError::MissingIntake
                | WorkflowError::QuestionsAlreadyGenerated
                | WorkflowError::QuestionsNotGenerated
                | WorkflowError::Unanswered(_)
                | WorkflowError::AlreadyAttempted(_)
                | WorkflowError::FeedbackIncomplete { .. }
                | WorkflowError::FitAlreadyRecorded
        )
    }
}

fn one_based(indices: &[usize]) -> String {
    indices
        .iter()
        .map(|i| (i + 1).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Intake,
    QuestionGeneration,
    Feedback,
    Summary,
}

impl Step {
    /// 1-based ordinal shown to the user.
    pub fn number(self) -> u8 {
        match self {
            Step::Intake => 1,
            Step::QuestionGeneration => 2,
            Step::Feedback => 3,
            Step::Summary => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Intake => "Upload Job Description & Resume",
            Step::QuestionGeneration => "Answer Tailored Mock Interview Questions",
            Step::Feedback => "Receive Feedback & Suggested Improvements",
            Step::Summary => "Summary Report & Final Recommendation",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// How many questions to draw from each source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionCounts {
    pub jd_count: u8,
    pub cv_count: u8,
}

impl QuestionCounts {
    pub fn new(jd_count: u32, cv_count: u32) -> Result<Self, WorkflowError> {
        Ok(Self {
            jd_count: checked_count("jd_question_count", jd_count)?,
            cv_count: checked_count("cv_question_count", cv_count)?,
        })
    }

    pub fn total(&self) -> usize {
        usize::from(self.jd_count) + usize::from(self.cv_count)
    }
}

impl Default for QuestionCounts {
    fn default() -> Self {
        Self {
            jd_count: DEFAULT_QUESTIONS_PER_SOURCE,
            cv_count: DEFAULT_QUESTIONS_PER_SOURCE,
        }
    }
}

fn checked_count(field: &'static str, value: u32) -> Result<u8, WorkflowError> {
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_QUESTIONS_PER_SOURCE)
        .ok_or(WorkflowError::QuestionCountOutOfRange { field, value })
}

/// Critique of one answer. Built once during the feedback step, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub index: usize,
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub rewrite: String,
    /// `Score: X/10` pulled from the feedback, if the model produced one.
    pub score: Option<f64>,
    pub sections: StarSections,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(index: usize, question: String, answer: String, feedback: String, rewrite: String) -> Self {
        let score = extract_score(&feedback);
        let sections = extract_star_sections(&feedback);
        Self {
            index,
            question,
            answer,
            feedback,
            rewrite,
            score,
            sections,
            created_at: Utc::now(),
        }
    }
}

/// A question whose feedback or rewrite call failed. Counts as attempted, carries no score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackFailure {
    pub index: usize,
    pub message: String,
}

/// End-of-workflow candidate/role fit evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitAssessment {
    pub text: String,
    pub dimensions: Vec<DimensionScore>,
    pub total: Option<f64>,
    pub percentage: Option<f64>,
    pub recommendation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FitAssessment {
    pub fn from_completion(text: String) -> Self {
        let parsed = parse_fit_assessment(&text);
        Self {
            text,
            dimensions: parsed.dimensions,
            total: parsed.total,
            percentage: parsed.percentage,
            recommendation: parsed.recommendation,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    Assessed(FitAssessment),
    Failed { message: String },
}

/// Three-way readiness call derived from the average answer score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    PracticeMore,
    NotReady,
}

impl Recommendation {
    /// `>= 8` proceed, `< 7` not ready, otherwise practice more.
    /// No average at all reads as not ready.
    pub fn from_average(average: Option<f64>) -> Self {
        match average {
            Some(avg) if avg >= PROCEED_THRESHOLD => Recommendation::Proceed,
            Some(avg) if avg >= NOT_READY_THRESHOLD => Recommendation::PracticeMore,
            _ => Recommendation::NotReady,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::Proceed => "Recommendation: Proceed to interview",
            Recommendation::PracticeMore => {
                "Recommendation: Practice more before the interview but you are close"
            }
            Recommendation::NotReady => "Recommendation: Not ready for interview",
        }
    }
}

/// A question waiting for feedback, detached from the state so LLM calls can borrow it freely.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingQuestion {
    pub index: usize,
    pub question: String,
    pub answer: String,
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WorkflowState {
    id: Uuid,
    created_at: DateTime<Utc>,
    step: Step,
    job_description: Option<String>,
    resume_text: Option<String>,
    counts: QuestionCounts,
    /// `None` until generated; generation happens at most once per session.
    questions: Option<Vec<String>>,
    answers: BTreeMap<usize, String>,
    feedback: Vec<FeedbackRecord>,
    failures: Vec<FeedbackFailure>,
    fit: Option<FitOutcome>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            step: Step::Intake,
            job_description: None,
            resume_text: None,
            counts: QuestionCounts::default(),
            questions: None,
            answers: BTreeMap::new(),
            feedback: Vec::new(),
            failures: Vec::new(),
            fit: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn job_description(&self) -> Option<&str> {
        self.job_description.as_deref()
    }

    pub fn resume_text(&self) -> Option<&str> {
        self.resume_text.as_deref()
    }

    pub fn counts(&self) -> QuestionCounts {
        self.counts
    }

    pub fn questions(&self) -> Option<&[String]> {
        self.questions.as_deref()
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    pub fn feedback(&self) -> &[FeedbackRecord] {
        &self.feedback
    }

    pub fn failures(&self) -> &[FeedbackFailure] {
        &self.failures
    }

    pub fn fit(&self) -> Option<&FitOutcome> {
        self.fit.as_ref()
    }

    pub fn require_step(&self, expected: Step) -> Result<(), WorkflowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WorkflowError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    // ── Step 1: Intake ────────────────────────────────────────────────────────

    /// Stages the intake inputs. May be repeated while still in Intake.
    pub fn submit_intake(
        &mut self,
        job_description: String,
        resume_text: String,
        counts: QuestionCounts,
    ) -> Result<(), WorkflowError> {
        self.require_step(Step::Intake)?;
        if job_description.trim().is_empty() {
            return Err(WorkflowError::EmptyJobDescription);
        }
        if resume_text.trim().is_empty() {
            return Err(WorkflowError::EmptyResume);
        }
        self.job_description = Some(job_description);
        self.resume_text = Some(resume_text);
        self.counts = counts;
        Ok(())
    }

    pub fn confirm_intake(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::Intake)?;
        let has_jd = self.job_description.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_cv = self.resume_text.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !(has_jd && has_cv) {
            return Err(WorkflowError::MissingIntake);
        }
        self.step = Step::QuestionGeneration;
        Ok(())
    }

    // ── Step 2: Questions & answers ───────────────────────────────────────────

    /// Stores the generated questions, capped at the requested total. Only once.
    pub fn store_questions(&mut self, mut questions: Vec<String>) -> Result<&[String], WorkflowError> {
        self.require_step(Step::QuestionGeneration)?;
        if self.questions.is_some() {
            return Err(WorkflowError::QuestionsAlreadyGenerated);
        }
        questions.truncate(self.counts.total());
        let stored = self.questions.insert(questions);
        Ok(stored.as_slice())
    }

    pub fn record_answer(&mut self, index: usize, answer: String) -> Result<(), WorkflowError> {
        self.require_step(Step::QuestionGeneration)?;
        let total = self.generated_len()?;
        if index >= total {
            return Err(WorkflowError::QuestionOutOfRange { index, total });
        }
        self.answers.insert(index, answer);
        Ok(())
    }

    /// Indices of questions with a missing, empty, or whitespace-only answer.
    pub fn unanswered(&self) -> Vec<usize> {
        let total = self.questions.as_ref().map_or(0, Vec::len);
        (0..total)
            .filter(|i| self.answers.get(i).map_or(true, |a| a.trim().is_empty()))
            .collect()
    }

    pub fn all_answered(&self) -> bool {
        self.questions.is_some() && self.unanswered().is_empty()
    }

    pub fn confirm_answers(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::QuestionGeneration)?;
        self.generated_len()?;
        let unanswered = self.unanswered();
        if !unanswered.is_empty() {
            return Err(WorkflowError::Unanswered(unanswered));
        }
        self.step = Step::Feedback;
        Ok(())
    }

    /// Answers in question order, blanks for any gaps.
    pub fn answers_in_order(&self) -> Vec<&str> {
        let total = self.questions.as_ref().map_or(0, Vec::len);
        (0..total).map(|i| self.answer(i).unwrap_or("")).collect()
    }

    // ── Step 3: Feedback ──────────────────────────────────────────────────────

    /// Questions that have not yet had a feedback attempt, in order.
    pub fn pending_feedback(&self) -> Vec<PendingQuestion> {
        self.questions
            .iter()
            .flatten()
            .enumerate()
            .filter(|(index, _)| !self.is_attempted(*index))
            .map(|(index, question)| PendingQuestion {
                index,
                question: question.clone(),
                answer: self.answer(index).unwrap_or_default().to_string(),
            })
            .collect()
    }

    pub fn record_feedback(&mut self, record: FeedbackRecord) -> Result<(), WorkflowError> {
        self.check_attemptable(record.index)?;
        self.feedback.push(record);
        self.feedback.sort_by_key(|r| r.index);
        Ok(())
    }

    pub fn record_feedback_failure(&mut self, index: usize, message: String) -> Result<(), WorkflowError> {
        self.check_attemptable(index)?;
        self.failures.push(FeedbackFailure { index, message });
        self.failures.sort_by_key(|f| f.index);
        Ok(())
    }

    /// Moves to Summary once every question has been attempted, successful or not.
    pub fn complete_feedback(&mut self) -> Result<(), WorkflowError> {
        self.require_step(Step::Feedback)?;
        let total = self.generated_len()?;
        let attempted = self.feedback.len() + self.failures.len();
        if attempted < total {
            return Err(WorkflowError::FeedbackIncomplete { attempted, total });
        }
        self.step = Step::Summary;
        Ok(())
    }

    fn is_attempted(&self, index: usize) -> bool {
        self.feedback.iter().any(|r| r.index == index) || self.failures.iter().any(|f| f.index == index)
    }

    fn check_attemptable(&self, index: usize) -> Result<(), WorkflowError> {
        self.require_step(Step::Feedback)?;
        let total = self.generated_len()?;
        if index >= total {
            return Err(WorkflowError::QuestionOutOfRange { index, total });
        }
        if self.is_attempted(index) {
            return Err(WorkflowError::AlreadyAttempted(index));
        }
        Ok(())
    }

    fn generated_len(&self) -> Result<usize, WorkflowError> {
        self.questions
            .as_ref()
            .map(Vec::len)
            .ok_or(WorkflowError::QuestionsNotGenerated)
    }

    // ── Step 4: Summary ───────────────────────────────────────────────────────

    pub fn scores(&self) -> Vec<f64> {
        self.feedback.iter().filter_map(|r| r.score).collect()
    }

    pub fn average_score(&self) -> Option<f64> {
        average_score(&self.scores())
    }

    pub fn recommendation(&self) -> Recommendation {
        Recommendation::from_average(self.average_score())
    }

    pub fn record_fit(&mut self, outcome: FitOutcome) -> Result<(), WorkflowError> {
        self.require_step(Step::Summary)?;
        if self.fit.is_some() {
            return Err(WorkflowError::FitAlreadyRecorded);
        }
        self.fit = Some(outcome);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
