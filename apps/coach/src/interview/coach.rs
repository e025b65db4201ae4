//! Interview coaching: drives each step's LLM work against the workflow state.
//!
//! Flow per step: prompts::build_* → CompletionClient::complete → parser → WorkflowState.
//! Calls run one at a time, in question order. The state machine stays the only mutator;
//! this module just feeds it.

use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::interview::parser::parse_questions;
use crate::interview::prompts::{
    build_feedback_prompt, build_fit_prompt, build_questions_prompt, build_rewrite_prompt,
};
use crate::interview::workflow::{
    FeedbackRecord, FitAssessment, FitOutcome, PendingQuestion, Step, WorkflowError, WorkflowState,
};
use crate::llm_client::{CompletionClient, LlmError};

/// What a feedback run did, for the response body and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackRun {
    pub succeeded: usize,
    pub failed: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Step 2: questions
// ────────────────────────────────────────────────────────────────────────────

/// Returns the session's questions, generating them on first use only.
///
/// A failed generation leaves the memo empty and surfaces as `AppError::Llm`;
/// the user cannot move on without questions.
pub async fn ensure_questions(
    state: &mut WorkflowState,
    llm: &dyn CompletionClient,
) -> Result<Vec<String>, AppError> {
    state.require_step(Step::QuestionGeneration)?;

    if let Some(existing) = state.questions() {
        debug!("Session {} already has {} questions", state.id(), existing.len());
        return Ok(existing.to_vec());
    }

    let (job_description, resume) = state
        .job_description()
        .zip(state.resume_text())
        .ok_or(WorkflowError::MissingIntake)?;
    let counts = state.counts();
    let requested = counts.total();

    info!(
        "Generating {} questions ({} JD + {} resume) for session {} via {}",
        requested,
        counts.jd_count,
        counts.cv_count,
        state.id(),
        llm.model()
    );

    let prompt = build_questions_prompt(job_description, resume, counts.jd_count, counts.cv_count);
    let completion = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    let parsed = parse_questions(&completion, requested);
    if parsed.len() < requested {
        warn!(
            "Model returned {} usable questions of {} requested for session {}",
            parsed.len(),
            requested,
            state.id()
        );
    }

    Ok(state.store_questions(parsed)?.to_vec())
}

// ────────────────────────────────────────────────────────────────────────────
// Step 3: feedback → Step 4: summary
// ────────────────────────────────────────────────────────────────────────────

/// Critiques and rewrites every pending answer, then moves the session to Summary
/// and runs the fit assessment.
///
/// A failed call only skips its own question. A failed fit assessment is recorded on
/// the session and never blocks the report.
pub async fn run_feedback(
    state: &mut WorkflowState,
    llm: &dyn CompletionClient,
) -> Result<FeedbackRun, AppError> {
    state.require_step(Step::Feedback)?;

    let resume = state
        .resume_text()
        .ok_or(WorkflowError::MissingIntake)?
        .to_string();
    let pending = state.pending_feedback();
    info!(
        "Collecting feedback for {} questions in session {}",
        pending.len(),
        state.id()
    );

    let mut run = FeedbackRun {
        succeeded: 0,
        failed: 0,
    };

    for item in pending {
        let index = item.index;
        match critique(&item, &resume, llm).await {
            Ok((feedback, rewrite)) => {
                let record = FeedbackRecord::new(index, item.question, item.answer, feedback, rewrite);
                if record.score.is_none() {
                    debug!("No score found in feedback for Q{}", index + 1);
                }
                state.record_feedback(record)?;
                run.succeeded += 1;
            }
            Err(e) => {
                warn!("Feedback for Q{} failed, skipping: {e}", index + 1);
                state.record_feedback_failure(index, format!("Error in generating feedback or rewrite: {e}"))?;
                run.failed += 1;
            }
        }
    }

    state.complete_feedback()?;
    info!(
        "Session {} reached summary: {} feedback, {} failed, average {:?}",
        state.id(),
        run.succeeded,
        run.failed,
        state.average_score()
    );

    if !state.feedback().is_empty() {
        assess_fit(state, llm).await?;
    }

    Ok(run)
}

/// Feedback then rewrite for one answer. Either call failing fails the question.
async fn critique(
    item: &PendingQuestion,
    resume: &str,
    llm: &dyn CompletionClient,
) -> Result<(String, String), LlmError> {
    let feedback = llm
        .complete(&build_feedback_prompt(&item.question, &item.answer, resume))
        .await?;
    let rewrite = llm
        .complete(&build_rewrite_prompt(&item.question, &item.answer))
        .await?;
    Ok((feedback, rewrite))
}

/// Scores candidate/role fit from the JD, resume, and all answers, and stores the outcome.
pub async fn assess_fit(
    state: &mut WorkflowState,
    llm: &dyn CompletionClient,
) -> Result<(), AppError> {
    state.require_step(Step::Summary)?;

    let (job_description, resume) = state
        .job_description()
        .zip(state.resume_text())
        .ok_or(WorkflowError::MissingIntake)?;
    let prompt = build_fit_prompt(job_description, resume, &state.answers_in_order());

    let outcome = match llm.complete(&prompt).await {
        Ok(text) => {
            let fit = FitAssessment::from_completion(text);
            for dim in &fit.dimensions {
                debug!("Fit {}: {}/10", dim.dimension.label(), dim.score);
            }
            if fit.dimensions.is_empty() {
                warn!("No dimension scores found in fit assessment for session {}", state.id());
            }
            FitOutcome::Assessed(fit)
        }
        Err(e) => {
            warn!("Fit assessment failed for session {}: {e}", state.id());
            FitOutcome::Failed {
                message: format!("Error generating fit score: {e}"),
            }
        }
    };

    state.record_fit(outcome)?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
