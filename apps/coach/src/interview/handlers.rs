//! Axum route handlers for the interview session API.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::{extract_resume_text, ExtractError};
use crate::interview::coach::{ensure_questions, run_feedback};
use crate::interview::report::{build_report, render_docx, DOCX_CONTENT_TYPE, REPORT_FILENAME};
use crate::interview::workflow::{
    FeedbackFailure, FeedbackRecord, FitOutcome, QuestionCounts, Recommendation, Step,
    WorkflowState, DEFAULT_QUESTIONS_PER_SOURCE,
};
use crate::llm_client::prompts::STAR_GUIDE;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StepView {
    pub step: Step,
    pub number: u8,
    pub title: &'static str,
}

impl From<Step> for StepView {
    fn from(step: Step) -> Self {
        Self {
            step,
            number: step.number(),
            title: step.title(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub step: StepView,
}

#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub question: String,
    pub answer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: StepView,
    pub model: String,
    pub job_description: Option<String>,
    pub resume_text: Option<String>,
    pub counts: QuestionCounts,
    pub questions: Option<Vec<QuestionView>>,
    /// Zero-based indices still missing an answer.
    pub unanswered: Vec<usize>,
    pub feedback: Vec<FeedbackRecord>,
    pub failures: Vec<FeedbackFailure>,
    pub fit: Option<FitOutcome>,
}

#[derive(Debug, Serialize)]
pub struct IntakeResponse {
    pub session_id: Uuid,
    pub step: StepView,
    pub counts: QuestionCounts,
    pub resume_filename: Option<String>,
    /// Full extracted text, so the candidate can check what the coach will read.
    pub resume_text: String,
    pub resume_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub session_id: Uuid,
    pub requested: usize,
    pub questions: Vec<QuestionView>,
    pub star_guide: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub index: usize,
    pub unanswered: Vec<usize>,
    pub all_answered: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub session_id: Uuid,
    pub scores: Vec<f64>,
    pub average_score: Option<f64>,
    pub recommendation: Recommendation,
    pub recommendation_message: &'static str,
    pub fit: Option<FitOutcome>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub session_id: Uuid,
    pub step: StepView,
    pub succeeded: usize,
    pub failed: usize,
    pub feedback: Vec<FeedbackRecord>,
    pub failures: Vec<FeedbackFailure>,
    pub summary: SummaryView,
}

struct UploadedResume {
    filename: Option<String>,
    content_type: Option<String>,
    bytes: bytes::Bytes,
}

fn question_views(state: &WorkflowState) -> Option<Vec<QuestionView>> {
    state.questions().map(|questions| {
        questions
            .iter()
            .enumerate()
            .map(|(index, question)| QuestionView {
                index,
                question: question.clone(),
                answer: state.answer(index).map(String::from),
            })
            .collect()
    })
}

fn summary_view(state: &WorkflowState) -> SummaryView {
    let recommendation = state.recommendation();
    SummaryView {
        session_id: state.id(),
        scores: state.scores(),
        average_score: state.average_score(),
        recommendation,
        recommendation_message: recommendation.message(),
        fit: state.fit().cloned(),
    }
}

fn parse_count(field: &str, raw: &str) -> Result<u32, AppError> {
    raw.trim().parse::<u32>().map_err(|_| {
        AppError::Validation(format!("{field} must be a whole number between 0 and 10"))
    })
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.sessions.create().await;
    info!(
        "Created session {session_id} ({} active)",
        state.sessions.len().await
    );
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            step: Step::Intake.into(),
        }),
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await?;
    let workflow = session.lock().await;

    Ok(Json(SessionView {
        session_id: workflow.id(),
        created_at: workflow.created_at(),
        step: workflow.step().into(),
        model: state.llm.model().to_string(),
        job_description: workflow.job_description().map(String::from),
        resume_text: workflow.resume_text().map(String::from),
        counts: workflow.counts(),
        questions: question_views(&workflow),
        unanswered: workflow.unanswered(),
        feedback: workflow.feedback().to_vec(),
        failures: workflow.failures().to_vec(),
        fit: workflow.fit().cloned(),
    }))
}

/// DELETE /api/v1/sessions/:id
///
/// Ends the practice run and discards its state.
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    info!(
        "Ended session {id} ({} active)",
        state.sessions.len().await
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/intake
///
/// Multipart fields: `job_description`, `jd_question_count`, `cv_question_count`,
/// and a `resume` file (PDF or plain text). Counts default to 2 each.
/// Can be resubmitted until the intake is confirmed.
pub async fn handle_submit_intake(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<IntakeResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;
    workflow.require_step(Step::Intake)?;

    let mut job_description = None;
    let mut jd_count = u32::from(DEFAULT_QUESTIONS_PER_SOURCE);
    let mut cv_count = u32::from(DEFAULT_QUESTIONS_PER_SOURCE);
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            "jd_question_count" => {
                jd_count = parse_count(&name, &field.text().await.map_err(multipart_error)?)?;
            }
            "cv_question_count" => {
                cv_count = parse_count(&name, &field.text().await.map_err(multipart_error)?)?;
            }
            "resume" => {
                let filename = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                resume = Some(UploadedResume {
                    filename,
                    content_type,
                    bytes,
                });
            }
            other => debug!("Ignoring unknown intake field '{other}'"),
        }
    }

    let counts = QuestionCounts::new(jd_count, cv_count)?;
    let job_description = job_description.unwrap_or_default();
    let upload = resume
        .ok_or_else(|| AppError::Validation("A resume file is required".to_string()))?;

    info!(
        "Extracting resume {:?} ({} bytes) for session {id}",
        upload.filename,
        upload.bytes.len()
    );
    let resume_filename = upload.filename.clone();
    let resume_text = tokio::task::spawn_blocking(move || {
        extract_resume_text(
            upload.filename.as_deref(),
            upload.content_type.as_deref(),
            &upload.bytes,
        )
    })
    .await
    .map_err(|e| ExtractError::Pdf(format!("extraction aborted: {e}")))??;

    workflow.submit_intake(job_description, resume_text.clone(), counts)?;

    Ok(Json(IntakeResponse {
        session_id: id,
        step: workflow.step().into(),
        counts,
        resume_filename,
        resume_chars: resume_text.chars().count(),
        resume_text,
    }))
}

/// POST /api/v1/sessions/:id/intake/confirm
pub async fn handle_confirm_intake(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;
    workflow.confirm_intake()?;
    info!("Session {id} confirmed intake");
    Ok(Json(workflow.step().into()))
}

/// POST /api/v1/sessions/:id/questions
///
/// Generates the questions on the first call; later calls return the same list.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionsResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;

    ensure_questions(&mut workflow, state.llm.as_ref()).await?;

    Ok(Json(QuestionsResponse {
        session_id: id,
        requested: workflow.counts().total(),
        questions: question_views(&workflow).unwrap_or_default(),
        star_guide: STAR_GUIDE,
    }))
}

/// PUT /api/v1/sessions/:id/answers/:index
pub async fn handle_record_answer(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;

    workflow.record_answer(index, req.answer)?;

    Ok(Json(AnswerResponse {
        index,
        unanswered: workflow.unanswered(),
        all_answered: workflow.all_answered(),
    }))
}

/// POST /api/v1/sessions/:id/answers/confirm
pub async fn handle_confirm_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StepView>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;
    workflow.confirm_answers()?;
    info!("Session {id} confirmed all answers");
    Ok(Json(workflow.step().into()))
}

/// POST /api/v1/sessions/:id/feedback
///
/// Critiques every answer, moves to the summary, then scores the overall fit.
/// Holds the session lock for the whole run.
pub async fn handle_run_feedback(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedbackResponse>, AppError> {
    let session = state.sessions.get(id).await?;
    let mut workflow = session.lock().await;

    let run = run_feedback(&mut workflow, state.llm.as_ref()).await?;

    Ok(Json(FeedbackResponse {
        session_id: id,
        step: workflow.step().into(),
        succeeded: run.succeeded,
        failed: run.failed,
        feedback: workflow.feedback().to_vec(),
        failures: workflow.failures().to_vec(),
        summary: summary_view(&workflow),
    }))
}

/// GET /api/v1/sessions/:id/summary
pub async fn handle_get_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryView>, AppError> {
    let session = state.sessions.get(id).await?;
    let workflow = session.lock().await;
    workflow.require_step(Step::Summary)?;
    Ok(Json(summary_view(&workflow)))
}

/// GET /api/v1/sessions/:id/report
///
/// Downloads the feedback report as a Word document.
pub async fn handle_download_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(id).await?;
    let workflow = session.lock().await;
    workflow.require_step(Step::Summary)?;

    let report = build_report(
        workflow.feedback(),
        workflow.average_score(),
        Some(workflow.recommendation()),
    );
    let bytes = render_docx(&report)?;
    info!(
        "Rendered report for session {id}: {} sections, {} bytes",
        report.sections.len(),
        bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILENAME}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/star-guide
pub async fn handle_star_guide() -> Json<Value> {
    Json(json!({ "guide": STAR_GUIDE }))
}
