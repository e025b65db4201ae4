// All LLM prompt templates for the interview workflow.
// Inputs are interpolated verbatim: no escaping, no truncation.

/// Question-generation prompt template.
/// Replace: {total}, {jd_count}, {cv_count}, {job_description}, {resume}
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"You are a mock interview coach. Generate a total of {total} behavioral interview questions.
- First, generate {jd_count} questions based strictly on the Job Description below.
- Then, generate {cv_count} questions based on the candidate's resume.

Job Description:
{job_description}

Resume:
{resume}

Format: Numbered list."#;

/// Per-question feedback prompt template.
/// Replace: {question}, {answer}, {resume}
pub const FEEDBACK_PROMPT_TEMPLATE: &str = r#"You are a high-stakes mock interview coach for elite consulting, marketing, sales, and product roles. Evaluate critically using the STAR method with McKinsey-level scrutiny. Be rigorous.

## Step 1: STAR Feedback
Break the answer into Situation, Task, Action, Result.
- Identify weak verbs, filler content, and gaps in logic.
- Penalize generic or unverifiable claims.
- Praise tangible impact and confident storytelling.

## Step 2: Final Score (out of 10)
- 9–10: Elite answer; confident, structured, quantifiable.
- 7–8: Solid but could use clearer impact or tighter phrasing.
- 5–6: Adequate structure, but weak delivery or result.
- <5: Confusing or structurally broken.

End like: Score: 7.5/10 – Strong action but impact unclear.

## Step 3: Resume-Based Enhancement
Cross-reference with CV. Suggest better framing or context from resume items.

Question: {question}
Answer: {answer}
Resume: {resume}"#;

/// Per-question rewrite prompt template.
/// Replace: {question}, {answer}
pub const REWRITE_PROMPT_TEMPLATE: &str = r#"Rewrite this answer in better STAR format:
- Sharpen the task
- Add results
- Make it business-relevant and crisp

Question: {question}
Original Answer: {answer}"#;

/// End-of-workflow fit assessment prompt template.
/// Replace: {job_description}, {resume}, {answers}
pub const FIT_PROMPT_TEMPLATE: &str = r#"You are a senior hiring manager trained in candidate evaluation. Using the Job Description, Resume, and the candidate's STAR-format interview responses, assess how well this candidate fits the role.

Rate on these 5 dimensions (1–10 each):
- Technical Tools: List specific tools used (SQL, Tableau, etc.), assess alignment with JD.
- Domain Experience: Match real work done with what the role demands.
- Problem Solving: Reference concrete examples and business impact from answers.
- Communication: Judge structure, clarity, and precision in written answers.
- Leadership/Initiative: Use resume and answers to assess proactive behavior.

For each dimension, first give the score (e.g., "Technical Tools: 8") on a line, then a line break, then explain why.

Conclude with a total out of 50, percentage out of 100, and a final one-line hiring recommendation.

Job Description:
{job_description}

Resume:
{resume}

Interview Answers:
{answers}"#;

pub fn build_questions_prompt(
    job_description: &str,
    resume: &str,
    jd_count: u8,
    cv_count: u8,
) -> String {
    let total = (u32::from(jd_count) + u32::from(cv_count)).to_string();
    let jd_count = jd_count.to_string();
    let cv_count = cv_count.to_string();
    fill(
        QUESTIONS_PROMPT_TEMPLATE,
        &[
            ("{total}", total.as_str()),
            ("{jd_count}", jd_count.as_str()),
            ("{cv_count}", cv_count.as_str()),
            ("{job_description}", job_description),
            ("{resume}", resume),
        ],
    )
}

pub fn build_feedback_prompt(question: &str, answer: &str, resume: &str) -> String {
    fill(
        FEEDBACK_PROMPT_TEMPLATE,
        &[("{question}", question), ("{answer}", answer), ("{resume}", resume)],
    )
}

pub fn build_rewrite_prompt(question: &str, answer: &str) -> String {
    fill(
        REWRITE_PROMPT_TEMPLATE,
        &[("{question}", question), ("{answer}", answer)],
    )
}

pub fn build_fit_prompt(job_description: &str, resume: &str, answers: &[&str]) -> String {
    let answers = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| format!("A{}: {}", i + 1, answer))
        .collect::<Vec<_>>()
        .join("\n\n");
    fill(
        FIT_PROMPT_TEMPLATE,
        &[
            ("{job_description}", job_description),
            ("{resume}", resume),
            ("{answers}", answers.as_str()),
        ],
    )
}

/// Single-pass placeholder substitution. Substituted values are never rescanned, so a
/// candidate answer that happens to contain `{resume}` stays as written.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some((pos, key, value)) = values
        .iter()
        .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
        .min_by_key(|(pos, _, _)| *pos)
    {
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + key.len()..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_prompt_carries_counts_and_split() {
        let prompt = build_questions_prompt("Growth PM at Acme", "Led pricing revamp", 3, 2);
        assert!(prompt.contains("Generate a total of 5 behavioral interview questions"));
        assert!(prompt.contains("First, generate 3 questions based strictly on the Job Description"));
        assert!(prompt.contains("Then, generate 2 questions based on the candidate's resume"));
        assert!(prompt.contains("Job Description:\nGrowth PM at Acme"));
        assert!(prompt.contains("Resume:\nLed pricing revamp"));
        assert!(prompt.ends_with("Format: Numbered list."));
    }

    #[test]
    fn test_questions_prompt_passes_long_input_unchanged() {
        let jd = "x".repeat(50_000);
        let prompt = build_questions_prompt(&jd, "cv", 1, 1);
        assert!(prompt.contains(&jd));
    }

    #[test]
    fn test_feedback_prompt_embeds_inputs_and_sentinel() {
        let prompt = build_feedback_prompt("Q?", "My answer", "Resume body");
        assert!(prompt.contains("Question: Q?"));
        assert!(prompt.contains("Answer: My answer"));
        assert!(prompt.contains("Resume: Resume body"));
        assert!(prompt.contains("Score: 7.5/10"));
        assert!(prompt.contains("STAR Feedback"));
        assert!(prompt.contains("Resume-Based Enhancement"));
    }

    #[test]
    fn test_rewrite_prompt_embeds_question_and_answer() {
        let prompt = build_rewrite_prompt("Q?", "A.");
        assert!(prompt.starts_with("Rewrite this answer in better STAR format:"));
        assert!(prompt.contains("Question: Q?\nOriginal Answer: A."));
    }

    #[test]
    fn test_fit_prompt_lists_every_answer_in_order() {
        let prompt = build_fit_prompt("JD", "CV", &["first", "second"]);
        assert!(prompt.contains("Interview Answers:\nA1: first\n\nA2: second"));
        assert!(prompt.contains("Leadership/Initiative"));
        assert!(prompt.contains("total out of 50"));
    }

    #[test]
    fn test_fill_does_not_rescan_substituted_values() {
        let prompt = build_feedback_prompt("Q", "I typed {resume} literally", "REAL");
        assert!(prompt.contains("Answer: I typed {resume} literally"));
        assert!(prompt.contains("Resume: REAL"));
    }
}
