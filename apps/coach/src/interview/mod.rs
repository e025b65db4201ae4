//! Interview coaching workflow: intake, question generation, STAR feedback, summary.

pub mod coach;
pub mod handlers;
pub mod parser;
pub mod prompts;
pub mod report;
pub mod workflow;
