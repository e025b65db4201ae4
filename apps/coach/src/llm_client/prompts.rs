// Shared prompt constants.
// Step-specific templates live in interview::prompts; this file holds cross-cutting fragments.

/// System prompt sent with every completion request.
pub const COACH_SYSTEM: &str = "You are InterviewCoach Pro, a rigorous mock interview coach \
    for high-performance roles. Follow the requested output format exactly. \
    Keep numbered lists as plain `N. text` lines and keep labelled lines such as \
    `Score: X/10` verbatim so they can be read back reliably.";

/// The STAR framework, shown to candidates before they answer.
pub const STAR_GUIDE: &str = "\
S - Situation: Set the scene
T - Task: What you had to achieve
A - Action: Steps you took
R - Result: Outcome & impact (preferably with numbers)";
