//! Fixed prompt text shared by the agent flows.

/// System message sent with every generation request.
pub const SYSTEM_INSTRUCTIONS: &str =
    "You are a clinical assistant. Use only the provided context. Do not invent facts. If unsure, say you do not know.";

pub const PLAN_STEPS: [&str; 4] = [
    "Check required sections (diagnosis, treatment, medications, follow-up).",
    "Check safety language and red flags.",
    "Check patient-friendly instructions.",
    "Check provider sign-off.",
];

pub const RETRIEVAL_QUERY: &str =
    "discharge summary SOP required sections medication list follow-up red flags sign-off privacy clinician review";

pub const NO_CITATIONS: &str = "No citations found.";

pub const OFFLINE_REPORT: &str = "Mock compliance report.";

pub fn report_prompt(draft: &str, citations: &str) -> String {
    format!(
        "Review the discharge summary for policy compliance. List issues with severity and suggest edits.\n\n\
         Summary:\n{draft}\nPolicy snippets:\n{citations}\n"
    )
}

pub fn qa_prompt(question: &str, snippets: &str) -> String {
    format!(
        "Answer the question using the provided policy snippets. Include brief citations.\n\n\
         Question: {question}\nSnippets:\n{snippets}\n"
    )
}

pub fn draft_prompt(notes: &str) -> String {
    format!("Draft a discharge summary and patient-friendly instructions.\n\nNotes:\n{notes}\n")
}
