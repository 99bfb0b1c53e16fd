//! Plain-text rendering of transcripts, summaries, and errors for the terminal.

use crate::session::{Reply, StageErrors, SummaryPipeline, Turn};
use std::fmt::Write as _;

const THINKING: &str = "Thinking...";
const EMPTY_SUMMARY: &str = "No Summary Available";

/// Render one turn as a question line and, once settled, a reply line.
pub fn render_turn(turn: &Turn) -> String {
    let mut out = format!("You: {}\n", turn.question);
    match &turn.reply {
        Reply::Pending => {
            let _ = writeln!(out, "Assistant: {THINKING}");
        }
        Reply::Answered(answer) => {
            let _ = writeln!(out, "Assistant: {}", answer.text);
            if !answer.sources.is_empty() {
                let _ = writeln!(out, "  sources: {}", answer.sources.join(", "));
            }
        }
        Reply::Failed(error) => {
            let _ = writeln!(out, "! {error}");
        }
    }
    out
}

/// Render a whole transcript in submission order.
pub fn render_transcript(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "Ask questions about your document\n".to_string();
    }
    turns.iter().map(render_turn).collect()
}

/// Render the summary followed by the question list.
///
/// Collapsed questions show `[+]`; expanded ones show `[-]` and their answer.
pub fn render_summary(pipeline: &SummaryPipeline) -> String {
    let Some(summary) = pipeline.summary_text() else {
        return format!("{EMPTY_SUMMARY}\n");
    };

    let mut out = String::from("Document Summary\n\n");
    let _ = writeln!(out, "{}", summary.trim_end());

    if !pipeline.questions().is_empty() {
        out.push_str("\nQuestions\n");
        for (index, item) in pipeline.questions().iter().enumerate() {
            if pipeline.is_expanded(index) {
                let _ = writeln!(out, "[-] {}", item.question);
                let _ = writeln!(out, "    Answer: {}", item.answer);
            } else {
                let _ = writeln!(out, "[+] {}", item.question);
            }
        }
    }
    out
}

/// Render the current stage errors, one per line.
pub fn render_errors(errors: &StageErrors) -> String {
    errors.iter().map(|error| format!("! {error}\n")).collect()
}
