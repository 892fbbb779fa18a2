//! Prompts for the health assistant.

use health_tracker_core::models::{ChatMessage, HealthRecord};
use health_tracker_core::summary::{recent, VitalsSummary};

/// Records included in the chat context by default.
pub const CONTEXT_RECORD_LIMIT: usize = 14;

/// System prompt for the chat assistant.
pub const SYSTEM_PROMPT: &str = r#"You are a friendly health assistant for an older adult who tracks blood pressure, pulse, blood glucose and daily medication at home.

Answer questions about their recent readings in plain language.
- Blood pressure above 140/90 mmHg is high.
- Fasting glucose below 3.9 mmol/L is low; above 7.8 mmol/L is high.

Never change or recommend changing a medication dose. For anything worrying, suggest contacting their doctor."#;

/// Prompt for reading vitals from a photo of a meter.
pub const VITALS_EXTRACTION_PROMPT: &str = r#"Read the numbers shown on this blood pressure monitor or glucose meter.

Return only a JSON object with these keys:
- systolic: systolic pressure in mmHg (integer, null if not shown)
- diastolic: diastolic pressure in mmHg (integer, null if not shown)
- pulse: pulse in beats per minute (integer, null if not shown)
- glucose_mmol: blood glucose in mmol/L (number, null if not shown)"#;

/// One line per record, oldest first, capped at the last `limit` records.
pub fn summarize_records(records: &[HealthRecord], limit: usize) -> String {
    let shown = recent(records, limit);
    if shown.is_empty() {
        return "No readings recorded yet.".to_string();
    }

    let mut text = String::new();
    for r in shown {
        text.push_str(&format!(
            "{} {:?}: BP {}/{} ({:?}), pulse {}, glucose {} mmol/L ({:?}, {:?})",
            r.date,
            r.time_period,
            r.systolic,
            r.diastolic,
            r.bp_status,
            r.pulse,
            r.glucose_mmol,
            r.glucose_status,
            r.meal_timing,
        ));
        if let Some(med) = &r.medication {
            text.push_str(&format!(", took {}", med));
            if let Some(dose) = &r.dose {
                text.push_str(&format!(" {}", dose));
            }
        }
        text.push('\n');
    }

    let summary = VitalsSummary::from_records(shown);
    if let (Some(sys), Some(dia)) = (summary.mean_systolic, summary.mean_diastolic) {
        text.push_str(&format!("Average BP {}/{}", sys, dia));
        if let Some(glucose) = summary.mean_glucose_mmol {
            text.push_str(&format!(", average glucose {} mmol/L", glucose));
        }
        text.push('\n');
    }

    text
}

/// Full message list for one chat turn.
///
/// The system prompt and record context come first, then the prior
/// conversation, then the new question.
pub fn build_chat_messages(
    history: &[ChatMessage],
    records: &[HealthRecord],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 3);

    messages.push(ChatMessage::system(SYSTEM_PROMPT));
    messages.push(ChatMessage::system(format!(
        "Recent readings:\n{}",
        summarize_records(records, CONTEXT_RECORD_LIMIT)
    )));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));

    messages
}
