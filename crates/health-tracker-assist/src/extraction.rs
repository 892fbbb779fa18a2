//! Vitals extraction from assistant replies and meter text.

use health_tracker_core::models::VitalsHint;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssistError, AssistResult};

/// Vitals as the model returns them, before any checking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RawVitals {
    pub systolic: Option<f64>,
    pub diastolic: Option<f64>,
    pub pulse: Option<f64>,
    pub glucose_mmol: Option<f64>,
}

impl RawVitals {
    /// Convert to a hint and drop anything out of range.
    pub fn into_hint(self) -> VitalsHint {
        VitalsHint {
            systolic: self.systolic.and_then(whole_number),
            diastolic: self.diastolic.and_then(whole_number),
            pulse: self.pulse.and_then(whole_number),
            glucose_mmol: self
                .glucose_mmol
                .and_then(|g| Decimal::try_from(g).ok())
                .map(|g| g.round_dp(1)),
        }
        .checked()
    }
}

fn whole_number(value: f64) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= u32::MAX as f64 {
        Some(value.round() as u32)
    } else {
        None
    }
}

/// Parse the JSON object in an assistant reply into a checked hint.
pub fn parse_vitals_reply(reply: &str) -> AssistResult<VitalsHint> {
    // Models sometimes wrap the object in prose or a code fence
    let json_start = reply.find('{').ok_or_else(|| {
        AssistError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = reply.rfind('}').ok_or_else(|| {
        AssistError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(AssistError::InvalidFormat("Braces out of order in response".into()));
    }

    let raw: RawVitals = serde_json::from_str(&reply[json_start..=json_end])?;
    Ok(raw.into_hint())
}

/// Pick readings out of plain meter text, e.g. "SYS 128 DIA 82 PUL 70" or "128/82".
///
/// Used when there is no model to ask. Anything unrecognised is left empty.
pub fn scan_reading_text(text: &str) -> VitalsHint {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .filter(|w| !w.is_empty())
        .collect();

    let mut raw = RawVitals::default();

    for (i, word) in words.iter().enumerate() {
        let next = words.get(i + 1).and_then(|w| w.parse::<f64>().ok());

        match *word {
            "sys" | "systolic" => raw.systolic = raw.systolic.or(next),
            "dia" | "diastolic" => raw.diastolic = raw.diastolic.or(next),
            "pul" | "pulse" | "bpm" => raw.pulse = raw.pulse.or(next),
            "glu" | "glucose" => raw.glucose_mmol = raw.glucose_mmol.or(next),
            _ => {
                if let Some((sys, dia)) = word.split_once('/') {
                    if let (Ok(sys), Ok(dia)) = (sys.parse::<f64>(), dia.parse::<f64>()) {
                        raw.systolic = raw.systolic.or(Some(sys));
                        raw.diastolic = raw.diastolic.or(Some(dia));
                    }
                }
                if let Some(num) = word.strip_suffix("mmol/l") {
                    raw.glucose_mmol = raw.glucose_mmol.or(num.parse().ok());
                }
            }
        }
    }

    raw.into_hint()
}
