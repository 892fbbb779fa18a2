//! SMS medication reminders.

use health_tracker_core::config::NotificationConfig;
use health_tracker_core::models::MedicationForecast;
use serde::Deserialize;

use crate::{ensure_success, AssistError, AssistResult};

/// Daily reminder text.
pub const REMINDER_BODY: &str = "Reminder: time to take your medication 💊";

/// Client for a Twilio-style messages API.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    http: reqwest::Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

impl NotificationClient {
    /// Build a client with the configured request timeout.
    pub fn from_config(config: &NotificationConfig) -> AssistResult<Self> {
        if !config.enabled {
            return Err(AssistError::NotConfigured("notifications are disabled".into()));
        }
        if config.account_sid.is_empty() || config.to_number.is_empty() {
            return Err(AssistError::NotConfigured(
                "notification account_sid and to_number are required".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from_number: config.from_number.clone(),
            to_number: config.to_number.clone(),
        })
    }

    /// Send one SMS and return the provider's message ID.
    pub async fn send(&self, body: &str) -> AssistResult<String> {
        let url = format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("To", self.to_number.as_str()),
                ("From", self.from_number.as_str()),
                ("Body", body),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let message: MessageResponse = serde_json::from_str(&response.text().await?)?;
        tracing::info!(sid = %message.sid, "Sent SMS reminder");
        Ok(message.sid)
    }

    /// Send the fixed daily reminder.
    pub async fn send_reminder(&self) -> AssistResult<String> {
        self.send(REMINDER_BODY).await
    }
}

/// Reminder listing the medications inside the warning window.
///
/// `None` when nothing is running low.
pub fn low_stock_message(forecasts: &[MedicationForecast]) -> Option<String> {
    let low: Vec<&MedicationForecast> = forecasts.iter().filter(|f| f.warning_active).collect();
    if low.is_empty() {
        return None;
    }

    let mut body = String::from("Medication running low:");
    for f in low {
        if f.days_until_finish < 0 {
            body.push_str(&format!("\n- {}: ran out on {}", f.name, f.estimated_finish_date));
        } else {
            body.push_str(&format!(
                "\n- {}: runs out {} ({} days)",
                f.name, f.estimated_finish_date, f.days_until_finish
            ));
        }
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use health_tracker_core::models::MedicationStockEntry;
    use health_tracker_core::projector::StockProjector;
    use rust_decimal::Decimal;

    fn forecasts(as_of: NaiveDate) -> Vec<MedicationForecast> {
        let refill = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let entries = vec![
            MedicationStockEntry::new("Metformin".into(), refill, 60, Decimal::TWO),
            MedicationStockEntry::new("Amlo".into(), refill, 90, Decimal::ONE),
        ];
        StockProjector::new().project(&entries, as_of).unwrap()
    }

    #[test]
    fn test_low_stock_message() {
        let msg = low_stock_message(&forecasts(NaiveDate::from_ymd_opt(2024, 1, 25).unwrap())).unwrap();
        assert_eq!(msg, "Medication running low:\n- Metformin: runs out 2024-01-31 (6 days)");
    }

    #[test]
    fn test_low_stock_message_overdue() {
        let msg = low_stock_message(&forecasts(NaiveDate::from_ymd_opt(2024, 2, 2).unwrap())).unwrap();
        assert!(msg.contains("- Metformin: ran out on 2024-01-31"));
        assert!(!msg.contains("Amlo"));
    }

    #[test]
    fn test_low_stock_message_none() {
        assert_eq!(
            low_stock_message(&forecasts(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())),
            None
        );
    }

    #[test]
    fn test_from_config_disabled() {
        assert!(matches!(
            NotificationClient::from_config(&NotificationConfig::default()),
            Err(AssistError::NotConfigured(_))
        ));
    }
}
