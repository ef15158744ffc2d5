// media-report/src/email.rs
// ============================================================================
// Module: Report Email Delivery
// Description: Verified-recipient email delivery for completed report runs
//              (§4.6 step 9).
// Purpose: One seam, `EmailSender`, so the worker never depends on
//          `aws-sdk-sesv2` directly.
// Dependencies: aws-sdk-sesv2, async_trait
// ============================================================================

//! ## Overview
//! [`EmailSender`] is the seam; [`SesEmailSender`] is the only production
//! implementation, grounded on the object-store client wiring used for raw
//! snapshots elsewhere in this corpus. [`send_report_email`] applies the
//! verified-sender-or-domain check and per-recipient drop/skip/fail rules so
//! the worker itself stays free of SES specifics.

use async_trait::async_trait;
use media_core::EventSink;
use serde_json::json;
use thiserror::Error;

/// Errors sending or verifying through the underlying email provider.
#[derive(Debug, Error)]
pub enum EmailSenderError {
    /// The underlying provider call failed.
    #[error("email sender error: {0}")]
    Upstream(String),
}

/// Sends report emails and checks sender/domain verification status.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Returns whether `identity` (an exact address or a bare domain) is a
    /// verified sending identity.
    ///
    /// # Errors
    /// Returns [`EmailSenderError`] when the underlying check fails.
    async fn is_verified(&self, identity: &str) -> Result<bool, EmailSenderError>;

    /// Sends one plain-text email from `sender` to `recipient`.
    ///
    /// # Errors
    /// Returns [`EmailSenderError`] when the underlying send fails.
    async fn send(&self, sender: &str, recipient: &str, subject: &str, body_text: &str) -> Result<(), EmailSenderError>;
}

/// Returns the domain portion of an email address, or `None` if there is no `@`.
fn domain_of(address: &str) -> Option<&str> {
    address.rsplit_once('@').map(|(_, domain)| domain)
}

/// Sends `subject`/`body_text` to every verified recipient in `recipients`.
///
/// Recipients whose exact address and domain are both unverified are
/// dropped. If `sender` is `None` or `recipients` is empty, the send is
/// skipped entirely and logged as such. A failed send for one recipient is
/// logged and does not stop delivery to the rest; the function itself never
/// returns an error.
pub async fn send_report_email(
    email: &dyn EmailSender,
    events: &dyn EventSink,
    sender: Option<&str>,
    recipients: &[String],
    subject: &str,
    body_text: &str,
) {
    let Some(sender) = sender else {
        events.emit(&json!({"event": "report.email_skipped", "reason": "no_sender_configured"}));
        return;
    };
    if recipients.is_empty() {
        events.emit(&json!({"event": "report.email_skipped", "reason": "no_recipients"}));
        return;
    }

    for recipient in recipients {
        match is_recipient_verified(email, recipient).await {
            Ok(true) => {}
            Ok(false) => {
                events.emit(&json!({"event": "report.email_dropped", "reason": "unverified_recipient", "recipient": recipient}));
                continue;
            }
            Err(err) => {
                events.emit(&json!({
                    "event": "report.email_failed",
                    "reason": "verification_check_failed",
                    "recipient": recipient,
                    "error": err.to_string(),
                }));
                continue;
            }
        }

        if let Err(err) = email.send(sender, recipient, subject, body_text).await {
            events.emit(&json!({
                "event": "report.email_failed",
                "reason": "send_failed",
                "recipient": recipient,
                "error": err.to_string(),
            }));
        }
    }
}

/// Verifies one recipient: the exact address first, then its domain.
async fn is_recipient_verified(email: &dyn EmailSender, recipient: &str) -> Result<bool, EmailSenderError> {
    if email.is_verified(recipient).await? {
        return Ok(true);
    }
    match domain_of(recipient) {
        Some(domain) => email.is_verified(domain).await,
        None => Ok(false),
    }
}

/// SES-backed [`EmailSender`].
pub struct SesEmailSender {
    client: aws_sdk_sesv2::Client,
}

impl SesEmailSender {
    /// Builds a sender over an already-configured SESv2 client.
    #[must_use]
    pub fn new(client: aws_sdk_sesv2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    async fn is_verified(&self, identity: &str) -> Result<bool, EmailSenderError> {
        let response = self
            .client
            .get_email_identity()
            .email_identity(identity)
            .send()
            .await
            .map_err(|err| EmailSenderError::Upstream(err.to_string()))?;
        Ok(response.verified_for_sending_status())
    }

    async fn send(&self, sender: &str, recipient: &str, subject: &str, body_text: &str) -> Result<(), EmailSenderError> {
        let destination = aws_sdk_sesv2::types::Destination::builder().to_addresses(recipient).build();
        let content = aws_sdk_sesv2::types::Content::builder()
            .data(body_text)
            .build()
            .map_err(|err| EmailSenderError::Upstream(err.to_string()))?;
        let subject_content = aws_sdk_sesv2::types::Content::builder()
            .data(subject)
            .build()
            .map_err(|err| EmailSenderError::Upstream(err.to_string()))?;
        let body = aws_sdk_sesv2::types::Body::builder().text(content).build();
        let message = aws_sdk_sesv2::types::Message::builder().subject(subject_content).body(body).build();
        let email_content = aws_sdk_sesv2::types::EmailContent::builder().simple(message).build();

        self.client
            .send_email()
            .from_email_address(sender)
            .destination(destination)
            .content(email_content)
            .send()
            .await
            .map_err(|err| EmailSenderError::Upstream(err.to_string()))?;
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use media_core::interfaces::NullEventSink;

    use super::EmailSender;
    use super::EmailSenderError;
    use super::send_report_email;

    struct FakeSender {
        verified: Vec<&'static str>,
        sent: Mutex<Vec<(String, String)>>,
        fail_send_for: Vec<&'static str>,
    }

    #[async_trait]
    impl EmailSender for FakeSender {
        async fn is_verified(&self, identity: &str) -> Result<bool, EmailSenderError> {
            Ok(self.verified.contains(&identity))
        }

        async fn send(&self, sender: &str, recipient: &str, _subject: &str, _body_text: &str) -> Result<(), EmailSenderError> {
            if self.fail_send_for.contains(&recipient) {
                return Err(EmailSenderError::Upstream("simulated failure".to_string()));
            }
            self.sent.lock().unwrap().push((sender.to_string(), recipient.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn no_sender_configured_skips_without_sending() {
        let sender = FakeSender { verified: vec!["reports@example.com"], sent: Mutex::new(Vec::new()), fail_send_for: vec![] };
        send_report_email(&sender, &NullEventSink, None, &["a@example.com".to_string()], "s", "b").await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_recipients_skips_without_sending() {
        let sender = FakeSender { verified: vec!["reports@example.com"], sent: Mutex::new(Vec::new()), fail_send_for: vec![] };
        send_report_email(&sender, &NullEventSink, Some("reports@example.com"), &[], "s", "b").await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exact_address_verification_is_tried_first() {
        let sender = FakeSender { verified: vec!["a@example.com"], sent: Mutex::new(Vec::new()), fail_send_for: vec![] };
        send_report_email(&sender, &NullEventSink, Some("reports@example.com"), &["a@example.com".to_string()], "s", "b").await;
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unverified_domain_falls_back_from_an_unverified_address() {
        let sender = FakeSender { verified: vec!["example.com"], sent: Mutex::new(Vec::new()), fail_send_for: vec![] };
        send_report_email(&sender, &NullEventSink, Some("reports@example.com"), &["a@example.com".to_string()], "s", "b").await;
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn fully_unverified_recipient_is_dropped() {
        let sender = FakeSender { verified: vec!["reports@example.com"], sent: Mutex::new(Vec::new()), fail_send_for: vec![] };
        send_report_email(&sender, &NullEventSink, Some("reports@example.com"), &["a@unverified.com".to_string()], "s", "b").await;
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_send_failure_for_one_recipient_does_not_block_the_rest() {
        let sender = FakeSender {
            verified: vec!["a@example.com", "b@example.com"],
            sent: Mutex::new(Vec::new()),
            fail_send_for: vec!["a@example.com"],
        };
        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        send_report_email(&sender, &NullEventSink, Some("reports@example.com"), &recipients, "s", "b").await;
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }
}
