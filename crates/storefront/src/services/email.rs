//! Transactional email (verification codes).
//!
//! Sent over SMTP via lettre with Askama templates. Without SMTP settings the
//! service runs in log-only mode: the message is not sent and the code is
//! written to the log at WARN so local sign-ups can still be verified.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::SmtpConfig;

#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    name: &'a str,
    code: &'a str,
    expires_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    name: &'a str,
    code: &'a str,
    expires_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailSendError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    smtp: Option<SmtpMailer>,
}

impl EmailService {
    /// Build the service; `None` selects log-only mode.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay settings are invalid.
    pub fn new(config: Option<&SmtpConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            tracing::warn!("SMTP_HOST not set; verification codes will be logged, not emailed");
            return Ok(Self { smtp: None });
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            smtp: Some(SmtpMailer {
                transport: builder.build(),
                from_address: config.from.clone(),
            }),
        })
    }

    /// Log-only service, for tests and local development.
    #[must_use]
    pub const fn log_only() -> Self {
        Self { smtp: None }
    }

    /// Send a sign-up verification code.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_verification_code(
        &self,
        to: &str,
        name: &str,
        code: &str,
        expires_minutes: i64,
    ) -> Result<(), EmailSendError> {
        let Some(smtp) = &self.smtp else {
            tracing::warn!(to = %to, code = %code, "Verification code (SMTP disabled)");
            return Ok(());
        };

        let html = VerificationCodeEmailHtml {
            name,
            code,
            expires_minutes,
        }
        .render()?;
        let text = VerificationCodeEmailText {
            name,
            code,
            expires_minutes,
        }
        .render()?;

        smtp.send_multipart(to, "Your Tidewear verification code", &text, &html)
            .await
    }
}

impl SmtpMailer {
    async fn send_multipart(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailSendError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailSendError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailSendError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.transport.send(email).await?;
        tracing::info!(to = %to, subject = %subject, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_render_code() {
        let text = VerificationCodeEmailText {
            name: "Ana",
            code: "482913",
            expires_minutes: 10,
        }
        .render()
        .unwrap();
        assert!(text.contains("Hi Ana"));
        assert!(text.contains("482913"));
        assert!(text.contains("10 minutes"));

        let html = VerificationCodeEmailHtml {
            name: "<b>Ana</b>",
            code: "482913",
            expires_minutes: 10,
        }
        .render()
        .unwrap();
        assert!(html.contains("482913"));
        assert!(!html.contains("<b>Ana</b>"));
    }

    #[tokio::test]
    async fn test_log_only_mode_succeeds() {
        let service = EmailService::log_only();
        service
            .send_verification_code("jo@shop.test", "Jo", "123456", 10)
            .await
            .unwrap();
    }
}
