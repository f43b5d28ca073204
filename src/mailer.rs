//! SMTP facade over lettre's async transport.

use crate::config::SmtpSettings;
use crate::error::AppError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::RwLock;

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_email: RwLock<Option<String>>,
}

impl Mailer {
    /// Build the transport from settings: implicit TLS when `secure`, a
    /// STARTTLS upgrade otherwise.
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, AppError> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        };
        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.pass.clone(),
            ))
            .build();
        Ok(Mailer {
            transport,
            from_email: RwLock::new(Some(settings.from.clone())),
        })
    }

    /// Default sender applied when `send_mail` is not given one.
    pub fn set_global_from_email(&self, email: impl Into<String>) {
        if let Ok(mut from) = self.from_email.write() {
            *from = Some(email.into());
        }
    }

    /// Send a plain-text mail. An explicit `from` overrides the global one.
    /// With `fail_on_error` false a delivery failure is logged and swallowed.
    pub async fn send_mail(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        fail_on_error: bool,
        from: Option<&str>,
    ) -> Result<(), AppError> {
        let global_from = self
            .from_email
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        let from = from
            .or(global_from.as_deref())
            .ok_or_else(|| AppError::Mail("no from address configured".into()))?;

        let message = Message::builder()
            .from(parse_mailbox(from)?)
            .to(parse_mailbox(to)?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| AppError::Mail(e.to_string()))?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) if fail_on_error => Err(AppError::Smtp(e)),
            Err(e) => {
                tracing::warn!(error = %e, to = %to, "mail delivery failed");
                Ok(())
            }
        }
    }
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, AppError> {
    addr.parse()
        .map_err(|_| AppError::Mail(format!("invalid mail address '{}'", addr)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_parsing_accepts_name_and_plain_forms() {
        assert!(parse_mailbox("user@example.com").is_ok());
        assert!(parse_mailbox("Ada <ada@example.com>").is_ok());
        assert!(parse_mailbox("not-an-address").is_err());
    }
}
