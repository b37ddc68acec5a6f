//! services/email_service.rs
//! Transporte de correo: contrato mínimo + implementaciones SMTP y consola.

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::app_config::SmtpConfig;
use crate::error::TransportError;

/// Un envío cubre toda la lista de destinatarios: o sale entero o falla entero.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        recipients: &[String],
    ) -> Result<(), TransportError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    timeout_secs: u64,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig, timeout_secs: u64) -> Result<Self, TransportError> {
        let mut builder = if cfg.tls {
            let tls_params = TlsParameters::new(cfg.host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.host)?.tls(Tls::Required(tls_params))
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.host)
        };

        builder = builder.port(cfg.port);
        if let (Some(user), Some(pass)) = (&cfg.user, &cfg.pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        let message = build_message(subject, body, from, recipients)?;

        tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.mailer.send(message),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.timeout_secs))??;

        Ok(())
    }
}

/// Mailer de desarrollo: no envía nada, deja el mensaje en el log.
#[derive(Clone, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl MailTransport for ConsoleMailer {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        recipients: &[String],
    ) -> Result<(), TransportError> {
        let message = build_message(subject, body, from, recipients)?;
        log::info!(
            "(console mailer) from={} to={} subject={:?}\n{}",
            from,
            recipients.join(", "),
            subject,
            String::from_utf8_lossy(&message.formatted())
        );
        Ok(())
    }
}

/// Un solo mensaje con todos los destinatarios en `To`.
fn build_message(
    subject: &str,
    body: &str,
    from: &str,
    recipients: &[String],
) -> Result<Message, TransportError> {
    let from: Mailbox = from
        .parse()
        .map_err(|_| TransportError::InvalidAddress(from.to_string()))?;

    let mut builder = Message::builder().from(from).subject(subject);
    for recip_str in recipients {
        let to: Mailbox = recip_str
            .parse()
            .map_err(|_| TransportError::InvalidAddress(recip_str.clone()))?;
        builder = builder.to(to);
    }

    Ok(builder
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_lists_every_recipient() {
        let recipients = vec!["a@example.com".to_string(), "b@example.com".to_string()];
        let message = build_message("Hola", "Cuerpo", "news@example.com", &recipients).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("a@example.com"));
        assert!(raw.contains("b@example.com"));
        assert_eq!(message.envelope().to().len(), 2);
    }

    #[test]
    fn bad_recipient_is_a_transport_error() {
        let recipients = vec!["not-an-address".to_string()];
        let err = build_message("Hola", "Cuerpo", "news@example.com", &recipients).unwrap_err();
        assert!(matches!(err, TransportError::InvalidAddress(a) if a == "not-an-address"));
    }

    #[actix_rt::test]
    async fn console_mailer_accepts_valid_message() {
        let recipients = vec!["a@example.com".to_string()];
        let result = ConsoleMailer
            .send("Hola", "Cuerpo", "news@example.com", &recipients)
            .await;
        assert!(result.is_ok());
    }
}
