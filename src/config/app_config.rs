//! config/app_config.rs
//! Configuración global del servicio, leída del entorno (.env incluido).

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub pass: Option<String>,
    /// STARTTLS obligatorio; en false se usa conexión plana (solo desarrollo).
    pub tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_host: String,
    pub bind_port: u16,
    /// Sin SMTP configurado se usa el mailer de consola.
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub send_timeout_secs: u64,
    /// Intervalo del disparador interno; `None` lo desactiva.
    pub dispatch_interval_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: "sqlite:data/mailing.db?mode=rwc".to_string(),
            bind_host: "0.0.0.0".to_string(),
            bind_port: 5022,
            smtp: None,
            mail_from: "noreply@localhost".to_string(),
            send_timeout_secs: 30,
            dispatch_interval_secs: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = AppConfig::default();

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => Some(SmtpConfig {
                host,
                port: parse_var("SMTP_PORT")?.unwrap_or(587),
                user: env::var("SMTP_USER").ok(),
                pass: env::var("SMTP_PASS").ok(),
                tls: parse_var::<bool>("SMTP_TLS")?.unwrap_or(true),
            }),
            _ => None,
        };

        // El remitente por defecto es el usuario SMTP, como EMAIL_HOST_USER.
        let mail_from = env::var("MAIL_FROM")
            .ok()
            .or_else(|| smtp.as_ref().and_then(|s| s.user.clone()))
            .unwrap_or(defaults.mail_from);

        Ok(AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_host: env::var("BIND_HOST").unwrap_or(defaults.bind_host),
            bind_port: parse_var("BIND_PORT")?.unwrap_or(defaults.bind_port),
            smtp,
            mail_from,
            send_timeout_secs: parse_var("SEND_TIMEOUT_SECS")?
                .unwrap_or(defaults.send_timeout_secs),
            dispatch_interval_secs: parse_var::<u64>("DISPATCH_INTERVAL_SECS")?
                .filter(|secs| *secs > 0),
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid value for {name}: '{raw}'")),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_smtp_and_no_ticker() {
        let cfg = AppConfig::default();
        assert!(cfg.smtp.is_none());
        assert!(cfg.dispatch_interval_secs.is_none());
        assert_eq!(cfg.send_timeout_secs, 30);
    }
}
