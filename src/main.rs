use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::app_config::AppConfig;
use crate::logger::init_logger;
use crate::services::dispatch_service::DispatchService;
use crate::services::email_service::{ConsoleMailer, MailTransport, SmtpMailer};
use crate::services::store_service::MailingStore;

mod access;
mod app;
mod config;
mod error;
mod handlers;
mod logger;
mod models;
mod services;

#[cfg(test)]
mod tests;

#[derive(Parser)]
#[command(name = "mailing_dispatch", about = "Scheduled newsletter dispatch service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Levanta la API HTTP (y el disparador interno si está configurado)
    Serve,
    /// Ejecuta una sola pasada de envío y termina
    RunOnce,
}

async fn setup_database(cfg: &AppConfig) -> Result<Pool<Sqlite>> {
    // Carpeta "data" para la ruta por defecto
    std::fs::create_dir_all("data").context("No se pudo crear directorio 'data'")?;

    log::info!("Conectando a SQLite en {}", cfg.database_url);

    let options = SqliteConnectOptions::from_str(&cfg.database_url)
        .context("DATABASE_URL inválida")?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("No se pudo conectar a la base de datos SQLite.")
}

fn build_transport(cfg: &AppConfig) -> Result<Arc<dyn MailTransport>> {
    match &cfg.smtp {
        Some(smtp) => {
            log::info!("Usando SMTP {}:{} (tls={})", smtp.host, smtp.port, smtp.tls);
            let mailer = SmtpMailer::new(smtp, cfg.send_timeout_secs)
                .context("No se pudo configurar el transporte SMTP")?;
            Ok(Arc::new(mailer))
        }
        None => {
            log::warn!("SMTP_HOST no definido: los correos solo se escriben en el log");
            Ok(Arc::new(ConsoleMailer))
        }
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok(); // Cargar .env al inicio
    init_logger();

    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;

    let db_pool = setup_database(&cfg).await?;

    let store = MailingStore::new(db_pool.clone());
    store
        .run_migrations()
        .await
        .context("Fallo en migraciones de 'mailing'")?;

    let dispatch_service =
        DispatchService::new(store.clone(), build_transport(&cfg)?, cfg.mail_from.clone());

    match cli.command.unwrap_or(Command::Serve) {
        Command::RunOnce => {
            let summary = dispatch_service.run_once(Utc::now()).await;
            log::info!("Pasada terminada: {:?}", summary);
            Ok(())
        }
        Command::Serve => serve(cfg, store, dispatch_service).await,
    }
}

async fn serve(cfg: AppConfig, store: MailingStore, dispatch_service: DispatchService) -> Result<()> {
    let ticker = cfg.dispatch_interval_secs.map(|secs| {
        log::info!("Disparador interno cada {}s", secs);
        dispatch_service.spawn_ticker(Duration::from_secs(secs))
    });

    log::info!("Levantando servidor en {}:{}", cfg.bind_host, cfg.bind_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(store.clone()))
            .app_data(web::Data::new(dispatch_service.clone()))
            .configure(app::init_app)
    })
    .workers(1)
    .bind((cfg.bind_host.as_str(), cfg.bind_port))?
    .run()
    .await?;

    if let Some(ticker) = ticker {
        // El ticker nunca termina solo: si ya acabó, fue un panic.
        if ticker.is_finished() {
            if let Err(e) = ticker.await {
                log::error!("El disparador interno terminó con error: {}", e);
            }
        } else {
            ticker.abort();
            log::info!("Disparador interno detenido");
        }
    }

    Ok(())
}
