use actix_web::dev::Server;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::reminders::{NotificationScheduler, SchedulerHandle};
use crate::storage::PostgresStore;

pub struct Application {
    port: u16,
    server: Server,
    scheduler: SchedulerHandle,
}

impl Application {
    /// Wires storage and mail delivery into the reminder scheduler, starts it
    /// and binds the HTTP listener. Must be called inside a tokio runtime.
    pub async fn build(config: Settings) -> Result<Self, io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender_email = config
            .get_email_client_sender()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            Some(config.get_email_client_timeout()),
        )
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr()?.port();
        let server = run(listener)?;

        let store = Arc::new(PostgresStore::new(db_pool));
        let scheduler = NotificationScheduler::new(store.clone(), store, Arc::new(email_client))
            .start(
                config.scheduler.next_start(Utc::now()),
                config.scheduler.get_period(),
            );

        Ok(Self {
            port,
            server,
            scheduler,
        })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    /// Serves until the HTTP server shuts down (e.g. on SIGINT), then stops
    /// the scheduler and waits for reminders still being delivered.
    pub async fn run_until_stop(self) -> Result<(), io::Error> {
        let result = self.server.await;

        tracing::info!("Server stopped, waiting for pending birthday reminders");
        self.scheduler.cancel_and_wait().await;

        result
    }
}

/// Endpoint used by clients to know if the server is working
#[tracing::instrument(name = "Health Check handler")]
async fn health_check(_: HttpRequest) -> impl Responder {
    HttpResponse::Ok()
}

pub fn run(listener: TcpListener) -> Result<Server, io::Error> {
    let server = HttpServer::new(move || {
        // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
        // request logger
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
