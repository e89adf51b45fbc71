use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use csync_auth::config::AuthConfig;
use csync_auth::domain::clock::SystemClock;
use csync_auth::mailer::{AnyMailer, ConsoleMailer, SmtpMailer};
use csync_auth::router::build_router;
use csync_auth::state::AppState;
use csync_auth::store::sweep::spawn_sweeper;

#[tokio::main]
async fn main() {
    csync_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let mailer = match &config.smtp_url {
        Some(url) => AnyMailer::Smtp(
            SmtpMailer::new(
                url,
                &config.mail_from,
                Duration::from_secs(config.mail_timeout_secs),
            )
            .expect("invalid SMTP_URL or MAIL_FROM"),
        ),
        None => {
            info!("SMTP_URL not set; emails will be logged, not delivered");
            AnyMailer::Console(ConsoleMailer)
        }
    };

    let state = AppState::new(&config, mailer, Arc::new(SystemClock));
    spawn_sweeper(
        state.credentials.clone(),
        Duration::from_secs(config.sweep_interval_secs),
    );

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
