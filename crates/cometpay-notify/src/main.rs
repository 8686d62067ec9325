use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cometpay::GatewayConfig;
use cometpay_notify::routes;
use cometpay_notify::state::AppState;

fn build_cors() -> Cors {
    // Notifications are server-to-server posts; no browser origin ever needs
    // CORS access beyond health checks.
    Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec!["content-type", "authorization"])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid gateway configuration: {e}");
            std::process::exit(1);
        }
    };

    let metrics_token = std::env::var("NOTIFY_METRICS_TOKEN")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.into_bytes());

    if metrics_token.is_none() {
        tracing::warn!("NOTIFY_METRICS_TOKEN not set — /metrics endpoint stays closed");
    }

    let notify_path = config.brand.notify_path().to_string();
    let brand = config.brand;

    let state = web::Data::new(AppState {
        config,
        metrics_token,
    });

    let port: u16 = std::env::var("NOTIFY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4080);

    let rate_limit_rpm: u64 = std::env::var("RATE_LIMIT_RPM")
        .ok()
        .and_then(|r| r.parse().ok())
        .unwrap_or(120);

    tracing::info!("{} notification receiver listening on port {port}", brand.display_name());
    tracing::info!("Rate limit: {rate_limit_rpm} req/min per IP");
    tracing::info!("  POST http://localhost:{port}{notify_path}");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors())
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(65_536))
            .service(routes::health)
            .service(routes::metrics_endpoint)
            .service(web::resource(&notify_path).route(web::post().to(routes::notify)))
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
