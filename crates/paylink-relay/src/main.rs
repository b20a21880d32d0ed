use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paylink::{ChainGateway, NodeGateway};
use paylink_relay::config::RelayConfig;
use paylink_relay::state::AppState;
use paylink_relay::{dashboard, routes};

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

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let gateway = Arc::new(NodeGateway::new(&config.rpc_url, config.contract));
    if !gateway.is_connected().await {
        // Reported, not fatal: the node may come up after the relay.
        tracing::warn!(rpc = %config.rpc_url, "blockchain node unreachable at startup");
    }

    let state = web::Data::new(AppState::new(
        gateway,
        config.public_base_url.clone(),
        config.admin_address,
    ));

    let port = config.port;
    tracing::info!("paylink relay listening on port {port}");
    tracing::info!("Payment links resolve against {}", config.public_base_url);
    match config.contract {
        Some(contract) => tracing::info!("Payment contract: {contract}"),
        None => tracing::warn!("No payment contract configured — running degraded"),
    }
    tracing::info!("Rate limit: {} req/min per IP", config.rate_limit_rpm);
    tracing::info!("  GET  http://localhost:{port}/dashboard");
    tracing::info!("  POST http://localhost:{port}/approve");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        // The relay is a LAN demo surface scanned by arbitrary phones;
        // permissive CORS matches the reference deployment.
        App::new()
            .wrap(Cors::permissive())
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .service(routes::health)
            .service(routes::metrics_endpoint)
            .service(routes::payment_request)
            .service(routes::cancel)
            .service(routes::approve)
            .service(dashboard::dashboard)
            .service(dashboard::create_intent)
            .service(dashboard::qr_png)
            .service(dashboard::register_form)
            .service(dashboard::register_submit)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
