use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use restaurant_info::config::Config;

mod api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .with_ansi(true)
        .with_file(false)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let state = web::Data::new(api::ApiState::new(&config).await?);
    let origin = config.allowed_origin.clone();

    tracing::info!("serving restaurant pages on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allowed_origin(&origin)
                    .allowed_methods(vec!["GET", "POST"])
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .service(api::healthz)
            .service(api::restaurant_page)
            .service(api::add_review)
    })
    .bind(config.bind_addr)?
    .run()
    .await?;
    Ok(())
}
