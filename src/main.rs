use actix_web::{App, HttpResponse, HttpServer, middleware, web};

use proposal_review::config::AppConfig;
use proposal_review::errors::AppError;
use proposal_review::handlers;
use proposal_review::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(startup_error)?;
    let state = AppState::from_config(&config).await.map_err(startup_error)?;

    log::info!("Starting server at http://{}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(handlers::configure_app)
            .default_service(web::to(|| async {
                Err::<HttpResponse, _>(AppError::NotFound("No such endpoint".to_string()))
            }))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

fn startup_error(e: AppError) -> std::io::Error {
    log::error!("Startup failed: {e}");
    std::io::Error::other(e.to_string())
}
