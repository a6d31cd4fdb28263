use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

use crate::error::AppError;
use crate::handlers;
use crate::state::AppState;

/// Registers every route under `/api/v1`. Shared by the server and tests.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|error, _| AppError::InvalidRequest(error.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|error, _| AppError::InvalidRequest(error.to_string()).into()),
    )
    .service(
        web::scope("/api/v1")
            .route("/health", web::get().to(handlers::health::handler))
            .route("/models", web::get().to(handlers::models::list))
            .route("/models/{key}/test", web::post().to(handlers::models::test))
            .route("/chat", web::post().to(handlers::chat::handler))
            .route("/sessions", web::get().to(handlers::sessions::list))
            .route("/sessions/{session_id}", web::get().to(handlers::sessions::detail))
            .route("/content/generate", web::post().to(handlers::content::generate))
            .route(
                "/content/frontmatter",
                web::post().to(handlers::content::frontmatter),
            )
            .service(
                web::scope("/studio")
                    .route("/connections", web::get().to(handlers::studio::connections))
                    .route(
                        "/connections/{id}/tree",
                        web::get().to(handlers::studio::tree),
                    )
                    .route(
                        "/connections/{id}/file",
                        web::get().to(handlers::studio::file),
                    )
                    .route(
                        "/connections/{id}/preview",
                        web::post().to(handlers::studio::preview),
                    )
                    .route(
                        "/connections/{id}/apply",
                        web::post().to(handlers::studio::apply),
                    ),
            ),
    );
}

pub async fn run_server(state: AppState, port: u16) -> io::Result<()> {
    let state = web::Data::new(state);
    log::info!("Listening on 0.0.0.0:{}", port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .configure(app_config)
    })
    .bind(format!("0.0.0.0:{}", port))?
    .run()
    .await
}
