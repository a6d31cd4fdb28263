use actix_web::{web, HttpResponse};
use lead_studio::{ApplyRequest, PreviewRequest};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub path: String,
}

pub async fn connections(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "connections": state.studio.list_connections(),
    }))
}

pub async fn tree(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let entries = state.studio.list_tree(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "entries": entries })))
}

pub async fn file(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<FileQuery>,
) -> Result<HttpResponse, AppError> {
    let file = state
        .studio
        .fetch_file(&path.into_inner(), &query.path)
        .await?;
    Ok(HttpResponse::Ok().json(file))
}

pub async fn preview(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<PreviewRequest>,
) -> Result<HttpResponse, AppError> {
    let preview = state
        .studio
        .preview(&path.into_inner(), request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(preview))
}

pub async fn apply(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<ApplyRequest>,
) -> Result<HttpResponse, AppError> {
    let connection_id = path.into_inner();
    let request = request.into_inner();
    log::info!(
        "Applying {} patch(es) to {} on {}",
        request.patches.len(),
        request.path,
        connection_id
    );
    let outcome = state.studio.apply(&connection_id, request).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
