use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::services::{FrontmatterRequest, GenerateRequest};
use crate::state::AppState;

pub async fn generate(
    state: web::Data<AppState>,
    request: web::Json<GenerateRequest>,
) -> Result<HttpResponse, AppError> {
    let generated = state.content.generate(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(generated))
}

pub async fn frontmatter(
    state: web::Data<AppState>,
    request: web::Json<FrontmatterRequest>,
) -> Result<HttpResponse, AppError> {
    let generated = state.content.frontmatter(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(generated))
}
