use actix_web::{web, HttpResponse};

use crate::error::AppError;
use crate::services::ExchangeRequest;
use crate::state::AppState;

pub async fn handler(
    state: web::Data<AppState>,
    request: web::Json<ExchangeRequest>,
) -> Result<HttpResponse, AppError> {
    let outcome = state.conversation.exchange(request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}
