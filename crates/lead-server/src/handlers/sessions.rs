use actix_web::{web, HttpResponse};
use lead_core::{SessionFilter, SessionSummary};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

const MAX_LIMIT: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListSessionsQuery {
    pub user_id: Option<String>,
    pub content_id: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
    total: usize,
}

pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListSessionsQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let filter = SessionFilter {
        user_id: query.user_id,
        content_id: query.content_id,
        limit: query.limit.map(|limit| limit.clamp(1, MAX_LIMIT)),
    };

    let sessions = state.conversation.list_sessions(filter).await?;
    Ok(HttpResponse::Ok().json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.conversation.get_session(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(session))
}
