//! Menu assistant chat

use axum::{Json, extract::State};
use http::HeaderMap;
use shared::error::{AppError, ErrorCode};
use shared::models::{ChatReply, ChatRequest, PublicMenuItem, visible_menu};

use crate::api::{ApiResult, internal};
use crate::db;
use crate::llm::{PromptContext, assemble, build_system_prompt};
use crate::state::AppState;

use super::session_table;

/// POST /api/public/chat
///
/// With a table session the assistant knows the menu visible at that table;
/// without one, `restaurant_id` names the restaurant.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    req.validate()?;
    let session = state.sessions.from_headers(&headers)?;

    let restaurant_id = match (session, req.restaurant_id) {
        (Some(s), _) => s.restaurant_id,
        (None, Some(id)) => id,
        (None, None) => return Err(AppError::required("restaurant_id")),
    };
    let restaurant = db::restaurants::get(&state.pool, restaurant_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))?;

    let menu: Option<Vec<PublicMenuItem>> = match session {
        Some(s) => {
            let table = session_table(&state, &s).await?;
            let items = db::menu::list_available(&state.pool, restaurant.id)
                .await
                .map_err(internal)?;
            Some(visible_menu(&items, table.zone_id))
        }
        None => None,
    };

    let prompt = build_system_prompt(&PromptContext {
        restaurant_name: &restaurant.name,
        currency: &restaurant.currency,
        menu: menu.as_deref(),
    });
    let messages = assemble(prompt, &req.messages);

    let reply = state.llm.chat(&messages).await.map_err(|e| {
        tracing::error!(restaurant_id, model = state.llm.model(), error = %e, "LLM request failed");
        AppError::upstream("Assistant is unavailable")
    })?;

    Ok(Json(ChatReply { reply }))
}
