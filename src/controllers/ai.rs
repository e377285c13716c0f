//! AI test endpoint - runs the engine without persisting anything

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::controllers::ApiResponse;
use crate::tools::ToolContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct TestAiRequest {
    message: String,
}

#[derive(Debug, Serialize)]
struct TestAiResponse {
    response: String,
    #[serde(rename = "toolsUsed", skip_serializing_if = "Option::is_none")]
    tools_used: Option<Vec<String>>,
    #[serde(rename = "chartData", skip_serializing_if = "Option::is_none")]
    chart_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/ai/test").route(web::post().to(test_ai)));
}

async fn test_ai(state: web::Data<AppState>, body: web::Json<TestAiRequest>) -> impl Responder {
    if body.message.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Message is required"));
    }

    let tool_context = ToolContext {
        oneinch_api_key: Some(state.config.oneinch_api_key.clone()),
        wallet_address: None,
    };

    // Throwaway chat id: no history, nothing persisted
    let chat_id = Uuid::new_v4().to_string();
    let result = state
        .engine
        .generate_response(&state.ai_client, &chat_id, &body.message, None, &tool_context)
        .await;

    HttpResponse::Ok().json(ApiResponse::success(
        TestAiResponse {
            response: result.content,
            tools_used: result.tools_used,
            chart_data: result.chart_data,
            error: result.error,
        },
        "AI response generated successfully",
    ))
}
