//! Message endpoints, including the AI-response workflow
//!
//! Creating a user message runs the orchestration loop and persists the
//! assistant's reply in the same request. Engine failures degrade to the
//! user message alone; they never fail the write.

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agent::UserContext;
use crate::controllers::ApiResponse;
use crate::middleware::auth::authenticate;
use crate::models::{ChatMessage, MessageRole};
use crate::tools::ToolContext;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct CreateMessageRequest {
    #[serde(rename = "chatId")]
    chat_id: String,
    content: String,
    role: MessageRole,
}

#[derive(Debug, Serialize)]
struct CreateMessageResponse {
    #[serde(rename = "userMessage")]
    user_message: ChatMessage,
    #[serde(rename = "aiMessage", skip_serializing_if = "Option::is_none")]
    ai_message: Option<ChatMessage>,
    #[serde(rename = "toolsUsed", skip_serializing_if = "Option::is_none")]
    tools_used: Option<Vec<String>>,
    #[serde(rename = "chartData", skip_serializing_if = "Option::is_none")]
    chart_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessageRequest {
    content: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/messages").route(web::post().to(create_message)))
        .service(
            web::resource("/api/messages/{message_id}")
                .route(web::get().to(get_message))
                .route(web::put().to(update_message))
                .route(web::delete().to(delete_message)),
        )
        .service(
            web::resource("/api/chats/{chat_id}/messages")
                .route(web::get().to(get_messages_by_chat)),
        )
        .service(
            web::resource("/api/users/{user_id}/messages")
                .route(web::get().to(get_messages_by_user)),
        );
}

async fn create_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateMessageRequest>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if body.content.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Content is required"));
    }

    match state.db.get_chat(&body.chat_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return HttpResponse::NotFound().json(ApiResponse::<()>::error("Chat not found"));
        }
        Err(e) => {
            log::error!("[MESSAGES] Failed to load chat {}: {}", body.chat_id, e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"));
        }
    }

    let user_message = match state.db.create_message(
        &body.chat_id,
        &auth_user.id,
        body.role,
        &body.content,
    ) {
        Ok(message) => message,
        Err(e) => {
            log::error!("[MESSAGES] Failed to create message: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"));
        }
    };

    let _ = state.db.touch_chat(&body.chat_id);

    // Assistant/system messages are plain writes; only user turns get a reply
    if body.role != MessageRole::User {
        return HttpResponse::Ok().json(ApiResponse::success(
            CreateMessageResponse {
                user_message,
                ai_message: None,
                tools_used: None,
                chart_data: None,
            },
            "Message created successfully",
        ));
    }

    // Resolve the chat owner for prompt personalization; the requester's
    // own profile is the fallback
    let user_context = state
        .db
        .get_user_by_chat_id(&body.chat_id)
        .ok()
        .flatten()
        .map(|u| UserContext::from_user(&u))
        .unwrap_or_else(|| UserContext {
            id: auth_user.id.clone(),
            wallet_address: auth_user.wallet_address.clone(),
            email: auth_user.email.clone(),
        });

    let tool_context = ToolContext {
        oneinch_api_key: Some(state.config.oneinch_api_key.clone()),
        wallet_address: user_context.wallet_address.clone(),
    };

    let generation = state
        .engine
        .generate_response(
            &state.ai_client,
            &body.chat_id,
            &body.content,
            Some(&user_context),
            &tool_context,
        )
        .await;

    if let Some(error) = &generation.error {
        log::error!("[MESSAGES] AI response failed for chat {}: {}", body.chat_id, error);
        return HttpResponse::Ok().json(ApiResponse::success(
            CreateMessageResponse {
                user_message,
                ai_message: None,
                tools_used: None,
                chart_data: None,
            },
            "Message created successfully (AI response failed)",
        ));
    }

    let ai_message = match state.db.create_message(
        &body.chat_id,
        &auth_user.id,
        MessageRole::Assistant,
        &generation.content,
    ) {
        Ok(message) => Some(message),
        Err(e) => {
            log::error!("[MESSAGES] Failed to persist AI message: {}", e);
            None
        }
    };

    HttpResponse::Ok().json(ApiResponse::success(
        CreateMessageResponse {
            user_message,
            ai_message,
            tools_used: generation.tools_used,
            chart_data: generation.chart_data,
        },
        "Messages created successfully with AI response",
    ))
}

async fn get_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let message_id = path.into_inner();
    match state.db.get_message(&message_id) {
        Ok(Some(message)) => {
            HttpResponse::Ok().json(ApiResponse::success(message, "Message retrieved"))
        }
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Message not found")),
        Err(e) => {
            log::error!("[MESSAGES] Failed to fetch message {}: {}", message_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_messages_by_chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let chat_id = path.into_inner();
    match state.db.get_messages_by_chat(&chat_id) {
        Ok(messages) => HttpResponse::Ok().json(ApiResponse::success(messages, "Messages retrieved")),
        Err(e) => {
            log::error!("[MESSAGES] Failed to list messages for chat {}: {}", chat_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_messages_by_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let user_id = path.into_inner();
    match state.db.get_messages_by_user(&user_id) {
        Ok(messages) => HttpResponse::Ok().json(ApiResponse::success(messages, "Messages retrieved")),
        Err(e) => {
            log::error!("[MESSAGES] Failed to list messages for user {}: {}", user_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn update_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateMessageRequest>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    if body.content.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Content is required"));
    }

    let message_id = path.into_inner();
    match state.db.update_message(&message_id, &body.content) {
        Ok(Some(message)) => {
            HttpResponse::Ok().json(ApiResponse::success(message, "Message updated"))
        }
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Message not found")),
        Err(e) => {
            log::error!("[MESSAGES] Failed to update message {}: {}", message_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn delete_message(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let message_id = path.into_inner();
    match state.db.delete_message(&message_id) {
        Ok(true) => HttpResponse::Ok().json(ApiResponse::success((), "Message deleted")),
        Ok(false) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Message not found")),
        Err(e) => {
            log::error!("[MESSAGES] Failed to delete message {}: {}", message_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}
