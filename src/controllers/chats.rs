//! Chat CRUD endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::ApiResponse;
use crate::middleware::auth::authenticate;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct CreateChatRequest {
    title: String,
}

#[derive(Debug, Deserialize)]
struct UpdateChatRequest {
    title: String,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/chats").route(web::post().to(create_chat)))
        .service(
            web::resource("/api/chats/{chat_id}")
                .route(web::get().to(get_chat))
                .route(web::put().to(update_chat))
                .route(web::delete().to(delete_chat)),
        )
        .service(web::resource("/api/users/{user_id}/chats").route(web::get().to(get_chats_by_user)));
}

async fn create_chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateChatRequest>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if body.title.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Title is required"));
    }

    match state.db.create_chat(&auth_user.id, body.title.trim()) {
        Ok(chat) => HttpResponse::Ok().json(ApiResponse::success(chat, "Chat created successfully")),
        Err(e) => {
            log::error!("[CHATS] Failed to create chat: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let chat_id = path.into_inner();
    match state.db.get_chat(&chat_id) {
        Ok(Some(chat)) => HttpResponse::Ok().json(ApiResponse::success(chat, "Chat retrieved")),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Chat not found")),
        Err(e) => {
            log::error!("[CHATS] Failed to fetch chat {}: {}", chat_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_chats_by_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let user_id = path.into_inner();
    match state.db.get_chats_by_user(&user_id) {
        Ok(chats) => HttpResponse::Ok().json(ApiResponse::success(chats, "Chats retrieved")),
        Err(e) => {
            log::error!("[CHATS] Failed to list chats for {}: {}", user_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn update_chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdateChatRequest>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    if body.title.trim().is_empty() {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Title is required"));
    }

    let chat_id = path.into_inner();
    match state.db.update_chat(&chat_id, body.title.trim()) {
        Ok(Some(chat)) => HttpResponse::Ok().json(ApiResponse::success(chat, "Chat updated")),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Chat not found")),
        Err(e) => {
            log::error!("[CHATS] Failed to update chat {}: {}", chat_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn delete_chat(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let chat_id = path.into_inner();
    match state.db.delete_chat(&chat_id) {
        Ok(true) => HttpResponse::Ok().json(ApiResponse::success((), "Chat deleted")),
        Ok(false) => HttpResponse::NotFound().json(ApiResponse::<()>::error("Chat not found")),
        Err(e) => {
            log::error!("[CHATS] Failed to delete chat {}: {}", chat_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}
