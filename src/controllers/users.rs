//! User sync and lookup endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::controllers::ApiResponse;
use crate::middleware::auth::authenticate;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/user/sync").route(web::post().to(sync_user)))
        .service(web::resource("/api/user/{provider_id}").route(web::get().to(get_user)));
}

/// Verify the caller's token and upsert their profile. The sync itself
/// happens inside `authenticate`; this endpoint exists so clients can force
/// a refresh right after login.
async fn sync_user(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let user = match state.db.get_user(&auth_user.id) {
        Ok(Some(user)) => user,
        Ok(None) => {
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Synced user not found"));
        }
        Err(e) => {
            log::error!("[USERS] Failed to load synced user: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"));
        }
    };

    let delegations = state
        .db
        .get_delegations_by_user(&user.id)
        .unwrap_or_default();

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": user,
        "delegations": delegations,
    }))
}

async fn get_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let provider_id = path.into_inner();
    match state.db.get_user_by_provider_id(&provider_id) {
        Ok(Some(user)) => HttpResponse::Ok().json(ApiResponse::success(user, "User retrieved")),
        Ok(None) => HttpResponse::NotFound().json(ApiResponse::<()>::error("User not found")),
        Err(e) => {
            log::error!("[USERS] Failed to fetch user {}: {}", provider_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}
