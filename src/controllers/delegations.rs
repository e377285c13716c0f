//! Delegation storage and lookup endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;

use crate::controllers::ApiResponse;
use crate::middleware::auth::authenticate;
use crate::tools::chains::is_valid_address;
use crate::AppState;

#[derive(Debug, Deserialize)]
struct StoreDelegationRequest {
    #[serde(rename = "chainId")]
    chain_id: i64,
    delegator: String,
    delegatee: String,
    nonce: String,
    authority: String,
    signature: String,
}

#[derive(Debug, Deserialize)]
struct DelegationsQuery {
    #[serde(rename = "chainId")]
    chain_id: Option<i64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/delegations").route(web::post().to(store_delegation)))
        .service(
            web::resource("/api/delegations/{address}")
                .route(web::get().to(get_delegations_by_address)),
        )
        .service(
            web::resource("/api/users/{user_id}/delegations")
                .route(web::get().to(get_delegations_by_user)),
        );
}

async fn store_delegation(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<StoreDelegationRequest>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    if !is_valid_address(&body.delegator) || !is_valid_address(&body.delegatee) {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("delegator and delegatee must be valid addresses"));
    }
    if body.signature.trim().is_empty() || body.nonce.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("nonce and signature are required"));
    }

    match state.db.store_delegation(
        &auth_user.id,
        body.chain_id,
        &body.delegator,
        &body.delegatee,
        &body.nonce,
        &body.authority,
        &body.signature,
    ) {
        Ok(delegation) => {
            HttpResponse::Ok().json(ApiResponse::success(delegation, "Delegation stored"))
        }
        Err(e) => {
            log::error!("[DELEGATIONS] Failed to store delegation: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_delegations_by_address(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<DelegationsQuery>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let address = path.into_inner();
    if !is_valid_address(&address) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error("Invalid address"));
    }

    match state.db.get_delegations_by_address(&address, query.chain_id) {
        Ok(delegations) => {
            let count = delegations.len();
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "delegations": delegations,
                "count": count,
            }))
        }
        Err(e) => {
            log::error!("[DELEGATIONS] Failed to fetch delegations for {}: {}", address, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_delegations_by_user(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(response) = authenticate(&req, &state.auth, &state.db).await {
        return response;
    }

    let user_id = path.into_inner();
    match state.db.get_delegations_by_user(&user_id) {
        Ok(delegations) => {
            HttpResponse::Ok().json(ApiResponse::success(delegations, "Delegations retrieved"))
        }
        Err(e) => {
            log::error!("[DELEGATIONS] Failed to fetch delegations for user {}: {}", user_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}
