//! Swap quote, execution, and status endpoints

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::controllers::ApiResponse;
use crate::db::models::swap_transaction::NewSwapTransaction;
use crate::middleware::auth::authenticate;
use crate::models::SwapStatus;
use crate::swap::{spawn_order_monitor, SwapQuoteRequest, USER_WILL_EXECUTE};
use crate::AppState;

#[derive(Debug, Deserialize)]
struct SwapRequestBody {
    amount: String,
    #[serde(rename = "srcChainId")]
    src_chain_id: i64,
    #[serde(rename = "dstChainId")]
    dst_chain_id: i64,
    #[serde(rename = "srcTokenAddress")]
    src_token_address: String,
    #[serde(rename = "dstTokenAddress")]
    dst_token_address: String,
    #[serde(rename = "chatId")]
    chat_id: Option<String>,
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwapListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/swap/quote").route(web::post().to(get_quote)))
        .service(web::resource("/api/swap/execute").route(web::post().to(execute_swap)))
        .service(web::resource("/api/swap/{swap_id}/status").route(web::get().to(get_swap_status)))
        .service(web::resource("/api/swap").route(web::get().to(get_user_swaps)));
}

fn validate(body: &SwapRequestBody) -> Option<&'static str> {
    if body.amount.is_empty() || !body.amount.chars().all(|c| c.is_ascii_digit()) {
        return Some("amount must be an integer string in the token's smallest unit");
    }
    if body.src_token_address.is_empty() || body.dst_token_address.is_empty() {
        return Some("srcTokenAddress and dstTokenAddress are required");
    }
    None
}

async fn get_quote(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SwapRequestBody>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let wallet_address = match &auth_user.wallet_address {
        Some(wallet) => wallet.clone(),
        None => {
            return HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Wallet address required"));
        }
    };

    if let Some(problem) = validate(&body) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(problem));
    }

    let request = SwapQuoteRequest {
        amount: body.amount.clone(),
        src_chain_id: body.src_chain_id,
        dst_chain_id: body.dst_chain_id,
        src_token_address: body.src_token_address.clone(),
        dst_token_address: body.dst_token_address.clone(),
        wallet_address,
    };

    match state.swap.get_quote(&request).await {
        Ok(quote) => {
            HttpResponse::Ok().json(ApiResponse::success(quote, "Quote generated successfully"))
        }
        Err(e) => {
            log::warn!("[SWAP] Quote failed: {}", e);
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(e))
        }
    }
}

async fn execute_swap(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<SwapRequestBody>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let wallet_address = match &auth_user.wallet_address {
        Some(wallet) => wallet.clone(),
        None => {
            return HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("User authentication required"));
        }
    };

    if let Some(problem) = validate(&body) {
        return HttpResponse::BadRequest().json(ApiResponse::<()>::error(problem));
    }

    // Record the swap before touching the API so failures leave a trace
    let swap = match state.db.create_swap_transaction(&NewSwapTransaction {
        user_id: &auth_user.id,
        chat_id: body.chat_id.as_deref(),
        message_id: body.message_id.as_deref(),
        src_chain_id: body.src_chain_id,
        dst_chain_id: body.dst_chain_id,
        src_token_address: &body.src_token_address,
        dst_token_address: &body.dst_token_address,
        amount: &body.amount,
        wallet_address: &wallet_address,
    }) {
        Ok(swap) => swap,
        Err(e) => {
            log::error!("[SWAP] Failed to record swap: {}", e);
            return HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"));
        }
    };

    let request = SwapQuoteRequest {
        amount: body.amount.clone(),
        src_chain_id: body.src_chain_id,
        dst_chain_id: body.dst_chain_id,
        src_token_address: body.src_token_address.clone(),
        dst_token_address: body.dst_token_address.clone(),
        wallet_address,
    };

    let order = match state.swap.execute_swap(&request).await {
        Ok(order) => order,
        Err(e) => {
            let details = json!({ "error": e.clone() });
            if let Err(db_err) =
                state
                    .db
                    .update_swap_status(&swap.id, SwapStatus::Failed, Some(&details))
            {
                log::error!("[SWAP] Failed to mark swap {} failed: {}", swap.id, db_err);
            }
            return HttpResponse::BadRequest().json(ApiResponse::<()>::error(e));
        }
    };

    if let Err(e) = state.db.mark_swap_processing(
        &swap.id,
        &order.order_hash,
        &order.quote,
        &order.secrets,
        &order.secret_hashes,
    ) {
        log::error!("[SWAP] Failed to update swap {}: {}", swap.id, e);
    }

    // Placeholder hashes mean the wallet will place the order; nothing to poll
    if order.order_hash != USER_WILL_EXECUTE {
        spawn_order_monitor(
            state.swap.clone(),
            state.db.clone(),
            swap.id.clone(),
            order.order_hash.clone(),
        );
    }

    HttpResponse::Ok().json(ApiResponse::success(
        json!({
            "swapId": swap.id,
            "orderHash": order.order_hash,
            "quote": order.quote,
        }),
        "Swap initiated successfully",
    ))
}

async fn get_swap_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let swap_id = path.into_inner();
    match state.db.get_swap_transaction(&swap_id) {
        Ok(Some(swap)) => {
            if swap.user_id != auth_user.id {
                return HttpResponse::Unauthorized()
                    .json(ApiResponse::<()>::error("Unauthorized access to swap transaction"));
            }
            HttpResponse::Ok().json(ApiResponse::success(swap, "Swap status retrieved"))
        }
        Ok(None) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Swap transaction not found"))
        }
        Err(e) => {
            log::error!("[SWAP] Failed to fetch swap {}: {}", swap_id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}

async fn get_user_swaps(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<SwapListQuery>,
) -> impl Responder {
    let auth_user = match authenticate(&req, &state.auth, &state.db).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    match state.db.get_swaps_by_user(&auth_user.id, limit, offset) {
        Ok(swaps) => HttpResponse::Ok().json(ApiResponse::success(swaps, "User swaps retrieved")),
        Err(e) => {
            log::error!("[SWAP] Failed to list swaps for {}: {}", auth_user.id, e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Internal server error"))
        }
    }
}
