//! HTTP routes for the cash inventory.
//!
//! Every handler holds the connection lock for its whole load -> compute ->
//! save cycle, so mutating requests against one inventory run one at a time.

use crate::api::{self, ApiResult, ErrorBody, WithdrawRequest};
use atm_core::{core_version, DenominationRecord, DepositRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, warn};
use rusqlite::Connection;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tower_http::cors::CorsLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Store writes are transactional, so a poisoned lock still guards a
        // consistent connection.
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    let atm_routes = Router::new()
        .route("/deposit", post(deposit))
        .route("/withdraw", post(withdraw))
        .route("/addDenomination", post(add_denomination))
        .route("/balance", get(balance))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .nest("/atm", atm_routes)
        .layer(CorsLayer::permissive())
}

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: core_version(),
    })
}

/// POST /atm/deposit
async fn deposit(
    State(state): State<AppState>,
    payload: Result<Json<DepositRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject("deposit", rejection),
    };
    debug!("event=http_request route=deposit entries={}", request.len());
    let conn = state.conn();
    respond("deposit", api::deposit(&conn, &request))
}

/// POST /atm/withdraw
async fn withdraw(
    State(state): State<AppState>,
    payload: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return reject("withdraw", rejection),
    };
    debug!(
        "event=http_request route=withdraw amount={}",
        request.int_cash_request
    );
    let conn = state.conn();
    respond("withdraw", api::withdraw(&conn, request))
}

/// POST /atm/addDenomination
async fn add_denomination(
    State(state): State<AppState>,
    payload: Result<Json<DenominationRecord>, JsonRejection>,
) -> Response {
    let record = match payload {
        Ok(Json(record)) => record,
        Err(rejection) => return reject("add_denomination", rejection),
    };
    debug!(
        "event=http_request route=add_denomination denomination={}",
        record.denomination
    );
    let conn = state.conn();
    respond("add_denomination", api::add_denomination(&conn, record))
}

/// GET /atm/balance
async fn balance(State(state): State<AppState>) -> Response {
    let conn = state.conn();
    respond("balance", api::balance(&conn))
}

fn reject(route: &str, rejection: JsonRejection) -> Response {
    let status = rejection.status();
    warn!(
        "event=http_request route={route} status=rejected http_status={} reason={}",
        status.as_u16(),
        rejection.body_text()
    );
    respond::<()>(
        route,
        Err(ErrorBody::rejected(rejection.body_text(), status.as_u16())),
    )
}

fn respond<T: Serialize>(route: &str, result: ApiResult<T>) -> Response {
    match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(body) => {
            let status =
                StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                error!(
                    "event=http_response route={route} status={} error={}",
                    status.as_u16(),
                    body.error
                );
            }
            (status, Json(body)).into_response()
        }
    }
}
