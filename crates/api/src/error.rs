//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use ledger::LedgerError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// The caller did not identify itself.
    Unauthenticated(String),
    /// Checkout or order error.
    Order(OrderError),
    /// Wallet error.
    Ledger(LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, status = status.as_u16(), "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    let status = match &err {
        OrderError::Validation(_)
        | OrderError::PromotionNotFound
        | OrderError::PromotionExpired
        | OrderError::NoCheckedItems { .. }
        | OrderError::CourierNotAvailable
        | OrderError::CourierNotBelongToShop => StatusCode::BAD_REQUEST,
        OrderError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        OrderError::UnauthorizedActor { .. } => StatusCode::FORBIDDEN,
        OrderError::WrongInitialStatus { .. } | OrderError::OutOfStock { .. } => {
            StatusCode::CONFLICT
        }
        OrderError::WalletNotActivated => StatusCode::PRECONDITION_FAILED,
        OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Collaborator(_) => StatusCode::BAD_GATEWAY,
        OrderError::Ledger(inner) => ledger_status(inner),
        OrderError::Store(inner) => store_status(inner),
    };
    (status, err.to_string())
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    (ledger_status(&err), err.to_string())
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::WalletNotActivated { .. } | LedgerError::InactiveWallet { .. } => {
            StatusCode::PRECONDITION_FAILED
        }
        LedgerError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::InvalidAmount(_) | LedgerError::SameWallet(_) => StatusCode::BAD_REQUEST,
        LedgerError::Store(inner) => store_status(inner),
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::BalanceOutOfRange(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}
