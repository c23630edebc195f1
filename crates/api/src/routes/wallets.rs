//! Wallet endpoints: opening, activation, top-up, withdrawal, balances
//! and history.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{MONEY_INTEGER_DIGITS, MONEY_SCALE, Money, TransactionId};
use domain::{AddressService, ShippingService};
use ledger::{HistoryKind, HistoryPage, HistoryRequest};
use serde::{Deserialize, Serialize};
use store::{MarketStore, Wallet};

use super::AppState;
use crate::error::ApiError;
use crate::extract::Actor;

#[derive(Deserialize)]
pub struct AmountRequest {
    pub amount: Money,
}

impl AmountRequest {
    /// The requested amount, if wallets can hold it without rounding.
    fn storable_amount(&self) -> Result<Money, ApiError> {
        if !self.amount.fits_storage() {
            return Err(ApiError::BadRequest(format!(
                "amount {} must have at most {MONEY_SCALE} decimals and fewer than \
                 {MONEY_INTEGER_DIGITS} whole digits",
                self.amount.amount()
            )));
        }
        Ok(self.amount)
    }
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub transaction_id: TransactionId,
}

/// Query string of `GET /wallets/history`.
#[derive(Deserialize, Default)]
pub struct HistoryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<String>,
    pub page: Option<u32>,
}

impl HistoryParams {
    fn into_request(self) -> Result<HistoryRequest, ApiError> {
        let kind = match self.kind.as_deref() {
            Some(kind) => kind.parse::<HistoryKind>().map_err(ApiError::BadRequest)?,
            None => HistoryKind::All,
        };
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::BadRequest(
                    "from must not be after to".to_string(),
                ));
            }
        }
        Ok(HistoryRequest {
            from: self.from,
            to: self.to,
            kind,
            page: self.page.unwrap_or(1),
        })
    }
}

/// POST /wallets: opens the PERSONAL, ESCROW and SHOP wallets, all inactive.
#[tracing::instrument(skip(state))]
pub async fn open<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
) -> Result<(StatusCode, Json<Vec<Wallet>>), ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let wallets = state.wallets.open_wallets(account_id).await?;
    Ok((StatusCode::CREATED, Json(wallets)))
}

/// POST /wallets/personal/activate
#[tracing::instrument(skip(state))]
pub async fn activate_personal<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
) -> Result<StatusCode, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    state.wallets.activate_personal(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /wallets/shop/activate
#[tracing::instrument(skip(state))]
pub async fn activate_shop<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
) -> Result<StatusCode, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    state.wallets.activate_shop(account_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /wallets/topup: credits the PERSONAL wallet from outside the system.
#[tracing::instrument(skip(state, req))]
pub async fn top_up<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
    Json(req): Json<AmountRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let amount = req.storable_amount()?;
    let transaction_id = state.wallets.top_up(account_id, amount).await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse { transaction_id })))
}

/// POST /wallets/withdraw: moves SHOP earnings into the PERSONAL wallet.
#[tracing::instrument(skip(state, req))]
pub async fn withdraw<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
    Json(req): Json<AmountRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let amount = req.storable_amount()?;
    let transaction_id = state.wallets.withdraw(account_id, amount).await?;
    Ok((StatusCode::CREATED, Json(TransactionResponse { transaction_id })))
}

/// GET /wallets/personal
pub async fn personal<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
) -> Result<Json<Wallet>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.wallets.personal_balance(account_id).await?))
}

/// GET /wallets/shop
pub async fn shop<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
) -> Result<Json<Wallet>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    Ok(Json(state.wallets.shop_balance(account_id).await?))
}

/// GET /wallets/history?from&to&kind&page
pub async fn history<S, A, C>(
    State(state): State<Arc<AppState<S, A, C>>>,
    Actor(account_id): Actor,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError>
where
    S: MarketStore + 'static,
    A: AddressService + 'static,
    C: ShippingService + 'static,
{
    let request = params.into_request()?;
    Ok(Json(state.wallets.history(account_id, request).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_history_params_defaults() {
        let request = HistoryParams::default().into_request().unwrap();
        assert_eq!(request.kind, HistoryKind::All);
        assert_eq!(request.page, 1);
        assert!(request.from.is_none());
    }

    #[test]
    fn test_history_params_reject_unknown_kind() {
        let params = HistoryParams {
            kind: Some("withdrawals".to_string()),
            ..HistoryParams::default()
        };
        assert!(matches!(params.into_request(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_amount_request_rejects_unstorable_amounts() {
        for raw in ["0.005", "\"12.345\"", "10000000000000"] {
            let req: AmountRequest =
                serde_json::from_str(&format!("{{\"amount\": {raw}}}")).unwrap();
            assert!(matches!(req.storable_amount(), Err(ApiError::BadRequest(_))));
        }

        let req: AmountRequest = serde_json::from_str(r#"{"amount": "12.50"}"#).unwrap();
        assert_eq!(req.storable_amount().unwrap(), Money::from_minor(1250));
    }

    #[test]
    fn test_history_params_reject_inverted_range() {
        let params = HistoryParams {
            from: Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            ..HistoryParams::default()
        };
        assert!(matches!(params.into_request(), Err(ApiError::BadRequest(_))));
    }
}
