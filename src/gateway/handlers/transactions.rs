//! Transfer ledger queries

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, ok};
use crate::ledger::{ListOrder, TransferRecord};

pub const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionsQuery {
    /// Maximum number of records (default 50)
    pub limit: Option<usize>,
    /// `newest_first` (default) or `oldest_first`
    #[param(value_type = Option<String>)]
    pub order: Option<ListOrder>,
}

#[derive(Serialize, ToSchema)]
pub struct TransactionsResponse {
    /// Records in the ledger
    pub total: usize,
    pub transactions: Vec<TransferRecord>,
}

/// Recent transfer records
#[utoipa::path(
    get,
    path = "/transactions",
    params(TransactionsQuery),
    responses(
        (status = 200, description = "Most recent records", body = TransactionsResponse, content_type = "application/json")
    ),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<TransactionsResponse> {
    let transactions = state.ledger.list(
        query.limit.unwrap_or(DEFAULT_LIMIT),
        query.order.unwrap_or_default(),
    );
    ok(TransactionsResponse {
        total: state.ledger.len(),
        transactions,
    })
}

/// One transfer record
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    params(
        ("id" = u64, Path, description = "Ledger id")
    ),
    responses(
        (status = 200, description = "The record", body = TransferRecord, content_type = "application/json"),
        (status = 404, description = "No record with that id")
    ),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<TransferRecord> {
    // Anything that is not a ledger id was never appended
    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::not_found(format!("Transaction not found: {}", id)))?;
    ok(state.ledger.get(id)?)
}
