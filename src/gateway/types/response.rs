//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Error side of every handler, rendered as an `ApiResponse`
//! - `error_codes`: Standard error code constants

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::ledger::LedgerError;
use crate::transfer::TransferError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success, diagnostic context on error (if any)
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    #[schema(example = 0)]
    pub code: i32,
    /// Response message
    #[schema(example = "ok")]
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }
}

pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

/// 200 with `data`
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok((StatusCode::OK, Json(ApiResponse::success(data))))
}

// ============================================================================
// ApiError
// ============================================================================

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
    /// Rendered into `data`
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
            details: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error_codes::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
            msg,
        )
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse {
            code: self.code,
            msg: self.msg,
            data: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &err {
            TransferError::InvalidDestination(_) => error_codes::INVALID_DESTINATION,
            TransferError::InvalidAmount(_) => error_codes::INVALID_AMOUNT,
            TransferError::InsufficientFunds(_) => error_codes::INSUFFICIENT_BALANCE,
            TransferError::AllEndpointsUnavailable(_) => error_codes::ENDPOINTS_UNAVAILABLE,
            TransferError::Rpc(_) => error_codes::RPC_ERROR,
            TransferError::SubmissionFailed(_) => error_codes::SUBMISSION_FAILED,
            TransferError::ConfirmationFailed { .. } => error_codes::CONFIRMATION_FAILED,
            TransferError::Internal(_) => error_codes::INTERNAL_ERROR,
        };

        let mut details = serde_json::json!({ "error_code": err.code() });
        if let TransferError::InsufficientFunds(shortfall) = &err
            && let Ok(Value::Object(fields)) = serde_json::to_value(shortfall.as_ref())
            && let Some(d) = details.as_object_mut()
        {
            d.extend(fields);
        }
        if let Some(rpc_code) = err.rpc_code() {
            details["rpc_code"] = rpc_code.into();
        }
        if let Some(tx_hash) = err.tx_hash() {
            details["tx_hash"] = tx_hash.into();
        }

        ApiError::new(status, code, err.to_string()).with_details(details)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => ApiError::not_found(err.to_string()),
            LedgerError::InvalidRecord(_) => ApiError::internal(err.to_string()),
        }
    }
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_DESTINATION: i32 = 1003;
    pub const INVALID_AMOUNT: i32 = 1004;

    // Resource errors (4xxx)
    pub const NOT_FOUND: i32 = 4004;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const ENDPOINTS_UNAVAILABLE: i32 = 5001;
    pub const RPC_ERROR: i32 = 5002;
    pub const SUBMISSION_FAILED: i32 = 5003;
    pub const CONFIRMATION_FAILED: i32 = 5004;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::RpcError;
    use crate::transfer::Shortfall;
    use rust_decimal::Decimal;

    #[test]
    fn test_success_envelope() {
        let body = serde_json::to_value(ApiResponse::success(7)).unwrap();
        assert_eq!(body["code"], error_codes::SUCCESS);
        assert_eq!(body["msg"], "ok");
        assert_eq!(body["data"], 7);
    }

    #[test]
    fn test_insufficient_funds_details() {
        let err: ApiError = TransferError::InsufficientFunds(Box::new(Shortfall {
            available: Decimal::new(5, 1),
            requested: Decimal::ONE,
            fee_estimate: Decimal::new(126, 5),
            total_needed: Decimal::new(100_126, 5),
            max_withdrawable: Decimal::new(49_824, 5),
            price: Decimal::from(3500),
        }))
        .into();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, error_codes::INSUFFICIENT_BALANCE);
        let details = err.details.unwrap();
        assert_eq!(details["error_code"], "INSUFFICIENT_FUNDS");
        assert_eq!(details["max_withdrawable"], "0.49824");
        assert_eq!(details["available"], "0.5");
    }

    #[test]
    fn test_confirmation_failure_details() {
        let err: ApiError = TransferError::ConfirmationFailed {
            tx_hash: "0xfeed".into(),
            reason: RpcError::Node {
                code: -32603,
                message: "internal".into(),
            },
        }
        .into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        let details = err.details.unwrap();
        assert_eq!(details["tx_hash"], "0xfeed");
        assert_eq!(details["rpc_code"], -32603);
    }

    #[test]
    fn test_ledger_not_found_is_404() {
        let err: ApiError = LedgerError::NotFound(9).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, error_codes::NOT_FOUND);
    }
}
