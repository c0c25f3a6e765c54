//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::{
    BalanceResponse, CachedBalance, HealthResponse, PriceResponse, ServiceInfo, StatusResponse,
    TransactionsResponse,
};
use crate::gateway::types::TransferBody;
use crate::ledger::{FailureKind, TransferKind, TransferRecord, TransferStatus};
use crate::transfer::TransferReceipt;

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Custody Gateway API",
        version = "1.0.0",
        description = "Outbound ETH transfers from a single custodial account, with live balance and price reporting.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::status::service_info,
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::status::get_status,
        crate::gateway::handlers::status::get_balance,
        crate::gateway::handlers::price::get_price,
        crate::gateway::handlers::transactions::list_transactions,
        crate::gateway::handlers::transactions::get_transaction,
        crate::gateway::handlers::transfer::create_transfer,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceInfo,
            CachedBalance,
            StatusResponse,
            BalanceResponse,
            PriceResponse,
            TransactionsResponse,
            TransferRecord,
            TransferKind,
            TransferStatus,
            FailureKind,
            TransferBody,
            TransferReceipt,
        )
    ),
    tags(
        (name = "System", description = "Service identity, health and status"),
        (name = "Balance", description = "Custodial balance"),
        (name = "Price", description = "ETH/USD price feed"),
        (name = "Transfer", description = "Outbound ETH transfers"),
        (name = "Transactions", description = "Transfer ledger")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::OpenApi;

    #[test]
    fn test_openapi_spec_generates() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, "Custody Gateway API");
        assert_eq!(spec.info.version, "1.0.0");
    }

    #[test]
    fn test_openapi_json_serializable() {
        let json_str = ApiDoc::openapi().to_json().unwrap();
        assert!(json_str.contains("Custody Gateway API"));
    }

    #[test]
    fn test_endpoints_registered() {
        let paths = ApiDoc::openapi().paths;
        for path in [
            "/",
            "/health",
            "/status",
            "/balance",
            "/price",
            "/transactions",
            "/transactions/{id}",
            "/withdraw",
        ] {
            assert!(paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_schemas_registered() {
        let components = ApiDoc::openapi().components.expect("should have components");
        assert!(components.schemas.contains_key("TransferBody"));
        assert!(components.schemas.contains_key("TransferRecord"));
    }
}
