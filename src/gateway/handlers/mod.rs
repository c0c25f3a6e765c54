pub mod health;
pub mod helpers;
pub mod price;
pub mod status;
pub mod transactions;
pub mod transfer;

pub use health::{HealthResponse, health_check};
pub use price::{PriceResponse, get_price};
pub use status::{
    BalanceResponse, CachedBalance, ServiceInfo, StatusResponse, get_balance, get_status,
    service_info,
};
pub use transactions::{TransactionsResponse, get_transaction, list_transactions};
pub use transfer::{TRANSFER_ROUTES, create_transfer};
