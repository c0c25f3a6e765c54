//! Gateway types module
//!
//! ## Input Types
//! - [`LenientDecimal`]: amount given as JSON number or numeric string
//! - [`TransferBody`]: transfer request with field-name aliases
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Handler error rendered in the same envelope

pub mod money;
pub mod request;
pub mod response;

pub use money::LenientDecimal;
pub use request::TransferBody;
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
