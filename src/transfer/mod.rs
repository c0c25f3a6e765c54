//! Outbound Transfer Pipeline
//!
//! Moves ETH out of the custodial account on request.
//!
//! # State Machine
//!
//! ```text
//! RECEIVED → VALIDATED → AMOUNT_RESOLVED → FEE_QUOTED → SUFFICIENCY_CHECKED → SUBMITTED → CONFIRMED
//!                                  (any non-terminal state) → FAILED
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Live balance**: sufficiency is decided on a balance read from the
//!    chain inside the submission lock, never on the cached balance
//! 2. **One submission per request**: nothing is ever resubmitted
//! 3. **Every attempt recorded**: anything past destination validation ends
//!    in exactly one ledger record; a submitted-but-unconfirmed transfer is
//!    recorded as `ConfirmationFailed` with its tx hash

pub mod error;
pub mod pipeline;
pub mod state;
pub mod types;

pub use error::{Shortfall, TransferError};
pub use pipeline::{PipelineSettings, TransferPipeline};
pub use state::TransferState;
pub use types::{AmountSpec, TransferReceipt, TransferRequest};
