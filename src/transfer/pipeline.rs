//! Transfer Pipeline
//!
//! Drives one outbound transfer from request to ledger record:
//! validate destination, resolve amount, quote fee, check funds against the
//! live balance, submit, wait for the receipt, record.
//!
//! Submissions from the custodial account are serialized. The submission
//! lock is taken before the sufficiency check and released after the
//! confirmation wait, so two requests never spend the same observed balance.

use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::{Shortfall, TransferError};
use super::state::TransferState;
use super::types::{AmountSpec, TransferReceipt, TransferRequest};
use crate::chain::address::{endpoint_host, is_valid_address};
use crate::chain::{ChainNode, EndpointSelector, RpcError, TransferTx};
use crate::config::AppConfig;
use crate::ledger::{TransferDraft, TransferLedger};
use crate::money::{eth_to_usd, eth_to_wei, gwei_to_wei, truncate_eth, wei_to_eth};
use crate::price::PriceState;

/// Fee and margin parameters of the custodial account
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub custody_address: String,
    pub gas_limit: u64,
    pub estimate_multiplier: u64,
    pub max_fee_multiplier: u64,
    pub priority_fee_wei: u128,
    /// Held back from the balance before applying a percentage
    pub fee_reserve: Decimal,
    /// Extra margin in the reported max withdrawable amount
    pub withdraw_buffer: Decimal,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let fees = &config.chain.fees;
        Self {
            custody_address: config.custody.address.clone(),
            gas_limit: fees.gas_limit,
            estimate_multiplier: fees.estimate_multiplier,
            max_fee_multiplier: fees.max_fee_multiplier,
            priority_fee_wei: gwei_to_wei(fees.priority_fee_gwei),
            fee_reserve: config.custody.fee_reserve,
            withdraw_buffer: config.custody.withdraw_buffer,
        }
    }
}

/// What is known about a request so far; feeds the failure record
struct Attempt {
    request_id: Uuid,
    state: TransferState,
    destination: String,
    price: Decimal,
    amount: Option<Decimal>,
    tx_hash: Option<String>,
}

impl Attempt {
    fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "{} -> {}",
            self.state,
            next
        );
        debug!(request_id = %self.request_id, from = %self.state, to = %next, "Transfer state");
        self.state = next;
    }
}

/// Confirmed inclusion, before it is recorded
struct Inclusion {
    tx_hash: String,
    amount: Decimal,
    fee_paid: Decimal,
    block_number: u64,
}

pub struct TransferPipeline {
    selector: Arc<EndpointSelector>,
    price: Arc<PriceState>,
    ledger: Arc<TransferLedger>,
    settings: PipelineSettings,
    submission_lock: Mutex<()>,
}

impl TransferPipeline {
    pub fn new(
        selector: Arc<EndpointSelector>,
        price: Arc<PriceState>,
        ledger: Arc<TransferLedger>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            selector,
            price,
            ledger,
            settings,
            submission_lock: Mutex::new(()),
        }
    }

    /// Run the pipeline on its own task
    ///
    /// The transfer completes and is recorded even if the caller goes away.
    pub async fn spawn_execute(
        self: &Arc<Self>,
        req: TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.execute(req).await })
            .await
            .map_err(|e| TransferError::Internal(format!("transfer task failed: {}", e)))?
    }

    pub async fn execute(&self, req: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let request_id = Uuid::new_v4();
        let destination = validate_destination(req.destination.as_deref()).inspect_err(|e| {
            warn!(request_id = %request_id, "Transfer rejected: {}", e);
        })?;

        let mut attempt = Attempt {
            request_id,
            state: TransferState::Received,
            destination,
            price: self.price.price().await,
            amount: None,
            tx_hash: None,
        };
        attempt.advance(TransferState::Validated);

        info!(
            request_id = %request_id,
            to = %attempt.destination,
            "Transfer request received"
        );

        match self.run(&req, &mut attempt).await {
            Ok(inclusion) => self.record_confirmed(&mut attempt, inclusion),
            Err(err) => {
                attempt.advance(TransferState::Failed);
                self.record_failure(&attempt, &err);
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        req: &TransferRequest,
        attempt: &mut Attempt,
    ) -> Result<Inclusion, TransferError> {
        let spec = req.amount_spec()?;

        // Amounts that do not depend on the balance are settled before any network call
        if !spec.depends_on_balance() {
            attempt.amount = Some(resolve_fixed_amount(spec, attempt.price)?);
        }

        let node = self.selector.acquire_live_endpoint().await?;
        debug!(
            request_id = %attempt.request_id,
            endpoint = %endpoint_host(node.endpoint()),
            "Using endpoint"
        );

        let amount = match (attempt.amount, spec) {
            (Some(amount), _) => amount,
            (None, AmountSpec::Percentage(pct)) => {
                let balance = self.live_balance(node.as_ref()).await?;
                let amount = resolve_percentage(pct, balance, self.settings.fee_reserve)?;
                attempt.amount = Some(amount);
                amount
            }
            (None, _) => {
                return Err(TransferError::Internal("amount left unresolved".into()));
            }
        };
        attempt.advance(TransferState::AmountResolved);

        let gas_price = node.gas_price_wei().await.map_err(TransferError::Rpc)?;
        let fee_estimate = self.fee_estimate(gas_price)?;
        attempt.advance(TransferState::FeeQuoted);

        let _guard = self.submission_lock.lock().await;

        let balance = self.live_balance(node.as_ref()).await?;
        self.check_sufficiency(amount, fee_estimate, balance, attempt.price)?;
        attempt.advance(TransferState::SufficiencyChecked);

        let tx = self.build_tx(&attempt.destination, amount, gas_price)?;
        let tx_hash = node
            .send_transfer(&tx)
            .await
            .map_err(TransferError::SubmissionFailed)?;
        if tx_hash.is_empty() {
            return Err(TransferError::SubmissionFailed(RpcError::EmptyResult(
                "transaction hash",
            )));
        }
        attempt.tx_hash = Some(tx_hash.clone());
        attempt.advance(TransferState::Submitted);
        info!(
            request_id = %attempt.request_id,
            tx_hash = %tx_hash,
            %amount,
            "Transfer submitted, waiting for confirmation"
        );

        let receipt = node.wait_for_receipt(&tx_hash).await.map_err(|reason| {
            TransferError::ConfirmationFailed {
                tx_hash: tx_hash.clone(),
                reason,
            }
        })?;
        if !receipt.success {
            return Err(TransferError::ConfirmationFailed {
                tx_hash: tx_hash.clone(),
                reason: RpcError::Reverted(tx_hash),
            });
        }

        let fee_paid_wei = receipt.fee_paid_wei().unwrap_or_else(|| {
            warn!(
                request_id = %attempt.request_id,
                tx_hash = %tx_hash,
                "Receipt has no effective gas price, recording the max fee"
            );
            receipt.max_fee_paid_wei(tx.max_fee_per_gas)
        });
        let fee_paid =
            wei_to_eth(fee_paid_wei).map_err(|e| TransferError::Internal(e.to_string()))?;

        Ok(Inclusion {
            tx_hash,
            amount,
            fee_paid,
            block_number: receipt.block_number,
        })
    }

    async fn live_balance(&self, node: &dyn ChainNode) -> Result<Decimal, TransferError> {
        let wei = node
            .balance_wei(&self.settings.custody_address)
            .await
            .map_err(TransferError::Rpc)?;
        wei_to_eth(wei).map_err(|e| TransferError::Internal(e.to_string()))
    }

    /// `gas_price × gas_limit × estimate_multiplier`, in ETH
    fn fee_estimate(&self, gas_price: u128) -> Result<Decimal, TransferError> {
        let wei = gas_price
            .checked_mul(self.settings.gas_limit as u128)
            .and_then(|v| v.checked_mul(self.settings.estimate_multiplier as u128))
            .ok_or_else(|| TransferError::Internal("fee estimate overflow".into()))?;
        wei_to_eth(wei).map_err(|e| TransferError::Internal(e.to_string()))
    }

    fn check_sufficiency(
        &self,
        amount: Decimal,
        fee_estimate: Decimal,
        balance: Decimal,
        price: Decimal,
    ) -> Result<(), TransferError> {
        let total_needed = amount + fee_estimate;
        if total_needed <= balance {
            return Ok(());
        }

        let max_withdrawable =
            (balance - fee_estimate - self.settings.withdraw_buffer).max(Decimal::ZERO);
        Err(TransferError::InsufficientFunds(Box::new(Shortfall {
            available: balance,
            requested: amount,
            fee_estimate,
            total_needed,
            max_withdrawable,
            price,
        })))
    }

    fn build_tx(
        &self,
        to: &str,
        amount: Decimal,
        gas_price: u128,
    ) -> Result<TransferTx, TransferError> {
        let value_wei = eth_to_wei(amount).map_err(|e| TransferError::InvalidAmount(e.to_string()))?;
        let max_fee_per_gas = gas_price.saturating_mul(self.settings.max_fee_multiplier as u128);

        Ok(TransferTx {
            from: self.settings.custody_address.clone(),
            to: to.to_string(),
            value_wei,
            gas_limit: self.settings.gas_limit,
            max_fee_per_gas,
            // The tip may never exceed the fee cap
            max_priority_fee_per_gas: self.settings.priority_fee_wei.min(max_fee_per_gas),
        })
    }

    fn record_confirmed(
        &self,
        attempt: &mut Attempt,
        inclusion: Inclusion,
    ) -> Result<TransferReceipt, TransferError> {
        attempt.advance(TransferState::Confirmed);
        let amount_usd = eth_to_usd(inclusion.amount, attempt.price);

        let draft = TransferDraft::confirmed(
            attempt.request_id,
            inclusion.tx_hash.clone(),
            inclusion.block_number,
        )
        .with_amount(inclusion.amount, amount_usd)
        .with_destination(&attempt.destination)
        .with_fee_paid(inclusion.fee_paid);

        let record = self.ledger.append(draft).map_err(|e| {
            error!(
                request_id = %attempt.request_id,
                tx_hash = %inclusion.tx_hash,
                "Confirmed transfer could not be recorded: {}", e
            );
            TransferError::Internal(e.to_string())
        })?;

        info!(
            request_id = %attempt.request_id,
            id = record.id,
            tx_hash = %inclusion.tx_hash,
            block = inclusion.block_number,
            amount = %inclusion.amount,
            fee_paid = %inclusion.fee_paid,
            "Transfer confirmed"
        );

        Ok(TransferReceipt {
            id: record.id,
            request_id: attempt.request_id,
            tx_hash: inclusion.tx_hash,
            amount: inclusion.amount,
            amount_usd,
            price: attempt.price,
            to: attempt.destination.clone(),
            fee_paid: inclusion.fee_paid,
            block_number: inclusion.block_number,
            confirmed: true,
        })
    }

    fn record_failure(&self, attempt: &Attempt, err: &TransferError) {
        let Some(kind) = err.failure_kind() else {
            return;
        };

        let mut draft = TransferDraft::failed(attempt.request_id, kind, err.to_string())
            .with_destination(&attempt.destination);
        if let Some(amount) = attempt.amount {
            draft = draft.with_amount(amount, eth_to_usd(amount, attempt.price));
        }
        if let Some(tx_hash) = attempt.tx_hash.as_deref().or(err.tx_hash()) {
            draft = draft.with_tx_hash(tx_hash);
        }

        let id = match self.ledger.append(draft) {
            Ok(record) => record.id,
            Err(e) => {
                error!(request_id = %attempt.request_id, "Failed transfer could not be recorded: {}", e);
                return;
            }
        };

        match err {
            TransferError::ConfirmationFailed { tx_hash, .. } => error!(
                request_id = %attempt.request_id,
                id,
                tx_hash = %tx_hash,
                "Transfer outcome ambiguous, submitted but not confirmed: {}", err
            ),
            TransferError::SubmissionFailed(_) => error!(
                request_id = %attempt.request_id,
                id,
                code = err.code(),
                "Transfer submission failed: {}", err
            ),
            _ => warn!(
                request_id = %attempt.request_id,
                id,
                code = err.code(),
                "Transfer rejected: {}", err
            ),
        }
    }
}

fn validate_destination(destination: Option<&str>) -> Result<String, TransferError> {
    match destination.map(str::trim) {
        Some(addr) if is_valid_address(addr) => Ok(addr.to_string()),
        Some(addr) => Err(TransferError::InvalidDestination(addr.to_string())),
        None => Err(TransferError::InvalidDestination(
            "destination address is required".into(),
        )),
    }
}

fn resolve_fixed_amount(spec: AmountSpec, price: Decimal) -> Result<Decimal, TransferError> {
    let amount = match spec {
        AmountSpec::Eth(eth) => eth,
        AmountSpec::Usd(usd) => usd
            .checked_div(price)
            .ok_or_else(|| TransferError::InvalidAmount(format!("cannot convert {} USD", usd)))?,
        AmountSpec::Percentage(_) => {
            return Err(TransferError::Internal(
                "percentage needs the live balance".into(),
            ));
        }
    };
    positive(truncate_eth(amount))
}

/// `pct / 100 × (balance − reserve)`
fn resolve_percentage(
    pct: Decimal,
    balance: Decimal,
    reserve: Decimal,
) -> Result<Decimal, TransferError> {
    let spendable = balance - reserve;
    if spendable <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount(format!(
            "balance {} ETH does not cover the {} ETH fee reserve",
            balance, reserve
        )));
    }
    positive(truncate_eth(pct / Decimal::ONE_HUNDRED * spendable))
}

fn positive(amount: Decimal) -> Result<Decimal, TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_destination() {
        assert_eq!(
            validate_destination(Some(" 0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045 ")).unwrap(),
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045"
        );
        assert!(validate_destination(Some("0xd8dA6BF2")).is_err());
        assert!(validate_destination(None).is_err());
    }

    #[test]
    fn test_usd_amount_at_price() {
        let amount =
            resolve_fixed_amount(AmountSpec::Usd(Decimal::from(350)), Decimal::from(3500)).unwrap();
        assert_eq!(amount, Decimal::new(1, 1));
    }

    #[test]
    fn test_usd_amount_truncated_to_wei() {
        let amount =
            resolve_fixed_amount(AmountSpec::Usd(Decimal::from(100)), Decimal::from(3500)).unwrap();
        assert_eq!(amount, Decimal::from_str("0.028571428571428571").unwrap());
    }

    #[test]
    fn test_fixed_amount_must_be_positive() {
        assert!(matches!(
            resolve_fixed_amount(AmountSpec::Eth(Decimal::ZERO), Decimal::from(3500)),
            Err(TransferError::InvalidAmount(_))
        ));
        assert!(matches!(
            resolve_fixed_amount(AmountSpec::Eth(Decimal::new(-1, 1)), Decimal::from(3500)),
            Err(TransferError::InvalidAmount(_))
        ));
        // Below one wei truncates to zero
        assert!(matches!(
            resolve_fixed_amount(AmountSpec::Eth(Decimal::new(1, 20)), Decimal::from(3500)),
            Err(TransferError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_full_percentage_keeps_reserve() {
        let amount =
            resolve_percentage(Decimal::ONE_HUNDRED, Decimal::ONE, Decimal::new(3, 3)).unwrap();
        assert_eq!(amount, Decimal::new(997, 3));

        let half =
            resolve_percentage(Decimal::from(50), Decimal::ONE, Decimal::new(3, 3)).unwrap();
        assert_eq!(half, Decimal::new(4985, 4));
    }

    #[test]
    fn test_percentage_of_dust_balance() {
        assert!(matches!(
            resolve_percentage(Decimal::from(50), Decimal::new(2, 3), Decimal::new(3, 3)),
            Err(TransferError::InvalidAmount(_))
        ));
    }
}
