//! Transfer Ledger - append-only record of attempted transfers
//!
//! Every transfer attempt that gets past destination validation ends up here
//! exactly once, confirmed or failed. Ids are assigned under the same lock
//! that stores the record, so id order is append order. Records are never
//! updated or removed; a resubmission is a new record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    NotFound(u64),

    #[error("Rejected ledger record: {0}")]
    InvalidRecord(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Withdrawal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Confirmed,
    Failed,
}

/// Why a failed record failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Refused before any submission (amount or funds)
    Rejected,
    /// No endpoint or read failed before submission
    Unavailable,
    /// The network did not accept the transaction
    SubmissionFailed,
    /// Submitted but not confirmed; outcome on chain is unknown or reverted
    ConfirmationFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TransferRecord {
    pub id: u64,
    pub kind: TransferKind,
    pub request_id: Uuid,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub amount_usd: Option<Decimal>,
    pub destination: Option<String>,
    pub tx_hash: Option<String>,
    #[schema(value_type = Option<String>)]
    pub fee_paid: Option<Decimal>,
    pub block_number: Option<u64>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A record before the ledger assigns its id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct TransferDraft {
    pub request_id: Uuid,
    pub status: TransferStatus,
    pub failure: Option<FailureKind>,
    pub amount: Option<Decimal>,
    pub amount_usd: Option<Decimal>,
    pub destination: Option<String>,
    pub tx_hash: Option<String>,
    pub fee_paid: Option<Decimal>,
    pub block_number: Option<u64>,
    pub error: Option<String>,
}

impl TransferDraft {
    pub fn confirmed(request_id: Uuid, tx_hash: String, block_number: u64) -> Self {
        Self {
            request_id,
            status: TransferStatus::Confirmed,
            failure: None,
            amount: None,
            amount_usd: None,
            destination: None,
            tx_hash: Some(tx_hash),
            fee_paid: None,
            block_number: Some(block_number),
            error: None,
        }
    }

    pub fn failed(request_id: Uuid, failure: FailureKind, error: impl Into<String>) -> Self {
        Self {
            request_id,
            status: TransferStatus::Failed,
            failure: Some(failure),
            amount: None,
            amount_usd: None,
            destination: None,
            tx_hash: None,
            fee_paid: None,
            block_number: None,
            error: Some(error.into()),
        }
    }

    pub fn with_amount(mut self, amount: Decimal, amount_usd: Decimal) -> Self {
        self.amount = Some(amount);
        self.amount_usd = Some(amount_usd);
        self
    }

    pub fn with_destination(mut self, destination: &str) -> Self {
        self.destination = Some(destination.to_string());
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: &str) -> Self {
        self.tx_hash = Some(tx_hash.to_string());
        self
    }

    pub fn with_fee_paid(mut self, fee_paid: Decimal) -> Self {
        self.fee_paid = Some(fee_paid);
        self
    }

    fn check(&self) -> Result<(), LedgerError> {
        match self.status {
            TransferStatus::Confirmed
                if self.tx_hash.as_deref().is_none_or(str::is_empty) =>
            {
                Err(LedgerError::InvalidRecord("confirmed record without tx hash"))
            }
            TransferStatus::Failed if self.error.as_deref().is_none_or(str::is_empty) => {
                Err(LedgerError::InvalidRecord("failed record without error text"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Default)]
struct LedgerInner {
    records: Vec<TransferRecord>,
    next_id: u64,
}

/// In-memory transfer ledger
#[derive(Default)]
pub struct TransferLedger {
    inner: Mutex<LedgerInner>,
}

impl TransferLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        // Appends cannot leave the Vec half-written, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `draft` and return the record as stored
    pub fn append(&self, draft: TransferDraft) -> Result<TransferRecord, LedgerError> {
        draft.check()?;

        let mut inner = self.lock();
        inner.next_id += 1;
        let record = TransferRecord {
            id: inner.next_id,
            kind: TransferKind::Withdrawal,
            request_id: draft.request_id,
            status: draft.status,
            failure: draft.failure,
            amount: draft.amount,
            amount_usd: draft.amount_usd,
            destination: draft.destination,
            tx_hash: draft.tx_hash,
            fee_paid: draft.fee_paid,
            block_number: draft.block_number,
            timestamp: Utc::now(),
            error: draft.error,
        };
        inner.records.push(record.clone());
        Ok(record)
    }

    /// Up to `limit` of the most recent records
    pub fn list(&self, limit: usize, order: ListOrder) -> Vec<TransferRecord> {
        let inner = self.lock();
        let start = inner.records.len().saturating_sub(limit);
        let recent = &inner.records[start..];
        match order {
            ListOrder::NewestFirst => recent.iter().rev().cloned().collect(),
            ListOrder::OldestFirst => recent.to_vec(),
        }
    }

    pub fn get(&self, id: u64) -> Result<TransferRecord, LedgerError> {
        let inner = self.lock();
        // Ids start at 1 and are dense
        id.checked_sub(1)
            .and_then(|idx| inner.records.get(idx as usize))
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn confirmed(n: u64) -> TransferDraft {
        TransferDraft::confirmed(Uuid::new_v4(), format!("0x{:064x}", n), 100 + n)
            .with_amount(Decimal::new(1, 1), Decimal::from(350))
            .with_destination("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")
    }

    #[test]
    fn test_ids_strictly_increasing() {
        let ledger = TransferLedger::new();
        let a = ledger.append(confirmed(1)).unwrap();
        let b = ledger
            .append(TransferDraft::failed(
                Uuid::new_v4(),
                FailureKind::Rejected,
                "Insufficient funds",
            ))
            .unwrap();
        let c = ledger.append(confirmed(2)).unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_rejects_confirmed_without_hash() {
        let ledger = TransferLedger::new();
        let draft = TransferDraft::confirmed(Uuid::new_v4(), String::new(), 1);
        assert_eq!(
            ledger.append(draft),
            Err(LedgerError::InvalidRecord("confirmed record without tx hash"))
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_rejects_failed_without_error() {
        let ledger = TransferLedger::new();
        let draft = TransferDraft::failed(Uuid::new_v4(), FailureKind::Unavailable, "");
        assert!(ledger.append(draft).is_err());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_get_returns_appended_record() {
        let ledger = TransferLedger::new();
        let stored = ledger.append(confirmed(7)).unwrap();

        assert_eq!(ledger.get(stored.id).unwrap(), stored);
        assert_eq!(ledger.get(0), Err(LedgerError::NotFound(0)));
        assert_eq!(ledger.get(2), Err(LedgerError::NotFound(2)));
    }

    #[test]
    fn test_list_window_and_order() {
        let ledger = TransferLedger::new();
        for n in 1..=5 {
            ledger.append(confirmed(n)).unwrap();
        }

        let newest: Vec<u64> = ledger
            .list(3, ListOrder::NewestFirst)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(newest, vec![5, 4, 3]);

        let oldest: Vec<u64> = ledger
            .list(3, ListOrder::OldestFirst)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(oldest, vec![3, 4, 5]);

        assert_eq!(ledger.list(50, ListOrder::NewestFirst).len(), 5);
        assert!(ledger.list(0, ListOrder::NewestFirst).is_empty());
    }

    #[test]
    fn test_concurrent_appends_get_unique_ids() {
        let ledger = Arc::new(TransferLedger::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = ledger.clone();
                std::thread::spawn(move || {
                    (0..25)
                        .map(|n| ledger.append(confirmed(t * 100 + n)).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=200).collect::<Vec<_>>());

        // Stored order matches id order
        let stored: Vec<u64> = ledger
            .list(200, ListOrder::OldestFirst)
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(stored, (1..=200).collect::<Vec<_>>());
    }

    #[test]
    fn test_serialized_failed_record() {
        let ledger = TransferLedger::new();
        let rec = ledger
            .append(
                TransferDraft::failed(
                    Uuid::new_v4(),
                    FailureKind::ConfirmationFailed,
                    "timed out",
                )
                .with_tx_hash("0xabc"),
            )
            .unwrap();

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"], "confirmation_failed");
        assert_eq!(json["tx_hash"], "0xabc");
        assert_eq!(json["error"], "timed out");
    }
}
