use alloy::primitives::TxHash;
use serde::Serialize;

use crate::intent::PaymentIntent;

/// Terminal result of one approval submission that reached the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TransactionOutcome {
    #[serde(rename_all = "camelCase")]
    Success { tx_hash: TxHash },
    Failure { reason: String },
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success { .. })
    }

    /// Human-readable detail line: the transaction hash or the failure
    /// reason.
    pub fn detail(&self) -> String {
        match self {
            TransactionOutcome::Success { tx_hash } => format!("{tx_hash}"),
            TransactionOutcome::Failure { reason } => reason.clone(),
        }
    }
}

/// Outcome paired with the intent it settles, as handed from the relay to
/// the merchant session. Delivered at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedPayment {
    pub intent: PaymentIntent,
    pub outcome: TransactionOutcome,
}

/// Distilled receipt for a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    /// Receipt status flag: false means the contract reverted.
    pub succeeded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let success = TransactionOutcome::Success {
            tx_hash: TxHash::ZERO,
        };
        let json = serde_json::to_value(&success).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json["txHash"].is_string());

        let failure = TransactionOutcome::Failure {
            reason: "rpc error: node unreachable".into(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["reason"], "rpc error: node unreachable");
    }

    #[test]
    fn detail_surfaces_hash_or_reason() {
        let success = TransactionOutcome::Success {
            tx_hash: TxHash::ZERO,
        };
        assert!(success.detail().starts_with("0x"));
        let failure = TransactionOutcome::Failure {
            reason: "reverted".into(),
        };
        assert_eq!(failure.detail(), "reverted");
    }
}
