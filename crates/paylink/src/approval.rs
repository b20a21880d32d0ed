//! The approval flow: one submission in, one settled payment (or one
//! terminal error) out.

use crate::error::PaylinkError;
use crate::gateway::ChainGateway;
use crate::intent::ApprovalSubmission;
use crate::outcome::ReceiptSummary;
use crate::registry::MerchantRegistry;
use crate::units;

/// Run a payer's approval submission to completion.
///
/// Steps, each terminal on failure with no retry:
/// 1. validate the claimed payer address;
/// 2. duplicate pre-check via `isPaymentProcessed` — mandatory even
///    though the contract enforces uniqueness again, so a known-dead
///    intent never costs a signed broadcast. Best-effort only: two
///    concurrent submissions can both pass and the contract picks the
///    winner;
/// 3. convert the amount and broadcast the signed `processPayment`;
/// 4. wait for the receipt and classify it.
///
/// The secret inside `submission` is consumed by the signing call and
/// does not survive this function.
pub async fn process_approval(
    gateway: &dyn ChainGateway,
    submission: ApprovalSubmission,
) -> Result<ReceiptSummary, PaylinkError> {
    let ApprovalSubmission {
        intent,
        payer_address,
        secret,
    } = submission;

    let payer = MerchantRegistry::parse_address(&payer_address)?;

    if gateway.is_payment_processed(&intent.payment_id).await? {
        return Err(PaylinkError::DuplicatePayment(intent.payment_id));
    }

    let value = units::ether_to_wei(&intent.amount)?;
    let tx_hash = gateway
        .send_payment(payer, intent.merchant, &intent.payment_id, value, secret)
        .await?;
    tracing::info!(
        payment_id = %intent.payment_id,
        payer = %payer,
        tx = %tx_hash,
        "payment broadcast"
    );

    let receipt = gateway.await_receipt(tx_hash).await?;
    if !receipt.succeeded {
        return Err(PaylinkError::ContractLogic(format!(
            "transaction {tx_hash} reverted"
        )));
    }
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{PayerSecret, PaymentIntent};
    use crate::testutil::{StubGateway, DEV_ADDR, DEV_KEY, MERCHANT_ADDR};
    use std::sync::atomic::Ordering;

    fn intent(payment_id: &str) -> PaymentIntent {
        PaymentIntent {
            merchant: MERCHANT_ADDR.parse().unwrap(),
            amount: "0.05".into(),
            payment_id: payment_id.into(),
            contract: None,
        }
    }

    fn submission(payment_id: &str) -> ApprovalSubmission {
        ApprovalSubmission {
            intent: intent(payment_id),
            payer_address: DEV_ADDR.into(),
            secret: PayerSecret::new(DEV_KEY),
        }
    }

    #[tokio::test]
    async fn settles_a_fresh_intent() {
        let gateway = StubGateway::new();
        let receipt = process_approval(&gateway, submission("PAY-1"))
            .await
            .unwrap();
        assert!(receipt.succeeded);
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 1);
        assert!(gateway.processed.lock().unwrap().contains("PAY-1"));
    }

    #[tokio::test]
    async fn malformed_payer_never_reaches_the_gateway() {
        let gateway = StubGateway::new();
        let err = process_approval(
            &gateway,
            ApprovalSubmission {
                intent: intent("PAY-1"),
                payer_address: "0x1234".into(),
                secret: PayerSecret::new(DEV_KEY),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PaylinkError::InvalidAddress(_)));
        assert!(err.is_rejection());
        assert_eq!(gateway.precheck_calls.load(Ordering::SeqCst), 0);
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_intent_is_rejected_without_broadcast() {
        let gateway = StubGateway::new().with_processed("PAY-1");
        let err = process_approval(&gateway, submission("PAY-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::DuplicatePayment(_)));
        assert!(err.is_rejection());
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_contract_surfaces_before_broadcast() {
        let gateway = StubGateway::without_contract();
        let err = process_approval(&gateway, submission("PAY-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::ContractUnavailable));
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn broadcast_failure_is_not_a_rejection() {
        let gateway = StubGateway::new().failing_broadcast();
        let err = process_approval(&gateway, submission("PAY-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, PaylinkError::Rpc(_)));
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn wrong_key_for_payer_is_a_signing_error() {
        let gateway = StubGateway::new();
        let err = process_approval(
            &gateway,
            ApprovalSubmission {
                intent: intent("PAY-1"),
                // Merchant's address claimed, but signed with the payer key.
                payer_address: MERCHANT_ADDR.into(),
                secret: PayerSecret::new(DEV_KEY),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PaylinkError::Signing(_)));
        assert!(!err.is_rejection());
    }

    #[tokio::test]
    async fn unregistered_merchant_reverts_on_chain() {
        let gateway = StubGateway::new();
        let err = process_approval(
            &gateway,
            ApprovalSubmission {
                intent: PaymentIntent {
                    merchant: DEV_ADDR.parse().unwrap(),
                    amount: "0.05".into(),
                    payment_id: "PAY-1".into(),
                    contract: None,
                },
                payer_address: DEV_ADDR.into(),
                secret: PayerSecret::new(DEV_KEY),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PaylinkError::ContractLogic(_)));
        // The broadcast happened; only the contract said no.
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicates_settle_exactly_once() {
        let gateway = StubGateway::new();
        let (a, b) = tokio::join!(
            process_approval(&gateway, submission("PAY-RACE")),
            process_approval(&gateway, submission("PAY-RACE")),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        // Both passed the best-effort pre-check and broadcast; the
        // contract resolved the race.
        assert_eq!(gateway.send_calls.load(Ordering::SeqCst), 2);
        let loser = if a.is_err() { a } else { b };
        assert!(matches!(
            loser.unwrap_err(),
            PaylinkError::ContractLogic(_)
        ));
    }
}
