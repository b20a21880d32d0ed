//! Thin adapter over the blockchain node.
//!
//! Everything here is single-attempt: an RPC failure is reported to the
//! caller, never retried. The payer's signing key exists only inside
//! `sign_and_send` and is gone once the transaction is built.

use std::time::{Duration, Instant};

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use url::Url;

use crate::error::PaylinkError;
use crate::intent::PayerSecret;
use crate::outcome::ReceiptSummary;
use crate::PaymentProcessor;

/// Fixed gas limit for contract invocations, matching the reference
/// deployment. Generous for both `processPayment` and `addMerchant`.
pub const TX_GAS_LIMIT: u64 = 200_000;

/// How long to poll for a receipt before reporting the wait as failed.
pub const RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Chain operations the relay and dashboard need.
///
/// A trait seam so the HTTP layer can run against a stub in tests; the
/// real implementation is [`NodeGateway`].
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// RPC liveness. Reported, never retried.
    async fn is_connected(&self) -> bool;

    async fn latest_block(&self) -> Result<u64, PaylinkError>;

    /// Pending-state nonce, fetched immediately before use.
    async fn nonce_for(&self, address: Address) -> Result<u64, PaylinkError>;

    async fn current_gas_price(&self) -> Result<u128, PaylinkError>;

    /// The configured payment contract, or `None` when the relay runs in
    /// degraded read-only mode.
    fn payment_contract(&self) -> Option<Address>;

    async fn is_payment_processed(&self, payment_id: &str) -> Result<bool, PaylinkError>;

    async fn is_merchant(&self, address: Address) -> Result<bool, PaylinkError>;

    async fn contract_owner(&self) -> Result<Address, PaylinkError>;

    /// Build, sign, and broadcast `processPayment(merchant, paymentId)`
    /// with `value_wei` attached. The secret must control `payer`.
    async fn send_payment(
        &self,
        payer: Address,
        merchant: Address,
        payment_id: &str,
        value_wei: U256,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError>;

    /// Build, sign, and broadcast `addMerchant(merchant)` from the admin
    /// account.
    async fn register_merchant(
        &self,
        admin: Address,
        merchant: Address,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError>;

    /// Poll for the receipt of a broadcast transaction until it is mined
    /// or [`RECEIPT_TIMEOUT`] elapses.
    async fn await_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, PaylinkError>;
}

/// [`ChainGateway`] backed by a JSON-RPC node over HTTP.
pub struct NodeGateway {
    provider: RootProvider,
    contract: Option<Address>,
}

impl NodeGateway {
    pub fn new(rpc_url: &Url, contract: Option<Address>) -> Self {
        let provider: RootProvider = RootProvider::new_http(rpc_url.clone());
        NodeGateway { provider, contract }
    }

    fn require_contract(&self) -> Result<Address, PaylinkError> {
        self.contract.ok_or(PaylinkError::ContractUnavailable)
    }

    /// Shared build/sign/broadcast path for state-changing calls.
    async fn sign_and_send(
        &self,
        from: Address,
        secret: PayerSecret,
        calldata: Vec<u8>,
        value: U256,
    ) -> Result<TxHash, PaylinkError> {
        let to = self.require_contract()?;
        let signer = secret.into_signer()?;
        if signer.address() != from {
            return Err(PaylinkError::Signing(
                "signing key does not control the submitted address".into(),
            ));
        }

        let nonce = self.nonce_for(from).await?;
        let gas_price = self.current_gas_price().await?;
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("chain id fetch failed: {e}")))?;

        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_gas_limit(TX_GAS_LIMIT)
            .with_chain_id(chain_id)
            .with_input(Bytes::from(calldata));

        let wallet = EthereumWallet::from(signer);
        let envelope = request
            .build(&wallet)
            .await
            .map_err(|e| PaylinkError::Signing(format!("transaction signing failed: {e}")))?;

        use alloy::eips::eip2718::Encodable2718;
        let pending = self
            .provider
            .send_raw_transaction(&envelope.encoded_2718())
            .await
            .map_err(|e| PaylinkError::Rpc(format!("broadcast failed: {e}")))?;
        Ok(*pending.tx_hash())
    }
}

#[async_trait]
impl ChainGateway for NodeGateway {
    async fn is_connected(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }

    async fn latest_block(&self) -> Result<u64, PaylinkError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("block number fetch failed: {e}")))
    }

    async fn nonce_for(&self, address: Address) -> Result<u64, PaylinkError> {
        self.provider
            .get_transaction_count(address)
            .await
            .map_err(|e| PaylinkError::Rpc(format!("nonce fetch failed: {e}")))
    }

    async fn current_gas_price(&self) -> Result<u128, PaylinkError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("gas price fetch failed: {e}")))
    }

    fn payment_contract(&self) -> Option<Address> {
        self.contract
    }

    async fn is_payment_processed(&self, payment_id: &str) -> Result<bool, PaylinkError> {
        let contract = PaymentProcessor::new(self.require_contract()?, &self.provider);
        let processed = contract
            .isPaymentProcessed(payment_id.to_string())
            .call()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("isPaymentProcessed failed: {e}")))?;
        Ok(processed)
    }

    async fn is_merchant(&self, address: Address) -> Result<bool, PaylinkError> {
        let contract = PaymentProcessor::new(self.require_contract()?, &self.provider);
        let registered = contract
            .merchants(address)
            .call()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("merchants failed: {e}")))?;
        Ok(registered)
    }

    async fn contract_owner(&self) -> Result<Address, PaylinkError> {
        let contract = PaymentProcessor::new(self.require_contract()?, &self.provider);
        let owner = contract
            .owner()
            .call()
            .await
            .map_err(|e| PaylinkError::Rpc(format!("owner failed: {e}")))?;
        Ok(owner)
    }

    async fn send_payment(
        &self,
        payer: Address,
        merchant: Address,
        payment_id: &str,
        value_wei: U256,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError> {
        let call = PaymentProcessor::processPaymentCall {
            merchant,
            paymentId: payment_id.to_string(),
        };
        self.sign_and_send(payer, secret, call.abi_encode(), value_wei)
            .await
    }

    async fn register_merchant(
        &self,
        admin: Address,
        merchant: Address,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError> {
        let call = PaymentProcessor::addMerchantCall { merchant };
        self.sign_and_send(admin, secret, call.abi_encode(), U256::ZERO)
            .await
    }

    async fn await_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, PaylinkError> {
        let deadline = Instant::now() + RECEIPT_TIMEOUT;
        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    return Ok(ReceiptSummary {
                        transaction_hash: tx_hash,
                        block_number: receipt.block_number,
                        succeeded: receipt.status(),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    return Err(PaylinkError::Rpc(format!("receipt fetch failed: {e}")));
                }
            }
            if Instant::now() >= deadline {
                return Err(PaylinkError::Rpc(format!(
                    "no receipt for {tx_hash} after {}s",
                    RECEIPT_TIMEOUT.as_secs()
                )));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
