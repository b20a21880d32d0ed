//! In-memory chain gateway double used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use tokio::task::yield_now;

use crate::error::PaylinkError;
use crate::gateway::ChainGateway;
use crate::intent::PayerSecret;
use crate::outcome::ReceiptSummary;

/// Dev-chain contract address used across tests.
pub const TEST_CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
/// Hardhat account 0 and its key: plays the payer (and contract owner).
pub const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const DEV_ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
/// Hardhat account 1: plays the registered merchant.
pub const MERCHANT_ADDR: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

/// Scriptable [`ChainGateway`]: tracks call counts and models the
/// contract's merchant/duplicate rules with in-memory sets. Every async
/// method yields once so interleavings in concurrency tests actually
/// interleave.
pub struct StubGateway {
    pub contract: Option<Address>,
    pub owner: Address,
    pub merchants: Mutex<HashSet<Address>>,
    pub processed: Mutex<HashSet<String>>,
    pub precheck_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub fail_broadcast: bool,
    receipts: Mutex<HashMap<TxHash, bool>>,
    next_hash: AtomicUsize,
}

impl StubGateway {
    /// Gateway with a configured contract and one registered merchant.
    pub fn new() -> Self {
        let mut merchants = HashSet::new();
        merchants.insert(MERCHANT_ADDR.parse().unwrap());
        StubGateway {
            contract: Some(TEST_CONTRACT.parse().unwrap()),
            owner: DEV_ADDR.parse().unwrap(),
            merchants: Mutex::new(merchants),
            processed: Mutex::new(HashSet::new()),
            precheck_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            fail_broadcast: false,
            receipts: Mutex::new(HashMap::new()),
            next_hash: AtomicUsize::new(0),
        }
    }

    /// Degraded mode: no contract configured.
    pub fn without_contract() -> Self {
        StubGateway {
            contract: None,
            ..StubGateway::new()
        }
    }

    pub fn with_processed(self, payment_id: &str) -> Self {
        self.processed.lock().unwrap().insert(payment_id.to_string());
        self
    }

    pub fn failing_broadcast(mut self) -> Self {
        self.fail_broadcast = true;
        self
    }

    fn allocate_hash(&self) -> TxHash {
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        TxHash::from(U256::from(n))
    }

    fn require_contract(&self) -> Result<Address, PaylinkError> {
        self.contract.ok_or(PaylinkError::ContractUnavailable)
    }
}

#[async_trait]
impl ChainGateway for StubGateway {
    async fn is_connected(&self) -> bool {
        true
    }

    async fn latest_block(&self) -> Result<u64, PaylinkError> {
        yield_now().await;
        Ok(42)
    }

    async fn nonce_for(&self, _address: Address) -> Result<u64, PaylinkError> {
        yield_now().await;
        Ok(0)
    }

    async fn current_gas_price(&self) -> Result<u128, PaylinkError> {
        yield_now().await;
        Ok(1_000_000_000)
    }

    fn payment_contract(&self) -> Option<Address> {
        self.contract
    }

    async fn is_payment_processed(&self, payment_id: &str) -> Result<bool, PaylinkError> {
        yield_now().await;
        self.precheck_calls.fetch_add(1, Ordering::SeqCst);
        self.require_contract()?;
        Ok(self.processed.lock().unwrap().contains(payment_id))
    }

    async fn is_merchant(&self, address: Address) -> Result<bool, PaylinkError> {
        yield_now().await;
        self.require_contract()?;
        Ok(self.merchants.lock().unwrap().contains(&address))
    }

    async fn contract_owner(&self) -> Result<Address, PaylinkError> {
        yield_now().await;
        self.require_contract()?;
        Ok(self.owner)
    }

    async fn send_payment(
        &self,
        payer: Address,
        merchant: Address,
        payment_id: &str,
        _value_wei: U256,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError> {
        yield_now().await;
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.require_contract()?;
        let signer = secret.into_signer()?;
        if signer.address() != payer {
            return Err(PaylinkError::Signing(
                "signing key does not control the submitted address".into(),
            ));
        }
        if self.fail_broadcast {
            return Err(PaylinkError::Rpc("broadcast failed: connection refused".into()));
        }

        // Mirrors the contract: the first transaction for a payment id
        // from a registered merchant succeeds, everything else reverts.
        let first = self
            .processed
            .lock()
            .unwrap()
            .insert(payment_id.to_string());
        let registered = self.merchants.lock().unwrap().contains(&merchant);
        let hash = self.allocate_hash();
        self.receipts.lock().unwrap().insert(hash, first && registered);
        Ok(hash)
    }

    async fn register_merchant(
        &self,
        admin: Address,
        merchant: Address,
        secret: PayerSecret,
    ) -> Result<TxHash, PaylinkError> {
        yield_now().await;
        self.require_contract()?;
        let signer = secret.into_signer()?;
        if signer.address() != admin {
            return Err(PaylinkError::Signing(
                "signing key does not control the submitted address".into(),
            ));
        }
        self.merchants.lock().unwrap().insert(merchant);
        let hash = self.allocate_hash();
        self.receipts.lock().unwrap().insert(hash, true);
        Ok(hash)
    }

    async fn await_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, PaylinkError> {
        yield_now().await;
        let succeeded = self
            .receipts
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .ok_or_else(|| PaylinkError::Rpc(format!("no receipt for {tx_hash}")))?;
        Ok(ReceiptSummary {
            transaction_hash: tx_hash,
            block_number: Some(7),
            succeeded,
        })
    }
}
