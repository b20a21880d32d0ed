use std::sync::Arc;

use alloy::primitives::Address;

use crate::error::PaylinkError;
use crate::gateway::ChainGateway;

/// Read-only view of the contract's merchant allowlist.
///
/// Used by the dashboard to gate QR generation. The relay never consults
/// it: `processPayment` re-checks registration on-chain anyway.
#[derive(Clone)]
pub struct MerchantRegistry {
    gateway: Arc<dyn ChainGateway>,
}

impl MerchantRegistry {
    pub fn new(gateway: Arc<dyn ChainGateway>) -> Self {
        MerchantRegistry { gateway }
    }

    /// Live `merchants(address)` read. Never cached: registration can
    /// change between renders.
    pub async fn is_registered(&self, merchant: Address) -> Result<bool, PaylinkError> {
        self.gateway.is_merchant(merchant).await
    }

    /// Parse a user-supplied address, surfacing the offending input.
    pub fn parse_address(raw: &str) -> Result<Address, PaylinkError> {
        let trimmed = raw.trim();
        trimmed
            .parse::<Address>()
            .map_err(|_| PaylinkError::InvalidAddress(trimmed.to_string()))
    }

    pub fn is_valid_address(raw: &str) -> bool {
        Self::parse_address(raw).is_ok()
    }
}
