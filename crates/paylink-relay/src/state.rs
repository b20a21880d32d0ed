use std::sync::Arc;

use alloy::primitives::Address;
use paylink::{ChainGateway, DashboardSession, MerchantRegistry};
use url::Url;

/// Shared application state injected into every handler.
pub struct AppState {
    pub gateway: Arc<dyn ChainGateway>,
    pub session: Arc<DashboardSession>,
    pub registry: MerchantRegistry,
    pub admin_address: Address,
}

impl AppState {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        public_base_url: Url,
        admin_address: Address,
    ) -> Self {
        let session = Arc::new(DashboardSession::new(public_base_url, gateway.clone()));
        let registry = MerchantRegistry::new(gateway.clone());
        AppState {
            gateway,
            session,
            registry,
            admin_address,
        }
    }
}
