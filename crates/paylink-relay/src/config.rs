use std::env;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use alloy::primitives::Address;
use url::Url;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
// Owner account of the reference dev-chain deployment.
const DEFAULT_ADMIN_ADDRESS: &str = "0x90F8bf6A479f320ead074411a4B0e7944Ea8c9C1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_RATE_LIMIT_RPM: u64 = 120;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// JSON-RPC endpoint of the blockchain node
    pub rpc_url: Url,
    /// Payment contract; `None` runs the relay in degraded read-only mode
    pub contract: Option<Address>,
    /// Account allowed to register merchants
    pub admin_address: Address,
    /// Server port
    pub port: u16,
    /// Base URL encoded into QR payment links
    pub public_base_url: Url,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u64,
}

impl RelayConfig {
    /// Read configuration from the environment. Called once at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: RPC endpoint
        let rpc_url_str = env::var("BLOCKCHAIN_URL").unwrap_or_else(|_| DEFAULT_RPC_URL.to_string());
        let rpc_url =
            Url::parse(&rpc_url_str).map_err(|_| ConfigError::InvalidUrl(rpc_url_str.clone()))?;

        // Optional: payment contract. Absence degrades every payment
        // operation to "contract unavailable" but keeps the relay up.
        let contract = match env::var("SMART_CONTRACT_ADDRESS")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(raw) => Some(
                raw.trim()
                    .parse::<Address>()
                    .map_err(|_| ConfigError::InvalidAddress(raw))?,
            ),
            None => {
                tracing::warn!(
                    "SMART_CONTRACT_ADDRESS not set — payment features will be limited"
                );
                None
            }
        };

        // Optional: admin account for merchant registration
        let admin_str =
            env::var("ADMIN_ADDRESS").unwrap_or_else(|_| DEFAULT_ADMIN_ADDRESS.to_string());
        let admin_address: Address = admin_str
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(admin_str))?;

        // Optional: port
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        // Optional: public base URL for QR links. Defaults to the LAN
        // address so a phone on the same network can reach the relay.
        let public_base_url = match env::var("PUBLIC_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
        {
            Some(raw) => {
                Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw))?
            }
            None => {
                let derived = format!("http://{}:{port}", detect_local_ip());
                Url::parse(&derived).map_err(|_| ConfigError::InvalidUrl(derived))?
            }
        };

        // Optional: rate limit
        let rate_limit_rpm = env::var("RATE_LIMIT_RPM")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_RPM);

        Ok(RelayConfig {
            rpc_url,
            contract,
            admin_address,
            port,
            public_base_url,
            rate_limit_rpm,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Best-effort LAN address discovery: a connected UDP socket toward a
/// public resolver reveals which local address the OS would route from.
/// No packet is sent. Falls back to loopback.
pub fn detect_local_ip() -> IpAddr {
    let fallback = IpAddr::V4(Ipv4Addr::LOCALHOST);
    match UdpSocket::bind(("0.0.0.0", 0)) {
        Ok(socket) => match socket.connect(("8.8.8.8", 80)) {
            Ok(()) => socket.local_addr().map(|addr| addr.ip()).unwrap_or(fallback),
            Err(_) => fallback,
        },
        Err(_) => fallback,
    }
}
