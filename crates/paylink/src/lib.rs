//! Payment-request relay core for QR-initiated on-chain payments.
//!
//! A merchant dashboard mints a [`PaymentIntent`], encodes it into a QR
//! payment URL, and a payer device approves it through the relay, which
//! signs and broadcasts `processPayment` against a fixed contract.
//!
//! # Two-session model
//!
//! - **Dashboard session** ([`DashboardSession`]) — mints intents, shows
//!   the QR, and reads each settlement outcome exactly once
//! - **Relay flow** ([`approval::process_approval`]) — consumes one
//!   approval submission, settles it, and reports back through the
//!   session's single-slot sink
//!
//! The two sessions never talk to each other directly; the encoded
//! intent and the outcome sink are the only bridges.

use alloy::sol;

// Core types
pub mod codec;
pub mod error;
pub mod intent;
pub mod outcome;
pub mod units;

// Chain-facing pieces
pub mod approval;
pub mod gateway;
pub mod registry;

// Presentation helpers
pub mod qr;
pub mod session;

#[cfg(test)]
pub(crate) mod testutil;

// Payment contract interface. Fixed and externally defined; only invoked,
// never reimplemented here.
sol! {
    #[sol(rpc)]
    interface PaymentProcessor {
        function processPayment(address merchant, string paymentId) external payable;
        function isPaymentProcessed(string paymentId) external view returns (bool);
        function processedPayments(string paymentId) external view returns (bool);
        function merchants(address account) external view returns (bool);
        function owner() external view returns (address);
        function addMerchant(address merchant) external;
        function removeMerchant(address merchant) external;
    }
}

// Re-exports
pub use codec::{decode, intent_from_json, payment_url};
pub use error::PaylinkError;
pub use gateway::{ChainGateway, NodeGateway};
pub use intent::{ApprovalSubmission, PayerSecret, PaymentIntent};
pub use outcome::{CompletedPayment, ReceiptSummary, TransactionOutcome};
pub use registry::MerchantRegistry;
pub use session::{DashboardSession, PaymentRequestDisplay};
pub use units::ether_to_wei;
