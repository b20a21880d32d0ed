use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::PaylinkError;
use crate::units;

/// Longest accepted `paymentId`. Intents are bounded; anything larger is
/// rejected at the codec boundary rather than forwarded to the contract.
pub const MAX_PAYMENT_ID_LEN: usize = 128;

/// A single payment request, as minted by the merchant dashboard and
/// carried inside the QR code.
///
/// The schema is strict: unknown fields are rejected, the merchant must be
/// a well-formed address, and the amount must convert losslessly to wei.
/// An intent is immutable once encoded; the relay only consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PaymentIntent {
    /// Receiving merchant. Must be registered with the contract for the
    /// payment to settle, but that is enforced on-chain, not here.
    pub merchant: Address,
    /// Decimal amount in native units (ETH). Kept as the original string;
    /// conversion to wei happens at submission time.
    #[serde(deserialize_with = "amount_string")]
    pub amount: String,
    /// Caller-supplied identifier, unique per merchant. Uniqueness is
    /// enforced by the contract.
    pub payment_id: String,
    /// Contract the intent was minted against. Informational: invocation
    /// always uses the relay's configured contract.
    #[serde(
        default,
        rename = "contractAddress",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract: Option<Address>,
}

impl PaymentIntent {
    /// Field-level validation applied by the codec after parsing.
    pub fn validate(&self) -> Result<(), PaylinkError> {
        if self.payment_id.trim().is_empty() {
            return Err(PaylinkError::Decode("paymentId must not be empty".into()));
        }
        if self.payment_id.len() > MAX_PAYMENT_ID_LEN {
            return Err(PaylinkError::Decode(format!(
                "paymentId exceeds {MAX_PAYMENT_ID_LEN} bytes"
            )));
        }
        units::ether_to_wei(&self.amount)?;
        Ok(())
    }
}

/// Accepts the amount as either a JSON string or a bare JSON number and
/// normalizes it to a string. Older dashboards emitted numbers.
fn amount_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => Ok(s),
        Raw::Number(n) => Ok(n.to_string()),
    }
}

/// The payer's signing credential, captured from the approval form.
///
/// Exists only for the lifetime of one submission: it is consumed by the
/// signing call and is never stored, logged, or echoed back. `Debug`
/// deliberately hides the contents.
pub struct PayerSecret(String);

impl PayerSecret {
    pub fn new(raw: impl Into<String>) -> Self {
        PayerSecret(raw.into())
    }

    /// Parse the secret into a local signer, consuming it.
    ///
    /// The error carries a fixed message so the raw material can never
    /// leak through an error page or log line.
    pub fn into_signer(self) -> Result<PrivateKeySigner, PaylinkError> {
        let trimmed = self.0.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex.parse::<PrivateKeySigner>()
            .map_err(|_| PaylinkError::Signing("malformed signing key".into()))
    }
}

impl std::fmt::Debug for PayerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PayerSecret([REDACTED])")
    }
}

/// Everything the relay needs to act on one approval POST.
#[derive(Debug)]
pub struct ApprovalSubmission {
    pub intent: PaymentIntent,
    /// Raw form value; validated as the first step of the approval flow.
    pub payer_address: String,
    pub secret: PayerSecret,
}
