use thiserror::Error;

/// Errors returned by paylink operations.
///
/// Every variant is terminal for the submission that produced it; nothing
/// here is retried. None of these ever carry the payer's signing secret.
#[derive(Debug, Error)]
pub enum PaylinkError {
    #[error("malformed payment intent: {0}")]
    Decode(String),

    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("payment {0} has already been processed")]
    DuplicatePayment(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("contract rejected the transaction: {0}")]
    ContractLogic(String),

    #[error("no payment contract configured")]
    ContractUnavailable,

    #[error("qr encoding error: {0}")]
    Qr(String),
}

impl PaylinkError {
    /// True for errors raised before any transaction is broadcast.
    ///
    /// Rejections are rendered to the submitting device only; once a
    /// broadcast has been attempted the chain may have changed, so every
    /// later result is also reported to the merchant session.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PaylinkError::Decode(_)
                | PaylinkError::InvalidAddress(_)
                | PaylinkError::DuplicatePayment(_)
                | PaylinkError::ContractUnavailable
        )
    }
}
