//! Merchant-side session state.
//!
//! The dashboard and the relay handlers share exactly two pieces of
//! mutable state: the currently displayed payment request and the
//! single-slot outcome sink. Both sit behind mutexes; a poisoned lock is
//! recovered rather than propagated so one panicked worker cannot wedge
//! the dashboard.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use url::Url;

use crate::codec;
use crate::error::PaylinkError;
use crate::gateway::ChainGateway;
use crate::intent::PaymentIntent;
use crate::outcome::CompletedPayment;
use crate::qr;

/// The payment request currently on display: the intent plus the
/// artifacts derived from it.
#[derive(Debug, Clone)]
pub struct PaymentRequestDisplay {
    pub intent: PaymentIntent,
    pub url: Url,
    pub qr_png: Vec<u8>,
}

/// Shared state for one merchant dashboard session.
pub struct DashboardSession {
    base_url: Url,
    gateway: Arc<dyn ChainGateway>,
    current: Mutex<Option<PaymentRequestDisplay>>,
    outcome: Mutex<Option<CompletedPayment>>,
}

impl DashboardSession {
    pub fn new(base_url: Url, gateway: Arc<dyn ChainGateway>) -> Self {
        DashboardSession {
            base_url,
            gateway,
            current: Mutex::new(None),
            outcome: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Encode `intent` into its payment URL and QR image and make it the
    /// displayed request, replacing any previous one.
    pub fn set_current_intent(&self, intent: PaymentIntent) -> Result<(), PaylinkError> {
        let url = codec::payment_url(&self.base_url, &intent)?;
        let qr_png = qr::encode_png(url.as_str())?;
        *lock_recovering(&self.current) = Some(PaymentRequestDisplay {
            intent,
            url,
            qr_png,
        });
        Ok(())
    }

    pub fn current_display(&self) -> Option<PaymentRequestDisplay> {
        lock_recovering(&self.current).clone()
    }

    pub fn current_intent(&self) -> Option<PaymentIntent> {
        lock_recovering(&self.current)
            .as_ref()
            .map(|display| display.intent.clone())
    }

    /// Hand a settled payment to the dashboard. Single slot: an unread
    /// outcome is replaced by the newer one and logged.
    pub fn push_outcome(&self, completed: CompletedPayment) {
        let mut slot = lock_recovering(&self.outcome);
        if let Some(previous) = slot.replace(completed) {
            tracing::warn!(
                payment_id = %previous.intent.payment_id,
                "unread payment outcome replaced by a newer one"
            );
        }
    }

    /// Read-and-clear the outcome slot. Each outcome is delivered at most
    /// once; a second call returns `None` until the next push.
    pub fn take_outcome(&self) -> Option<CompletedPayment> {
        lock_recovering(&self.outcome).take()
    }

    /// Live registration check for the dashboard's merchant field.
    pub async fn merchant_status(&self, merchant: Address) -> Result<bool, PaylinkError> {
        self.gateway.is_merchant(merchant).await
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!("session mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}
