//! Merchant-facing dashboard routes.

use actix_web::http::{header, StatusCode};
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use paylink::{ChainGateway, MerchantRegistry, PayerSecret, PaymentIntent};

use crate::metrics;
use crate::pages;
use crate::routes::{html, status_for};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IntentForm {
    pub merchant: String,
    pub amount: String,
    #[serde(default)]
    pub payment_id: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub merchant: String,
    pub admin_secret: String,
}

/// `PAY-<unix seconds>`, the id used when the merchant leaves the field
/// blank.
fn default_payment_id() -> String {
    let seconds = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("PAY-{seconds}")
}

async fn render_dashboard(
    state: &AppState,
    flash_error: Option<String>,
    status: StatusCode,
) -> HttpResponse {
    let connected = state.gateway.is_connected().await;
    let latest_block = if connected {
        state.gateway.latest_block().await.ok()
    } else {
        None
    };

    let display = state.session.current_display();
    let (merchant_registered, payment_processed) = match &display {
        Some(current) => (
            state
                .registry
                .is_registered(current.intent.merchant)
                .await
                .ok(),
            state
                .gateway
                .is_payment_processed(&current.intent.payment_id)
                .await
                .ok(),
        ),
        None => (None, None),
    };

    let view = pages::DashboardView {
        connected,
        latest_block,
        contract: state.gateway.payment_contract(),
        display: display.as_ref(),
        merchant_registered,
        payment_processed,
        outcome: state.session.take_outcome(),
        flash_error,
        default_payment_id: default_payment_id(),
    };
    html(status, pages::dashboard_page(&view))
}

#[get("/dashboard")]
pub async fn dashboard(state: web::Data<AppState>) -> HttpResponse {
    render_dashboard(&state, None, StatusCode::OK).await
}

/// Mint a new payment request and make it the displayed one.
///
/// Gated on the merchant's on-chain registration so the dashboard never
/// hands out a QR code the contract is guaranteed to reject.
#[post("/dashboard/intent")]
pub async fn create_intent(
    state: web::Data<AppState>,
    form: web::Form<IntentForm>,
) -> HttpResponse {
    let merchant = match MerchantRegistry::parse_address(&form.merchant) {
        Ok(address) => address,
        Err(e) => return render_dashboard(&state, Some(e.to_string()), StatusCode::BAD_REQUEST).await,
    };

    match state.registry.is_registered(merchant).await {
        Ok(true) => {}
        Ok(false) => {
            return render_dashboard(
                &state,
                Some(format!(
                    "{merchant} is not a registered merchant — register it first"
                )),
                StatusCode::BAD_REQUEST,
            )
            .await;
        }
        Err(e) => return render_dashboard(&state, Some(e.to_string()), status_for(&e)).await,
    }

    let payment_id = if form.payment_id.trim().is_empty() {
        default_payment_id()
    } else {
        form.payment_id.trim().to_string()
    };
    let intent = PaymentIntent {
        merchant,
        amount: form.amount.trim().to_string(),
        payment_id,
        contract: state.gateway.payment_contract(),
    };
    if let Err(e) = intent.validate() {
        return render_dashboard(&state, Some(e.to_string()), StatusCode::BAD_REQUEST).await;
    }

    match state.session.set_current_intent(intent.clone()) {
        Ok(()) => {
            metrics::INTENTS_MINTED.inc();
            tracing::info!(
                payment_id = %intent.payment_id,
                merchant = %intent.merchant,
                amount = %intent.amount,
                "payment request created"
            );
            HttpResponse::SeeOther()
                .insert_header((header::LOCATION, "/dashboard"))
                .finish()
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to render payment request");
            render_dashboard(&state, Some(e.to_string()), StatusCode::INTERNAL_SERVER_ERROR).await
        }
    }
}

/// The displayed request's QR as a plain PNG, for printing or download.
#[get("/dashboard/qr.png")]
pub async fn qr_png(state: web::Data<AppState>) -> HttpResponse {
    match state.session.current_display() {
        Some(display) => HttpResponse::Ok()
            .content_type("image/png")
            .body(display.qr_png),
        None => HttpResponse::NotFound()
            .content_type("text/plain; charset=utf-8")
            .body("no active payment request"),
    }
}

#[get("/dashboard/register")]
pub async fn register_form(state: web::Data<AppState>) -> HttpResponse {
    let owner = state.gateway.contract_owner().await.ok();
    html(
        StatusCode::OK,
        pages::register_page(owner, state.admin_address, None),
    )
}

/// Register a merchant with the contract, signed by the admin key typed
/// into the form. The key is consumed by the signing call and dropped.
#[post("/dashboard/register")]
pub async fn register_submit(
    state: web::Data<AppState>,
    form: web::Form<RegisterForm>,
) -> HttpResponse {
    let RegisterForm {
        merchant,
        admin_secret,
    } = form.into_inner();

    let owner = state.gateway.contract_owner().await.ok();
    let merchant = match MerchantRegistry::parse_address(&merchant) {
        Ok(address) => address,
        Err(e) => {
            return html(
                StatusCode::BAD_REQUEST,
                pages::register_page(owner, state.admin_address, Some(e.to_string())),
            );
        }
    };

    match state.registry.is_registered(merchant).await {
        Ok(false) => {}
        Ok(true) => {
            return html(
                StatusCode::CONFLICT,
                pages::register_page(
                    owner,
                    state.admin_address,
                    Some(format!("{merchant} is already registered")),
                ),
            );
        }
        Err(e) => {
            return html(
                status_for(&e),
                pages::register_page(owner, state.admin_address, Some(e.to_string())),
            );
        }
    }

    let tx_hash = match state
        .gateway
        .register_merchant(state.admin_address, merchant, PayerSecret::new(admin_secret))
        .await
    {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(merchant = %merchant, error = %e, "merchant registration not sent");
            return html(
                status_for(&e),
                pages::register_page(owner, state.admin_address, Some(e.to_string())),
            );
        }
    };

    match state.gateway.await_receipt(tx_hash).await {
        Ok(receipt) if receipt.succeeded => {
            tracing::info!(merchant = %merchant, tx = %tx_hash, "merchant registered");
            html(
                StatusCode::OK,
                pages::register_success_page(merchant, &receipt),
            )
        }
        Ok(_) => html(
            StatusCode::UNPROCESSABLE_ENTITY,
            pages::register_page(
                owner,
                state.admin_address,
                Some(format!("registration transaction {tx_hash} reverted")),
            ),
        ),
        Err(e) => {
            tracing::error!(merchant = %merchant, error = %e, "registration receipt wait failed");
            html(
                status_for(&e),
                pages::register_page(owner, state.admin_address, Some(e.to_string())),
            )
        }
    }
}
