use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;

use paylink::{
    approval, codec, ApprovalSubmission, ChainGateway, CompletedPayment, PayerSecret,
    PaylinkError, TransactionOutcome,
};

use crate::metrics;
use crate::pages;
use crate::state::AppState;

/// Fields of the approval POST. The secret rides along as an opaque
/// string and is wrapped into a [`PayerSecret`] immediately; the form is
/// deliberately not `Debug`.
#[derive(Deserialize)]
pub struct ApproveForm {
    pub payment_data: String,
    pub account_id: String,
    pub secret_key: String,
}

pub(crate) fn status_for(error: &PaylinkError) -> StatusCode {
    match error {
        PaylinkError::Decode(_) => StatusCode::BAD_REQUEST,
        PaylinkError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        PaylinkError::Signing(_) => StatusCode::BAD_REQUEST,
        PaylinkError::DuplicatePayment(_) => StatusCode::CONFLICT,
        PaylinkError::ContractUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        PaylinkError::Rpc(_) => StatusCode::BAD_GATEWAY,
        PaylinkError::ContractLogic(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PaylinkError::Qr(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Landing route for scanned payment links: decode the intent from the
/// query string and render the approval form.
#[get("/")]
pub async fn payment_request(req: HttpRequest) -> HttpResponse {
    match codec::decode(req.query_string()) {
        Ok(intent) => {
            let canonical = match serde_json::to_string(&intent) {
                Ok(json) => json,
                Err(e) => {
                    return html(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        pages::error_page("Internal Error", &PaylinkError::Decode(e.to_string())),
                    );
                }
            };
            metrics::INTENT_VIEWS.inc();
            tracing::info!(
                payment_id = %intent.payment_id,
                merchant = %intent.merchant,
                "approval page rendered"
            );
            html(StatusCode::OK, pages::approval_page(&intent, &canonical))
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected malformed payment link");
            html(status_for(&e), pages::error_page("Invalid Payment Request", &e))
        }
    }
}

#[get("/cancel")]
pub async fn cancel() -> HttpResponse {
    tracing::info!("payment cancelled by payer");
    html(StatusCode::OK, pages::cancel_page())
}

/// The approval submission. Validation failures render to the payer only;
/// once a broadcast is attempted, the outcome is also pushed to the
/// merchant session, success or not.
#[post("/approve")]
pub async fn approve(state: web::Data<AppState>, form: web::Form<ApproveForm>) -> HttpResponse {
    let ApproveForm {
        payment_data,
        account_id,
        secret_key,
    } = form.into_inner();

    let intent = match codec::intent_from_json(&payment_data) {
        Ok(intent) => intent,
        Err(e) => {
            metrics::APPROVALS.with_label_values(&["rejected"]).inc();
            tracing::warn!(error = %e, "approval carried malformed payment data");
            return html(status_for(&e), pages::error_page("Payment Failed", &e));
        }
    };

    let submission = ApprovalSubmission {
        intent: intent.clone(),
        payer_address: account_id,
        secret: PayerSecret::new(secret_key),
    };

    match approval::process_approval(state.gateway.as_ref(), submission).await {
        Ok(receipt) => {
            metrics::APPROVALS.with_label_values(&["settled"]).inc();
            tracing::info!(
                payment_id = %intent.payment_id,
                tx = %receipt.transaction_hash,
                block = ?receipt.block_number,
                "payment settled"
            );
            state.session.push_outcome(CompletedPayment {
                intent: intent.clone(),
                outcome: TransactionOutcome::Success {
                    tx_hash: receipt.transaction_hash,
                },
            });
            html(StatusCode::OK, pages::payment_success_page(&intent, &receipt))
        }
        Err(e) if e.is_rejection() => {
            metrics::APPROVALS.with_label_values(&["rejected"]).inc();
            tracing::warn!(payment_id = %intent.payment_id, error = %e, "approval rejected");
            html(status_for(&e), pages::error_page("Payment Failed", &e))
        }
        Err(e) => {
            metrics::APPROVALS.with_label_values(&["failed"]).inc();
            tracing::error!(payment_id = %intent.payment_id, error = %e, "payment failed");
            state.session.push_outcome(CompletedPayment {
                intent: intent.clone(),
                outcome: TransactionOutcome::Failure {
                    reason: e.to_string(),
                },
            });
            html(status_for(&e), pages::error_page("Payment Failed", &e))
        }
    }
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.gateway.latest_block().await {
        Ok(block) => {
            let status = if state.gateway.payment_contract().is_some() {
                "ok"
            } else {
                "degraded"
            };
            HttpResponse::Ok().json(serde_json::json!({
                "status": status,
                "service": "paylink-relay",
                "latestBlock": block.to_string(),
                "contract": state.gateway.payment_contract().map(|a| a.to_string()),
            }))
        }
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "degraded",
            "service": "paylink-relay",
            "error": "RPC unreachable",
        })),
    }
}

#[get("/metrics")]
pub async fn metrics_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
