//! Server-rendered HTML.
//!
//! Every user-supplied value is run through [`escape_html`] before it is
//! interpolated, whether it lands in text or in an attribute. The payer's
//! secret is never passed into this module at all.

use alloy::primitives::Address;
use paylink::{
    qr, CompletedPayment, PaylinkError, PaymentIntent, PaymentRequestDisplay, ReceiptSummary,
    TransactionOutcome,
};

const PAGE_STYLE: &str = "\
body { font-family: Arial, sans-serif; padding: 20px; background: #fafafa; }
.container { max-width: 540px; margin: 0 auto; }
.panel { background: #f0f0f0; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
.banner-success { background: #e6f4ea; border: 1px solid #4caf50; padding: 12px; border-radius: 5px; margin-bottom: 20px; }
.banner-failure { background: #fdecea; border: 1px solid #f44336; padding: 12px; border-radius: 5px; margin-bottom: 20px; }
.form-group { margin-bottom: 15px; }
label { display: block; margin-bottom: 5px; font-weight: bold; }
input[type=text], input[type=password] { width: 100%; padding: 8px; box-sizing: border-box; }
button { background: #4caf50; color: white; border: none; padding: 10px 18px; border-radius: 4px; cursor: pointer; }
a.cancel { color: #f44336; margin-left: 12px; }
img.qr { display: block; margin: 10px 0; max-width: 100%; }
code { word-break: break-all; }
";

/// Escape text for interpolation into HTML bodies and attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>{title}</title>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <style>{PAGE_STYLE}</style>\n</head>\n<body>\n<div class=\"container\">\n\
         {body}\n</div>\n</body>\n</html>",
        title = escape_html(title),
    )
}

fn intent_panel(intent: &PaymentIntent) -> String {
    format!(
        "<div class=\"panel\">\n\
         <p><strong>Merchant:</strong> <code>{merchant}</code></p>\n\
         <p><strong>Amount:</strong> {amount} ETH</p>\n\
         <p><strong>Payment ID:</strong> {payment_id}</p>\n\
         </div>",
        merchant = escape_html(&intent.merchant.to_string()),
        amount = escape_html(&intent.amount),
        payment_id = escape_html(&intent.payment_id),
    )
}

/// Approval form shown to the payer device after scanning the QR code.
pub fn approval_page(intent: &PaymentIntent, canonical_json: &str) -> String {
    let body = format!(
        "<h2>Payment Request</h2>\n\
         {panel}\n\
         <form method=\"POST\" action=\"/approve\">\n\
         <input type=\"hidden\" name=\"payment_data\" value=\"{data}\">\n\
         <div class=\"form-group\">\n\
         <label for=\"account_id\">Your Wallet Address:</label>\n\
         <input type=\"text\" id=\"account_id\" name=\"account_id\" required>\n\
         </div>\n\
         <div class=\"form-group\">\n\
         <label for=\"secret_key\">Your Private Key:</label>\n\
         <input type=\"password\" id=\"secret_key\" name=\"secret_key\" required autocomplete=\"off\">\n\
         </div>\n\
         <button type=\"submit\">Approve Payment</button>\n\
         <a class=\"cancel\" href=\"/cancel\">Cancel</a>\n\
         </form>",
        panel = intent_panel(intent),
        data = escape_html(canonical_json),
    );
    page("Payment Request", &body)
}

pub fn payment_success_page(intent: &PaymentIntent, receipt: &ReceiptSummary) -> String {
    let block = match receipt.block_number {
        Some(number) => format!("<p><strong>Block:</strong> {number}</p>\n"),
        None => String::new(),
    };
    let body = format!(
        "<h2>Payment Successful</h2>\n\
         {panel}\n\
         <div class=\"banner-success\">\n\
         <p><strong>Transaction:</strong> <code>{tx}</code></p>\n{block}\
         </div>\n\
         <p>You can close this page.</p>",
        panel = intent_panel(intent),
        tx = receipt.transaction_hash,
    );
    page("Payment Successful", &body)
}

/// Failure page for any terminal error in the approval flow.
pub fn error_page(title: &str, error: &PaylinkError) -> String {
    let body = format!(
        "<h2>{heading}</h2>\n\
         <div class=\"banner-failure\"><p>{message}</p></div>\n\
         <p>You can close this page. To try again, ask the merchant for a fresh payment request.</p>",
        heading = escape_html(title),
        message = escape_html(&error.to_string()),
    );
    page(title, &body)
}

pub fn cancel_page() -> String {
    let body = "<h2>Payment Cancelled</h2>\n\
                <p>No transaction was sent. You can close this page.</p>";
    page("Payment Cancelled", body)
}

/// Everything the dashboard page renders in one pass.
pub struct DashboardView<'a> {
    pub connected: bool,
    pub latest_block: Option<u64>,
    pub contract: Option<Address>,
    pub display: Option<&'a PaymentRequestDisplay>,
    /// Registration state of the displayed intent's merchant.
    pub merchant_registered: Option<bool>,
    /// Live on-chain status of the displayed intent.
    pub payment_processed: Option<bool>,
    /// Read-and-cleared settlement banner.
    pub outcome: Option<CompletedPayment>,
    pub flash_error: Option<String>,
    pub default_payment_id: String,
}

pub fn dashboard_page(view: &DashboardView<'_>) -> String {
    let mut body = String::from("<h2>Merchant Dashboard</h2>\n");

    if let Some(flash) = &view.flash_error {
        body.push_str(&format!(
            "<div class=\"banner-failure\"><p>{}</p></div>\n",
            escape_html(flash)
        ));
    }

    if let Some(completed) = &view.outcome {
        let (class, label) = match &completed.outcome {
            TransactionOutcome::Success { .. } => ("banner-success", "Payment received"),
            TransactionOutcome::Failure { .. } => ("banner-failure", "Payment failed"),
        };
        body.push_str(&format!(
            "<div class=\"{class}\">\n\
             <p><strong>{label}:</strong> {payment_id}</p>\n\
             <p><code>{detail}</code></p>\n\
             </div>\n",
            payment_id = escape_html(&completed.intent.payment_id),
            detail = escape_html(&completed.outcome.detail()),
        ));
    }

    body.push_str("<h3>Chain</h3>\n<div class=\"panel\">\n");
    body.push_str(&format!(
        "<p><strong>Node:</strong> {}</p>\n",
        if view.connected {
            "connected"
        } else {
            "unreachable"
        }
    ));
    if let Some(block) = view.latest_block {
        body.push_str(&format!("<p><strong>Latest block:</strong> {block}</p>\n"));
    }
    match view.contract {
        Some(contract) => body.push_str(&format!(
            "<p><strong>Contract:</strong> <code>{contract}</code></p>\n"
        )),
        None => body.push_str(
            "<p><strong>Contract:</strong> not configured — payment features are limited</p>\n",
        ),
    }
    body.push_str("</div>\n");

    body.push_str(&format!(
        "<h3>Create Payment Request</h3>\n\
         <form method=\"POST\" action=\"/dashboard/intent\">\n\
         <div class=\"form-group\">\n\
         <label for=\"merchant\">Merchant Address:</label>\n\
         <input type=\"text\" id=\"merchant\" name=\"merchant\" required>\n\
         </div>\n\
         <div class=\"form-group\">\n\
         <label for=\"amount\">Amount (ETH):</label>\n\
         <input type=\"text\" id=\"amount\" name=\"amount\" required>\n\
         </div>\n\
         <div class=\"form-group\">\n\
         <label for=\"payment_id\">Payment ID:</label>\n\
         <input type=\"text\" id=\"payment_id\" name=\"payment_id\" value=\"{default_id}\">\n\
         </div>\n\
         <button type=\"submit\">Generate QR</button>\n\
         </form>\n",
        default_id = escape_html(&view.default_payment_id),
    ));

    if let Some(display) = view.display {
        body.push_str(&format!(
            "<h3>Current Payment Request</h3>\n\
             {panel}\n\
             <img class=\"qr\" alt=\"payment QR code\" src=\"{qr_uri}\">\n\
             <p>Or visit: <a href=\"{url}\"><code>{url}</code></a></p>\n",
            panel = intent_panel(&display.intent),
            qr_uri = qr::data_uri(&display.qr_png),
            url = escape_html(display.url.as_str()),
        ));
        if let Some(registered) = view.merchant_registered {
            body.push_str(&format!(
                "<p><strong>Merchant registered:</strong> {}</p>\n",
                if registered { "yes" } else { "no" }
            ));
        }
        if let Some(processed) = view.payment_processed {
            body.push_str(&format!(
                "<p><strong>Status:</strong> {}</p>\n",
                if processed {
                    "settled on-chain"
                } else {
                    "awaiting payment"
                }
            ));
        }
    }

    body.push_str("<p><a href=\"/dashboard/register\">Merchant registration</a></p>");
    page("Merchant Dashboard", &body)
}

/// Admin page for registering merchants with the contract.
pub fn register_page(
    owner: Option<Address>,
    admin: Address,
    flash_error: Option<String>,
) -> String {
    let mut body = String::from("<h2>Merchant Registration</h2>\n");
    if let Some(flash) = flash_error {
        body.push_str(&format!(
            "<div class=\"banner-failure\"><p>{}</p></div>\n",
            escape_html(&flash)
        ));
    }
    body.push_str(&format!(
        "<div class=\"panel\">\n\
         <p><strong>Contract owner:</strong> <code>{owner}</code></p>\n\
         <p><strong>Admin account:</strong> <code>{admin}</code></p>\n\
         </div>\n",
        owner = match owner {
            Some(address) => address.to_string(),
            None => "unavailable".to_string(),
        },
    ));
    body.push_str(
        "<form method=\"POST\" action=\"/dashboard/register\">\n\
         <div class=\"form-group\">\n\
         <label for=\"merchant\">Merchant Address:</label>\n\
         <input type=\"text\" id=\"merchant\" name=\"merchant\" required>\n\
         </div>\n\
         <div class=\"form-group\">\n\
         <label for=\"admin_secret\">Admin Private Key:</label>\n\
         <input type=\"password\" id=\"admin_secret\" name=\"admin_secret\" required autocomplete=\"off\">\n\
         </div>\n\
         <p>The key must control the admin account shown above. It is used once and not stored.</p>\n\
         <button type=\"submit\">Register Merchant</button>\n\
         </form>\n\
         <p><a href=\"/dashboard\">Back to dashboard</a></p>",
    );
    page("Merchant Registration", &body)
}

pub fn register_success_page(merchant: Address, receipt: &ReceiptSummary) -> String {
    let block = match receipt.block_number {
        Some(number) => format!("<p><strong>Block:</strong> {number}</p>\n"),
        None => String::new(),
    };
    let body = format!(
        "<h2>Merchant Registered</h2>\n\
         <div class=\"banner-success\">\n\
         <p><strong>Merchant:</strong> <code>{merchant}</code></p>\n\
         <p><strong>Transaction:</strong> <code>{tx}</code></p>\n{block}\
         </div>\n\
         <p><a href=\"/dashboard\">Back to dashboard</a></p>",
        tx = receipt.transaction_hash,
    );
    page("Merchant Registered", &body)
}
