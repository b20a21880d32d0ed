//! Payment intent <-> URL codec.
//!
//! One canonical wire format: `{base}/?payment_data=<JSON>`, with the JSON
//! percent-encoded so braces and quotes survive inside any larger URL. The
//! decoder additionally accepts the legacy discrete query parameters
//! (`merchant` / `amount` / `paymentId`) still found in old QR printouts.

use url::Url;

use crate::error::PaylinkError;
use crate::intent::PaymentIntent;

/// Query parameter carrying the JSON-encoded intent.
pub const PAYMENT_DATA_PARAM: &str = "payment_data";

/// Encode an intent into the payment URL embedded in the QR code.
pub fn payment_url(base: &Url, intent: &PaymentIntent) -> Result<Url, PaylinkError> {
    let json = serde_json::to_string(intent).map_err(|e| PaylinkError::Decode(e.to_string()))?;
    let mut url = base.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair(PAYMENT_DATA_PARAM, &json);
    Ok(url)
}

/// Decode an intent from a full payment URL or a bare query string.
///
/// `payment_data` wins when present; otherwise the legacy discrete
/// parameters are tried. The returned intent is fully validated.
pub fn decode(raw: &str) -> Result<PaymentIntent, PaylinkError> {
    let trimmed = raw.trim();
    let query = match Url::parse(trimmed) {
        Ok(url) => url.query().unwrap_or("").to_string(),
        Err(_) => trimmed.strip_prefix('?').unwrap_or(trimmed).to_string(),
    };

    let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();

    if let Some((_, json)) = pairs.iter().find(|(key, _)| key == PAYMENT_DATA_PARAM) {
        return intent_from_json(json);
    }
    legacy_intent(&pairs)
}

/// Parse and validate an intent from its canonical JSON form. Used for the
/// `payment_data` query parameter and for the approval POST body.
pub fn intent_from_json(json: &str) -> Result<PaymentIntent, PaylinkError> {
    let intent: PaymentIntent =
        serde_json::from_str(json).map_err(|e| PaylinkError::Decode(e.to_string()))?;
    intent.validate()?;
    Ok(intent)
}

fn legacy_intent(pairs: &[(String, String)]) -> Result<PaymentIntent, PaylinkError> {
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let merchant = param("merchant")
        .ok_or_else(|| PaylinkError::Decode("missing merchant".into()))?
        .parse()
        .map_err(|_| PaylinkError::Decode("merchant is not a valid address".into()))?;
    let amount = param("amount")
        .ok_or_else(|| PaylinkError::Decode("missing amount".into()))?
        .to_string();
    let payment_id = param("paymentId")
        .ok_or_else(|| PaylinkError::Decode("missing paymentId".into()))?
        .to_string();

    let intent = PaymentIntent {
        merchant,
        amount,
        payment_id,
        contract: None,
    };
    intent.validate()?;
    Ok(intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://192.168.1.50:8000").unwrap()
    }

    fn intent() -> PaymentIntent {
        PaymentIntent {
            merchant: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
                .parse()
                .unwrap(),
            amount: "0.05".into(),
            payment_id: "PAY-1700000000".into(),
            contract: Some(
                "0x5FbDB2315678afecb367f032d93F642f64180aa3"
                    .parse()
                    .unwrap(),
            ),
        }
    }

    #[test]
    fn url_round_trip_preserves_intent() {
        let original = intent();
        let url = payment_url(&base(), &original).unwrap();
        let decoded = decode(url.as_str()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn encoded_url_contains_no_raw_json_characters() {
        let url = payment_url(&base(), &intent()).unwrap();
        let text = url.as_str();
        assert!(!text.contains('{'));
        assert!(!text.contains('"'));
        assert!(!text.contains(' '));
    }

    #[test]
    fn decodes_bare_query_string() {
        let url = payment_url(&base(), &intent()).unwrap();
        let query = url.query().unwrap();
        assert_eq!(decode(query).unwrap(), intent());
        assert_eq!(decode(&format!("?{query}")).unwrap(), intent());
    }

    #[test]
    fn decodes_legacy_discrete_parameters() {
        let decoded = decode(
            "merchant=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266&amount=0.05&paymentId=PAY-9",
        )
        .unwrap();
        assert_eq!(decoded.amount, "0.05");
        assert_eq!(decoded.payment_id, "PAY-9");
        assert!(decoded.contract.is_none());
    }

    #[test]
    fn missing_merchant_is_a_decode_error() {
        let err = decode("amount=1&paymentId=PAY-1").unwrap_err();
        assert!(matches!(err, PaylinkError::Decode(_)));
    }

    #[test]
    fn malformed_payment_data_is_a_decode_error() {
        let err = decode("payment_data=%7Bnot-json").unwrap_err();
        assert!(matches!(err, PaylinkError::Decode(_)));
    }

    #[test]
    fn numeric_amount_is_normalized() {
        let decoded = decode(
            "payment_data=%7B%22merchant%22%3A%220xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266%22%2C%22amount%22%3A0.01%2C%22paymentId%22%3A%22PAY-3%22%7D",
        )
        .unwrap();
        assert_eq!(decoded.amount, "0.01");
    }

    #[test]
    fn zero_amount_is_rejected_at_the_boundary() {
        let err = decode(
            "merchant=0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266&amount=0&paymentId=PAY-4",
        )
        .unwrap_err();
        assert!(matches!(err, PaylinkError::Decode(_)));
    }
}
