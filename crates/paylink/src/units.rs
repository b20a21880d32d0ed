use alloy::primitives::U256;

use crate::error::PaylinkError;

/// Native-unit precision: 1 ETH = 10^18 wei.
pub const ETHER_DECIMALS: u32 = 18;

const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Convert a decimal ETH amount ("0.01", "1", ".5") to wei.
///
/// Integer math only; amounts that cannot be represented exactly in wei
/// (more than 18 fractional digits) are rejected rather than rounded, and
/// zero is rejected because a zero-value payment intent is meaningless.
pub fn ether_to_wei(amount: &str) -> Result<U256, PaylinkError> {
    let text = amount.trim();
    if text.is_empty() {
        return Err(PaylinkError::Decode("amount must not be empty".into()));
    }

    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(PaylinkError::Decode(format!("invalid amount: {text}")));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(PaylinkError::Decode(format!("invalid amount: {text}")));
    }
    if frac.len() > ETHER_DECIMALS as usize {
        return Err(PaylinkError::Decode(format!(
            "amount has more than {ETHER_DECIMALS} decimal places"
        )));
    }

    let mut wei = U256::ZERO;
    if !whole.is_empty() {
        let whole_units = U256::from_str_radix(whole, 10)
            .map_err(|_| PaylinkError::Decode(format!("amount out of range: {text}")))?;
        wei = whole_units
            .checked_mul(U256::from(WEI_PER_ETHER))
            .ok_or_else(|| PaylinkError::Decode(format!("amount out of range: {text}")))?;
    }
    if !frac.is_empty() {
        let padded = format!("{frac:0<18}");
        let frac_wei = U256::from_str_radix(&padded, 10)
            .map_err(|_| PaylinkError::Decode(format!("amount out of range: {text}")))?;
        wei = wei
            .checked_add(frac_wei)
            .ok_or_else(|| PaylinkError::Decode(format!("amount out of range: {text}")))?;
    }

    if wei.is_zero() {
        return Err(PaylinkError::Decode("amount must be positive".into()));
    }
    Ok(wei)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_whole_ether() {
        assert_eq!(
            ether_to_wei("1").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
        assert_eq!(
            ether_to_wei("2").unwrap(),
            U256::from(2_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn converts_fractional_ether() {
        assert_eq!(
            ether_to_wei("0.01").unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
        assert_eq!(ether_to_wei(".5").unwrap(), U256::from(WEI_PER_ETHER / 2));
        assert_eq!(ether_to_wei("1.").unwrap(), U256::from(WEI_PER_ETHER));
    }

    #[test]
    fn converts_single_wei() {
        assert_eq!(
            ether_to_wei("0.000000000000000001").unwrap(),
            U256::from(1u8)
        );
    }

    #[test]
    fn rejects_excess_precision() {
        // 19 fractional digits cannot be represented in wei.
        assert!(ether_to_wei("0.0000000000000000001").is_err());
    }

    #[test]
    fn rejects_zero_and_empty() {
        assert!(ether_to_wei("0").is_err());
        assert!(ether_to_wei("0.0").is_err());
        assert!(ether_to_wei("").is_err());
        assert!(ether_to_wei("   ").is_err());
        assert!(ether_to_wei(".").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(ether_to_wei("abc").is_err());
        assert!(ether_to_wei("-1").is_err());
        assert!(ether_to_wei("1.2.3").is_err());
        assert!(ether_to_wei("1e18").is_err());
        assert!(ether_to_wei("0x10").is_err());
    }

    #[test]
    fn accepts_large_amounts_within_range() {
        let wei = ether_to_wei("1000000").unwrap();
        assert_eq!(
            wei,
            U256::from(WEI_PER_ETHER) * U256::from(1_000_000u64)
        );
    }
}
