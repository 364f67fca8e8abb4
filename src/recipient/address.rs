//! Chain address syntax checks.

/// Syntactic check for an EVM-style address: `0x` followed by 40 hex chars.
pub fn is_valid_address(input: &str) -> bool {
    let body = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(b) => b,
        None => return false,
    };
    body.len() == 40 && hex::decode(body).is_ok()
}

/// Addresses are compared case-insensitively; stored lowercase.
pub fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address(
            "0x52908400098527886E0F7030069857D2E4169EE7"
        ));
        assert!(is_valid_address(
            "0xde709f2102306220921060314715629080e2fb77"
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("vitalik.eth"));
        assert!(!is_valid_address("0x1234")); // too short
        assert!(!is_valid_address(
            "52908400098527886E0F7030069857D2E4169EE7" // missing 0x
        ));
        assert!(!is_valid_address(
            "0xZZ908400098527886E0F7030069857D2E4169EE7" // not hex
        ));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize(" 0x52908400098527886E0F7030069857D2E4169EE7 "),
            "0x52908400098527886e0f7030069857d2e4169ee7"
        );
    }
}
