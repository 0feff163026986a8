//! Wallet address handling. Addresses arrive in arbitrary casing, so every
//! comparison is case-insensitive and everything persisted goes through
//! EIP-55 checksum normalization first.

use alloy::primitives::Address;

use super::ChainError;

/// Parse an address in any casing and return its checksummed form.
pub fn normalize_address(input: &str) -> Result<String, ChainError> {
    let addr: Address = input
        .trim()
        .parse()
        .map_err(|_| ChainError::InvalidAddress(input.to_string()))?;
    Ok(addr.to_checksum(None))
}

/// Case-insensitive address equality.
pub fn addresses_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    // EIP-55 reference vector
    const LOWER: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
    const CHECKSUMMED: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    #[test]
    fn normalizes_lowercase_to_checksum() {
        assert_eq!(normalize_address(LOWER).unwrap(), CHECKSUMMED);
    }

    #[test]
    fn normalizes_uppercase_to_checksum() {
        let upper = LOWER.to_uppercase().replace("0X", "0x");
        assert_eq!(normalize_address(&upper).unwrap(), CHECKSUMMED);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            normalize_address(&format!("  {} ", CHECKSUMMED)).unwrap(),
            CHECKSUMMED
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_address("not-an-address").is_err());
        assert!(normalize_address("0x1234").is_err());
    }

    #[test]
    fn matching_ignores_case() {
        assert!(addresses_match(LOWER, CHECKSUMMED));
        assert!(addresses_match(CHECKSUMMED, &LOWER.to_uppercase().replace("0X", "0x")));
        assert!(!addresses_match(LOWER, "0x0000000000000000000000000000000000000000"));
    }
}
