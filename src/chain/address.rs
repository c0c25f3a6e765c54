//! Account address format checks

/// Length of a `0x`-prefixed 20-byte account address
pub const ADDRESS_LEN: usize = 42;

/// `0x` followed by exactly 40 hex digits (either case, no checksum check)
pub fn is_valid_address(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address.starts_with("0x")
        && hex::decode(&address[2..]).is_ok()
}

/// Host part of an endpoint URL, safe to log and report
///
/// Paths are dropped since providers embed API keys there.
pub fn endpoint_host(url: &str) -> &str {
    let without_scheme = url.split_once("//").map(|(_, rest)| rest).unwrap_or(url);
    without_scheme
        .split(['/', '?'])
        .next()
        .unwrap_or(without_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address(
            "0x86bB004AF573623752401F14D9847917745556bc"
        ));
        assert!(is_valid_address(
            "0xd8da6bf26964af9d7eed9e03e53415d37aa96045"
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        // Wrong length
        assert!(!is_valid_address("0x86bB004AF573623752401F14D984791774555"));
        // Missing prefix
        assert!(!is_valid_address(
            "86bB004AF573623752401F14D9847917745556bcff"
        ));
        // Non-hex digit
        assert!(!is_valid_address(
            "0x86bB004AF573623752401F14D9847917745556bz"
        ));
        assert!(!is_valid_address(""));
    }

    #[test]
    fn test_endpoint_host_strips_path_and_scheme() {
        assert_eq!(
            endpoint_host("https://eth-mainnet.g.alchemy.com/v2/secret-key"),
            "eth-mainnet.g.alchemy.com"
        );
        assert_eq!(endpoint_host("http://127.0.0.1:8545"), "127.0.0.1:8545");
        assert_eq!(endpoint_host("localhost:8545"), "localhost:8545");
    }
}
