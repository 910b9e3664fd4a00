//! Account address and transaction hash normalization
//!
//! Canonical address form is `0x` followed by 64 lowercase hex digits.
//! Shorter inputs (legacy 32-digit addresses, `0x1`) are left-padded with
//! zeros. Transaction hashes are always exactly 64 hex digits.

use crate::core::ExplorerError;

/// Hex digits in a canonical address
pub const ADDRESS_HEX_LEN: usize = 64;

/// Hex digits in a transaction hash
pub const HASH_HEX_LEN: usize = 64;

fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

fn is_hex(payload: &str) -> bool {
    !payload.is_empty() && payload.chars().all(|c| c.is_ascii_hexdigit())
}

/// Canonicalize an account address.
///
/// Accepts an optional `0x` prefix and 1 to 64 hex digits in any case.
pub fn normalize_address(input: &str) -> Result<String, ExplorerError> {
    let payload = strip_hex_prefix(input.trim());
    if !is_hex(payload) || payload.len() > ADDRESS_HEX_LEN {
        return Err(ExplorerError::invalid_address(input));
    }
    Ok(format!(
        "0x{:0>width$}",
        payload.to_ascii_lowercase(),
        width = ADDRESS_HEX_LEN
    ))
}

pub fn is_valid_address_format(input: &str) -> bool {
    let payload = strip_hex_prefix(input.trim());
    is_hex(payload) && payload.len() <= ADDRESS_HEX_LEN
}

/// Canonicalize a transaction hash, or `None` if the input is not one.
pub fn normalize_transaction_hash(input: &str) -> Option<String> {
    let payload = strip_hex_prefix(input.trim());
    if payload.len() != HASH_HEX_LEN || !is_hex(payload) {
        return None;
    }
    Some(format!("0x{}", payload.to_ascii_lowercase()))
}

/// Drop leading zeros for display, keeping at least one digit (`0x1`).
pub fn strip_leading_zeros(address: &str) -> String {
    let payload = strip_hex_prefix(address.trim()).trim_start_matches('0');
    if payload.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", payload.to_ascii_lowercase())
    }
}

/// Short display form `0xabcd…1234`. Addresses short enough to show whole
/// are returned stripped but untruncated; anything that is not an address
/// comes back unchanged.
pub fn format_address_for_display(address: &str, head_len: usize, tail_len: usize) -> String {
    if !is_valid_address_format(address) {
        return address.to_string();
    }
    shorten(&strip_leading_zeros(address), head_len, tail_len)
}

/// Like [`format_address_for_display`] but keeps leading zeros.
pub fn format_hash_for_display(hash: &str, head_len: usize, tail_len: usize) -> String {
    match normalize_transaction_hash(hash) {
        Some(hash) => shorten(&hash, head_len, tail_len),
        None => hash.to_string(),
    }
}

/// `prefixed` is `0x` followed by ASCII hex only.
fn shorten(prefixed: &str, head_len: usize, tail_len: usize) -> String {
    let payload = &prefixed[2..];
    if payload.len() <= head_len + tail_len {
        return prefixed.to_string();
    }
    format!(
        "0x{}…{}",
        &payload[..head_len],
        &payload[payload.len() - tail_len..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_address_is_padded_to_canonical_width() {
        let input = "9A710919B1A1E67EDA335269C0085C91";
        assert!(is_valid_address_format(input));
        let normalized = normalize_address(input).unwrap();
        assert_eq!(normalized.len(), 2 + ADDRESS_HEX_LEN);
        assert_eq!(
            normalized,
            "0x000000000000000000000000000000009a710919b1a1e67eda335269c0085c91"
        );
        assert!(is_valid_address_format(&normalized));
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in ["0x1", "1", "0X00ff", "9A710919B1A1E67EDA335269C0085C91", "abc"] {
            let once = normalize_address(input).unwrap();
            assert_eq!(normalize_address(&once).unwrap(), once);
        }
    }

    #[test]
    fn rejects_non_hex_and_overlong() {
        assert!(normalize_address("0xzz").is_err());
        assert!(normalize_address("").is_err());
        assert!(normalize_address("0x").is_err());
        assert!(normalize_address(&"a".repeat(65)).is_err());
        assert!(!is_valid_address_format("hello"));
        assert!(!is_valid_address_format(&"1".repeat(65)));
    }

    #[test]
    fn hash_keeps_canonical_form() {
        let hash = "0xcf4776b92c291291e0ee31107ab5984acba3f3ed5a76b5406d8dcf22d1834d18";
        assert_eq!(normalize_transaction_hash(hash).as_deref(), Some(hash));
        let upper = hash.trim_start_matches("0x").to_uppercase();
        assert_eq!(normalize_transaction_hash(&upper).as_deref(), Some(hash));
    }

    #[test]
    fn malformed_hash_is_none() {
        assert_eq!(normalize_transaction_hash("0x1234"), None);
        assert_eq!(normalize_transaction_hash(&"g".repeat(64)), None);
    }

    #[test]
    fn display_forms_renormalize_losslessly() {
        let canonical = normalize_address("0x1").unwrap();
        assert_eq!(strip_leading_zeros(&canonical), "0x1");
        assert_eq!(normalize_address(&strip_leading_zeros(&canonical)).unwrap(), canonical);
        assert_eq!(strip_leading_zeros("0x0000"), "0x0");

        let long = normalize_address("9A710919B1A1E67EDA335269C0085C91").unwrap();
        assert_eq!(format_address_for_display(&long, 4, 4), "0x9a71…5c91");
        assert_eq!(format_address_for_display("0x1", 4, 4), "0x1");
    }

    #[test]
    fn display_leaves_garbage_alone() {
        assert_eq!(format_address_for_display("0xé1234567890", 4, 4), "0xé1234567890");
        assert_eq!(format_address_for_display("ünïcödé-ünïcödé", 2, 2), "ünïcödé-ünïcödé");
    }

    #[test]
    fn hash_display_keeps_leading_zeros() {
        let hash = format!("0x{:064x}", 0xabcdu64);
        assert_eq!(format_hash_for_display(&hash, 6, 4), "0x000000…abcd");
        assert_eq!(format_hash_for_display("0x12", 6, 4), "0x12");
    }
}
