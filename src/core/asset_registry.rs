//! Registry of reference (stable or blue-chip) assets.

use std::collections::HashMap;

/// Mint of wrapped SOL.
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

const MAINNET_REFERENCE_ASSETS: [(&str, &str); 6] = [
    ("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "USDC"),
    ("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", "USDT"),
    (WSOL_MINT, "WSOL"),
    ("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", "BONK"),
    ("mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So", "mSOL"),
    ("J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn", "jitoSOL"),
];

/// Immutable set of reference assets plus the wrapped-native asset.
///
/// Built once at startup and shared by reference. Each reference asset carries its
/// display symbol, so membership and symbol lookup cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceAssetRegistry {
    assets: HashMap<String, String>,
    wrapped_native: String,
}

impl ReferenceAssetRegistry {
    /// Creates a registry with no reference assets.
    #[must_use]
    pub fn new(wrapped_native: impl Into<String>) -> Self {
        Self {
            assets: HashMap::new(),
            wrapped_native: wrapped_native.into(),
        }
    }

    /// The mainnet-beta default: USDC, USDT, WSOL, BONK, mSOL and jitoSOL, with WSOL
    /// as the wrapped-native asset.
    #[must_use]
    pub fn mainnet() -> Self {
        MAINNET_REFERENCE_ASSETS
            .iter()
            .fold(Self::new(WSOL_MINT), |registry, (mint, symbol)| {
                registry.with_asset(*mint, *symbol)
            })
    }

    /// Adds a reference asset, replacing the symbol if the asset is already known.
    #[must_use]
    pub fn with_asset(mut self, asset_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.assets.insert(asset_id.into(), symbol.into());
        self
    }

    #[must_use]
    pub fn is_reference(&self, asset_id: &str) -> bool {
        self.assets.contains_key(asset_id)
    }

    #[must_use]
    pub fn is_wrapped_native(&self, asset_id: &str) -> bool {
        self.wrapped_native == asset_id
    }

    #[must_use]
    pub fn wrapped_native(&self) -> &str {
        &self.wrapped_native
    }

    #[must_use]
    pub fn symbol(&self, asset_id: &str) -> Option<&str> {
        self.assets.get(asset_id).map(String::as_str)
    }

    /// Symbol for reference assets, otherwise the first eight characters of the id.
    #[must_use]
    pub fn display_name(&self, asset_id: &str) -> String {
        match self.symbol(asset_id) {
            Some(symbol) => symbol.to_string(),
            None => {
                let prefix: String = asset_id.chars().take(8).collect();
                format!("{prefix}...")
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Default for ReferenceAssetRegistry {
    fn default() -> Self {
        Self::mainnet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_registry() {
        let registry = ReferenceAssetRegistry::mainnet();
        assert_eq!(registry.len(), 6);
        assert!(registry.is_reference(WSOL_MINT));
        assert!(registry.is_wrapped_native(WSOL_MINT));
        assert_eq!(
            registry.symbol("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
            Some("USDC")
        );
    }

    #[test]
    fn test_display_name_falls_back_to_prefix() {
        let registry = ReferenceAssetRegistry::new("WRAPPED_NATIVE").with_asset("USDC", "USDC");
        assert_eq!(registry.display_name("USDC"), "USDC");
        assert_eq!(
            registry.display_name("4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R"),
            "4k3Dyjzv..."
        );
        assert_eq!(registry.display_name("FOO"), "FOO...");
    }

    #[test]
    fn test_wrapped_native_need_not_be_reference() {
        let registry = ReferenceAssetRegistry::new("WRAPPED_NATIVE");
        assert!(registry.is_wrapped_native("WRAPPED_NATIVE"));
        assert!(!registry.is_reference("WRAPPED_NATIVE"));
        assert!(registry.is_empty());
    }
}
