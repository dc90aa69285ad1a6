//! Types for the wallet session and market snapshot

use crate::error::GatewayError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Checksum-formatted account address as returned by the provider
///
/// The string is kept exactly as the provider returned it; equality is
/// case-insensitive because checksum casing varies between providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// Wraps a provider-supplied address string
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address exactly as the provider returned it
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened `0x1234...5678` form for display surfaces
    pub fn abbreviated(&self) -> String {
        if self.0.len() >= 10 {
            format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
        } else {
            self.0.clone()
        }
    }
}

impl PartialEq for WalletAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for WalletAddress {}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account balance in the chain's smallest unit
///
/// Always derived from the provider's hexadecimal string; `Display`
/// renders the exact unsigned base-10 value with no rounding and no
/// unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Balance(u128);

impl Balance {
    /// Parses a provider-supplied hexadecimal balance string
    ///
    /// Accepts an optional `0x`/`0X` prefix. A string that is not a
    /// valid unsigned base-16 integer is an invalid provider response.
    pub fn from_hex(hex: &str) -> Result<Self, GatewayError> {
        let digits = hex
            .strip_prefix("0x")
            .or_else(|| hex.strip_prefix("0X"))
            .unwrap_or(hex);
        u128::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| GatewayError::invalid_response(format!("balance hex {hex:?}: {e}")))
    }

    /// Raw quantity in the smallest unit
    pub fn as_smallest_unit(&self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection status of the wallet session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No account attached
    #[default]
    Disconnected,
    /// Account authorization in flight
    Connecting,
    /// Account attached, address and balance known
    Connected,
    /// Permission revocation in flight
    Disconnecting,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
            SessionStatus::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// Snapshot of the wallet session exposed to the presentation layer
///
/// Invariant: `address` and `balance` are `Some` iff `status` is
/// `Connected`. `Default` is the cold-start state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalletSessionState {
    /// Current connection status
    pub status: SessionStatus,
    /// Attached account, present only when connected
    pub address: Option<WalletAddress>,
    /// Balance of the attached account, present only when connected
    pub balance: Option<Balance>,
}

impl WalletSessionState {
    /// Builds the connected state for an account
    pub fn connected(address: WalletAddress, balance: Balance) -> Self {
        Self {
            status: SessionStatus::Connected,
            address: Some(address),
            balance: Some(balance),
        }
    }

    /// True when an account is attached
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }
}

/// One market entry from the listings API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketListing {
    /// Asset name (e.g. "Bitcoin")
    pub name: String,
    /// Ticker symbol (e.g. "BTC")
    pub symbol: String,
    /// Provider slug identifier (e.g. "bitcoin")
    pub slug: String,
    /// Latest USD price
    pub price_usd: f64,
    /// 24h price change percentage, when the provider reports one
    pub percent_change_24h: Option<f64>,
}

/// Ordered batch of top listings plus its fetch timestamp
///
/// Replaced wholesale on every refresh; the listing order is exactly
/// the order the provider returned (ranked by market capitalization).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingsSnapshot {
    /// Listings in provider order
    pub listings: Vec<MarketListing>,
    /// When this batch was fetched
    pub fetched_at: DateTime<Utc>,
}

impl ListingsSnapshot {
    /// Creates a snapshot stamped with the current time
    pub fn new(listings: Vec<MarketListing>) -> Self {
        Self {
            listings,
            fetched_at: Utc::now(),
        }
    }
}
