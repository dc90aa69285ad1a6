//! Constants for the wallet dashboard SDK
//!
//! All configuration for the SDK is centralized here. No runtime
//! configuration file is used - the system operates with these
//! compile-time constants plus the `CMC_API_KEY` environment variable.

/// Market-data API base URL
pub const MARKET_API_URL: &str = "https://pro-api.coinmarketcap.com";

/// Market-data API endpoint for the latest ranked listings
pub const LISTINGS_LATEST_ENDPOINT: &str = "/v1/cryptocurrency/listings/latest";

/// Request header carrying the market-data API credential
pub const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Environment variable holding the market-data API credential
pub const API_KEY_ENV: &str = "CMC_API_KEY";

/// How many listings a snapshot holds
pub const TOP_LISTINGS_LIMIT: usize = 5;

/// HTTP request timeout when fetching listings (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "wallet-dashboard-sdk/0.1.0";

/// Provider RPC method for requesting account authorization
pub const RPC_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";

/// Provider RPC method for querying an account balance
pub const RPC_GET_BALANCE: &str = "eth_getBalance";

/// Provider RPC method for dropping granted account permissions
pub const RPC_REVOKE_PERMISSIONS: &str = "wallet_revokePermissions";

/// Block tag used for balance queries (latest known chain state)
pub const BALANCE_BLOCK_TAG: &str = "latest";

/// Provider error code signaling that the user declined a request
pub const USER_REJECTED_CODE: i64 = 4001;

/// Key under which the last-connected address is persisted
pub const SESSION_STORE_KEY: &str = "account";
