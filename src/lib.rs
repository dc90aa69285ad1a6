//! # Wallet Dashboard SDK
//!
//! Core of a dashboard frontend that attaches to an injected
//! blockchain wallet and displays a snapshot of top cryptocurrency
//! market listings.
//!
//! Two external, independently volatile data sources feed the state:
//! the wallet provider (detection, account authorization, balance,
//! unsolicited chain changes) and the market-data HTTP API (top
//! ranked listings). The presentation layer only renders whatever the
//! [`WalletDashboard`] currently holds and dispatches user intents
//! back into it.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use wallet_dashboard_sdk::{
//!     CmcListingsClient, FileSessionStore, WalletDashboard,
//! };
//! # use wallet_dashboard_sdk::{DisconnectPrompt, WalletAddress};
//! # struct AlwaysYes;
//! # #[async_trait::async_trait]
//! # impl DisconnectPrompt for AlwaysYes {
//! #     async fn confirm_disconnect(&self, _address: &WalletAddress) -> bool { true }
//! # }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let listings = Arc::new(CmcListingsClient::from_env()?);
//! let store = Arc::new(FileSessionStore::new("./data"));
//! let dashboard = WalletDashboard::new(
//!     Vec::new(), // injected wallet providers go here
//!     listings,
//!     store,
//!     Arc::new(AlwaysYes),
//! );
//!
//! dashboard.start().await;
//! dashboard.connect().await?;
//! let state = dashboard.wallet_state().await;
//! if let Some(balance) = state.balance {
//!     println!("balance: {balance}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod market;
pub mod persist;
pub mod session;
pub mod snapshot;
pub mod types;

// Re-export commonly used types
pub use dashboard::WalletDashboard;
pub use error::{GatewayError, MarketError, RpcError, SessionError, StoreError};
pub use gateway::{ProviderGateway, WalletProvider};
pub use market::{CmcListingsClient, ListingsProvider};
pub use persist::{FileSessionStore, SessionStore};
pub use session::{ConnectOutcome, DisconnectOutcome, DisconnectPrompt, WalletSession};
pub use snapshot::MarketSnapshotStore;
pub use types::{
    Balance, ListingsSnapshot, MarketListing, SessionStatus, WalletAddress, WalletSessionState,
};
