//! Dashboard facade
//!
//! The single object the presentation layer talks to. Owns provider
//! detection, the start/shutdown lifecycle, the chain-changed wiring
//! between gateway and session, and the intent entry points.

use crate::{
    error::{MarketError, SessionError},
    gateway::{ProviderGateway, WalletProvider},
    market::ListingsProvider,
    persist::SessionStore,
    session::{ConnectOutcome, DisconnectOutcome, DisconnectPrompt, WalletSession},
    snapshot::MarketSnapshotStore,
    types::{ListingsSnapshot, WalletAddress, WalletSessionState},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Facade over the wallet session and the market snapshot
///
/// The wallet side is absent when detection found no usable provider;
/// market data keeps working either way.
pub struct WalletDashboard {
    gateway: Option<Arc<ProviderGateway>>,
    session: Option<Arc<WalletSession>>,
    market: Arc<MarketSnapshotStore>,
    store: Arc<dyn SessionStore>,
    /// Address seeded from the store at startup; informational only,
    /// no automatic reconnect
    last_known_address: RwLock<Option<WalletAddress>>,
    started: AtomicBool,
}

impl WalletDashboard {
    /// Builds the dashboard, running provider detection exactly once
    pub fn new(
        candidates: Vec<Arc<dyn WalletProvider>>,
        listings: Arc<dyn ListingsProvider>,
        store: Arc<dyn SessionStore>,
        prompt: Arc<dyn DisconnectPrompt>,
    ) -> Self {
        let gateway = ProviderGateway::detect(candidates).map(Arc::new);
        let session = gateway
            .as_ref()
            .map(|g| Arc::new(WalletSession::new(g.clone(), store.clone(), prompt)));

        Self {
            gateway,
            session,
            market: Arc::new(MarketSnapshotStore::new(listings)),
            store,
            last_known_address: RwLock::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// True when a wallet provider was detected
    pub fn has_wallet(&self) -> bool {
        self.session.is_some()
    }

    /// Starts the dashboard: seeds the persisted address, wires the
    /// chain-changed subscription and issues the initial market fetch
    ///
    /// Idempotent; repeated calls are logged no-ops.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("dashboard already started");
            return;
        }

        let seeded = self.store.load();
        if let Some(address) = &seeded {
            tracing::info!(address = %address, "found persisted session address");
        }
        *self.last_known_address.write().await = seeded;

        if let (Some(gateway), Some(session)) = (&self.gateway, &self.session) {
            let session = session.clone();
            gateway
                .subscribe_chain_changed(move |chain_id| {
                    // Bump synchronously so no stale completion can
                    // commit between the event and the async reset
                    session.invalidate();
                    let session = session.clone();
                    tokio::spawn(async move {
                        session.reset_after_chain_change(&chain_id).await;
                    });
                })
                .await;
        }

        // Failure is logged by the snapshot store and the empty
        // snapshot stands; no retry.
        let _ = self.market.refresh().await;
    }

    /// Drops the chain-changed subscription and allows a later restart
    pub async fn shutdown(&self) {
        if let Some(gateway) = &self.gateway {
            gateway.unsubscribe_chain_changed().await;
        }
        self.started.store(false, Ordering::SeqCst);
    }

    /// Dispatches the connect intent
    pub async fn connect(&self) -> Result<ConnectOutcome, SessionError> {
        match &self.session {
            Some(session) => session.connect().await,
            None => Err(SessionError::NoProvider),
        }
    }

    /// Dispatches the disconnect intent
    pub async fn disconnect(&self) -> Result<DisconnectOutcome, SessionError> {
        match &self.session {
            Some(session) => session.disconnect().await,
            None => Err(SessionError::NoProvider),
        }
    }

    /// Dispatches the balance refresh intent
    pub async fn refresh_balance(&self) -> Result<(), SessionError> {
        match &self.session {
            Some(session) => session.refresh_balance().await,
            None => Err(SessionError::NoProvider),
        }
    }

    /// Dispatches the market refresh intent
    pub async fn refresh_market(&self) -> Result<(), MarketError> {
        self.market.refresh().await
    }

    /// Current wallet session state; cold start when no provider exists
    pub async fn wallet_state(&self) -> WalletSessionState {
        match &self.session {
            Some(session) => session.state().await,
            None => WalletSessionState::default(),
        }
    }

    /// Latest market snapshot, if one has been fetched
    pub async fn market_snapshot(&self) -> Option<ListingsSnapshot> {
        self.market.latest().await
    }

    /// Address persisted by a previous session, seeded at startup
    pub async fn last_known_address(&self) -> Option<WalletAddress> {
        self.last_known_address.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{RPC_GET_BALANCE, RPC_REQUEST_ACCOUNTS};
    use crate::gateway::mock::MockWalletProvider;
    use crate::market::mock::MockListingsProvider;
    use crate::persist::mock::MemoryStore;
    use crate::session::mock::ScriptedPrompt;
    use crate::types::{MarketListing, SessionStatus};
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        provider: Arc<MockWalletProvider>,
        listings: Arc<MockListingsProvider>,
        store: Arc<MemoryStore>,
        dashboard: WalletDashboard,
    }

    fn harness(with_wallet: bool) -> Harness {
        let provider = Arc::new(MockWalletProvider::new());
        let listings = Arc::new(MockListingsProvider::new());
        let store = Arc::new(MemoryStore::new());

        let candidates: Vec<Arc<dyn WalletProvider>> = if with_wallet {
            vec![provider.clone()]
        } else {
            Vec::new()
        };
        let dashboard = WalletDashboard::new(
            candidates,
            listings.clone(),
            store.clone(),
            Arc::new(ScriptedPrompt::answering(true)),
        );

        Harness {
            provider,
            listings,
            store,
            dashboard,
        }
    }

    fn snapshot(symbols: &[&str]) -> ListingsSnapshot {
        ListingsSnapshot::new(
            symbols
                .iter()
                .map(|s| MarketListing {
                    name: s.to_string(),
                    symbol: s.to_string(),
                    slug: s.to_lowercase(),
                    price_usd: 1.0,
                    percent_change_24h: None,
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn start_seeds_address_and_fetches_market() {
        let h = harness(true);
        h.store.save(&WalletAddress::new("0xCached")).unwrap();
        h.listings.push_ok(snapshot(&["BTC"]));

        h.dashboard.start().await;

        assert_eq!(
            h.dashboard.last_known_address().await,
            Some(WalletAddress::new("0xCached"))
        );
        assert_eq!(h.dashboard.market_snapshot().await.unwrap().listings.len(), 1);
        // Seeding never reconnects by itself
        assert_eq!(
            h.dashboard.wallet_state().await.status,
            SessionStatus::Disconnected
        );
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let h = harness(true);
        h.listings.push_ok(snapshot(&["BTC"]));

        h.dashboard.start().await;
        h.dashboard.start().await;

        assert_eq!(h.listings.fetches_started(), 1);
    }

    #[tokio::test]
    async fn wallet_intents_fail_without_a_provider() {
        let h = harness(false);
        h.listings.push_ok(snapshot(&["BTC"]));
        h.dashboard.start().await;

        assert!(!h.dashboard.has_wallet());
        assert!(matches!(
            h.dashboard.connect().await,
            Err(SessionError::NoProvider)
        ));
        assert_eq!(h.dashboard.wallet_state().await, WalletSessionState::default());

        // Market data still works
        assert!(h.dashboard.market_snapshot().await.is_some());
    }

    #[tokio::test]
    async fn failed_initial_fetch_leaves_snapshot_empty() {
        let h = harness(true);
        h.listings.push_err(MarketError::api("HTTP 500"));

        h.dashboard.start().await;
        assert!(h.dashboard.market_snapshot().await.is_none());

        // A later manual refresh can still succeed
        h.listings.push_ok(snapshot(&["ETH"]));
        h.dashboard.refresh_market().await.unwrap();
        assert!(h.dashboard.market_snapshot().await.is_some());
    }

    #[tokio::test]
    async fn chain_change_resets_a_connected_session() {
        let h = harness(true);
        h.listings.push_ok(snapshot(&["BTC"]));
        h.dashboard.start().await;

        h.provider
            .push_response(RPC_REQUEST_ACCOUNTS, Ok(json!(["0xabc"])));
        h.provider.push_response(RPC_GET_BALANCE, Ok(json!("0x1")));
        h.dashboard.connect().await.unwrap();
        assert!(h.dashboard.wallet_state().await.is_connected());

        h.provider.emit_chain_changed("0x89");
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(h.dashboard.wallet_state().await, WalletSessionState::default());
    }
}
