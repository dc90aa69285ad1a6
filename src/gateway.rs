//! Gateway to the injected wallet provider
//!
//! Sole point of contact with the wallet: provider detection, typed
//! JSON-RPC calls, and the chain-changed event subscription all live
//! here so the rest of the crate never touches the raw provider.

use crate::{
    constants::{
        BALANCE_BLOCK_TAG, RPC_GET_BALANCE, RPC_REQUEST_ACCOUNTS, RPC_REVOKE_PERMISSIONS,
        USER_REJECTED_CODE,
    },
    error::{GatewayError, RpcError},
    types::WalletAddress,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Trait for injected wallet providers
///
/// Mirrors the provider's real surface: a JSON-RPC style request
/// method plus an event stream for unsolicited chain changes.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Issues a raw RPC request against the provider
    ///
    /// # Arguments
    /// * `method` - RPC method name (e.g. `eth_requestAccounts`)
    /// * `params` - JSON-encoded positional parameters
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;

    /// Subscribes to chain-changed notifications
    ///
    /// Each call returns a fresh receiver; the payload is the new
    /// chain id string.
    fn chain_events(&self) -> broadcast::Receiver<String>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Gateway owning the detected wallet provider
pub struct ProviderGateway {
    provider: Arc<dyn WalletProvider>,
    /// At most one chain-changed forwarding task per logical session
    chain_listener: Mutex<Option<JoinHandle<()>>>,
}

impl ProviderGateway {
    /// Performs provider discovery over the injected candidates
    ///
    /// Exactly one candidate yields a gateway. No candidate fails
    /// softly, and a conflicting second provider is refused rather
    /// than picked arbitrarily. Safe to call any number of times.
    pub fn detect(mut candidates: Vec<Arc<dyn WalletProvider>>) -> Option<Self> {
        match candidates.len() {
            0 => {
                tracing::info!("no injected wallet provider found");
                None
            }
            1 => {
                let provider = candidates.remove(0);
                tracing::info!(provider = provider.provider_name(), "wallet provider detected");
                Some(Self::new(provider))
            }
            count => {
                tracing::warn!(count, "conflicting injected wallet providers, refusing all");
                None
            }
        }
    }

    /// Wraps an already-chosen provider
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self {
            provider,
            chain_listener: Mutex::new(None),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        self.provider
            .request(method, params)
            .await
            .map_err(|err| match err.code {
                USER_REJECTED_CODE => GatewayError::UserRejected,
                _ => GatewayError::Rpc(err),
            })
    }

    /// Issues the account-authorization request
    ///
    /// A declined request surfaces as `UserRejected`; a success with an
    /// empty account list is a provider error, not a connection.
    pub async fn request_accounts(&self) -> Result<Vec<WalletAddress>, GatewayError> {
        let value = self.request(RPC_REQUEST_ACCOUNTS, json!([])).await?;
        let accounts: Vec<String> = serde_json::from_value(value).map_err(|e| {
            GatewayError::invalid_response(format!("{RPC_REQUEST_ACCOUNTS} payload: {e}"))
        })?;

        if accounts.is_empty() {
            return Err(GatewayError::NoAccounts);
        }

        Ok(accounts.into_iter().map(WalletAddress::new).collect())
    }

    /// Queries the balance for an address at the latest chain state
    ///
    /// Returns the raw hexadecimal string; conversion is the caller's
    /// concern so the value stays re-derivable from the wire form.
    pub async fn get_balance(&self, address: &WalletAddress) -> Result<String, GatewayError> {
        let value = self
            .request(RPC_GET_BALANCE, json!([address.as_str(), BALANCE_BLOCK_TAG]))
            .await?;
        serde_json::from_value(value)
            .map_err(|e| GatewayError::invalid_response(format!("{RPC_GET_BALANCE} payload: {e}")))
    }

    /// Asks the provider to drop previously granted account permissions
    pub async fn revoke_access(&self) -> Result<(), GatewayError> {
        self.request(RPC_REVOKE_PERMISSIONS, json!([{ "eth_accounts": {} }]))
            .await
            .map(|_| ())
    }

    /// Registers the chain-changed handler for this logical session
    ///
    /// Idempotent: while a subscription is active, further calls are
    /// logged no-ops, so re-registering on every render cannot produce
    /// duplicate handlers firing per event.
    pub async fn subscribe_chain_changed<F>(&self, handler: F)
    where
        F: Fn(String) + Send + 'static,
    {
        let mut listener = self.chain_listener.lock().await;
        if listener.is_some() {
            tracing::debug!("chain-changed handler already registered, ignoring");
            return;
        }

        let mut events = self.provider.chain_events();
        *listener = Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(chain_id) => handler(chain_id),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "chain-changed events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Drops the active chain-changed subscription, if any
    pub async fn unsubscribe_chain_changed(&self) {
        if let Some(handle) = self.chain_listener.lock().await.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    /// Scripted wallet provider for testing
    ///
    /// Responses are queued per method; an optional gate holds the next
    /// request until the test releases it, which is how in-flight races
    /// are reproduced deterministically.
    pub struct MockWalletProvider {
        responses: StdMutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
        calls: StdMutex<Vec<(String, Value)>>,
        gate: StdMutex<Option<Arc<Notify>>>,
        chain_tx: broadcast::Sender<String>,
    }

    impl Default for MockWalletProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockWalletProvider {
        pub fn new() -> Self {
            let (chain_tx, _) = broadcast::channel(16);
            Self {
                responses: StdMutex::new(HashMap::new()),
                calls: StdMutex::new(Vec::new()),
                gate: StdMutex::new(None),
                chain_tx,
            }
        }

        /// Queues the next response for a method
        pub fn push_response(&self, method: &str, response: Result<Value, RpcError>) {
            self.responses
                .lock()
                .unwrap()
                .entry(method.to_string())
                .or_default()
                .push_back(response);
        }

        /// Holds the next request until the returned gate is notified
        pub fn hold_next_request(&self) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            *self.gate.lock().unwrap() = Some(gate.clone());
            gate
        }

        /// Number of requests issued for a method
        pub fn call_count(&self, method: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == method)
                .count()
        }

        /// Params of every request issued for a method
        pub fn calls_for(&self, method: &str) -> Vec<Value> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _)| m == method)
                .map(|(_, p)| p.clone())
                .collect()
        }

        /// Emits a chain-changed event to all subscribers
        pub fn emit_chain_changed(&self, chain_id: &str) {
            let _ = self.chain_tx.send(chain_id.to_string());
        }
    }

    #[async_trait]
    impl WalletProvider for MockWalletProvider {
        async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));

            let gate = self.gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            self.responses
                .lock()
                .unwrap()
                .get_mut(method)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(RpcError::new(-32601, format!("unscripted method {method}"))))
        }

        fn chain_events(&self) -> broadcast::Receiver<String> {
            self.chain_tx.subscribe()
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
