//! Wallet session state machine
//!
//! Owns the connection status, address and balance, and guards every
//! transition. Provider calls are async; completions that land after a
//! chain change are discarded by comparing a generation counter
//! captured before the call against the current one at commit time.

use crate::{
    error::{GatewayError, SessionError},
    gateway::ProviderGateway,
    persist::SessionStore,
    types::{Balance, SessionStatus, WalletAddress, WalletSessionState},
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Yes/no confirmation for the disconnect intent
///
/// The presentation layer supplies the implementation (e.g. a modal);
/// the state machine only requires the decision.
#[async_trait]
pub trait DisconnectPrompt: Send + Sync {
    /// Returns true when the user confirms the disconnect
    async fn confirm_disconnect(&self, address: &WalletAddress) -> bool;
}

/// How a connect attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Account attached, address and balance stored
    Connected,
    /// The user declined the authorization request; not an error
    Rejected,
    /// A chain change invalidated the attempt while it was in flight
    Superseded,
}

/// How a disconnect attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Permissions revoked and local state cleared
    Revoked,
    /// The user declined the confirmation; state unchanged
    Cancelled,
    /// A chain change invalidated the attempt while it was in flight
    Superseded,
}

/// Wallet session state machine
///
/// Transitions: Disconnected -> Connecting -> Connected ->
/// Disconnecting -> Disconnected, plus a hard reset to cold start from
/// any state on a chain-changed notification. The transition guards
/// make `connect`, `refresh_balance` and `disconnect` mutually
/// exclusive without locks beyond the state cell itself.
pub struct WalletSession {
    gateway: Arc<ProviderGateway>,
    store: Arc<dyn SessionStore>,
    prompt: Arc<dyn DisconnectPrompt>,
    state: RwLock<WalletSessionState>,
    /// Bumped on every chain change; completions from an older
    /// generation are discarded at commit time
    generation: AtomicU64,
}

impl WalletSession {
    /// Creates a session in the cold-start (Disconnected) state
    pub fn new(
        gateway: Arc<ProviderGateway>,
        store: Arc<dyn SessionStore>,
        prompt: Arc<dyn DisconnectPrompt>,
    ) -> Self {
        Self {
            gateway,
            store,
            prompt,
            state: RwLock::new(WalletSessionState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Current session state, cloned for the presentation layer
    pub async fn state(&self) -> WalletSessionState {
        self.state.read().await.clone()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Marks all in-flight operations stale
    ///
    /// Called synchronously from the chain-changed handler so that no
    /// completion can commit between the event and the reset.
    pub(crate) fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Resets to the cold-start state after a chain change
    ///
    /// Runs exactly once per event; stale completions discard
    /// themselves instead of re-triggering this.
    pub(crate) async fn reset_after_chain_change(&self, chain_id: &str) {
        let mut state = self.state.write().await;
        *state = WalletSessionState::default();
        tracing::info!(chain_id, "chain changed, session reset to cold start");
    }

    /// Requests account authorization and attaches the first account
    ///
    /// Valid only from Disconnected. A declined request is the expected
    /// case and returns `Rejected` without an error; every other
    /// provider failure returns the session to Disconnected and is
    /// surfaced. The address is persisted on the final commit so a
    /// failed connect never leaves a stale persisted value.
    pub async fn connect(&self) -> Result<ConnectOutcome, SessionError> {
        {
            let mut state = self.state.write().await;
            if state.status != SessionStatus::Disconnected {
                return Err(SessionError::InvalidTransition {
                    status: state.status,
                    intent: "connect",
                });
            }
            state.status = SessionStatus::Connecting;
        }
        let generation = self.generation();

        let accounts = self.gateway.request_accounts().await;

        let address = {
            let mut state = self.state.write().await;
            if self.generation() != generation {
                tracing::debug!("connect resolution superseded by chain change, discarding");
                return Ok(ConnectOutcome::Superseded);
            }
            match accounts {
                Ok(accounts) => match accounts.into_iter().next() {
                    Some(address) => address,
                    None => {
                        *state = WalletSessionState::default();
                        return Err(GatewayError::NoAccounts.into());
                    }
                },
                Err(GatewayError::UserRejected) => {
                    *state = WalletSessionState::default();
                    tracing::info!("wallet connection declined by user");
                    return Ok(ConnectOutcome::Rejected);
                }
                Err(err) => {
                    *state = WalletSessionState::default();
                    return Err(err.into());
                }
            }
        };

        let balance = match self.gateway.get_balance(&address).await {
            Ok(hex) => Balance::from_hex(&hex),
            Err(err) => Err(err),
        };

        let mut state = self.state.write().await;
        if self.generation() != generation {
            tracing::debug!("connect resolution superseded by chain change, discarding");
            return Ok(ConnectOutcome::Superseded);
        }
        match balance {
            Ok(balance) => {
                if let Err(err) = self.store.save(&address) {
                    tracing::warn!(error = %err, "failed to persist session address");
                }
                tracing::info!(address = %address, "wallet connected");
                *state = WalletSessionState::connected(address, balance);
                Ok(ConnectOutcome::Connected)
            }
            Err(err) => {
                *state = WalletSessionState::default();
                Err(err.into())
            }
        }
    }

    /// Re-fetches the balance of the attached account
    ///
    /// Valid only when Connected; status never changes. On failure the
    /// previous balance is kept and the error is surfaced.
    pub async fn refresh_balance(&self) -> Result<(), SessionError> {
        let (generation, address) = {
            let state = self.state.read().await;
            match (state.status, state.address.as_ref()) {
                (SessionStatus::Connected, Some(address)) => {
                    (self.generation(), address.clone())
                }
                _ => {
                    return Err(SessionError::InvalidTransition {
                        status: state.status,
                        intent: "refresh balance",
                    })
                }
            }
        };

        let fetched = match self.gateway.get_balance(&address).await {
            Ok(hex) => Balance::from_hex(&hex),
            Err(err) => Err(err),
        };

        let mut state = self.state.write().await;
        if self.generation() != generation || state.status != SessionStatus::Connected {
            tracing::debug!("balance refresh superseded, discarding");
            return Ok(());
        }
        match fetched {
            Ok(balance) => {
                state.balance = Some(balance);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Revokes account permissions and detaches the account
    ///
    /// Valid only from Connected, and only after the prompt confirms.
    /// Local state clears even when revocation fails (the wallet side
    /// may already be detached), but the failure is still surfaced.
    pub async fn disconnect(&self) -> Result<DisconnectOutcome, SessionError> {
        let (generation, address) = {
            let state = self.state.read().await;
            match (state.status, state.address.as_ref()) {
                (SessionStatus::Connected, Some(address)) => {
                    (self.generation(), address.clone())
                }
                _ => {
                    return Err(SessionError::InvalidTransition {
                        status: state.status,
                        intent: "disconnect",
                    })
                }
            }
        };

        if !self.prompt.confirm_disconnect(&address).await {
            tracing::debug!("disconnect cancelled at confirmation");
            return Ok(DisconnectOutcome::Cancelled);
        }

        {
            let mut state = self.state.write().await;
            if self.generation() != generation || state.status != SessionStatus::Connected {
                return Ok(DisconnectOutcome::Superseded);
            }
            // Address and balance are only ever present while Connected
            *state = WalletSessionState {
                status: SessionStatus::Disconnecting,
                ..WalletSessionState::default()
            };
        }

        let revoked = self.gateway.revoke_access().await;

        let mut state = self.state.write().await;
        if self.generation() != generation {
            tracing::debug!("disconnect resolution superseded by chain change, discarding");
            return Ok(DisconnectOutcome::Superseded);
        }

        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %err, "failed to clear persisted session");
        }
        *state = WalletSessionState::default();

        match revoked {
            Ok(()) => {
                tracing::info!("wallet disconnected");
                Ok(DisconnectOutcome::Revoked)
            }
            Err(err) => Err(SessionError::Revocation(err)),
        }
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Prompt that always answers the same way
    pub struct ScriptedPrompt {
        answer: bool,
        asked: AtomicUsize,
    }

    impl ScriptedPrompt {
        pub fn answering(answer: bool) -> Self {
            Self {
                answer,
                asked: AtomicUsize::new(0),
            }
        }

        pub fn times_asked(&self) -> usize {
            self.asked.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DisconnectPrompt for ScriptedPrompt {
        async fn confirm_disconnect(&self, _address: &WalletAddress) -> bool {
            self.asked.fetch_add(1, Ordering::SeqCst);
            self.answer
        }
    }
}
