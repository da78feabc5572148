//! Session gateway.
//!
//! Wraps every outgoing call: attaches the access token, recovers from a 401 with a
//! single de-duplicated refresh followed by one retry, and ends the session when the
//! refresh itself fails.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use super::events::SessionEvent;
use super::refresh::{
    PendingRefresh, RefreshFailure, RefreshOutcome, RefreshState, TOKEN_REFRESH_PATH,
    TokenRefreshRequest, TokenRefreshResponse,
};
use super::request::{ApiRequest, ApiResponse};
use super::transport::Transport;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{ClientError, Result};

/// Broadcast channel capacity for session events.
const SESSION_EVENT_CAPACITY: usize = 16;

/// Authenticating front of the transport.
///
/// Cheap to clone; clones share the refresh state and the credential store.
#[derive(Clone)]
pub struct SessionGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    transport: Arc<dyn Transport>,
    store: Arc<CredentialStore>,
    state: Mutex<RefreshState>,
    /// Bumped on every login/logout so a refresh that settles afterwards
    /// cannot overwrite the new session's credential.
    epoch: AtomicU64,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionGateway {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            inner: Arc::new(GatewayInner {
                transport,
                store,
                state: Mutex::new(RefreshState::Idle),
                epoch: AtomicU64::new(0),
                events,
            }),
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.inner.store
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Whether the last refresh failed and no login happened since.
    pub fn is_expired(&self) -> bool {
        matches!(*self.inner.state.lock(), RefreshState::Failed)
    }

    /// Whether a refresh call is currently in flight.
    pub fn refresh_in_flight(&self) -> bool {
        matches!(*self.inner.state.lock(), RefreshState::Refreshing(_))
    }

    /// Install the credential returned by a login and reopen the session.
    ///
    /// This is the only way to sign in, so a login after an expiry always clears
    /// the expired state. The credential is live before it is persisted.
    pub async fn begin_session(&self, credential: Credential) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            self.inner.store.set(credential);
            *state = RefreshState::Idle;
        }

        info!("Session started");
        self.inner.emit(SessionEvent::SignedIn);
        self.inner.store.persist().await
    }

    /// Drop the credential locally.
    pub async fn end_session(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            self.inner.store.clear();
            *state = RefreshState::Idle;
        }

        info!("Session ended");
        self.inner.emit(SessionEvent::SignedOut);
        self.inner.store.persist().await
    }

    /// Send a request, recovering from one authorization failure.
    ///
    /// Non-2xx answers are returned as errors. Transport failures are returned
    /// unchanged and never retried here.
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let inner = &self.inner;

        if !request.auth_required {
            let response = inner.transport.dispatch(&request, None).await?;
            return response.error_for_status(&request.path);
        }

        if self.is_expired() {
            return Err(ClientError::session_expired(
                "session has ended, sign in again",
            ));
        }

        let token = inner.store.access_token();
        let response = inner.transport.dispatch(&request, token.as_deref()).await?;
        if !response.is_unauthorized() {
            return response.error_for_status(&request.path);
        }

        debug!("Authorization failed, waiting for a fresh access token");
        let fresh = inner.fresh_token(token.as_deref()).await?;

        let retried = inner.transport.dispatch(&request, Some(&fresh)).await?;
        if retried.is_unauthorized() {
            warn!("Authorization failed again after refresh; giving up");
        }
        retried.error_for_status(&request.path)
    }

    /// Send a request and decode its JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.send(request).await?.json()
    }
}

impl GatewayInner {
    fn emit(&self, event: SessionEvent) {
        debug!(event = event.event_name(), "Session event");
        // Ignore errors - just means no subscribers currently
        let _ = self.events.send(event);
    }

    /// Obtain an access token newer than `stale`.
    ///
    /// Joins the in-flight refresh if there is one, starts one otherwise. If the
    /// stored token already differs from `stale`, another request refreshed in the
    /// meantime and that token is returned without a new refresh.
    async fn fresh_token(self: &Arc<Self>, stale: Option<&str>) -> Result<String> {
        let pending = {
            let mut state = self.state.lock();
            let joined = match &*state {
                RefreshState::Failed => {
                    return Err(ClientError::session_expired(
                        "session has ended, sign in again",
                    ));
                }
                RefreshState::Refreshing(pending) => Some(pending.clone()),
                RefreshState::Idle => None,
            };

            match joined {
                Some(pending) => {
                    debug!("Joining in-flight refresh");
                    pending
                }
                None => {
                    if let Some(current) = self.store.access_token()
                        && stale != Some(current.as_str())
                    {
                        debug!("Credential was refreshed meanwhile; reusing it");
                        return Ok(current);
                    }

                    let pending: PendingRefresh = Arc::clone(self).refresh().boxed().shared();
                    *state = RefreshState::Refreshing(pending.clone());
                    pending
                }
            }
        };

        pending
            .await
            .map_err(|failure| ClientError::session_expired(failure.to_string()))
    }

    /// The one refresh call shared by every waiter.
    async fn refresh(self: Arc<Self>) -> RefreshOutcome {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let outcome = self.exchange_refresh_token().await;
        let Some(outcome) = self.settle(epoch, outcome) else {
            return self.store.access_token().ok_or(RefreshFailure::SessionReset);
        };

        if let Err(e) = self.store.persist().await {
            match &outcome {
                Ok(_) => warn!(error = %e, "Failed to persist refreshed credential (non-fatal)"),
                Err(_) => warn!(error = %e, "Failed to remove persisted credential"),
            }
        }
        outcome
    }

    async fn exchange_refresh_token(&self) -> std::result::Result<Credential, RefreshFailure> {
        let Some(current) = self.store.get() else {
            return Err(RefreshFailure::MissingRefreshToken);
        };

        info!("Refreshing access token");

        let request = ApiRequest::post(TOKEN_REFRESH_PATH)
            .without_auth()
            .json(&TokenRefreshRequest {
                refresh: &current.refresh_token,
            })
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

        let response = self
            .transport
            .dispatch(&request, None)
            .await
            .map_err(|e| RefreshFailure::Transport(e.to_string()))?;

        if !response.status.is_success() {
            return Err(RefreshFailure::Rejected {
                status: response.status.as_u16(),
            });
        }

        let body: TokenRefreshResponse = response
            .json()
            .map_err(|e| RefreshFailure::Malformed(e.to_string()))?;

        Ok(current.refreshed(body.access, body.refresh))
    }

    /// Apply a refresh result to the in-memory store and the state machine.
    ///
    /// Runs before the shared handle resolves, so every waiter retries with a
    /// credential that is already visible in the store. Returns `None` when a
    /// login or logout happened meanwhile and the result was discarded.
    fn settle(
        &self,
        epoch: u64,
        outcome: std::result::Result<Credential, RefreshFailure>,
    ) -> Option<RefreshOutcome> {
        let event = {
            let mut state = self.state.lock();

            if self.epoch.load(Ordering::SeqCst) != epoch {
                debug!(state = state.name(), "Session changed during refresh; discarding result");
                return None;
            }

            match &outcome {
                Ok(credential) => {
                    self.store.set(credential.clone());
                    *state = RefreshState::Idle;
                    info!("Access token refreshed");
                    SessionEvent::Refreshed
                }
                Err(failure) => {
                    self.store.clear();
                    *state = RefreshState::Failed;
                    error!(error = %failure, "Credential refresh failed - session expired");
                    SessionEvent::Expired {
                        reason: failure.to_string(),
                    }
                }
            }
        };

        self.emit(event);
        Some(outcome.map(|credential| credential.access_token))
    }
}
