use super::collaborators::{Navigator, NotificationLevel, Notifier, Route, TokenStore, Transport};
use super::error::{SessionError, StoreError};
use super::request::{ApiRequest, ApiResponse, RequestContext, RequestKind};
use super::tokens::{
    AuthenticatedUser, LoginBody, LoginResponse, RefreshBody, Session, SessionState,
    SessionStatus, TokenPair,
};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, info, warn};

pub const DEFAULT_TOKEN_PATH: &str = "/token";
pub const DEFAULT_REFRESH_PATH: &str = "/token/refresh";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub token_path: String,
    pub refresh_path: String,
    pub send_refresh_header: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            send_refresh_header: true,
        }
    }
}

type Waiter = oneshot::Sender<Result<String, SessionError>>;

#[derive(Default)]
struct Inner {
    session: Session,
    // Generation whose refresh is in flight. Waiters in `pending` belong to it.
    refreshing: Option<u64>,
    pending: VecDeque<Waiter>,
    // Bumped on login/logout so a refresh that outlives its session is discarded.
    generation: u64,
}

impl Inner {
    fn status(&self) -> SessionStatus {
        let state = if !self.session.is_authenticated() {
            SessionState::Anonymous
        } else if self.refreshing == Some(self.generation) {
            SessionState::Refreshing
        } else {
            SessionState::Authenticated
        };
        SessionStatus {
            state,
            user: self.session.user.clone(),
        }
    }
}

/// Owns the credentials for every HydroServer API call and coordinates
/// token refresh: one refresh at a time, everything else that hits a 401
/// meanwhile waits for its result.
pub struct SessionManager {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    store: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    inner: Mutex<Inner>,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        transport: Arc<dyn Transport>,
        store: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status_tx, _) = watch::channel(Inner::default().status());
        Self {
            config,
            transport,
            store,
            navigator,
            notifier,
            inner: Mutex::new(Inner::default()),
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.inner.lock().await.session.is_authenticated()
    }

    pub async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.inner.lock().await.session.user.clone()
    }

    pub async fn session(&self) -> Session {
        self.inner.lock().await.session.clone()
    }

    async fn publish(&self) {
        let status = self.status().await;
        self.status_tx.send_replace(status);
    }

    /// Loads whatever a previous run persisted.
    pub async fn restore(&self) -> Result<SessionStatus, StoreError> {
        let restored = self.store.load().await?;
        if restored.is_authenticated() {
            info!("restored persisted session");
        }
        {
            let mut inner = self.inner.lock().await;
            inner.session = restored;
        }
        self.publish().await;
        Ok(self.status().await)
    }

    pub async fn attach_credentials(&self, mut request: ApiRequest) -> ApiRequest {
        let (access_token, refresh_token) = {
            let inner = self.inner.lock().await;
            (
                inner.session.access_token.clone(),
                inner.session.refresh_token.clone(),
            )
        };
        if let Some(token) = access_token.as_deref() {
            request.set_bearer(token);
        }
        if self.config.send_refresh_header {
            if let Some(token) = refresh_token.as_deref() {
                request.set_refresh_bearer(token);
            }
        }
        request
    }

    /// Sends an API call, transparently refreshing and retrying once when
    /// the access token has expired. Non-success statuses other than 401
    /// come back as [`SessionError::Http`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, SessionError> {
        let mut ctx = RequestContext::new(request);
        let mut credential: Option<String> = None;
        loop {
            let response = self.dispatch(&mut ctx, credential.as_deref()).await?;
            if !response.is_auth_failure() {
                return into_result(response);
            }
            credential = Some(self.handle_failure(&mut ctx, &response).await?);
        }
    }

    async fn dispatch(
        &self,
        ctx: &mut RequestContext,
        credential: Option<&str>,
    ) -> Result<ApiResponse, SessionError> {
        let mut outgoing = self.attach_credentials(ctx.request.clone()).await;
        if let Some(token) = credential {
            outgoing.set_bearer(token);
        }
        ctx.sent_with = outgoing.bearer().map(str::to_string);

        let method = outgoing.method.clone();
        match self.transport.send(outgoing).await {
            Ok(response) => {
                debug!(%method, path = %ctx.request.path, status = %response.status, "api response");
                Ok(response)
            }
            Err(err) => {
                warn!(%method, path = %ctx.request.path, error = %err, "api request failed");
                self.notifier
                    .notify(NotificationLevel::Error, "Unable to reach HydroServer.");
                Err(err.into())
            }
        }
    }

    /// Decides what happens after `ctx` came back 401. `Ok` carries the
    /// access token to re-dispatch with; `Err` is final for the caller.
    pub async fn handle_failure(
        &self,
        ctx: &mut RequestContext,
        response: &ApiResponse,
    ) -> Result<String, SessionError> {
        debug!(path = %ctx.request.path, status = %response.status, retried = ctx.retried, "auth failure");
        match ctx.kind {
            RequestKind::Refresh => return Err(self.reject_refresh().await),
            RequestKind::Login => return Err(SessionError::InvalidCredentials),
            RequestKind::Api => {}
        }

        if ctx.retried {
            return Err(SessionError::Unauthorized);
        }
        ctx.retried = true;

        let generation = {
            let mut inner = self.inner.lock().await;
            let generation = inner.generation;
            if inner.refreshing == Some(generation) {
                let (tx, rx) = oneshot::channel();
                inner.pending.push_back(tx);
                drop(inner);
                debug!(path = %ctx.request.path, "queued behind token refresh");
                return rx.await.unwrap_or(Err(SessionError::LoggedOut));
            }
            if let Some(current) = inner
                .session
                .access_token
                .as_ref()
                .filter(|t| ctx.sent_with.as_deref() != Some(t.as_str()))
            {
                // Sent with a credential that has since been replaced.
                return Ok(current.clone());
            }
            inner.refreshing = Some(generation);
            generation
        };

        self.publish().await;
        let outcome = self
            .refresh_for(generation)
            .await
            .map(|pair| pair.access_token);

        let pending = {
            let mut inner = self.inner.lock().await;
            if inner.refreshing == Some(generation) {
                inner.refreshing = None;
                std::mem::take(&mut inner.pending)
            } else {
                // A reset already settled this refresh's waiters.
                VecDeque::new()
            }
        };
        if !pending.is_empty() {
            debug!(count = pending.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for waiter in pending {
            let _ = waiter.send(outcome.clone());
        }
        self.publish().await;
        outcome
    }

    /// Exchanges the refresh token for a new pair and installs it. Never
    /// retried; a rejection ends the session.
    pub async fn refresh_access_token(&self) -> Result<TokenPair, SessionError> {
        let generation = self.inner.lock().await.generation;
        self.refresh_for(generation).await
    }

    async fn refresh_for(&self, generation: u64) -> Result<TokenPair, SessionError> {
        let refresh_token = {
            let inner = self.inner.lock().await;
            if inner.generation != generation {
                return Err(SessionError::LoggedOut);
            }
            inner.session.refresh_token.clone()
        };
        let Some(refresh_token) = refresh_token else {
            info!("no refresh token available");
            return Err(self.reject_refresh().await);
        };

        info!("access token expired, refreshing");
        let body = serde_json::to_value(RefreshBody {
            refresh_token: &refresh_token,
        })
        .map_err(|e| SessionError::Decode(e.to_string()))?;
        let mut ctx = RequestContext::with_kind(
            ApiRequest::post(self.config.refresh_path.clone(), body),
            RequestKind::Refresh,
        );
        let response = self.dispatch(&mut ctx, None).await?;

        if self.inner.lock().await.generation != generation {
            info!("session ended while refreshing; ignoring refresh outcome");
            return Err(SessionError::LoggedOut);
        }
        if !response.status.is_success() {
            warn!(status = %response.status, "token refresh failed");
            return Err(self.reject_refresh().await);
        }
        let pair: TokenPair = match serde_json::from_value(response.body) {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "token refresh returned an unreadable body");
                return Err(self.reject_refresh().await);
            }
        };
        if pair.access_token.trim().is_empty() {
            warn!("token refresh returned an empty access token");
            return Err(self.reject_refresh().await);
        }

        let session = {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                info!("session ended while refreshing; discarding new tokens");
                return Err(SessionError::LoggedOut);
            }
            inner.session.install_pair(pair.clone());
            inner.session.clone()
        };
        if let Err(e) = self.store.save(&session).await {
            warn!(error = %e, "failed to persist refreshed tokens");
        }
        info!("access token refreshed");
        Ok(pair)
    }

    async fn reject_refresh(&self) -> SessionError {
        warn!("refresh token rejected, logging out");
        self.reset(SessionError::RefreshRejected).await;
        self.navigator.navigate(Route::Login);
        self.notifier.notify(
            NotificationLevel::Error,
            "Your session has expired. Please log in again.",
        );
        SessionError::RefreshRejected
    }

    async fn reset(&self, reason: SessionError) {
        let pending = {
            let mut inner = self.inner.lock().await;
            inner.session.clear();
            inner.generation += 1;
            inner.refreshing = None;
            std::mem::take(&mut inner.pending)
        };
        for waiter in pending {
            let _ = waiter.send(Err(reason.clone()));
        }
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to clear persisted session");
        }
        self.publish().await;
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionStatus, SessionError> {
        self.reset(SessionError::LoggedOut).await;

        let body = serde_json::to_value(LoginBody { email, password })
            .map_err(|e| SessionError::Decode(e.to_string()))?;
        let mut ctx = RequestContext::with_kind(
            ApiRequest::post(self.config.token_path.clone(), body),
            RequestKind::Login,
        );

        let dispatched = self.dispatch(&mut ctx, None).await;
        let result = match dispatched {
            Ok(response) if response.is_auth_failure() => {
                self.handle_failure(&mut ctx, &response).await.map(|_| ())
            }
            Ok(response) if response.status == StatusCode::BAD_REQUEST => {
                Err(SessionError::InvalidCredentials)
            }
            Ok(response) => match into_result(response) {
                Ok(response) => self.install_login(response).await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!("logged in");
                self.navigator.navigate(Route::PostLogin);
                self.notifier
                    .notify(NotificationLevel::Success, "Successfully logged in.");
                Ok(self.status().await)
            }
            Err(e) => {
                info!(error = %e, "login failed");
                if e == SessionError::InvalidCredentials {
                    self.notifier
                        .notify(NotificationLevel::Error, "Invalid email or password.");
                }
                Err(e)
            }
        }
    }

    async fn install_login(&self, response: ApiResponse) -> Result<(), SessionError> {
        let parsed: LoginResponse = serde_json::from_value(response.body)
            .map_err(|e| SessionError::Decode(e.to_string()))?;
        let session = Session::new(
            Some(parsed.access_token),
            Some(parsed.refresh_token),
            parsed.user,
        );
        if !session.is_authenticated() {
            return Err(SessionError::Decode("empty access token".to_string()));
        }
        {
            let mut inner = self.inner.lock().await;
            inner.session = session.clone();
        }
        if let Err(e) = self.store.save(&session).await {
            warn!(error = %e, "failed to persist session");
        }
        self.publish().await;
        Ok(())
    }

    pub async fn logout(&self) {
        self.reset(SessionError::LoggedOut).await;
        info!("logged out");
        self.navigator.navigate(Route::LoggedOut);
        self.notifier
            .notify(NotificationLevel::Info, "You have logged out.");
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, SessionError> {
    if response.status.is_success() {
        Ok(response)
    } else {
        Err(SessionError::Http {
            status: response.status.as_u16(),
            body: response.body,
        })
    }
}
