//! Session authentication flows
//!
//! Login and signup obtain a credential from credential-issuing endpoints,
//! logout discards it. The service also owns the background refresh task,
//! which runs for as long as a session is active.

use std::sync::Arc;
use std::time::Duration;

use dropdoko_common::auth::SessionCredential;
use dropdoko_domain::{AuthEndpoints, AuthResponse, LoginRequest, SessionConfig, SignupRequest};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::client::ApiClient;
use super::errors::ApiError;
use super::request::ApiRequest;
use super::scheduler::{RefreshScheduler, SchedulerConfig, SchedulerError};

/// Authentication service for the storefront and back-office sessions
pub struct ApiAuthService {
    client: Arc<ApiClient>,
    endpoints: AuthEndpoints,
    /// `None` when background refresh is disabled
    scheduler: Option<Mutex<RefreshScheduler>>,
}

impl ApiAuthService {
    /// Create a new auth service
    ///
    /// # Arguments
    ///
    /// * `client` - API client whose session this service manages
    /// * `endpoints` - credential-issuing and session endpoint paths
    /// * `refresh_interval` - background refresh period; zero disables it
    pub fn new(client: Arc<ApiClient>, endpoints: AuthEndpoints, refresh_interval: Duration) -> Self {
        let scheduler = (!refresh_interval.is_zero()).then(|| {
            Mutex::new(RefreshScheduler::new(
                Arc::clone(&client),
                SchedulerConfig { interval: refresh_interval },
            ))
        });

        Self { client, endpoints, scheduler }
    }

    pub fn from_config(client: Arc<ApiClient>, config: &SessionConfig) -> Self {
        Self::new(
            client,
            config.endpoints.clone(),
            Duration::from_secs(config.background_refresh_secs),
        )
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Initialize the service (load a persisted credential)
    ///
    /// Should be called on startup. Starts background refresh when a
    /// credential was found.
    ///
    /// # Returns
    ///
    /// `true` if a credential was loaded, `false` if none exists
    ///
    /// # Errors
    ///
    /// Returns error if the credential store cannot be read
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> Result<bool, ApiError> {
        let restored = self.client.session().restore().await?;

        if restored {
            info!("restored persisted session");
            self.start_auto_refresh().await;
        } else {
            debug!("no persisted session");
        }

        Ok(restored)
    }

    /// Log in with email and password
    ///
    /// # Errors
    ///
    /// A rejected login is returned as [`ApiError::Domain`] carrying the
    /// backend's message (e.g. "Invalid credentials"); no refresh is attempted.
    #[instrument(skip(self, request))]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let response = self.issue(&self.endpoints.login, request).await?;
        info!("login successful");
        Ok(response)
    }

    /// Create an account and start a session for it
    ///
    /// # Errors
    ///
    /// Same as [`ApiAuthService::login`]
    #[instrument(skip(self, request))]
    pub async fn signup(&self, request: &SignupRequest) -> Result<AuthResponse, ApiError> {
        let response = self.issue(&self.endpoints.signup, request).await?;
        info!("signup successful");
        Ok(response)
    }

    /// End the session
    ///
    /// The backend logout call is best-effort: its failure is logged and the
    /// local session is cleared regardless.
    ///
    /// # Errors
    ///
    /// Returns error only if the credential store cannot be cleared
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.stop_auto_refresh().await;

        let request = ApiRequest::post(self.endpoints.logout.as_str()).background();
        if let Err(err) = self.client.send(request).await {
            warn!(error = %err, "backend logout failed; clearing local session anyway");
        }

        self.client.session().clear().await?;
        info!("logged out");
        Ok(())
    }

    /// Check if a credential is present
    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Start background auto-refresh task
    pub async fn start_auto_refresh(&self) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };

        match scheduler.lock().await.start().await {
            Ok(()) | Err(SchedulerError::AlreadyRunning) => {}
            Err(err) => warn!(error = %err, "failed to start background refresh"),
        }
    }

    /// Stop background auto-refresh task if running
    pub async fn stop_auto_refresh(&self) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };

        match scheduler.lock().await.stop().await {
            Ok(()) | Err(SchedulerError::NotRunning) => {}
            Err(err) => warn!(error = %err, "failed to stop background refresh"),
        }
    }

    pub async fn is_auto_refresh_running(&self) -> bool {
        match &self.scheduler {
            Some(scheduler) => scheduler.lock().await.is_running().await,
            None => false,
        }
    }

    async fn issue<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ApiError> {
        let request = ApiRequest::post(path).json(body)?.credential_issuing();
        let response: AuthResponse = self.client.send(request).await?.json()?;

        if response.access_token.trim().is_empty() {
            return Err(ApiError::Decode("auth response carried an empty access token".into()));
        }

        let credential = SessionCredential::new(response.access_token.clone());
        if let Err(err) = self.client.session().replace(credential).await {
            warn!(error = %err, "session credential could not be persisted");
        }

        self.start_auto_refresh().await;
        Ok(response)
    }
}
