use super::secret_manager::{SecretManager, KEYRING_USER_ACCESS_TOKEN, KEYRING_USER_REFRESH_TOKEN};
use crate::session::{AuthenticatedUser, Session, StoreError, TokenStore};
use crate::settings::{SettingsStore, KEY_USER};
use async_trait::async_trait;
use tauri::Runtime;
use tracing::warn;

/// Tokens go to the OS keychain; the user profile lives in the settings file.
pub struct PersistentTokenStore<R: Runtime> {
    access_token: SecretManager,
    refresh_token: SecretManager,
    settings: SettingsStore<R>,
}

impl<R: Runtime> PersistentTokenStore<R> {
    pub fn new(settings: SettingsStore<R>) -> Self {
        Self {
            access_token: SecretManager::new(KEYRING_USER_ACCESS_TOKEN),
            refresh_token: SecretManager::new(KEYRING_USER_REFRESH_TOKEN),
            settings,
        }
    }

    pub fn is_available(&self) -> bool {
        self.access_token.is_available() && self.refresh_token.is_available()
    }

    fn load_user(&self) -> Option<AuthenticatedUser> {
        let value = self.settings.get_json(KEY_USER)?;
        match serde_json::from_value(value) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "discarding unreadable stored user");
                self.settings.remove(KEY_USER);
                None
            }
        }
    }
}

#[async_trait]
impl<R: Runtime> TokenStore for PersistentTokenStore<R> {
    async fn load(&self) -> Result<Session, StoreError> {
        Ok(Session::new(
            self.access_token.get()?,
            self.refresh_token.get()?,
            self.load_user(),
        ))
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.access_token.set(session.access_token.as_deref())?;
        self.refresh_token.set(session.refresh_token.as_deref())?;
        match &session.user {
            Some(user) => {
                let value = serde_json::to_value(user)
                    .map_err(|e| StoreError::Corrupt(e.to_string()))?;
                self.settings.set(KEY_USER, value);
            }
            None => self.settings.remove(KEY_USER),
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.settings.remove(KEY_USER);
        let access = self.access_token.delete();
        let refresh = self.refresh_token.delete();
        access.and(refresh)
    }
}
