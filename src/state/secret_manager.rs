use crate::session::StoreError;

const KEYRING_SERVICE: &str = "org.hydroserver.desktop";
pub const KEYRING_USER_ACCESS_TOKEN: &str = "access_token";
pub const KEYRING_USER_REFRESH_TOKEN: &str = "refresh_token";

/// One OS keychain entry under the app's service name.
#[derive(Clone)]
pub struct SecretManager {
    user: &'static str,
}

impl SecretManager {
    pub fn new(user: &'static str) -> Self {
        Self { user }
    }

    fn entry(&self) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(KEYRING_SERVICE, self.user).map_err(|_| StoreError::Unavailable)
    }

    pub fn is_available(&self) -> bool {
        let Ok(entry) = self.entry() else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(keyring::Error::NoStorageAccess(_)) => false,
            Err(keyring::Error::PlatformFailure(_)) => false,
            Err(_) => false,
        }
    }

    pub fn get(&self) -> Result<Option<String>, StoreError> {
        match self.entry()?.get_password() {
            Ok(pwd) => {
                let trimmed = pwd.trim();
                if trimmed.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(trimmed.to_string()))
                }
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(keyring::Error::BadEncoding(_)) => {
                Err(StoreError::Corrupt(format!("{} is not valid UTF-8", self.user)))
            }
            Err(_) => Err(StoreError::Unavailable),
        }
    }

    pub fn set(&self, value: Option<&str>) -> Result<(), StoreError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self
                .entry()?
                .set_password(value)
                .map_err(|_| StoreError::Unavailable),
            None => self.delete(),
        }
    }

    pub fn delete(&self) -> Result<(), StoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(_) => Err(StoreError::Unavailable),
        }
    }
}
