use async_trait::async_trait;
use authcheck_core::config::KeyringSettings;
use authcheck_core::entities::StoredToken;
use authcheck_core::ports::TokenStore;
use authcheck_core::Error;
use keyring::credential::{CredentialBuilderApi, CredentialPersistence};
use keyring::Entry;
use tracing::{debug, instrument, warn};

/// Whether the compiled-in keyring backend can see entries written by
/// other processes. The mock store only keeps what the same `Entry` set.
pub fn has_shared_backend() -> bool {
    !matches!(
        keyring::default::default_credential_builder().persistence(),
        CredentialPersistence::EntryOnly | CredentialPersistence::ProcessOnly
    )
}

/// Keyring-backed token store (libsecret on Linux, Keychain on macOS)
///
/// Reads the entry written by the setup tool; this crate never writes it.
pub struct KeyringTokenStore {
    service: String,
    entry: String,
}

impl KeyringTokenStore {
    pub fn new(settings: &KeyringSettings) -> Self {
        Self {
            service: settings.service.clone(),
            entry: settings.entry.clone(),
        }
    }

    fn get_entry(&self) -> Result<Entry, Error> {
        Entry::new(&self.service, &self.entry)
            .map_err(|e| Error::CredentialStorage(format!("failed to create keyring entry: {}", e)))
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(&KeyringSettings::default())
    }
}

#[async_trait]
impl TokenStore for KeyringTokenStore {
    #[instrument(skip(self), fields(service = %self.service, entry = %self.entry))]
    async fn load_token(&self) -> Result<Option<StoredToken>, Error> {
        if !has_shared_backend() {
            warn!("keyring backend is process-local, stored tokens are not visible");
        }

        let entry = self.get_entry()?;

        // Run blocking keyring operation in spawn_blocking
        let token = tokio::task::spawn_blocking(move || match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(Error::CredentialStorage(format!(
                "failed to read token: {}",
                e
            ))),
        })
        .await
        .map_err(|e| Error::CredentialStorage(format!("task join error: {}", e)))??;

        // An empty entry is as good as none
        let token = token.map(StoredToken::new).filter(|t| !t.is_empty());
        debug!(found = token.is_some(), "token lookup finished");
        Ok(token)
    }
}
