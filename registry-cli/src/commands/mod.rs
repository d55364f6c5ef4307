pub mod completion;
pub mod config;
pub mod output;
pub mod overview;
pub mod patients;
pub mod profile;
pub mod session;
pub mod users;

use anyhow::{Context as _, Result, bail};
use registry_client::{
    FileStore, GatewayError, HttpGateway, RestorePhase, SessionManager, connect,
};
use shared::{config::ClientConfig, models::User};
use std::{
    io::{self, Write},
    sync::Arc,
};
use tracing::{debug, warn};

/// Everything a command needs: the session file, the session, and the API.
pub struct Context {
    pub store: Arc<FileStore>,
    pub manager: SessionManager<HttpGateway>,
    pub json: bool,
}

impl Context {
    /// Open the session file named by `config` and build the API client.
    pub fn open(config: &ClientConfig, json: bool) -> Result<Self> {
        let path = config.resolved_session_path();
        debug!(path = %path.display(), "using session file");
        let store = Arc::new(FileStore::open(path));
        let manager = connect(config, store.clone()).context("failed to build API client")?;
        Ok(Self {
            store,
            manager,
            json,
        })
    }

    pub fn gateway(&self) -> &HttpGateway {
        self.manager.gateway()
    }

    /// Restore and validate the stored session, refreshing it if needed.
    pub async fn require_session(&self) -> Result<User> {
        match self.manager.initialize().await {
            RestorePhase::Confirmed => self
                .manager
                .snapshot()
                .user()
                .cloned()
                .context("session has no user record"),
            RestorePhase::Cleared => {
                bail!("your session has expired; run `registry session login` to sign in again")
            }
            _ => bail!("not signed in; run `registry session login` first"),
        }
    }

    /// [`Self::require_session`] plus an administrator check.
    pub async fn require_admin(&self) -> Result<User> {
        let user = self.require_session().await?;
        if !shared::models::is_admin(Some(&user)) {
            bail!("this command requires the admin role (signed in as {})", user.label());
        }
        Ok(user)
    }

    /// Run an API call, refreshing the access token once if it is rejected.
    pub async fn call<'a, T, F, Fut>(&'a self, op: F) -> Result<T>
    where
        F: Fn(&'a HttpGateway) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        match op(self.gateway()).await {
            Err(err) if err.is_unauthorized() => {
                warn!(error = %err, "access token rejected; refreshing");
                self.manager
                    .refresh_token()
                    .await
                    .context("session expired; run `registry session login` to sign in again")?;
                Ok(op(self.gateway()).await?)
            }
            other => Ok(other?),
        }
    }
}

/// Read one non-empty line from stdin after printing `message`.
pub fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim().to_string();
    if trimmed.is_empty() {
        bail!("input must not be empty");
    }
    Ok(trimmed)
}

/// Ask a yes/no question; anything but `y`/`yes` is a no.
pub fn confirm(message: &str) -> Result<bool> {
    print!("{message} [y/N] ");
    io::stdout().flush().ok();
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
