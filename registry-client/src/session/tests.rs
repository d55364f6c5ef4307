//! Session manager behavior against scripted gateways.

use super::*;
use crate::{
    error::GatewayError,
    gateway::Credentials,
    storage::{MemoryStore, REFRESH_TOKEN_KEY, StorageError, TOKEN_KEY, USER_KEY},
};
use async_trait::async_trait;
use shared::models::Role;
use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

fn user(id: &str, role: &str) -> User {
    serde_json::from_value(serde_json::json!({
        "_id": id,
        "email": format!("{id}@clinic.test"),
        "role": role
    }))
    .unwrap()
}

fn rejected(message: &str) -> GatewayError {
    GatewayError::Rejected {
        status: Some(400),
        message: message.to_string(),
    }
}

/// Gateway whose answers are fixed up front. Unscripted calls are rejected.
struct ScriptedGateway {
    login: Result<Credentials, GatewayError>,
    register: Result<Option<User>, GatewayError>,
    logout: Result<(), GatewayError>,
    refresh: Result<String, GatewayError>,
    profile: Result<User, GatewayError>,
    update: Result<User, GatewayError>,
    store: Option<MemoryStore>,
    calls: Mutex<Vec<&'static str>>,
    token_at_logout: Mutex<Option<String>>,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self {
            login: Err(rejected("login not scripted")),
            register: Err(rejected("register not scripted")),
            logout: Ok(()),
            refresh: Err(rejected("refresh not scripted")),
            profile: Err(rejected("profile not scripted")),
            update: Err(rejected("update not scripted")),
            store: None,
            calls: Mutex::new(Vec::new()),
            token_at_logout: Mutex::new(None),
        }
    }
}

impl ScriptedGateway {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AuthGateway for ScriptedGateway {
    async fn login(&self, _email: &str, _password: &str) -> Result<Credentials, GatewayError> {
        self.record("login");
        self.login.clone()
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<Option<User>, GatewayError> {
        self.record("register");
        self.register.clone()
    }

    async fn logout(&self) -> Result<(), GatewayError> {
        self.record("logout");
        if let Some(store) = &self.store {
            *self.token_at_logout.lock().unwrap() = store.get(TOKEN_KEY);
        }
        self.logout.clone()
    }

    async fn refresh_token(&self) -> Result<String, GatewayError> {
        self.record("refresh");
        self.refresh.clone()
    }

    async fn get_user_profile(&self) -> Result<User, GatewayError> {
        self.record("profile");
        self.profile.clone()
    }

    async fn update_user_profile(&self, _update: &ProfileUpdate) -> Result<User, GatewayError> {
        self.record("update_profile");
        self.update.clone()
    }

    async fn update_avatar(&self, _update: &AvatarUpdate) -> Result<User, GatewayError> {
        self.record("update_avatar");
        self.update.clone()
    }
}

/// Memory store that can be told to refuse writes.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: Arc<AtomicBool>,
}

impl SessionStore for FlakyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io("disk full".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

fn manager(gateway: ScriptedGateway, store: &MemoryStore) -> SessionManager<ScriptedGateway> {
    SessionManager::new(gateway, Arc::new(store.clone()))
}

fn seed(store: &MemoryStore, refresh: Option<&str>) {
    storage::persist_user(store, &user("cached", "user")).unwrap();
    store.set(TOKEN_KEY, "T0").unwrap();
    if let Some(refresh) = refresh {
        store.set(REFRESH_TOKEN_KEY, refresh).unwrap();
    }
}

fn credentials(role: &str) -> Credentials {
    Credentials {
        user: user("fresh", role),
        access_token: "T1".to_string(),
        refresh_token: "R1".to_string(),
    }
}

async fn signed_in(store: &MemoryStore, gateway: ScriptedGateway) -> SessionManager<ScriptedGateway> {
    let gateway = ScriptedGateway {
        login: Ok(credentials("user")),
        ..gateway
    };
    let manager = manager(gateway, store);
    manager.login("fresh@clinic.test", "pw").await.unwrap();
    manager
}

#[test]
fn test_new_manager_starts_loading() {
    let store = MemoryStore::new();
    let manager = manager(ScriptedGateway::default(), &store);
    let session = manager.snapshot();
    assert!(session.is_loading());
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
}

#[test]
fn test_session_debug_hides_tokens() {
    let session = Session::authenticated(user("u1", "user"), "T1".to_string(), Some("R1".to_string()));
    let debug = format!("{session:?}");
    assert!(debug.contains("u1"));
    assert!(!debug.contains("T1"));
    assert!(!debug.contains("R1"));
}

#[test]
fn test_terminal_phases() {
    assert!(RestorePhase::Confirmed.is_terminal());
    assert!(RestorePhase::Cleared.is_terminal());
    assert!(RestorePhase::Anonymous.is_terminal());
    assert!(!RestorePhase::Restore.is_terminal());
    assert!(!RestorePhase::Validate.is_terminal());
    assert!(!RestorePhase::Refresh.is_terminal());
}

#[tokio::test]
async fn test_initialize_without_cache_is_anonymous() {
    let store = MemoryStore::new();
    let manager = manager(ScriptedGateway::default(), &store);

    assert_eq!(manager.initialize().await, RestorePhase::Anonymous);
    let session = manager.snapshot();
    assert!(!session.is_loading());
    assert!(!session.is_authenticated());
    assert!(manager.gateway().calls().is_empty());
}

#[tokio::test]
async fn test_initialize_token_without_user_is_anonymous() {
    let store = MemoryStore::new();
    store.set(TOKEN_KEY, "T0").unwrap();
    let manager = manager(ScriptedGateway::default(), &store);

    assert_eq!(manager.initialize().await, RestorePhase::Anonymous);
    assert!(!manager.snapshot().is_loading());
}

#[tokio::test]
async fn test_initialize_confirms_and_replaces_cached_user() {
    let store = MemoryStore::new();
    seed(&store, Some("R0"));
    let gateway = ScriptedGateway {
        profile: Ok(user("cached", "admin")),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);

    assert_eq!(manager.initialize().await, RestorePhase::Confirmed);
    let session = manager.snapshot();
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.user().unwrap().role, Role::Admin);
    assert_eq!(session.access_token(), Some("T0"));

    let stored: User = serde_json::from_str(&store.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored.role, Role::Admin);
}

#[tokio::test]
async fn test_subscribers_see_settled_session() {
    let store = MemoryStore::new();
    seed(&store, Some("R0"));
    let gateway = ScriptedGateway {
        profile: Ok(user("cached", "user")),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);
    let mut updates = manager.subscribe();

    manager.initialize().await;

    // Only the latest value is retained; it must be the settled one.
    assert!(updates.has_changed().unwrap());
    let latest = updates.borrow_and_update().clone();
    assert!(latest.is_authenticated());
    assert!(!latest.is_loading());
}

#[tokio::test]
async fn test_initialize_refreshes_after_failed_validation() {
    let store = MemoryStore::new();
    seed(&store, Some("R0"));
    let gateway = ScriptedGateway {
        profile: Err(rejected("jwt expired")),
        refresh: Ok("T2".to_string()),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);

    assert_eq!(manager.initialize().await, RestorePhase::Confirmed);
    let session = manager.snapshot();
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.access_token(), Some("T2"));
    assert_eq!(session.refresh_token(), Some("R0"));
    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("T2"));
    assert_eq!(manager.gateway().calls(), vec!["profile", "refresh"]);
}

#[tokio::test]
async fn test_initialize_clears_when_refresh_fails() {
    let store = MemoryStore::new();
    seed(&store, Some("R0"));
    let gateway = ScriptedGateway {
        profile: Err(GatewayError::Connectivity),
        refresh: Err(rejected("refresh token expired")),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);

    assert_eq!(manager.initialize().await, RestorePhase::Cleared);
    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(session.user().is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_initialize_without_refresh_token_clears() {
    let store = MemoryStore::new();
    seed(&store, None);
    let gateway = ScriptedGateway {
        profile: Err(rejected("jwt expired")),
        refresh: Ok("T2".to_string()),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);

    assert_eq!(manager.initialize().await, RestorePhase::Cleared);
    assert!(!manager.snapshot().is_loading());
    assert_eq!(manager.gateway().calls(), vec!["profile"]);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_persists_before_publishing() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        login: Ok(credentials("admin")),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);
    let mut updates = manager.subscribe();

    let user = manager.login("a@b.com", "pw").await.unwrap();
    assert_eq!(user.role, Role::Admin);

    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("T1"));
    assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    let stored: User = serde_json::from_str(&store.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored.role, Role::Admin);

    let session = updates.borrow_and_update().clone();
    assert!(session.is_authenticated());
    assert!(!session.is_loading());
    assert_eq!(session.access_token(), Some("T1"));
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let store = MemoryStore::new();
    let manager = manager(ScriptedGateway::default(), &store);

    assert_eq!(
        manager.login("  ", "pw").await,
        Err(SessionError::MissingCredentials)
    );
    assert_eq!(
        manager.login("a@b.com", "").await,
        Err(SessionError::MissingCredentials)
    );
    assert!(manager.gateway().calls().is_empty());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let store = MemoryStore::new();
    let manager = signed_in(&store, ScriptedGateway::default()).await;
    let before = manager.snapshot();

    let manager = SessionManager {
        gateway: ScriptedGateway {
            login: Err(rejected("Wrong password")),
            ..ScriptedGateway::default()
        },
        store: manager.store,
        state: manager.state,
    };
    let err = manager.login("fresh@clinic.test", "nope").await.unwrap_err();

    assert_eq!(err.to_string(), "Wrong password");
    assert_eq!(manager.snapshot(), before);
    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_failed_login_leaves_anonymous_session_anonymous() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        login: Err(GatewayError::Timeout(crate::error::LOGIN_TIMEOUT_MESSAGE)),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);
    manager.initialize().await;

    let err = manager.login("a@b.com", "pw").await.unwrap_err();
    assert_eq!(err.to_string(), crate::error::LOGIN_TIMEOUT_MESSAGE);
    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_login_storage_failure_restores_previous_state() {
    let store = FlakyStore::default();
    let gateway = ScriptedGateway {
        login: Ok(credentials("user")),
        ..ScriptedGateway::default()
    };
    let manager = SessionManager::new(gateway, Arc::new(store.clone()));
    manager.initialize().await;

    store.fail_writes.store(true, Ordering::SeqCst);
    let err = manager.login("a@b.com", "pw").await.unwrap_err();

    assert!(matches!(err, SessionError::Storage(_)));
    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn test_register_does_not_sign_in() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        register: Ok(Some(user("new", "user"))),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);
    manager.initialize().await;

    let request = RegisterRequest {
        email: "new@clinic.test".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
        avatar: None,
    };
    let created = manager.register(&request).await.unwrap();

    assert_eq!(created.unwrap().id, "new");
    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_register_checks_input_locally() {
    let store = MemoryStore::new();
    let manager = manager(ScriptedGateway::default(), &store);

    let mismatch = RegisterRequest {
        email: "new@clinic.test".to_string(),
        password: "pw".to_string(),
        confirm_password: "other".to_string(),
        avatar: None,
    };
    assert_eq!(
        manager.register(&mismatch).await,
        Err(SessionError::PasswordMismatch)
    );

    let missing = RegisterRequest {
        email: String::new(),
        ..mismatch
    };
    assert_eq!(
        manager.register(&missing).await,
        Err(SessionError::MissingCredentials)
    );
    assert!(manager.gateway().calls().is_empty());
}

#[tokio::test]
async fn test_register_surfaces_server_message() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        register: Err(rejected("Email already registered")),
        ..ScriptedGateway::default()
    };
    let manager = manager(gateway, &store);

    let request = RegisterRequest {
        email: "dup@clinic.test".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
        avatar: None,
    };
    let err = manager.register(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
    assert!(!manager.snapshot().is_loading());
}

#[tokio::test]
async fn test_logout_clears_even_when_remote_fails() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        logout: Err(GatewayError::Connectivity),
        store: Some(store.clone()),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;
    store.set(storage::LEGACY_ACCESS_TOKEN_KEY, "old").unwrap();

    manager.logout().await.unwrap();

    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());
    assert!(session.user().is_none());
    assert!(session.access_token().is_none());
    assert!(session.refresh_token().is_none());
    assert!(store.get(TOKEN_KEY).is_none());
    assert!(store.get(REFRESH_TOKEN_KEY).is_none());
    assert!(store.get(USER_KEY).is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_logout_sends_credentials_before_clearing() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        store: Some(store.clone()),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;

    manager.logout().await.unwrap();

    assert_eq!(
        manager.gateway().token_at_logout.lock().unwrap().as_deref(),
        Some("T1")
    );
}

#[tokio::test]
async fn test_refresh_replaces_only_access_token() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        refresh: Ok("T2".to_string()),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;
    let before = manager.snapshot();

    manager.refresh_token().await.unwrap();

    let after = manager.snapshot();
    assert_eq!(after.access_token(), Some("T2"));
    assert_eq!(after.refresh_token(), before.refresh_token());
    assert_eq!(after.user(), before.user());
    assert!(after.is_authenticated());
    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("T2"));
    assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
}

#[tokio::test]
async fn test_refresh_failure_clears_everything() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        refresh: Err(rejected("refresh token revoked")),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;

    let err = manager.refresh_token().await.unwrap_err();

    assert_eq!(err.to_string(), "refresh token revoked");
    let session = manager.snapshot();
    assert!(!session.is_authenticated());
    assert!(session.user().is_none());
    assert!(session.access_token().is_none());
    assert!(session.refresh_token().is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_refresh_without_refresh_token_fails_fast() {
    let store = MemoryStore::new();
    let manager = manager(
        ScriptedGateway {
            refresh: Ok("T2".to_string()),
            ..ScriptedGateway::default()
        },
        &store,
    );
    manager.initialize().await;

    assert_eq!(
        manager.refresh_token().await,
        Err(SessionError::MissingRefreshToken)
    );
    assert!(manager.gateway().calls().is_empty());
}

#[tokio::test]
async fn test_profile_update_keeps_tokens() {
    let store = MemoryStore::new();
    let mut renamed = user("fresh", "user");
    renamed.name = Some("Dr. Sari".to_string());
    let gateway = ScriptedGateway {
        update: Ok(renamed.clone()),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;

    let update = ProfileUpdate {
        name: Some("Dr. Sari".to_string()),
        email: None,
    };
    let updated = manager.update_profile(&update).await.unwrap();
    assert_eq!(updated, renamed);

    let session = manager.snapshot();
    assert_eq!(session.user(), Some(&renamed));
    assert_eq!(session.access_token(), Some("T1"));
    assert_eq!(session.refresh_token(), Some("R1"));
    assert!(session.is_authenticated());

    let stored: User = serde_json::from_str(&store.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(stored.name.as_deref(), Some("Dr. Sari"));
    assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_failed_avatar_update_leaves_session_unchanged() {
    let store = MemoryStore::new();
    let gateway = ScriptedGateway {
        update: Err(rejected("Image too large")),
        ..ScriptedGateway::default()
    };
    let manager = signed_in(&store, gateway).await;
    let before = manager.snapshot();
    let stored_before = store.get(USER_KEY);

    let update = AvatarUpdate {
        avatar: "data:image/png;base64,AAAA".to_string(),
    };
    let err = manager.update_avatar(&update).await.unwrap_err();

    assert_eq!(err.to_string(), "Image too large");
    assert_eq!(manager.snapshot(), before);
    assert_eq!(store.get(USER_KEY), stored_before);
}
