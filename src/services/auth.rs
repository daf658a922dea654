//! Authentication service
//!
//! Registration, password login, bearer-token validation and seeding of the
//! first administrator.

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::config::settings::{Settings, MAX_SESSION_TTL_HOURS};
use crate::crypto::{generate_token, hash_password, verify_password};
use crate::error::{InventoryError, InventoryResult};
use crate::models::{NewUser, Role, User, UserId};
use crate::storage::{Session, Storage};

/// Username of the seeded administrator
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Password of the seeded administrator
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// The authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Identity {
    fn of(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    /// Fail with `Forbidden` unless the caller is an administrator
    pub fn require_admin(&self) -> InventoryResult<()> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(InventoryError::Forbidden(format!(
                "user '{}' is not an administrator",
                self.username
            )))
        }
    }
}

/// Service for users and sessions
pub struct AuthService<'a> {
    storage: &'a Storage,
    session_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new auth service
    ///
    /// A session lifetime outside `1..=MAX_SESSION_TTL_HOURS` falls back to
    /// 24 hours.
    pub fn new(storage: &'a Storage, settings: &Settings) -> Self {
        let hours = settings.session_ttl_hours;
        let session_ttl = Some(hours)
            .filter(|h| (1..=MAX_SESSION_TTL_HOURS).contains(h))
            .and_then(Duration::try_hours)
            .unwrap_or_else(|| {
                warn!(session_ttl_hours = hours, "Session lifetime out of range, using 24 hours");
                Duration::hours(24)
            });

        Self {
            storage,
            session_ttl,
        }
    }

    /// Register a new user
    ///
    /// Anyone may register a plain user; an admin account needs an admin
    /// `caller`.
    pub fn register(&self, input: NewUser, caller: Option<&Identity>) -> InventoryResult<User> {
        let username = input.username.trim();
        if username.is_empty() {
            return Err(InventoryError::Validation("Username cannot be empty".into()));
        }
        if input.password.is_empty() {
            return Err(InventoryError::Validation("Password cannot be empty".into()));
        }

        if input.role.is_admin() {
            match caller {
                Some(identity) => identity.require_admin()?,
                None => {
                    return Err(InventoryError::Forbidden(
                        "creating an administrator requires an administrator".into(),
                    ))
                }
            }
        }

        let mut user = User::new(username, hash_password(&input.password)?, input.role);
        user.full_name = input.full_name.trim().to_string();
        user.email = input.email.trim().to_string();

        self.storage.users.insert(user.clone())?;
        self.storage.users.save()?;

        info!(user_id = %user.id, username = %user.username, role = %user.role, "User registered");
        Ok(user)
    }

    /// Exchange a username and password for a session token
    pub fn login(&self, username: &str, password: &str) -> InventoryResult<Session> {
        let user = self
            .storage
            .users
            .get_by_username(username)?
            .filter(|u| verify_password(password, &u.password_hash))
            .ok_or_else(|| {
                warn!(username = %username.trim(), "Rejected login");
                InventoryError::Unauthorized("invalid username or password".into())
            })?;

        let now = Utc::now();
        let purged = self.storage.sessions.purge_expired(now)?;
        if purged > 0 {
            debug!(purged, "Dropped expired sessions");
        }

        let session = Session {
            token: generate_token(),
            user_id: user.id,
            created_at: now,
            expires_at: now.checked_add_signed(self.session_ttl).ok_or_else(|| {
                InventoryError::Config("session lifetime overflows the clock".into())
            })?,
        };

        self.storage.sessions.insert(session.clone())?;
        self.storage.sessions.save()?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(session)
    }

    /// Resolve a bearer token to the identity it was issued for
    pub fn authenticate(&self, token: &str) -> InventoryResult<Identity> {
        let token = token.trim();
        if token.is_empty() {
            return Err(InventoryError::Unauthorized("missing token".into()));
        }

        let session = match self.storage.sessions.get(token)? {
            Some(session) => session,
            None => {
                warn!("Rejected unknown token");
                return Err(InventoryError::Unauthorized("invalid token".into()));
            }
        };

        if session.is_expired(Utc::now()) {
            warn!(user_id = %session.user_id, "Rejected expired token");
            return Err(InventoryError::Unauthorized("token expired".into()));
        }

        let user = self.storage.users.get(session.user_id)?.ok_or_else(|| {
            warn!(user_id = %session.user_id, "Rejected token of a missing user");
            InventoryError::Unauthorized("user no longer exists".into())
        })?;

        Ok(Identity::of(&user))
    }

    /// Invalidate a session, returning whether it existed
    pub fn logout(&self, token: &str) -> InventoryResult<bool> {
        let removed = self.storage.sessions.remove(token.trim())?;
        if removed {
            self.storage.sessions.save()?;
            info!("Session ended");
        }
        Ok(removed)
    }

    /// The full account behind an identity
    pub fn current_user(&self, identity: &Identity) -> InventoryResult<User> {
        self.storage
            .users
            .get(identity.user_id)?
            .ok_or_else(|| InventoryError::user_not_found(identity.username.clone()))
    }

    /// Create the default administrator when there is none
    ///
    /// Returns `true` if an account was created.
    pub fn ensure_admin(&self) -> InventoryResult<bool> {
        if self.storage.users.has_admin()? {
            debug!("Administrator already present");
            return Ok(false);
        }

        let mut admin = User::new(
            DEFAULT_ADMIN_USERNAME,
            hash_password(DEFAULT_ADMIN_PASSWORD)?,
            Role::Admin,
        );
        admin.full_name = "Administrator".into();

        self.storage.users.insert(admin)?;
        self.storage.users.save()?;

        info!(username = DEFAULT_ADMIN_USERNAME, "Seeded administrator");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::InventoryPaths;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    fn new_user(username: &str, password: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            role,
            ..Default::default()
        }
    }

    #[test]
    fn test_register_and_login() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);

        let user = auth
            .register(new_user("staff", "pass1", Role::User), None)
            .unwrap();
        assert_ne!(user.password_hash, "pass1");

        let session = auth.login("Staff", "pass1").unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.expires_at - session.created_at, Duration::hours(24));

        let identity = auth.authenticate(&session.token).unwrap();
        assert_eq!(identity.username, "staff");
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn test_out_of_range_session_lifetime_falls_back() {
        let (_temp_dir, storage) = create_test_storage();
        let auth = AuthService::new(&storage, &Settings::default());
        auth.ensure_admin().unwrap();

        for hours in [i64::MAX / 1000, 0, -3] {
            let settings = Settings {
                session_ttl_hours: hours,
                ..Settings::default()
            };
            let session = AuthService::new(&storage, &settings)
                .login("admin", "admin123")
                .unwrap();
            assert_eq!(session.expires_at - session.created_at, Duration::hours(24));
        }

        let settings = Settings {
            session_ttl_hours: MAX_SESSION_TTL_HOURS,
            ..Settings::default()
        };
        let session = AuthService::new(&storage, &settings)
            .login("admin", "admin123")
            .unwrap();
        assert_eq!(
            session.expires_at - session.created_at,
            Duration::hours(MAX_SESSION_TTL_HOURS)
        );
    }

    #[test]
    fn test_register_validation() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);

        let result = auth.register(new_user("  ", "pw", Role::User), None);
        assert!(matches!(result, Err(InventoryError::Validation(_))));

        let result = auth.register(new_user("staff", "", Role::User), None);
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_register_duplicate_username() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);

        auth.register(new_user("staff", "pw", Role::User), None)
            .unwrap();
        let result = auth.register(new_user("STAFF", "pw", Role::User), None);
        assert!(matches!(result, Err(InventoryError::Duplicate { .. })));
    }

    #[test]
    fn test_admin_registration_requires_admin() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);

        let result = auth.register(new_user("boss", "pw", Role::Admin), None);
        assert!(matches!(result, Err(InventoryError::Forbidden(_))));

        let staff = auth
            .register(new_user("staff", "pw", Role::User), None)
            .unwrap();
        let result = auth.register(new_user("boss", "pw", Role::Admin), Some(&Identity::of(&staff)));
        assert!(matches!(result, Err(InventoryError::Forbidden(_))));

        auth.ensure_admin().unwrap();
        let admin = auth.authenticate(&auth.login("admin", "admin123").unwrap().token).unwrap();
        let boss = auth
            .register(new_user("boss", "pw", Role::Admin), Some(&admin))
            .unwrap();
        assert!(boss.role.is_admin());
    }

    #[test]
    fn test_login_rejects_bad_credentials() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);
        auth.register(new_user("staff", "right", Role::User), None)
            .unwrap();

        assert!(matches!(
            auth.login("staff", "wrong"),
            Err(InventoryError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login("nobody", "right"),
            Err(InventoryError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_invalid_and_expired_tokens_rejected() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);
        let user = auth
            .register(new_user("staff", "pw", Role::User), None)
            .unwrap();

        assert!(matches!(
            auth.authenticate("not-a-token"),
            Err(InventoryError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authenticate(""),
            Err(InventoryError::Unauthorized(_))
        ));

        let past = Utc::now() - Duration::hours(1);
        storage
            .sessions
            .insert(Session {
                token: "stale".into(),
                user_id: user.id,
                created_at: past - Duration::hours(24),
                expires_at: past,
            })
            .unwrap();
        assert!(matches!(
            auth.authenticate("stale"),
            Err(InventoryError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_logout_invalidates_token() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);
        auth.register(new_user("staff", "pw", Role::User), None)
            .unwrap();

        let session = auth.login("staff", "pw").unwrap();
        assert!(auth.logout(&session.token).unwrap());
        assert!(!auth.logout(&session.token).unwrap());
        assert!(auth.authenticate(&session.token).is_err());
    }

    #[test]
    fn test_ensure_admin_only_once() {
        let (_temp_dir, storage) = create_test_storage();
        let settings = Settings::default();
        let auth = AuthService::new(&storage, &settings);

        assert!(auth.ensure_admin().unwrap());
        assert!(!auth.ensure_admin().unwrap());
        assert_eq!(storage.users.count().unwrap(), 1);

        let identity = auth
            .authenticate(&auth.login("admin", "admin123").unwrap().token)
            .unwrap();
        assert!(identity.require_admin().is_ok());
        assert_eq!(auth.current_user(&identity).unwrap().full_name, "Administrator");
    }

    #[test]
    fn test_sessions_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let paths = InventoryPaths::with_base_dir(temp_dir.path().to_path_buf());
        let settings = Settings::default();

        let token = {
            let storage = Storage::open(paths.clone()).unwrap();
            let auth = AuthService::new(&storage, &settings);
            auth.ensure_admin().unwrap();
            auth.login("admin", "admin123").unwrap().token
        };

        let storage = Storage::open(paths).unwrap();
        let auth = AuthService::new(&storage, &settings);
        assert_eq!(auth.authenticate(&token).unwrap().username, "admin");
    }
}
