//! Authentication CLI commands
//!
//! Sign in, sign out, registration and administrator seeding. A successful
//! login stores its token in the token file so later commands can use it.

use std::fs::{self, OpenOptions};
use std::io::Write;

use clap::Subcommand;
use tracing::debug;
use zeroize::Zeroizing;

use crate::config::paths::InventoryPaths;
use crate::config::settings::Settings;
use crate::error::{InventoryError, InventoryResult};
use crate::models::{NewUser, Role};
use crate::services::auth::{DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME};
use crate::services::{AuthService, Identity};
use crate::storage::Storage;

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in and remember the session token
    Login {
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Create a user account
    Register {
        username: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
        #[arg(long, default_value = "")]
        full_name: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Role (user or admin; admin requires an admin session)
        #[arg(long, default_value = "user")]
        role: String,
    },
}

/// Admin subcommands
#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the default administrator if none exists
    Seed,
}

/// Pick the token from the flag/environment, else the token file
pub fn resolve_token(paths: &InventoryPaths, explicit: Option<&str>) -> Option<String> {
    if let Some(token) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    match fs::read_to_string(paths.token_file()) {
        Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
        Err(e) => {
            debug!(error = %e, "No saved token");
            None
        }
    }
}

/// Authenticate the caller or fail with `Unauthorized`
pub fn require_identity(
    storage: &Storage,
    settings: &Settings,
    explicit_token: Option<&str>,
) -> InventoryResult<Identity> {
    let token = resolve_token(storage.paths(), explicit_token).ok_or_else(|| {
        InventoryError::Unauthorized(
            "not signed in. Run 'inventory auth login <username>' or pass --token".into(),
        )
    })?;

    AuthService::new(storage, settings).authenticate(&token)
}

fn read_password(given: Option<String>) -> InventoryResult<Zeroizing<String>> {
    match given {
        Some(password) => Ok(Zeroizing::new(password)),
        None => rpassword::prompt_password("Password: ")
            .map(Zeroizing::new)
            .map_err(|e| InventoryError::Io(format!("Failed to read password: {}", e))),
    }
}

/// Write the token file, readable by the owner only on unix
fn save_token(paths: &InventoryPaths, token: &str) -> InventoryResult<()> {
    let token_file = paths.token_file();
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(&token_file)
        .map_err(|e| InventoryError::Io(format!("Failed to save token: {}", e)))?;

    // `mode` only applies when the file is created
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|e| InventoryError::Io(format!("Failed to restrict token file: {}", e)))?;
    }

    file.write_all(token.as_bytes())
        .map_err(|e| InventoryError::Io(format!("Failed to save token: {}", e)))?;

    debug!(path = %token_file.display(), "Saved session token");
    Ok(())
}

/// Handle an auth command
pub fn handle_auth_command(
    storage: &Storage,
    settings: &Settings,
    explicit_token: Option<&str>,
    cmd: AuthCommands,
) -> InventoryResult<()> {
    let service = AuthService::new(storage, settings);
    let paths = storage.paths();

    match cmd {
        AuthCommands::Login { username, password } => {
            let password = read_password(password)?;
            let session = service.login(&username, &password)?;

            save_token(paths, &session.token)?;

            println!("Signed in as {}", username.trim());
            println!("Token expires {}", session.expires_at.format("%Y-%m-%d %H:%M UTC"));
            println!("{}", session.token);
        }

        AuthCommands::Logout => {
            let token = resolve_token(paths, explicit_token)
                .ok_or_else(|| InventoryError::Unauthorized("not signed in".into()))?;

            let existed = service.logout(&token)?;

            let token_file = paths.token_file();
            if token_file.exists() {
                fs::remove_file(&token_file)
                    .map_err(|e| InventoryError::Io(format!("Failed to remove token: {}", e)))?;
            }

            if existed {
                println!("Signed out.");
            } else {
                println!("Session had already ended.");
            }
        }

        AuthCommands::Whoami => {
            let identity = require_identity(storage, settings, explicit_token)?;
            let user = service.current_user(&identity)?;

            println!("{} ({})", user.username, user.role);
            if !user.full_name.is_empty() {
                println!("  Name:  {}", user.full_name);
            }
            if !user.email.is_empty() {
                println!("  Email: {}", user.email);
            }
        }

        AuthCommands::Register {
            username,
            password,
            full_name,
            email,
            role,
        } => {
            let role: Role = role.parse().map_err(InventoryError::Validation)?;

            // Admin accounts need an admin session
            let caller = if role.is_admin() {
                Some(require_identity(storage, settings, explicit_token)?)
            } else {
                None
            };

            let password = read_password(password)?;
            let user = service.register(
                NewUser {
                    username,
                    password: password.as_str().to_owned(),
                    full_name,
                    email,
                    role,
                },
                caller.as_ref(),
            )?;

            println!("Registered {} ({})", user.username, user.role);
        }
    }

    Ok(())
}

/// Handle an admin command
pub fn handle_admin_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AdminCommands,
) -> InventoryResult<()> {
    match cmd {
        AdminCommands::Seed => {
            if AuthService::new(storage, settings).ensure_admin()? {
                println!(
                    "Created administrator '{}' with password '{}'. Change it after signing in.",
                    DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD
                );
            } else {
                println!("An administrator already exists.");
            }
        }
    }

    Ok(())
}
