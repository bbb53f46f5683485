//! Database secret resolution.
//!
//! # Contract
//! - Config YAML stores only the env var NAME of the connection URL
//!   (`database.url_env`).
//! - When that variable is unset or blank, the connection is composed from
//!   `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`.
//! - `Debug` redacts every credential.
//! - Error messages name env vars, never values.

use anyhow::{bail, Context, Result};

use crate::settings::DatabaseSection;

pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_NAME: &str = "DB_NAME";

const DEFAULT_DB_PORT: u16 = 5432;

/// Resolved database credentials, built once at startup.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseSecrets {
    /// Full connection URL read from the env var `var`.
    Url { var: String, url: String },
    /// Discrete connection parts.
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        database: String,
    },
}

impl std::fmt::Debug for DatabaseSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseSecrets::Url { var, .. } => f
                .debug_struct("Url")
                .field("var", var)
                .field("url", &"<REDACTED>")
                .finish(),
            DatabaseSecrets::Parts {
                host,
                port,
                user,
                password,
                database,
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("password", &password.as_ref().map(|_| "<REDACTED>"))
                .field("database", database)
                .finish(),
        }
    }
}

impl DatabaseSecrets {
    /// Short description for logs; never contains credentials.
    pub fn describe(&self) -> String {
        match self {
            DatabaseSecrets::Url { var, .. } => format!("url from env {var}"),
            DatabaseSecrets::Parts {
                host,
                port,
                database,
                ..
            } => format!("{host}:{port}/{database}"),
        }
    }
}

/// Resolve from the process environment.
pub fn resolve_database_secrets(cfg: &DatabaseSection) -> Result<DatabaseSecrets> {
    resolve_database_secrets_with(cfg, |name| std::env::var(name).ok())
}

/// Resolve with an injected lookup; blank values count as unset.
pub fn resolve_database_secrets_with<F>(cfg: &DatabaseSection, lookup: F) -> Result<DatabaseSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let url_var = cfg.url_env.trim();
    if let Some(url) = get(url_var) {
        return Ok(DatabaseSecrets::Url {
            var: url_var.to_string(),
            url,
        });
    }

    let Some(host) = get(ENV_DB_HOST) else {
        bail!(
            "SECRETS_MISSING: neither '{}' nor '{}' is set; \
             provide a connection URL or DB_* connection parts",
            url_var,
            ENV_DB_HOST
        );
    };
    let Some(user) = get(ENV_DB_USER) else {
        bail!("SECRETS_MISSING: required env var '{}' is not set or empty", ENV_DB_USER);
    };
    let Some(database) = get(ENV_DB_NAME) else {
        bail!("SECRETS_MISSING: required env var '{}' is not set or empty", ENV_DB_NAME);
    };
    let port = match get(ENV_DB_PORT) {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .with_context(|| format!("SECRETS_INVALID: env var '{ENV_DB_PORT}' is not a port"))?,
        None => DEFAULT_DB_PORT,
    };

    Ok(DatabaseSecrets::Parts {
        host,
        port,
        user,
        password: get(ENV_DB_PASSWORD),
        database,
    })
}
