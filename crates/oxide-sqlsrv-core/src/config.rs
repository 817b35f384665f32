//! Connection configuration.

use serde::{Deserialize, Serialize};

use crate::client::{ConnectionParams, Credentials, Encoding};
use crate::error::{DatabaseError, Result};

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_collation() -> String {
    "SQL_Latin1_General_CP1_CI_AS".to_string()
}

/// Settings for one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Server host or instance name.
    pub hostname: String,
    /// TCP port, appended as `host,port` when set.
    pub port: Option<u16>,
    /// Login name. Empty together with `password` selects integrated auth.
    pub username: String,
    /// Password.
    pub password: String,
    /// Initial database.
    pub database: String,
    /// Prefix applied to table names.
    pub db_prefix: String,
    /// Client character set.
    #[serde(default = "default_charset")]
    pub charset: String,
    /// Collation used for CREATE DATABASE and table attributes.
    #[serde(default = "default_collation")]
    pub collation: String,
    /// Encrypt the transport.
    pub encrypt: bool,
    /// Raise on DDL failures instead of returning `false`.
    pub debug: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            db_prefix: String::new(),
            charset: default_charset(),
            collation: default_collation(),
            encrypt: false,
            debug: false,
        }
    }
}

impl ConnectionConfig {
    /// Creates a config for `hostname` with defaults elsewhere.
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Configuration`] when the document does
    /// not describe a valid configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DatabaseError::Configuration(e.to_string()))
    }

    /// Sets the port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets login credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Sets the initial database.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Sets the table prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.db_prefix = prefix.into();
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Sets the collation.
    #[must_use]
    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = collation.into();
        self
    }

    /// Enables or disables transport encryption.
    #[must_use]
    pub const fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Enables or disables debug mode.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The server string handed to the client: `host` or `host,port`.
    #[must_use]
    pub fn server(&self) -> String {
        match self.port {
            Some(port) => format!("{},{port}", self.hostname),
            None => self.hostname.clone(),
        }
    }

    /// Builds the native connection parameters.
    ///
    /// Credentials are omitted entirely when both username and password
    /// are empty, so the server falls back to integrated authentication.
    #[must_use]
    pub fn connection_params(&self) -> ConnectionParams {
        let credentials = if self.username.is_empty() && self.password.is_empty() {
            None
        } else {
            Some(Credentials {
                uid: self.username.clone(),
                pwd: self.password.clone(),
            })
        };

        ConnectionParams {
            credentials,
            database: self.database.clone(),
            character_set: Encoding::from_charset(&self.charset),
            encrypt: self.encrypt,
            return_dates_as_strings: true,
        }
    }
}
