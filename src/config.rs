use std::env;
use std::str::FromStr;
use std::time::Duration;
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database: DatabaseConfig,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub connection_string: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number")?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT must be a valid number of seconds")?;

        let database = DatabaseConfig::from_env()?;

        let config = Config {
            port,
            database,
            request_timeout: Duration::from_secs(request_timeout_secs),
        };
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.request_timeout.as_secs() == 0 {
            anyhow::bail!("REQUEST_TIMEOUT must be greater than 0");
        }

        self.database.validate()
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let connection_string = env::var("DATABASE_URL")
            .context("DATABASE_URL environment variable is required")?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a valid number")?;

        let connection_timeout_secs = env::var("DATABASE_CONNECTION_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("DATABASE_CONNECTION_TIMEOUT must be a valid number of seconds")?;

        Ok(DatabaseConfig {
            connection_string,
            max_connections,
            connection_timeout: Duration::from_secs(connection_timeout_secs),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if !self.connection_string.starts_with("postgresql://")
            && !self.connection_string.starts_with("postgres://")
        {
            anyhow::bail!("DATABASE_URL must start with 'postgresql://' or 'postgres://'");
        }

        let parsed = self.pg_config()?;
        if parsed.get_dbname().map_or(true, |name| name.trim().is_empty()) {
            anyhow::bail!("DATABASE_URL must name a database");
        }

        if self.max_connections == 0 {
            anyhow::bail!("Max connections must be greater than 0");
        }

        if self.connection_timeout.as_secs() == 0 {
            anyhow::bail!("Connection timeout must be greater than 0");
        }

        Ok(())
    }

    /// Parses the connection string with the driver's own parser, so host,
    /// credentials and `sslmode` follow libpq rules.
    pub fn pg_config(&self) -> Result<tokio_postgres::Config> {
        tokio_postgres::Config::from_str(&self.connection_string)
            .context("DATABASE_URL is not a valid PostgreSQL connection string")
    }

    /// Host list for log lines; never includes credentials.
    pub fn display_host(&self) -> String {
        match self.pg_config() {
            Ok(parsed) => parsed
                .get_hosts()
                .iter()
                .map(|host| match host {
                    tokio_postgres::config::Host::Tcp(name) => name.clone(),
                    #[cfg(unix)]
                    tokio_postgres::config::Host::Unix(path) => path.display().to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Err(_) => "<invalid>".to_string(),
        }
    }
}
