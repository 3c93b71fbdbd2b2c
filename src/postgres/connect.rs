use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, warn};

use crate::config::DataSourceConfig;
use crate::error::SqlConnectorError;

/// An open PostgreSQL connection plus the task driving its socket.
pub struct PostgresConnection {
    pub(crate) client: Client,
    driver: JoinHandle<()>,
}

impl PostgresConnection {
    /// Close the connection. Best-effort: teardown problems are logged,
    /// never returned, so they cannot mask the outcome of the query that
    /// ran on this connection.
    pub(crate) async fn close(self) {
        // Dropping the client ends the driver task's connection future.
        drop(self.client);
        if let Err(e) = self.driver.await {
            warn!(error = %e, "postgres connection driver ended abnormally");
        }
        info!("postgres connection closed");
    }
}

/// Open a connection, confirm liveness with a trivial round trip, and hand
/// it out.
///
/// # Errors
///
/// Returns `SqlConnectorError::ConnectionError` naming the host and
/// database (never credentials) with the underlying cause.
pub async fn open_connection(
    config: &DataSourceConfig,
) -> Result<PostgresConnection, SqlConnectorError> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config.host(&config.host);
    pg_config.port(config.port);
    pg_config.dbname(&config.database);
    pg_config.user(&config.username);
    pg_config.password(config.password.expose());
    apply_extra_options(&mut pg_config, &config.extra_options);

    let (client, driver) = if config.use_tls {
        let tls = native_tls::TlsConnector::new()
            .map_err(|e| connection_error(config, &format!("TLS setup failed: {e}")))?;
        let tls = postgres_native_tls::MakeTlsConnector::new(tls);
        let (client, connection) = pg_config
            .connect(tls)
            .await
            .map_err(|e| connection_error(config, &e.to_string()))?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection task failed");
            }
        });
        (client, driver)
    } else {
        let (client, connection) = pg_config
            .connect(NoTls)
            .await
            .map_err(|e| connection_error(config, &e.to_string()))?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "postgres connection task failed");
            }
        });
        (client, driver)
    };

    // Liveness round trip before the connection is handed out.
    if let Err(e) = client.simple_query("SELECT 1").await {
        let failure = connection_error(config, &e.to_string());
        drop(client);
        let _ = driver.await;
        return Err(failure);
    }

    info!(
        host = %config.host,
        database = %config.database,
        "postgres connection established"
    );
    Ok(PostgresConnection { client, driver })
}

fn connection_error(config: &DataSourceConfig, cause: &str) -> SqlConnectorError {
    SqlConnectorError::ConnectionError(format!(
        "PostgreSQL connection failed for {}:{}/{}: {cause}",
        config.host, config.port, config.database
    ))
}

fn apply_extra_options(
    pg_config: &mut tokio_postgres::Config,
    extra_options: &HashMap<String, JsonValue>,
) {
    for (key, value) in extra_options {
        match key.as_str() {
            "applicationName" => {
                if let Some(name) = value.as_str() {
                    pg_config.application_name(name);
                }
            }
            "connectTimeout" => {
                if let Some(secs) = value.as_u64() {
                    pg_config.connect_timeout(Duration::from_secs(secs));
                }
            }
            "options" => {
                if let Some(options) = value.as_str() {
                    pg_config.options(options);
                }
            }
            other => {
                debug!(option = other, "ignoring unrecognized postgres option");
            }
        }
    }
}
