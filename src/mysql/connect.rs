use std::collections::HashMap;

use mysql_async::prelude::Queryable;
use mysql_async::{Conn, OptsBuilder, SslOpts};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use crate::config::DataSourceConfig;
use crate::error::SqlConnectorError;

/// Open a connection and confirm liveness with a protocol ping.
///
/// # Errors
///
/// Returns `SqlConnectorError::ConnectionError` naming the host and
/// database (never credentials) with the underlying cause.
pub async fn open_connection(config: &DataSourceConfig) -> Result<Conn, SqlConnectorError> {
    let mut opts = OptsBuilder::default()
        .ip_or_hostname(config.host.clone())
        .tcp_port(config.port)
        .db_name(Some(config.database.clone()))
        .user(Some(config.username.clone()))
        .pass(Some(config.password.expose().to_string()));
    if config.use_tls {
        opts = opts.ssl_opts(Some(SslOpts::default()));
    }
    opts = apply_extra_options(opts, &config.extra_options);

    let mut conn = Conn::new(opts)
        .await
        .map_err(|e| connection_error(config, &e.to_string()))?;

    // Liveness round trip before the connection is handed out.
    conn.ping()
        .await
        .map_err(|e| connection_error(config, &e.to_string()))?;

    info!(
        host = %config.host,
        database = %config.database,
        "mysql connection established"
    );
    Ok(conn)
}

/// Close the connection. Best-effort: teardown problems are logged, never
/// returned, so they cannot mask the outcome of the query that ran on this
/// connection.
pub(crate) async fn close(conn: Conn) {
    if let Err(e) = conn.disconnect().await {
        error!(error = %e, "error closing mysql connection");
    } else {
        info!("mysql connection closed");
    }
}

fn connection_error(config: &DataSourceConfig, cause: &str) -> SqlConnectorError {
    SqlConnectorError::ConnectionError(format!(
        "MySQL connection failed for {}:{}/{}: {cause}",
        config.host, config.port, config.database
    ))
}

fn apply_extra_options(
    mut opts: OptsBuilder,
    extra_options: &HashMap<String, JsonValue>,
) -> OptsBuilder {
    for (key, value) in extra_options {
        match key.as_str() {
            "tcpNodelay" => {
                if let Some(enabled) = value.as_bool() {
                    opts = opts.tcp_nodelay(enabled);
                }
            }
            "waitTimeout" => {
                if let Some(secs) = value.as_u64() {
                    opts = opts.wait_timeout(Some(usize::try_from(secs).unwrap_or(usize::MAX)));
                }
            }
            other => {
                debug!(option = other, "ignoring unrecognized mysql option");
            }
        }
    }
    opts
}
