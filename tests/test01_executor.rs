use std::collections::HashMap;

use sql_connector::prelude::*;
use sql_connector::test_utils::{MockConnector, sample_config};
use tokio::runtime::Runtime;

fn store_with(id: &str, config: DataSourceConfig) -> MemoryDataSourceStore {
    let store = MemoryDataSourceStore::new();
    store.insert(id, config);
    store
}

fn id_params() -> NamedParams {
    HashMap::from([("id".to_string(), RowValues::Int(7))])
}

#[test]
fn unknown_data_source_fails_before_any_connection() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new(DatabaseType::Postgres);
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(MemoryDataSourceStore::new(), connector);

        let err = executor
            .execute("missing", "SELECT 1", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::NotFound(_)));
        assert_eq!(activity.connect_count(), 0);
    });
    Ok(())
}

#[test]
fn disabled_data_source_fails_before_any_connection() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut config = sample_config(DatabaseType::Postgres);
        config.enabled = false;
        let connector = MockConnector::new(DatabaseType::Postgres);
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(store_with("ds1", config), connector);

        let err = executor
            .execute("ds1", "SELECT 1", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::Disabled(_)));
        assert_eq!(activity.connect_count(), 0);
    });
    Ok(())
}

#[test]
fn mutating_statement_never_reaches_the_connection_manager()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new(DatabaseType::Postgres);
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Postgres)),
            connector,
        );

        let err = executor
            .execute("ds1", "DROP TABLE users;", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::QueryError(_)));
        assert_eq!(activity.connect_count(), 0);
        assert_eq!(activity.close_count(), 0);
    });
    Ok(())
}

#[test]
fn postgres_execution_binds_and_closes_once() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new(DatabaseType::Postgres).with_rows(
            vec!["id", "name"],
            vec![vec![RowValues::Int(7), RowValues::Text("alice".into())]],
        );
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Postgres)),
            connector,
        );

        let result = executor
            .execute("ds1", "SELECT * FROM users WHERE id = :id", &id_params())
            .await
            .unwrap();

        assert_eq!(result.row_count, 1);
        assert_eq!(result.rows[0].get("name"), Some(&RowValues::Text("alice".into())));

        let queries = activity.recorded_queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].0, "SELECT * FROM users WHERE id = $1");
        assert_eq!(queries[0].1, vec![RowValues::Int(7)]);

        assert_eq!(activity.connect_count(), 1);
        assert_eq!(activity.close_count(), 1);
    });
    Ok(())
}

#[test]
fn mysql_execution_uses_question_mark_placeholders() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new(DatabaseType::Mysql)
            .with_rows(vec!["id"], vec![vec![RowValues::Int(7)]]);
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Mysql)),
            connector,
        );

        executor
            .execute("ds1", "SELECT * FROM users WHERE id = :id", &id_params())
            .await
            .unwrap();

        let queries = activity.recorded_queries();
        assert_eq!(queries[0].0, "SELECT * FROM users WHERE id = ?");
        assert_eq!(queries[0].1, vec![RowValues::Int(7)]);
    });
    Ok(())
}

#[test]
fn repeated_key_is_one_slot_on_postgres_two_args_on_mysql()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let sql = "SELECT * FROM t WHERE a = :id OR b = :id";

        let pg = MockConnector::new(DatabaseType::Postgres);
        let pg_activity = pg.activity();
        let executor =
            SqlExecutor::with_connector(store_with("ds1", sample_config(DatabaseType::Postgres)), pg);
        executor.execute("ds1", sql, &id_params()).await.unwrap();
        let (pg_sql, pg_args) = pg_activity.recorded_queries()[0].clone();
        assert_eq!(pg_sql, "SELECT * FROM t WHERE a = $1 OR b = $1");
        assert_eq!(pg_args, vec![RowValues::Int(7)]);

        let my = MockConnector::new(DatabaseType::Mysql);
        let my_activity = my.activity();
        let executor =
            SqlExecutor::with_connector(store_with("ds1", sample_config(DatabaseType::Mysql)), my);
        executor.execute("ds1", sql, &id_params()).await.unwrap();
        let (my_sql, my_args) = my_activity.recorded_queries()[0].clone();
        assert_eq!(my_sql, "SELECT * FROM t WHERE a = ? OR b = ?");
        assert_eq!(my_args, vec![RowValues::Int(7), RowValues::Int(7)]);
    });
    Ok(())
}

#[test]
fn connection_closes_exactly_once_when_the_query_fails()
-> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector =
            MockConnector::new(DatabaseType::Postgres).with_query_failure("relation does not exist");
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Postgres)),
            connector,
        );

        let err = executor
            .execute("ds1", "SELECT * FROM nowhere", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::ExecutionError(_)));
        assert_eq!(activity.connect_count(), 1);
        assert_eq!(activity.close_count(), 1);
    });
    Ok(())
}

#[test]
fn connect_failure_propagates_as_connection_error() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let connector = MockConnector::new(DatabaseType::Postgres)
            .with_connect_failure("host unreachable");
        let activity = connector.activity();
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Postgres)),
            connector,
        );

        let err = executor
            .execute("ds1", "SELECT 1", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::ConnectionError(_)));
        // nothing was handed out, so nothing to close
        assert_eq!(activity.close_count(), 0);
    });
    Ok(())
}

#[test]
fn declared_future_operations_are_unimplemented() -> Result<(), Box<dyn std::error::Error>> {
    let rt = Runtime::new()?;
    rt.block_on(async {
        let executor = SqlExecutor::with_connector(
            store_with("ds1", sample_config(DatabaseType::Postgres)),
            MockConnector::new(DatabaseType::Postgres),
        );

        let err = executor
            .execute_stored_procedure("ds1", "refresh_stats", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::Unimplemented(_)));

        let err = executor
            .execute_function("ds1", "total_users", &NamedParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SqlConnectorError::Unimplemented(_)));

        let err = executor.explain_query("ds1", "SELECT 1").await.unwrap_err();
        assert!(matches!(err, SqlConnectorError::Unimplemented(_)));
    });
    Ok(())
}
