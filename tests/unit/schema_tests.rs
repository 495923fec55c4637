/*!
 * Tests for schema creation and teardown on every dialect
 */

use message_db::database::schema::{creation_script, drop_script};
use message_db::{Dialect, MessageStoreError, SchemaManager, TableNames};

use crate::common::RecordingExecutor;

fn tables() -> TableNames {
    TableNames::default()
}

/// Ensuring the schema runs exactly the rendered creation script
#[test]
fn test_ensureSchema_onEveryDialect_shouldRunCreationScript() {
    for dialect in Dialect::ALL {
        let executor = RecordingExecutor::new(dialect.driver_name());
        let manager = SchemaManager::new(&executor).unwrap();

        manager.ensure_schema(&tables()).unwrap();

        assert_eq!(
            executor.statements(),
            creation_script(dialect, &tables()),
            "unexpected DDL for {}",
            dialect
        );
        assert!(manager.has_schema(&tables()).unwrap());
    }
}

/// A second ensure finds both tables and issues nothing
#[test]
fn test_ensureSchema_calledTwice_shouldBeIdempotent() {
    for dialect in Dialect::ALL {
        let executor = RecordingExecutor::new(dialect.driver_name());
        let manager = SchemaManager::new(&executor).unwrap();

        manager.ensure_schema(&tables()).unwrap();
        executor.clear();
        manager.ensure_schema(&tables()).unwrap();

        assert!(executor.statements().is_empty());
    }
}

/// Unknown drivers are rejected before any DDL
#[test]
fn test_schemaManager_withUnknownDriver_shouldFailWithoutDdl() {
    let executor = RecordingExecutor::new("cubrid");

    let result = SchemaManager::new(&executor);

    match result {
        Err(MessageStoreError::UnsupportedDialect(driver)) => assert_eq!(driver, "cubrid"),
        _ => panic!("Expected UnsupportedDialect"),
    }
    assert!(executor.statements().is_empty());
}

/// Ensure then drop leaves nothing behind, foreign key first
#[test]
fn test_dropSchema_afterEnsure_shouldDropForeignKeyThenTables() {
    let executor = RecordingExecutor::new("mysql");
    let manager = SchemaManager::new(&executor).unwrap();
    manager.ensure_schema(&tables()).unwrap();
    executor.clear();

    manager.drop_schema(&tables()).unwrap();

    assert_eq!(executor.statements(), drop_script(Dialect::MySql, &tables()));
    assert!(executor.tables().is_empty());
}

/// Oracle drops each sequence after its table
#[test]
fn test_dropSchema_onOracle_shouldDropSequences() {
    let executor = RecordingExecutor::new("oci");
    let manager = SchemaManager::new(&executor).unwrap();
    manager.ensure_schema(&tables()).unwrap();
    executor.clear();

    manager.drop_schema(&tables()).unwrap();

    assert_eq!(
        executor.statements(),
        vec![
            "ALTER TABLE \"message\" DROP CONSTRAINT \"FK_source_message_message\"".to_string(),
            "DROP TABLE \"message\"".to_string(),
            "DROP SEQUENCE \"message_SEQ\"".to_string(),
            "DROP TABLE \"source_message\"".to_string(),
            "DROP SEQUENCE \"source_message_SEQ\"".to_string(),
        ]
    );
}

/// Without a remaining foreign key only the tables are dropped
#[test]
fn test_dropSchema_withoutForeignKey_shouldSkipAlter() {
    let executor = RecordingExecutor::new("pgsql");
    let manager = SchemaManager::new(&executor).unwrap();
    manager.ensure_schema(&tables()).unwrap();
    executor.tracker().lock().unwrap().foreign_keys.clear();
    executor.clear();

    manager.drop_schema(&tables()).unwrap();

    assert_eq!(executor.count("ALTER TABLE"), 0);
    assert_eq!(executor.count("DROP TABLE"), 2);
}

/// Dropping an absent schema is a no-op on every dialect
#[test]
fn test_dropSchema_whenAbsent_shouldIssueNothing() {
    for dialect in Dialect::ALL {
        let executor = RecordingExecutor::new(dialect.driver_name());
        let manager = SchemaManager::new(&executor).unwrap();

        manager.drop_schema(&tables()).unwrap();

        assert!(executor.statements().is_empty());
    }
}

/// A partially present schema only loses the missing table's statements
#[test]
fn test_dropSchema_withOnlySourceTable_shouldDropIt() {
    let executor = RecordingExecutor::new("sqlsrv");
    executor.tracker().lock().unwrap().tables.insert("source_message".to_string());
    let manager = SchemaManager::new(&executor).unwrap();

    manager.drop_schema(&tables()).unwrap();

    assert_eq!(executor.statements(), vec!["DROP TABLE [source_message]".to_string()]);
}

/// A failing statement aborts with the statement attached and no cleanup
#[test]
fn test_ensureSchema_withFailingIndex_shouldReportStatement() {
    let executor = RecordingExecutor::new("pgsql");
    executor.fail_on("CREATE INDEX");
    let manager = SchemaManager::new(&executor).unwrap();

    let err = manager.ensure_schema(&tables()).unwrap_err();

    match err {
        MessageStoreError::Schema { statement, .. } => {
            assert!(statement.starts_with("CREATE INDEX \"IDX_source_message_category\""));
        }
        other => panic!("Unexpected error: {}", other),
    }
    // Tables created before the failure stay
    assert_eq!(executor.tables().len(), 2);
    assert_eq!(executor.count("DROP"), 0);
}

/// Oracle creates sequences and triggers before the foreign key
#[test]
fn test_creationScript_forOracle_shouldOrderSequencesBeforeForeignKey() {
    let script = creation_script(Dialect::Oracle, &tables());

    let first_sequence = script.iter().position(|s| s.starts_with("CREATE SEQUENCE")).unwrap();
    let first_trigger = script.iter().position(|s| s.starts_with("CREATE TRIGGER")).unwrap();
    let foreign_key = script.iter().position(|s| s.contains("FOREIGN KEY")).unwrap();

    assert!(first_sequence < first_trigger);
    assert!(first_trigger < foreign_key);
    assert_eq!(foreign_key, script.len() - 1);
}

/// PostgreSQL uses serial keys and restricts key updates
#[test]
fn test_creationScript_forPgsql_shouldUseSerialAndRestrict() {
    let script = creation_script(Dialect::PgSql, &tables());

    assert!(script[0].contains("\"id\" serial NOT NULL PRIMARY KEY"));
    assert!(script[1].contains("\"locale\" varchar(16) NOT NULL"));
    assert!(script.last().unwrap().ends_with("ON DELETE CASCADE ON UPDATE RESTRICT"));
}

/// Prefixed table names flow into every derived object name
#[test]
fn test_creationScript_withPrefix_shouldNameObjectsAfterTables() {
    let tables = TableNames::with_prefix("yii_").unwrap();
    let script = creation_script(Dialect::MySql, &tables);

    assert!(script[0].starts_with("CREATE TABLE `yii_source_message`"));
    assert!(script.iter().any(|s| s.contains("`PK_yii_message_id_locale`")));
    assert!(script.iter().any(|s| s.contains("`IDX_yii_source_message_category`")));
    assert!(script.iter().any(|s| s.contains("`IDX_yii_message_locale`")));
    assert!(script.last().unwrap().contains("`FK_yii_source_message_yii_message`"));
}

/// Schema-qualified names are quoted per segment and shortened for object names
#[test]
fn test_creationScript_withSchemaQualifiedNames_shouldQuoteSegments() {
    let tables = TableNames::new("dbo.source_message", "dbo.message", "").unwrap();
    let script = creation_script(Dialect::SqlServer, &tables);

    assert!(script[0].starts_with("CREATE TABLE [dbo].[source_message]"));
    assert!(script.iter().any(|s| s.contains("[IDX_message_locale] ON [dbo].[message]")));
}

/// SQLite puts the schema on the index name and indexes the bare table
#[test]
fn test_creationScript_forSqliteWithQualifiedNames_shouldQualifyIndexName() {
    let tables = TableNames::new("main.source_message", "main.message", "").unwrap();
    let script = creation_script(Dialect::Sqlite, &tables);

    assert!(script.iter().any(|s| s
        == "CREATE INDEX `main`.`IDX_source_message_category` ON `source_message` (`category`)"));
    assert!(script
        .iter()
        .any(|s| s == "CREATE INDEX `main`.`IDX_message_locale` ON `message` (`locale`)"));
}
