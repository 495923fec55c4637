/*!
 * Schema lifecycle for the message catalog.
 *
 * This module renders the DDL of the two catalog tables for every
 * supported dialect and applies or removes it through a `SqlExecutor`.
 * Creation is a no-op when both tables already exist, teardown skips
 * tables that are already gone.
 */

use log::{debug, info};

use super::dialect::{AutoPkStrategy, Dialect};
use super::executor::SqlExecutor;
use super::models::TableNames;
use crate::errors::{MessageStoreError, Result};

/// Length of `source_message.category`
const CATEGORY_LENGTH: usize = 255;

/// Length of `message.locale`
pub const LOCALE_LENGTH: usize = 16;

/// Statements creating both tables, their keys, indexes and, on Oracle,
/// the sequences and triggers generating `id`
pub fn creation_script(dialect: Dialect, tables: &TableNames) -> Vec<String> {
    if dialect.profile().inline_constraints {
        return inline_creation_script(dialect, tables);
    }

    let profile = dialect.profile();
    let q = |identifier: &str| dialect.quote(identifier);
    let source = q(&tables.source_message);
    let message = q(&tables.message);
    let message_short = TableNames::short_name(&tables.message);
    let options = profile
        .table_options
        .map(|options| format!(" {}", options))
        .unwrap_or_default();

    let mut statements = vec![
        format!(
            "CREATE TABLE {} (\n\t{} {},\n\t{} {},\n\t{} {},\n\t{} {}\n){}",
            source,
            q("id"),
            profile.pk_type,
            q("category"),
            dialect.string_type(CATEGORY_LENGTH),
            q("message_id"),
            profile.text_type,
            q("comment"),
            profile.text_type,
            options
        ),
        format!(
            "CREATE TABLE {} (\n\t{} {} NOT NULL,\n\t{} {} NOT NULL,\n\t{} {}\n){}",
            message,
            q("id"),
            profile.integer_type,
            q("locale"),
            dialect.string_type(LOCALE_LENGTH),
            q("translation"),
            profile.text_type,
            options
        ),
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} PRIMARY KEY ({}, {})",
            message,
            q(&format!("PK_{}_id_locale", message_short)),
            q("id"),
            q("locale")
        ),
    ];

    statements.extend(index_statements(dialect, tables));

    if profile.auto_pk == AutoPkStrategy::SequenceTrigger {
        for table in [&tables.source_message, &tables.message] {
            statements.push(create_sequence(dialect, table));
        }
        for table in [&tables.source_message, &tables.message] {
            statements.push(create_trigger(dialect, table));
        }
    }

    let mut foreign_key = format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE",
        message,
        q(&tables.foreign_key_name()),
        q("id"),
        source,
        q("id")
    );
    if let Some(action) = profile.fk_update_action {
        foreign_key.push_str(" ON UPDATE ");
        foreign_key.push_str(action);
    }
    statements.push(foreign_key);

    statements
}

/// Statements dropping everything `creation_script` creates, assuming all
/// of it exists
pub fn drop_script(dialect: Dialect, tables: &TableNames) -> Vec<String> {
    let mut statements = drop_message_statements(dialect, tables, true);
    statements.extend(drop_source_statements(dialect, tables));
    statements
}

// Dialects without ALTER TABLE ADD CONSTRAINT declare the keys inline
fn inline_creation_script(dialect: Dialect, tables: &TableNames) -> Vec<String> {
    let profile = dialect.profile();
    let q = |identifier: &str| dialect.quote(identifier);
    let source_short = TableNames::short_name(&tables.source_message);
    let message_short = TableNames::short_name(&tables.message);

    let mut statements = vec![
        format!(
            "CREATE TABLE {} (\n\t{} {},\n\t{} {},\n\t{} {},\n\t{} {},\n\tCONSTRAINT {} PRIMARY KEY ({})\n)",
            q(&tables.source_message),
            q("id"),
            profile.pk_type,
            q("category"),
            dialect.string_type(CATEGORY_LENGTH),
            q("message_id"),
            profile.text_type,
            q("comment"),
            profile.text_type,
            q(&format!("PK_{}", source_short)),
            q("id")
        ),
        format!(
            "CREATE TABLE {} (\n\t{} {} NOT NULL,\n\t{} {} NOT NULL,\n\t{} {},\n\tPRIMARY KEY ({}, {}),\n\tCONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE CASCADE\n)",
            q(&tables.message),
            q("id"),
            profile.integer_type,
            q("locale"),
            dialect.string_type(LOCALE_LENGTH),
            q("translation"),
            profile.text_type,
            q("id"),
            q("locale"),
            q(&format!("FK_{}_{}", message_short, source_short)),
            q("id"),
            q(source_short),
            q("id")
        ),
    ];

    statements.extend(index_statements(dialect, tables));
    statements
}

fn index_statements(dialect: Dialect, tables: &TableNames) -> Vec<String> {
    let inline = dialect.profile().inline_constraints;
    let index = |table: &str, column: &str| {
        let name = format!("IDX_{}_{}", TableNames::short_name(table), column);
        // SQLite qualifies the index name, the indexed table stays bare
        let (name, target) = match table.rsplit_once('.') {
            Some((schema, short)) if inline => (format!("{}.{}", schema, name), short),
            _ => (name, table),
        };
        format!(
            "CREATE INDEX {} ON {} ({})",
            dialect.quote(&name),
            dialect.quote(target),
            dialect.quote(column)
        )
    };

    vec![
        index(&tables.source_message, "category"),
        index(&tables.message, "locale"),
    ]
}

fn create_sequence(dialect: Dialect, table: &str) -> String {
    format!(
        "CREATE SEQUENCE {}\nSTART WITH 1\nINCREMENT BY 1\nNOMAXVALUE",
        dialect.quote(&format!("{}_SEQ", table))
    )
}

fn create_trigger(dialect: Dialect, table: &str) -> String {
    format!(
        "CREATE TRIGGER {} BEFORE INSERT ON {} FOR EACH ROW BEGIN <<COLUMN_SEQUENCES>> BEGIN\n\
         IF INSERTING AND :NEW.{} IS NULL THEN SELECT {}.NEXTVAL INTO :NEW.{} FROM SYS.DUAL; END IF;\n\
         END COLUMN_SEQUENCES;\n\
         END;",
        dialect.quote(&format!("{}_TRG", table)),
        dialect.quote(table),
        dialect.quote("id"),
        dialect.quote(&format!("{}_SEQ", table)),
        dialect.quote("id")
    )
}

fn drop_message_statements(dialect: Dialect, tables: &TableNames, drop_foreign_key: bool) -> Vec<String> {
    let profile = dialect.profile();
    let mut statements = Vec::new();

    if drop_foreign_key && !profile.inline_constraints {
        statements.push(format!(
            "ALTER TABLE {} DROP {} {}",
            dialect.quote(&tables.message),
            profile.drop_fk_keyword,
            dialect.quote(&tables.foreign_key_name())
        ));
    }

    statements.push(format!("DROP TABLE {}", dialect.quote(&tables.message)));

    if profile.auto_pk == AutoPkStrategy::SequenceTrigger {
        statements.push(format!(
            "DROP SEQUENCE {}",
            dialect.quote(&format!("{}_SEQ", tables.message))
        ));
    }

    statements
}

fn drop_source_statements(dialect: Dialect, tables: &TableNames) -> Vec<String> {
    let mut statements = vec![format!("DROP TABLE {}", dialect.quote(&tables.source_message))];

    if dialect.profile().auto_pk == AutoPkStrategy::SequenceTrigger {
        statements.push(format!(
            "DROP SEQUENCE {}",
            dialect.quote(&format!("{}_SEQ", tables.source_message))
        ));
    }

    statements
}

/// Creates and drops the catalog tables through an executor
pub struct SchemaManager<E: SqlExecutor> {
    executor: E,
    dialect: Dialect,
}

impl<E: SqlExecutor> SchemaManager<E> {
    /// Bind a manager to an executor. Fails for drivers without a profile.
    pub fn new(executor: E) -> Result<Self> {
        let dialect = executor.dialect()?;
        Ok(Self { executor, dialect })
    }

    /// Dialect the DDL is rendered for
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether both catalog tables exist
    pub fn has_schema(&self, tables: &TableNames) -> Result<bool> {
        Ok(self.executor.table_exists(&tables.source_message)?
            && self.executor.table_exists(&tables.message)?)
    }

    /// Create the catalog tables unless both already exist
    pub fn ensure_schema(&self, tables: &TableNames) -> Result<()> {
        if self.has_schema(tables)? {
            debug!("Message tables {} already exist", tables);
            return Ok(());
        }

        info!("Creating message tables {} for {}", tables, self.dialect);
        self.run(creation_script(self.dialect, tables))?;
        info!("Message tables {} created", tables);
        Ok(())
    }

    /// Drop the catalog tables, message table first. Missing tables are skipped.
    pub fn drop_schema(&self, tables: &TableNames) -> Result<()> {
        if self.executor.table_exists(&tables.message)? {
            let has_foreign_key = !self.dialect.profile().inline_constraints
                && !self.executor.foreign_keys(&tables.message)?.is_empty();

            info!("Dropping table {}", tables.message);
            self.run(drop_message_statements(self.dialect, tables, has_foreign_key))?;
        }

        if self.executor.table_exists(&tables.source_message)? {
            info!("Dropping table {}", tables.source_message);
            self.run(drop_source_statements(self.dialect, tables))?;
        }

        Ok(())
    }

    fn run(&self, statements: Vec<String>) -> Result<()> {
        for statement in statements {
            debug!("DDL: {}", statement);
            if let Err(source) = self.executor.execute(&statement, &[]) {
                return Err(MessageStoreError::Schema { statement, source });
            }
        }
        Ok(())
    }
}
