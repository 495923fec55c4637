/*!
 * SQL dialect profiles.
 *
 * Every dialect-dependent decision made by the schema manager and the
 * message store is looked up here: identifier quoting, placeholder style,
 * column types, how the primary key of `source_message` is generated and
 * which update action the foreign key carries.
 */

use std::fmt;
use std::str::FromStr;

use crate::errors::MessageStoreError;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// MySQL / MariaDB (`mysql`)
    MySql,
    /// PostgreSQL (`pgsql`)
    PgSql,
    /// Microsoft SQL Server (`sqlsrv`)
    SqlServer,
    /// Oracle (`oci`)
    Oracle,
    /// SQLite (`sqlite`)
    Sqlite,
}

/// How the surrogate key of `source_message` gets its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPkStrategy {
    /// The column type itself generates the key
    Native,
    /// A sequence plus a `BEFORE INSERT` trigger fill the key
    SequenceTrigger,
}

/// Bind-parameter syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `?1`, `?2`, ...
    NumberedQuestion,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@P1`, `@P2`, ...
    AtP,
    /// `:1`, `:2`, ...
    Colon,
}

/// Static description of one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialectProfile {
    /// Driver name as reported by the executor
    pub driver_name: &'static str,
    /// Key generation for `source_message.id`
    pub auto_pk: AutoPkStrategy,
    /// `ON UPDATE` action of the message foreign key, `None` to omit the clause
    pub fk_update_action: Option<&'static str>,
    /// Primary and foreign keys must be declared inside `CREATE TABLE`
    pub inline_constraints: bool,
    /// Opening and closing identifier quote
    pub quotes: (char, char),
    /// Bind-parameter syntax
    pub placeholders: PlaceholderStyle,
    /// Column definition of `source_message.id`. With inline constraints the
    /// key is declared by a separate table constraint.
    pub pk_type: &'static str,
    /// Plain integer column type
    pub integer_type: &'static str,
    /// Short string column type, `{}` is replaced with the length
    pub string_type: &'static str,
    /// Unbounded text column type
    pub text_type: &'static str,
    /// Trailing `CREATE TABLE` options
    pub table_options: Option<&'static str>,
    /// Keyword in `ALTER TABLE .. DROP <keyword> <name>` for foreign keys
    pub drop_fk_keyword: &'static str,
}

const MYSQL: DialectProfile = DialectProfile {
    driver_name: "mysql",
    auto_pk: AutoPkStrategy::Native,
    fk_update_action: Some("RESTRICT"),
    inline_constraints: false,
    quotes: ('`', '`'),
    placeholders: PlaceholderStyle::Question,
    pk_type: "int(11) NOT NULL AUTO_INCREMENT PRIMARY KEY",
    integer_type: "int(11)",
    string_type: "varchar({})",
    text_type: "text",
    table_options: Some("CHARACTER SET utf8mb4 COLLATE utf8mb4_bin ENGINE=InnoDB"),
    drop_fk_keyword: "FOREIGN KEY",
};

const PGSQL: DialectProfile = DialectProfile {
    driver_name: "pgsql",
    auto_pk: AutoPkStrategy::Native,
    fk_update_action: Some("RESTRICT"),
    inline_constraints: false,
    quotes: ('"', '"'),
    placeholders: PlaceholderStyle::Dollar,
    pk_type: "serial NOT NULL PRIMARY KEY",
    integer_type: "integer",
    string_type: "varchar({})",
    text_type: "text",
    table_options: None,
    drop_fk_keyword: "CONSTRAINT",
};

// SQL Server spells RESTRICT as NO ACTION
const SQLSRV: DialectProfile = DialectProfile {
    driver_name: "sqlsrv",
    auto_pk: AutoPkStrategy::Native,
    fk_update_action: Some("NO ACTION"),
    inline_constraints: false,
    quotes: ('[', ']'),
    placeholders: PlaceholderStyle::AtP,
    pk_type: "int IDENTITY PRIMARY KEY",
    integer_type: "int",
    string_type: "nvarchar({})",
    text_type: "nvarchar(max)",
    table_options: None,
    drop_fk_keyword: "CONSTRAINT",
};

// Oracle accepts no ON UPDATE clause at all
const ORACLE: DialectProfile = DialectProfile {
    driver_name: "oci",
    auto_pk: AutoPkStrategy::SequenceTrigger,
    fk_update_action: None,
    inline_constraints: false,
    quotes: ('"', '"'),
    placeholders: PlaceholderStyle::Colon,
    pk_type: "NUMBER(10) NOT NULL PRIMARY KEY",
    integer_type: "NUMBER(10)",
    string_type: "VARCHAR2({})",
    text_type: "CLOB",
    table_options: None,
    drop_fk_keyword: "CONSTRAINT",
};

// SQLite cannot ALTER TABLE ADD CONSTRAINT
const SQLITE: DialectProfile = DialectProfile {
    driver_name: "sqlite",
    auto_pk: AutoPkStrategy::Native,
    fk_update_action: None,
    inline_constraints: true,
    quotes: ('`', '`'),
    placeholders: PlaceholderStyle::NumberedQuestion,
    pk_type: "integer NOT NULL",
    integer_type: "integer",
    string_type: "varchar({})",
    text_type: "text",
    table_options: None,
    drop_fk_keyword: "CONSTRAINT",
};

impl Dialect {
    /// All dialects, in the order the DDL dumps are usually listed
    pub const ALL: [Dialect; 5] = [
        Dialect::MySql,
        Dialect::PgSql,
        Dialect::SqlServer,
        Dialect::Oracle,
        Dialect::Sqlite,
    ];

    /// Resolve the dialect for a driver name
    pub fn from_driver_name(driver_name: &str) -> Result<Self, MessageStoreError> {
        match driver_name.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::PgSql),
            "sqlsrv" | "mssql" => Ok(Self::SqlServer),
            "oci" | "oracle" => Ok(Self::Oracle),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(MessageStoreError::UnsupportedDialect(driver_name.to_string())),
        }
    }

    /// Configuration driving DDL generation and query rendering
    pub fn profile(self) -> &'static DialectProfile {
        match self {
            Self::MySql => &MYSQL,
            Self::PgSql => &PGSQL,
            Self::SqlServer => &SQLSRV,
            Self::Oracle => &ORACLE,
            Self::Sqlite => &SQLITE,
        }
    }

    /// Canonical driver name
    pub fn driver_name(self) -> &'static str {
        self.profile().driver_name
    }

    /// Quote a (possibly schema-qualified) identifier
    pub fn quote(self, identifier: &str) -> String {
        let (open, close) = self.profile().quotes;
        identifier
            .split('.')
            .map(|part| format!("{open}{part}{close}"))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Bind placeholder for the 1-based parameter `index`
    pub fn placeholder(self, index: usize) -> String {
        match self.profile().placeholders {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::NumberedQuestion => format!("?{index}"),
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::AtP => format!("@P{index}"),
            PlaceholderStyle::Colon => format!(":{index}"),
        }
    }

    /// String column type of the given length
    pub fn string_type(self, length: usize) -> String {
        self.profile().string_type.replace("{}", &length.to_string())
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.driver_name())
    }
}

impl FromStr for Dialect {
    type Err = MessageStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_driver_name(s)
    }
}
