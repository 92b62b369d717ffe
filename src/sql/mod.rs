//! Schema Compilation
//!
//! Emits relational schema scripts from the blueprint's models and migration
//! journal:
//! - dialect: per-flavor strategies (types, quoting, ALTER capabilities)
//! - ddl: statement tree rendered through a strategy
//! - base: the one-time base script
//! - migration: incremental deltas from the journal

pub mod base;
pub mod ddl;
pub mod dialect;
pub mod migration;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

pub use base::emit_base_schema;
pub use ddl::{Script, Statement};
pub use dialect::{AlterCapability, ColumnType, ColumnTypeMapper, SqlDialect};
pub use migration::{emit_migration_delta, migration_file_name, migration_script};

/// Supported SQL flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    pub fn all() -> [Dialect; 3] {
        [Self::Postgres, Self::MySql, Self::Sqlite]
    }

    pub fn as_str(&self) -> &'static str {
        self.strategy().name()
    }

    /// The strategy that renders this dialect
    pub fn strategy(&self) -> &'static dyn SqlDialect {
        match self {
            Self::Postgres => &dialect::Postgres,
            Self::MySql => &dialect::MySql,
            Self::Sqlite => &dialect::Sqlite,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            _ => Err(CompileError::UnknownDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_names_round_trip() {
        for dialect in Dialect::all() {
            assert_eq!(dialect.as_str().parse::<Dialect>().unwrap(), dialect);
            assert_eq!(
                serde_json::to_string(&dialect).unwrap(),
                format!("\"{}\"", dialect)
            );
        }
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
