//! Dialect strategies
//!
//! Everything that differs between SQL flavors lives behind two traits:
//! [`ColumnTypeMapper`] for types and identifier quoting, [`AlterCapability`]
//! for what `ALTER TABLE` can do. Schema compilers only talk to these traits.

// =============================================================================
// Abstract column types
// =============================================================================

/// Dialect-independent column type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Uuid,
    Varchar(u32),
    Text,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Decimal { precision: u32, scale: u32 },
    Float,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    Json,
    Blob,
}

impl ColumnType {
    /// Parse an abstract datatype name (`"VARCHAR"`, `"varchar(80)"`, `"uuid"`).
    ///
    /// Unknown names become a VARCHAR of the given default size.
    pub fn parse(datatype: &str, size: Option<u32>, default_varchar: u32) -> Self {
        let raw = datatype.trim().to_ascii_uppercase();
        let (name, inline_args) = match raw.find('(') {
            Some(open) => {
                let args: Vec<u32> = raw[open + 1..]
                    .trim_end_matches(')')
                    .split(',')
                    .filter_map(|a| a.trim().parse().ok())
                    .collect();
                (raw[..open].trim().to_string(), args)
            }
            None => (raw.clone(), Vec::new()),
        };
        let size = size.or_else(|| inline_args.first().copied()).filter(|s| *s > 0);

        match name.as_str() {
            "UUID" | "GUID" => Self::Uuid,
            "VARCHAR" | "STRING" | "CHAR" | "EMAIL" | "URL" | "PASSWORD" | "PHONE" => {
                Self::Varchar(size.unwrap_or(default_varchar))
            }
            "TEXT" | "LONGTEXT" | "MEDIUMTEXT" | "CLOB" => Self::Text,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "INT" | "INTEGER" | "NUMBER" => Self::Integer,
            "BIGINT" | "LONG" => Self::BigInt,
            "DECIMAL" | "NUMERIC" | "MONEY" | "CURRENCY" => {
                let precision = size.unwrap_or(10);
                // scale may never exceed precision
                let scale = inline_args.get(1).copied().unwrap_or(2).min(precision);
                Self::Decimal { precision, scale }
            }
            "FLOAT" | "REAL" => Self::Float,
            "DOUBLE" | "DOUBLE PRECISION" => Self::Double,
            "BOOLEAN" | "BOOL" | "BIT" => Self::Boolean,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" | "TIMESTAMP" | "TIMESTAMPTZ" => Self::Timestamp,
            "JSON" | "JSONB" | "OBJECT" => Self::Json,
            "BLOB" | "BINARY" | "BYTEA" | "FILE" => Self::Blob,
            _ => Self::Varchar(size.unwrap_or(default_varchar)),
        }
    }
}

// =============================================================================
// Strategy traits
// =============================================================================

/// Type mapping and identifier quoting
pub trait ColumnTypeMapper {
    fn column_type(&self, ty: &ColumnType) -> String;

    fn quote(&self, ident: &str) -> String;
}

/// What a dialect's `ALTER TABLE` supports. `None` means the change needs a
/// manual migration.
pub trait AlterCapability {
    fn drop_column(&self, table: &str, column: &str) -> Option<String>;

    fn alter_column_type(&self, table: &str, column: &str, ty: &ColumnType, not_null: bool) -> Option<String>;

    /// Whether `ADD COLUMN .. NOT NULL` without a default is accepted
    fn supports_not_null_on_add(&self) -> bool;
}

/// A complete SQL flavor
pub trait SqlDialect: ColumnTypeMapper + AlterCapability + Send + Sync {
    fn name(&self) -> &'static str;
}

fn double_quoted(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

// =============================================================================
// PostgreSQL
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl ColumnTypeMapper for Postgres {
    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::TinyInt | ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
        }
    }

    fn quote(&self, ident: &str) -> String {
        double_quoted(ident)
    }
}

impl AlterCapability for Postgres {
    fn drop_column(&self, table: &str, column: &str) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} DROP COLUMN IF EXISTS {};",
            self.quote(table),
            self.quote(column)
        ))
    }

    fn alter_column_type(&self, table: &str, column: &str, ty: &ColumnType, _not_null: bool) -> Option<String> {
        let sql_type = self.column_type(ty);
        Some(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
            self.quote(table),
            self.quote(column),
            sql_type,
            self.quote(column),
            sql_type
        ))
    }

    /// Populated tables reject a NOT NULL column without a default
    fn supports_not_null_on_add(&self) -> bool {
        false
    }
}

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }
}

// =============================================================================
// MySQL
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl ColumnTypeMapper for MySql {
    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
        }
    }

    fn quote(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }
}

impl AlterCapability for MySql {
    fn drop_column(&self, table: &str, column: &str) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.quote(table),
            self.quote(column)
        ))
    }

    fn alter_column_type(&self, table: &str, column: &str, ty: &ColumnType, not_null: bool) -> Option<String> {
        Some(format!(
            "ALTER TABLE {} MODIFY COLUMN {} {}{};",
            self.quote(table),
            self.quote(column),
            self.column_type(ty),
            if not_null { " NOT NULL" } else { "" }
        ))
    }

    fn supports_not_null_on_add(&self) -> bool {
        true
    }
}

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }
}

// =============================================================================
// SQLite
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl ColumnTypeMapper for Sqlite {
    fn column_type(&self, ty: &ColumnType) -> String {
        match ty {
            ColumnType::Uuid => "VARCHAR(36)".to_string(),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Text | ColumnType::Json => "TEXT".to_string(),
            ColumnType::TinyInt
            | ColumnType::SmallInt
            | ColumnType::Integer
            | ColumnType::BigInt
            | ColumnType::Boolean => "INTEGER".to_string(),
            ColumnType::Decimal { .. } => "NUMERIC".to_string(),
            ColumnType::Float | ColumnType::Double => "REAL".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Timestamp => "DATETIME".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
        }
    }

    fn quote(&self, ident: &str) -> String {
        double_quoted(ident)
    }
}

impl AlterCapability for Sqlite {
    fn drop_column(&self, _table: &str, _column: &str) -> Option<String> {
        None
    }

    fn alter_column_type(&self, _table: &str, _column: &str, _ty: &ColumnType, _not_null: bool) -> Option<String> {
        None
    }

    fn supports_not_null_on_add(&self) -> bool {
        false
    }
}

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abstract_types() {
        assert_eq!(ColumnType::parse("uuid", None, 255), ColumnType::Uuid);
        assert_eq!(ColumnType::parse("VARCHAR", None, 255), ColumnType::Varchar(255));
        assert_eq!(ColumnType::parse("varchar(80)", None, 255), ColumnType::Varchar(80));
        assert_eq!(ColumnType::parse("VARCHAR", Some(40), 255), ColumnType::Varchar(40));
        assert_eq!(
            ColumnType::parse("DECIMAL(12,4)", None, 255),
            ColumnType::Decimal { precision: 12, scale: 4 }
        );
        assert_eq!(ColumnType::parse("mystery", None, 100), ColumnType::Varchar(100));
    }

    #[test]
    fn test_decimal_scale_never_exceeds_precision() {
        let narrow = ColumnType::parse("DECIMAL", Some(1), 255);
        assert_eq!(narrow, ColumnType::Decimal { precision: 1, scale: 1 });
        assert_eq!(Postgres.column_type(&narrow), "NUMERIC(1, 1)");
        assert_eq!(
            ColumnType::parse("NUMERIC(3,5)", None, 255),
            ColumnType::Decimal { precision: 3, scale: 3 }
        );
    }

    #[test]
    fn test_uuid_and_tinyint_per_dialect() {
        assert_eq!(Postgres.column_type(&ColumnType::Uuid), "UUID");
        assert_eq!(MySql.column_type(&ColumnType::Uuid), "CHAR(36)");
        assert_eq!(Sqlite.column_type(&ColumnType::Uuid), "VARCHAR(36)");

        assert_eq!(Postgres.column_type(&ColumnType::TinyInt), "SMALLINT");
        assert_eq!(MySql.column_type(&ColumnType::TinyInt), "TINYINT");
        assert_eq!(Sqlite.column_type(&ColumnType::TinyInt), "INTEGER");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(Postgres.quote("order"), "\"order\"");
        assert_eq!(Sqlite.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(MySql.quote("order"), "`order`");
    }

    #[test]
    fn test_alter_capabilities() {
        assert!(Sqlite.drop_column("t", "c").is_none());
        assert!(Sqlite.alter_column_type("t", "c", &ColumnType::Text, false).is_none());
        assert_eq!(
            MySql.alter_column_type("t", "c", &ColumnType::Integer, true).as_deref(),
            Some("ALTER TABLE `t` MODIFY COLUMN `c` INT NOT NULL;")
        );
        assert!(Postgres
            .alter_column_type("t", "c", &ColumnType::Integer, false)
            .unwrap()
            .contains("ALTER COLUMN \"c\" TYPE INTEGER"));
    }
}
