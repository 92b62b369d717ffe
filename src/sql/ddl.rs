//! DDL statement tree
//!
//! Schema compilers build [`Statement`]s; rendering to a concrete dialect
//! happens once, at the end, through the dialect strategy.

use super::dialect::{ColumnType, SqlDialect};

/// Column default expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDefault {
    CurrentTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub ty: ColumnType,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            not_null: false,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(ColumnDefault::CurrentTimestamp);
        self
    }

    /// Column definition as it appears inside `CREATE TABLE` or `ADD COLUMN`
    pub fn render(&self, dialect: &dyn SqlDialect) -> String {
        let mut sql = format!("{} {}", dialect.quote(&self.name), dialect.column_type(&self.ty));
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique && !self.primary_key {
            sql.push_str(" UNIQUE");
        }
        if let Some(ColumnDefault::CurrentTimestamp) = self.default {
            sql.push_str(" DEFAULT CURRENT_TIMESTAMP");
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

impl OnDelete {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: String,
    pub table: String,
    pub references: String,
    pub on_delete: OnDelete,
}

impl ForeignKey {
    /// Reference to `users.id`
    pub fn to_users(column: impl Into<String>, on_delete: OnDelete) -> Self {
        Self {
            column: column.into(),
            table: "users".to_string(),
            references: "id".to_string(),
            on_delete,
        }
    }

    fn render(&self, dialect: &dyn SqlDialect) -> String {
        format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            dialect.quote(&self.column),
            dialect.quote(&self.table),
            dialect.quote(&self.references),
            self.on_delete.as_sql()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    fn render(&self, dialect: &dyn SqlDialect) -> String {
        let mut lines: Vec<String> = self.columns.iter().map(|c| c.render(dialect)).collect();
        lines.extend(self.foreign_keys.iter().map(|fk| fk.render(dialect)));
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            dialect.quote(&self.name),
            lines.join(",\n    ")
        )
    }
}

/// One DDL step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    CreateTable(CreateTable),
    DropTable(String),
    AddColumn { table: String, column: ColumnDef },
    DropColumn { table: String, column: String },
    AlterColumnType { table: String, column: ColumnDef },
    /// Row in the migrations-tracking table
    RecordMigration(String),
    /// A step the dialect cannot express; rendered as SQL comments only
    ManualStep(Vec<String>),
}

impl Statement {
    pub fn render(&self, dialect: &dyn SqlDialect) -> String {
        match self {
            Self::CreateTable(table) => table.render(dialect),
            Self::DropTable(name) => format!("DROP TABLE IF EXISTS {};", dialect.quote(name)),
            Self::AddColumn { table, column } => format!(
                "ALTER TABLE {} ADD COLUMN {};",
                dialect.quote(table),
                column.render(dialect)
            ),
            Self::DropColumn { table, column } => dialect
                .drop_column(table, column)
                .unwrap_or_else(|| manual_comment(&cannot_remove(dialect.name(), table, column))),
            Self::AlterColumnType { table, column } => dialect
                .alter_column_type(table, &column.name, &column.ty, column.not_null)
                .unwrap_or_else(|| {
                    manual_comment(&cannot_retype(dialect.name(), table, &column.name, dialect.column_type(&column.ty)))
                }),
            Self::RecordMigration(name) => format!(
                "INSERT INTO {} ({}) VALUES ({});",
                dialect.quote(super::base::MIGRATIONS_TABLE),
                dialect.quote("name"),
                string_literal(name)
            ),
            Self::ManualStep(lines) => manual_comment(lines),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, Self::ManualStep(_))
    }
}

/// Comment lines for a column the dialect cannot drop
pub fn cannot_remove(dialect: &str, table: &str, column: &str) -> Vec<String> {
    vec![
        format!("MANUAL MIGRATION REQUIRED: {} cannot remove column \"{}\" from table \"{}\".", dialect, column, table),
        format!("Rebuild \"{}\" without \"{}\" and copy the remaining data across.", table, column),
    ]
}

/// Comment lines for a column type the dialect cannot change in place
pub fn cannot_retype(dialect: &str, table: &str, column: &str, new_type: String) -> Vec<String> {
    vec![
        format!(
            "MANUAL MIGRATION REQUIRED: {} cannot change the type of column \"{}\" in table \"{}\".",
            dialect, column, table
        ),
        format!("Rebuild \"{}\" with \"{}\" as {} and copy the data across.", table, column, new_type),
    ]
}

fn manual_comment(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| format!("-- {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-quoted SQL string literal
pub fn string_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// =============================================================================
// Scripts
// =============================================================================

/// An ordered statement list with a comment header
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub header: Vec<String>,
    pub statements: Vec<Statement>,
}

impl Script {
    pub fn new(header: impl IntoIterator<Item = String>) -> Self {
        Self {
            header: header.into_iter().collect(),
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn render(&self, dialect: &dyn SqlDialect) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str("-- ");
            out.push_str(line);
            out.push('\n');
        }
        for statement in &self.statements {
            out.push('\n');
            out.push_str(&statement.render(dialect));
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySql, Postgres, Sqlite};

    #[test]
    fn test_create_table_rendering() {
        let table = CreateTable::new("notes")
            .column(ColumnDef::new("id", ColumnType::Uuid).primary_key())
            .column(ColumnDef::new("slug", ColumnType::Varchar(80)).not_null().unique())
            .column(ColumnDef::new("userid", ColumnType::Uuid).not_null())
            .foreign_key(ForeignKey::to_users("userid", OnDelete::Cascade));

        let sql = Statement::CreateTable(table.clone()).render(&Postgres);
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"notes\" (\n    \"id\" UUID PRIMARY KEY NOT NULL,\n    \"slug\" VARCHAR(80) NOT NULL UNIQUE,\n    \"userid\" UUID NOT NULL,\n    FOREIGN KEY (\"userid\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE\n);"
        );

        let sql = Statement::CreateTable(table).render(&MySql);
        assert!(sql.contains("`id` CHAR(36) PRIMARY KEY NOT NULL"));
    }

    #[test]
    fn test_unsupported_steps_become_comments() {
        let drop = Statement::DropColumn {
            table: "orders".to_string(),
            column: "x".to_string(),
        };
        let sql = drop.render(&Sqlite);
        assert!(sql.lines().all(|l| l.starts_with("-- ")));
        assert!(sql.contains("\"orders\"") && sql.contains("\"x\""));
        assert!(!sql.contains("DROP COLUMN"));

        assert_eq!(drop.render(&MySql), "ALTER TABLE `orders` DROP COLUMN `x`;");
    }

    #[test]
    fn test_record_migration_escapes_literal() {
        let sql = Statement::RecordMigration("it's.sql".to_string()).render(&Postgres);
        assert_eq!(sql, "INSERT INTO \"_migrations\" (\"name\") VALUES ('it''s.sql');");
    }

    #[test]
    fn test_script_header() {
        let mut script = Script::new(["Base schema".to_string()]);
        assert!(script.is_empty());
        script.push(Statement::DropTable("t".to_string()));
        assert_eq!(script.render(&Sqlite), "-- Base schema\n\nDROP TABLE IF EXISTS \"t\";\n");
    }
}
