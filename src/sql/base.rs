//! Base schema
//!
//! The first script of every dialect: the migrations-tracking table, the
//! built-in auth tables, one table per model, then password auth and form
//! submissions. Writing it is a one-time operation; see
//! [`crate::output::SchemaWriter::write_base`].

use crate::blueprint::{Field, KeyRole, Model};
use crate::codegen::names::slugify;
use crate::config::SchemaConfig;
use crate::graph::{DiagnosticCode, Diagnostics};

use super::ddl::{ColumnDef, CreateTable, ForeignKey, OnDelete, Script, Statement};
use super::dialect::{ColumnType, SqlDialect};

pub const MIGRATIONS_TABLE: &str = "_migrations";

/// Tables owned by the runtime; models may not take these names
pub const BUILTIN_TABLES: &[&str] = &[
    MIGRATIONS_TABLE,
    "users",
    "sessions",
    "oauth_tokens",
    "passwords",
    "form_submissions",
];

/// Name of the tracking row the base script inserts
pub const BASE_MARKER: &str = "base";

const USER_COLUMN: &str = "userid";

// =============================================================================
// Built-in tables
// =============================================================================

fn migrations_table() -> CreateTable {
    CreateTable::new(MIGRATIONS_TABLE)
        .column(ColumnDef::new("name", ColumnType::Varchar(255)).primary_key())
        .column(ColumnDef::new("applied_at", ColumnType::Timestamp).not_null().default_now())
}

fn users_table() -> CreateTable {
    CreateTable::new("users")
        .column(ColumnDef::new("id", ColumnType::Uuid).primary_key())
        .column(ColumnDef::new("email", ColumnType::Varchar(255)).not_null().unique())
        .column(ColumnDef::new("name", ColumnType::Varchar(255)))
        .column(ColumnDef::new("image", ColumnType::Text))
        .column(ColumnDef::new("created_at", ColumnType::Timestamp).not_null().default_now())
}

fn sessions_table() -> CreateTable {
    CreateTable::new("sessions")
        .column(ColumnDef::new("id", ColumnType::Varchar(255)).primary_key())
        .column(ColumnDef::new(USER_COLUMN, ColumnType::Uuid).not_null())
        .column(ColumnDef::new("expires_at", ColumnType::Timestamp).not_null())
        .column(ColumnDef::new("created_at", ColumnType::Timestamp).not_null().default_now())
        .foreign_key(ForeignKey::to_users(USER_COLUMN, OnDelete::Cascade))
}

fn oauth_tokens_table() -> CreateTable {
    CreateTable::new("oauth_tokens")
        .column(ColumnDef::new("id", ColumnType::Uuid).primary_key())
        .column(ColumnDef::new(USER_COLUMN, ColumnType::Uuid).not_null())
        .column(ColumnDef::new("provider", ColumnType::Varchar(64)).not_null())
        .column(ColumnDef::new("provider_account_id", ColumnType::Varchar(255)).not_null())
        .column(ColumnDef::new("access_token", ColumnType::Text))
        .column(ColumnDef::new("refresh_token", ColumnType::Text))
        .column(ColumnDef::new("expires_at", ColumnType::Timestamp))
        .foreign_key(ForeignKey::to_users(USER_COLUMN, OnDelete::Cascade))
}

fn passwords_table() -> CreateTable {
    CreateTable::new("passwords")
        .column(ColumnDef::new(USER_COLUMN, ColumnType::Uuid).primary_key())
        .column(ColumnDef::new("hash", ColumnType::Varchar(255)).not_null())
        .column(ColumnDef::new("updated_at", ColumnType::Timestamp).not_null().default_now())
        .foreign_key(ForeignKey::to_users(USER_COLUMN, OnDelete::Cascade))
}

fn form_submissions_table() -> CreateTable {
    CreateTable::new("form_submissions")
        .column(ColumnDef::new("id", ColumnType::Uuid).primary_key())
        .column(ColumnDef::new("form_id", ColumnType::Varchar(255)).not_null())
        .column(ColumnDef::new(USER_COLUMN, ColumnType::Uuid))
        .column(ColumnDef::new("data", ColumnType::Json).not_null())
        .column(ColumnDef::new("created_at", ColumnType::Timestamp).not_null().default_now())
        .foreign_key(ForeignKey::to_users(USER_COLUMN, OnDelete::SetNull))
}

// =============================================================================
// Model tables
// =============================================================================

/// Table name for a model. Names that collide with a built-in table are
/// prefixed with `app_` and reported.
pub fn table_name(model_name: &str, fallback_id: &str, subject: &str, diagnostics: &mut Diagnostics) -> String {
    let mut name = slugify(model_name);
    if name.is_empty() {
        let id = slugify(fallback_id);
        name = if id.is_empty() { "model".to_string() } else { format!("model_{}", id) };
    }
    if BUILTIN_TABLES.contains(&name.as_str()) {
        let renamed = format!("app_{}", name);
        diagnostics.report(
            subject,
            DiagnosticCode::ReservedTableName,
            format!("model table '{}' collides with a built-in table; using '{}'", name, renamed),
        );
        name = renamed;
    }
    name
}

/// Column for one abstract field
pub fn field_column(field: &Field, default_varchar: u32) -> ColumnDef {
    let mut column = ColumnDef::new(
        field.name.trim(),
        ColumnType::parse(&field.datatype, field.size, default_varchar),
    );
    column.not_null = field.required.is_set();
    column.unique = field.key == KeyRole::Unique;
    column
}

/// Build a model table from its fields.
///
/// Exactly one column is the primary key: the first field keyed primary,
/// else a field named `id`, else a prepended UUID `id`. Later primary fields
/// are demoted to unique. User-specific tables get a trailing `userid`
/// referencing `users`.
pub fn model_table(name: &str, fields: &[Field], user_specific: bool, default_varchar: u32) -> CreateTable {
    let mut table = CreateTable::new(name);
    let mut has_primary = false;

    for field in fields {
        let column_name = field.name.trim();
        if column_name.is_empty() || table.has_column(column_name) {
            tracing::warn!(table = name, field = column_name, "skipping unnamed or duplicate field");
            continue;
        }
        let mut column = field_column(field, default_varchar);
        if field.key == KeyRole::Primary {
            if has_primary {
                column.unique = true;
            } else {
                column = column.primary_key();
                has_primary = true;
            }
        }
        table.columns.push(column);
    }

    if !has_primary {
        match table.columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case("id")) {
            Some(id) => {
                id.primary_key = true;
                id.not_null = true;
                id.unique = false;
            }
            None => table
                .columns
                .insert(0, ColumnDef::new("id", ColumnType::Uuid).primary_key()),
        }
    }

    if user_specific {
        if !table.has_column(USER_COLUMN) {
            table.columns.push(ColumnDef::new(USER_COLUMN, ColumnType::Uuid).not_null());
        }
        table.foreign_keys.push(ForeignKey::to_users(USER_COLUMN, OnDelete::Cascade));
    }

    table
}

// =============================================================================
// Script
// =============================================================================

/// Table name of every model, in model order. Later models whose name is
/// already taken get their id appended.
pub fn model_table_names(models: &[Model], diagnostics: &mut Diagnostics) -> Vec<String> {
    let mut used: Vec<String> = Vec::with_capacity(models.len());
    for model in models {
        let mut name = table_name(&model.name, &model.id, &model.id, diagnostics);
        if used.contains(&name) {
            let renamed = format!("{}_{}", name, slugify(&model.id));
            diagnostics.report(
                &model.id,
                DiagnosticCode::ReservedTableName,
                format!("model table '{}' is already defined; using '{}'", name, renamed),
            );
            name = renamed;
        }
        used.push(name);
    }
    used
}

/// Build the base script for one dialect
pub fn emit_base_schema(
    models: &[Model],
    dialect: &dyn SqlDialect,
    config: &SchemaConfig,
    diagnostics: &mut Diagnostics,
) -> Script {
    let mut script = Script::new([
        format!("Base schema ({})", dialect.name()),
        "Generated by blueprint-compiler. Apply once; later changes ship as migrations.".to_string(),
    ]);

    for table in [migrations_table(), users_table(), sessions_table(), oauth_tokens_table()] {
        script.push(Statement::CreateTable(table));
    }

    let names = model_table_names(models, diagnostics);
    for (model, name) in models.iter().zip(names) {
        let table = model_table(
            &name,
            &model.fields,
            model.data_is_user_specific.is_set(),
            config.default_varchar_size,
        );
        tracing::debug!(model = %model.name, table = %name, columns = table.columns.len(), "model table");
        script.push(Statement::CreateTable(table));
    }

    script.push(Statement::CreateTable(passwords_table()));
    script.push(Statement::CreateTable(form_submissions_table()));
    script.push(Statement::RecordMigration(BASE_MARKER.to_string()));

    tracing::info!(dialect = dialect.name(), models = models.len(), "base schema built");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{MySql, Postgres, Sqlite};
    use serde_json::json;

    fn models(value: serde_json::Value) -> Vec<Model> {
        serde_json::from_value(value).unwrap()
    }

    fn table_names(script: &Script) -> Vec<String> {
        script
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::CreateTable(t) => Some(t.name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_fixed_table_order() {
        let models = models(json!([{"name": "Product", "fields": [{"name": "title", "datatype": "VARCHAR"}]}]));
        let script = emit_base_schema(&models, &Postgres, &SchemaConfig::default(), &mut Diagnostics::new());
        assert_eq!(
            table_names(&script),
            [
                "_migrations",
                "users",
                "sessions",
                "oauth_tokens",
                "product",
                "passwords",
                "form_submissions"
            ]
        );
        assert_eq!(
            script.statements.last(),
            Some(&Statement::RecordMigration("base".to_string()))
        );
    }

    #[test]
    fn test_user_specific_uuid_model_on_sqlite() {
        let models = models(json!([{
            "name": "Order",
            "fields": [{"name": "id", "datatype": "UUID", "key": "primary", "required": "true"}],
            "data_is_user_specific": "true"
        }]));
        let script = emit_base_schema(&models, &Sqlite, &SchemaConfig::default(), &mut Diagnostics::new());
        let sql = script.render(&Sqlite);

        let start = sql.find("CREATE TABLE IF NOT EXISTS \"order\"").unwrap();
        let order = &sql[start..start + sql[start..].find(");").unwrap()];
        assert!(order.contains("\"id\" VARCHAR(36) PRIMARY KEY NOT NULL"));
        let userid = order.find("\"userid\" VARCHAR(36) NOT NULL").unwrap();
        assert!(userid > order.find("\"id\"").unwrap());
        assert!(order.contains("FOREIGN KEY (\"userid\") REFERENCES \"users\" (\"id\") ON DELETE CASCADE"));
    }

    #[test]
    fn test_primary_key_rules() {
        let fields: Vec<Field> = serde_json::from_value(json!([
            {"name": "code", "datatype": "VARCHAR", "size": 12, "key": "primary"},
            {"name": "alt", "datatype": "VARCHAR", "key": "primary"},
            {"name": "qty", "datatype": "TINYINT", "required": "yes"}
        ]))
        .unwrap();
        let table = model_table("stock", &fields, false, 255);
        let pks: Vec<&str> = table.columns.iter().filter(|c| c.primary_key).map(|c| c.name.as_str()).collect();
        assert_eq!(pks, ["code"]);
        assert!(table.columns[1].unique);
        assert!(table.columns[2].not_null);

        let table = model_table("tags", &[], false, 255);
        assert_eq!(table.columns[0].name, "id");
        assert!(table.columns[0].primary_key);
    }

    #[test]
    fn test_reserved_table_names_are_prefixed() {
        let models = models(json!([{"id": 3, "name": "Users"}]));
        let mut diags = Diagnostics::new();
        let script = emit_base_schema(&models, &MySql, &SchemaConfig::default(), &mut diags);
        assert!(table_names(&script).contains(&"app_users".to_string()));
        assert_eq!(diags.with_code(DiagnosticCode::ReservedTableName).count(), 1);
    }

    #[test]
    fn test_column_order_is_dialect_independent() {
        let models = models(json!([{"name": "Note", "fields": [
            {"name": "body", "datatype": "TEXT"}, {"name": "rank", "datatype": "INT"}
        ]}]));
        let order = |dialect: &dyn SqlDialect| -> Vec<String> {
            let script = emit_base_schema(&models, dialect, &SchemaConfig::default(), &mut Diagnostics::new());
            match &script.statements[4] {
                Statement::CreateTable(t) => t.columns.iter().map(|c| c.name.clone()).collect(),
                other => panic!("unexpected {:?}", other),
            }
        };
        assert_eq!(order(&Postgres), order(&MySql));
        assert_eq!(order(&MySql), order(&Sqlite));
    }
}
