//! Migration deltas
//!
//! Turns the change journal into ordered DDL. Entries are compiled in journal
//! order with no reordering or batching. Changes a dialect cannot express are
//! kept in place as manual-migration comments.

use chrono::NaiveDateTime;

use crate::blueprint::{Blueprint, ChangeOp, Field, Migration, MigrationAction, Model};
use crate::config::SchemaConfig;
use crate::graph::{DiagnosticCode, DiagnosticItem, Diagnostics};

use super::base::{field_column, model_table, model_table_names, table_name};
use super::ddl::{cannot_remove, cannot_retype, ColumnDef, Script, Statement};
use super::dialect::{ColumnType, SqlDialect};

/// Compile the journal into statements for one dialect
pub fn emit_migration_delta(
    blueprint: &Blueprint,
    dialect: &dyn SqlDialect,
    config: &SchemaConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Statement> {
    // Base-script names; their diagnostics belong to the base build
    let tables = model_table_names(&blueprint.models, &mut Diagnostics::new());
    let mut statements = Vec::new();
    for entry in &blueprint.migrations {
        compile_entry(entry, blueprint, &tables, dialect, config, diagnostics, &mut statements);
    }
    tracing::debug!(
        dialect = dialect.name(),
        entries = blueprint.migrations.len(),
        statements = statements.len(),
        "migration delta"
    );
    statements
}

fn entry_subject(entry: &Migration) -> String {
    if entry.id.is_empty() {
        entry.model.clone()
    } else {
        entry.id.clone()
    }
}

fn invalid(diagnostics: &mut Diagnostics, subject: &str, message: String, context: Option<String>) {
    let mut item = DiagnosticItem::new(subject, DiagnosticCode::InvalidJournalEntry, message);
    if let Some(context) = context {
        item = item.with_context(context);
    }
    diagnostics.push(item);
}

/// The model an entry targets: by `model_id` when given, else by name
fn target_model<'a>(
    entry: &Migration,
    blueprint: &'a Blueprint,
    subject: &str,
    diagnostics: &mut Diagnostics,
) -> Option<(usize, &'a Model)> {
    if let Some(id) = entry.model_id.as_deref() {
        match blueprint.models.iter().enumerate().find(|(_, m)| m.id == id) {
            Some(found) => return Some(found),
            None => diagnostics.report(
                subject,
                DiagnosticCode::AmbiguousModel,
                format!("journal entry names model id '{}', which is not defined; matching by name", id),
            ),
        }
    }

    let mut named = blueprint.models.iter().enumerate().filter(|(_, m)| m.name == entry.model);
    let first = named.next()?;
    let others = named.count();
    if others > 0 {
        diagnostics.report(
            subject,
            DiagnosticCode::AmbiguousModel,
            format!(
                "{} models are named '{}'; targeting model '{}'",
                others + 1,
                entry.model,
                first.1.id
            ),
        );
    }
    Some(first)
}

fn compile_entry(
    entry: &Migration,
    blueprint: &Blueprint,
    tables: &[String],
    dialect: &dyn SqlDialect,
    config: &SchemaConfig,
    diagnostics: &mut Diagnostics,
    out: &mut Vec<Statement>,
) {
    let subject = entry_subject(entry);
    if entry.model.trim().is_empty() && entry.model_id.is_none() {
        invalid(diagnostics, &subject, "journal entry names no model; skipped".to_string(), None);
        return;
    }
    let target = target_model(entry, blueprint, &subject, diagnostics);
    let table = match target.and_then(|(index, _)| tables.get(index)) {
        Some(table) => table.clone(),
        None if entry.model.trim().is_empty() => {
            invalid(diagnostics, &subject, "journal entry names no known model; skipped".to_string(), None);
            return;
        }
        None => table_name(&entry.model, &entry.id, &subject, diagnostics),
    };

    match &entry.action {
        MigrationAction::Create => {
            let mut fields: Vec<Field> = Vec::new();
            for change in &entry.changes {
                if change.operation != ChangeOp::Add {
                    invalid(
                        diagnostics,
                        &subject,
                        format!("create of '{}' carries a non-add change; ignored", entry.model),
                        None,
                    );
                    continue;
                }
                match added_field(change.definition(), change.field_name()) {
                    Some(field) => fields.push(field),
                    None => invalid(
                        diagnostics,
                        &subject,
                        format!("add change on '{}' names no field; ignored", entry.model),
                        None,
                    ),
                }
            }
            if fields.is_empty() {
                if let Some((_, model)) = target {
                    fields = model.fields.clone();
                }
            }
            out.push(Statement::CreateTable(model_table(
                &table,
                &fields,
                entry.data_is_user_specific.is_set(),
                config.default_varchar_size,
            )));
        }
        MigrationAction::Delete => out.push(Statement::DropTable(table)),
        MigrationAction::Update => {
            for change in &entry.changes {
                if !change.target.eq_ignore_ascii_case("field") {
                    invalid(
                        diagnostics,
                        &subject,
                        format!("unsupported change target '{}'; ignored", change.target),
                        None,
                    );
                    continue;
                }
                compile_field_change(
                    &subject,
                    &table,
                    change.operation.clone(),
                    change.definition(),
                    change.field_name(),
                    dialect,
                    config,
                    diagnostics,
                    out,
                );
            }
        }
        MigrationAction::Unknown(raw) => invalid(
            diagnostics,
            &subject,
            format!("unknown migration action '{}'; skipped", raw),
            None,
        ),
    }
}

/// Field for an add change: the recorded definition, or a default-typed column by name
fn added_field(definition: Option<&Field>, name: Option<&str>) -> Option<Field> {
    match definition {
        Some(field) if !field.name.trim().is_empty() => Some(field.clone()),
        _ => name.map(|name| Field {
            name: name.to_string(),
            ..Field::default()
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn compile_field_change(
    subject: &str,
    table: &str,
    operation: ChangeOp,
    definition: Option<&Field>,
    name: Option<&str>,
    dialect: &dyn SqlDialect,
    config: &SchemaConfig,
    diagnostics: &mut Diagnostics,
    out: &mut Vec<Statement>,
) {
    match operation {
        ChangeOp::Add => {
            let Some(field) = added_field(definition, name) else {
                invalid(diagnostics, subject, format!("add on '{}' names no field; ignored", table), None);
                return;
            };
            let mut column = field_column(&field, config.default_varchar_size);
            if column.not_null && !dialect.supports_not_null_on_add() {
                diagnostics.report(
                    subject,
                    DiagnosticCode::DialectCapabilityGap,
                    format!(
                        "{} cannot add required column '{}' to existing rows; added as nullable",
                        dialect.name(),
                        column.name
                    ),
                );
                column.not_null = false;
            }
            out.push(Statement::AddColumn {
                table: table.to_string(),
                column,
            });
        }
        ChangeOp::Remove => {
            let Some(column) = name else {
                invalid(diagnostics, subject, format!("remove on '{}' names no field; ignored", table), None);
                return;
            };
            if dialect.drop_column(table, column).is_some() {
                out.push(Statement::DropColumn {
                    table: table.to_string(),
                    column: column.to_string(),
                });
            } else {
                diagnostics.report(
                    subject,
                    DiagnosticCode::DialectCapabilityGap,
                    format!("{} cannot drop column '{}' from '{}'; manual migration required", dialect.name(), column, table),
                );
                out.push(Statement::ManualStep(cannot_remove(dialect.name(), table, column)));
            }
        }
        ChangeOp::Modify => {
            let Some(field) = definition else {
                invalid(
                    diagnostics,
                    subject,
                    format!("modify on '{}' carries no new definition; ignored", table),
                    name.map(|n| format!("field: {}", n)),
                );
                return;
            };
            let column_name = name.unwrap_or(field.name.as_str()).trim();
            let mut column = ColumnDef::new(
                column_name,
                ColumnType::parse(&field.datatype, field.size, config.default_varchar_size),
            );
            column.not_null = field.required.is_set();

            if dialect
                .alter_column_type(table, &column.name, &column.ty, column.not_null)
                .is_some()
            {
                out.push(Statement::AlterColumnType {
                    table: table.to_string(),
                    column,
                });
            } else {
                diagnostics.report(
                    subject,
                    DiagnosticCode::DialectCapabilityGap,
                    format!(
                        "{} cannot change the type of '{}.{}'; manual migration required",
                        dialect.name(),
                        table,
                        column.name
                    ),
                );
                out.push(Statement::ManualStep(cannot_retype(
                    dialect.name(),
                    table,
                    &column.name,
                    dialect.column_type(&column.ty),
                )));
            }
        }
        ChangeOp::Unknown(raw) => invalid(
            diagnostics,
            subject,
            format!("unknown field operation '{}'; ignored", raw),
            name.map(|n| format!("field: {}", n)),
        ),
    }
}

// =============================================================================
// Migration files
// =============================================================================

/// File name of a migration: `NNNN_YYYYMMDDHHMMSS.sql`
pub fn migration_file_name(sequence: u32, now: NaiveDateTime) -> String {
    format!("{:04}_{}.sql", sequence, now.format("%Y%m%d%H%M%S"))
}

/// Wrap a delta into a script that records itself in the tracking table.
/// Returns `None` for an empty delta.
pub fn migration_script(
    statements: Vec<Statement>,
    file_name: &str,
    dialect: &dyn SqlDialect,
) -> Option<Script> {
    if statements.is_empty() {
        return None;
    }
    let mut script = Script::new([
        format!("Migration {} ({})", file_name, dialect.name()),
        "Generated by blueprint-compiler. Do not edit.".to_string(),
    ]);
    for statement in statements {
        script.push(statement);
    }
    script.push(Statement::RecordMigration(file_name.to_string()));
    Some(script)
}
