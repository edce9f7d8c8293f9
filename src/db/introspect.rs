//! Schema introspection
//!
//! Populates a [`SchemaInformation`] for a named schema from the standard
//! information schema plus the pg_catalog views that carry index
//! definitions and foreign-key targets. All queries use parameter binding;
//! user input is never concatenated into SQL here.
//!
//! Multi-row index and constraint queries are folded by name with an
//! order-preserving name list, so emission order matches first discovery.
//! The fold helpers are pure and unit tested without a database.

use crate::db::schema::{
    ColumnDetails, ConstraintDetails, ConstraintType, IndexDetails, SchemaInformation,
    TableDetails,
};
use crate::error::{EditorError, EditorResult, SchemaStage};
use log::{debug, info, warn};
use std::collections::HashMap;
use tokio_postgres::Client;

/// Default schema assumed when the caller passes an empty name.
pub const DEFAULT_SCHEMA: &str = "public";

const TABLES_SQL: &str = "\
    SELECT t.table_name::text \
    FROM information_schema.tables t \
    WHERE t.table_schema = $1 AND t.table_type = 'BASE TABLE' \
    ORDER BY t.table_name";

const COLUMNS_SQL: &str = "\
    SELECT \
        c.column_name::text, \
        c.ordinal_position::int, \
        c.column_default::text, \
        c.is_nullable::text, \
        c.data_type::text, \
        c.character_maximum_length::int, \
        c.numeric_precision::int, \
        c.numeric_scale::int, \
        pgd.description \
    FROM information_schema.columns c \
    LEFT JOIN pg_catalog.pg_class tbl \
        ON tbl.relname = c.table_name \
        AND tbl.relnamespace = \
            (SELECT oid FROM pg_catalog.pg_namespace WHERE nspname = c.table_schema) \
    LEFT JOIN pg_catalog.pg_description pgd \
        ON pgd.objoid = tbl.oid AND pgd.objsubid = c.ordinal_position \
    WHERE c.table_schema = $1 AND c.table_name = $2 \
    ORDER BY c.ordinal_position";

const INDEXES_SQL: &str = "\
    SELECT \
        i.relname::text AS index_name, \
        idx.indisunique AS is_unique, \
        idx.indisprimary AS is_primary, \
        pg_get_indexdef(idx.indexrelid) AS index_definition, \
        a.attname::text AS column_name, \
        am.amname::text AS index_type \
    FROM pg_catalog.pg_class t \
    JOIN pg_catalog.pg_index idx ON t.oid = idx.indrelid \
    JOIN pg_catalog.pg_class i ON i.oid = idx.indexrelid \
    JOIN pg_catalog.pg_attribute a \
        ON a.attrelid = t.oid AND a.attnum = ANY(idx.indkey) AND NOT a.attisdropped \
    JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace \
    LEFT JOIN pg_catalog.pg_am am ON i.relam = am.oid \
    WHERE t.relkind = 'r' AND t.relname = $1 AND n.nspname = $2 \
    ORDER BY index_name, array_position(idx.indkey, a.attnum)";

const KEY_CONSTRAINTS_SQL: &str = "\
    SELECT \
        tc.constraint_name::text, \
        tc.constraint_type::text, \
        kcu.column_name::text, \
        tc.is_deferrable::text, \
        tc.initially_deferred::text \
    FROM information_schema.table_constraints tc \
    JOIN information_schema.key_column_usage kcu \
        ON tc.constraint_name = kcu.constraint_name \
        AND tc.table_schema = kcu.table_schema \
        AND tc.table_name = kcu.table_name \
    WHERE tc.table_schema = $1 AND tc.table_name = $2 \
        AND tc.constraint_type IN ('PRIMARY KEY', 'FOREIGN KEY', 'UNIQUE') \
    ORDER BY tc.constraint_name, kcu.ordinal_position";

const FK_DETAILS_SQL: &str = "\
    SELECT \
        rc.constraint_name::text, \
        ccu.table_name::text AS foreign_table_name, \
        ccu.column_name::text AS foreign_column_name \
    FROM information_schema.referential_constraints rc \
    JOIN information_schema.key_column_usage kcu \
        ON rc.constraint_name = kcu.constraint_name \
        AND rc.constraint_schema = kcu.table_schema \
    JOIN information_schema.constraint_column_usage ccu \
        ON rc.unique_constraint_name = ccu.constraint_name \
        AND rc.unique_constraint_schema = ccu.table_schema \
    WHERE kcu.table_schema = $1 AND kcu.table_name = $2 \
    ORDER BY rc.constraint_name, kcu.ordinal_position";

const CHECK_CONSTRAINTS_SQL: &str = "\
    SELECT \
        tc.constraint_name::text, \
        cc.check_clause::text, \
        tc.is_deferrable::text, \
        tc.initially_deferred::text \
    FROM information_schema.check_constraints cc \
    JOIN information_schema.table_constraints tc \
        ON cc.constraint_name = tc.constraint_name \
        AND cc.constraint_schema = tc.constraint_schema \
    WHERE tc.table_schema = $1 AND tc.table_name = $2";

/// Fetch the full schema information for `schema_name`.
///
/// Lists base tables in name order, then fetches columns, indexes, and
/// constraints per table. Never returns a partial result: any failing
/// stage fails the whole operation.
pub async fn table_schema(client: &Client, schema_name: &str) -> EditorResult<SchemaInformation> {
    let schema_name = if schema_name.is_empty() {
        DEFAULT_SCHEMA
    } else {
        schema_name
    };
    info!("fetching schema information for '{}'", schema_name);

    let table_rows = client
        .query(TABLES_SQL, &[&schema_name])
        .await
        .map_err(|e| EditorError::schema(SchemaStage::Tables, e))?;
    let table_names: Vec<String> = table_rows.iter().map(|r| r.get(0)).collect();

    let mut tables = Vec::with_capacity(table_names.len());
    for table_name in table_names {
        debug!("fetching details for table '{}'", table_name);
        let columns = columns_for_table(client, schema_name, &table_name).await?;
        let indexes = indexes_for_table(client, schema_name, &table_name).await?;
        let constraints = constraints_for_table(client, schema_name, &table_name).await?;
        tables.push(TableDetails {
            table_name,
            columns,
            indexes,
            constraints,
        });
    }

    info!(
        "schema '{}' introspected: {} tables",
        schema_name,
        tables.len()
    );
    Ok(SchemaInformation {
        schema_name: schema_name.to_string(),
        tables,
    })
}

/// Fetch the columns of one table, ordered by ordinal position.
pub async fn columns_for_table(
    client: &Client,
    schema_name: &str,
    table_name: &str,
) -> EditorResult<Vec<ColumnDetails>> {
    let rows = client
        .query(COLUMNS_SQL, &[&schema_name, &table_name])
        .await
        .map_err(|e| EditorError::schema(SchemaStage::Columns, e))?;

    Ok(rows
        .iter()
        .map(|row| ColumnDetails {
            column_name: row.get(0),
            ordinal_position: row.get(1),
            column_default: row.get(2),
            is_nullable: row.get(3),
            data_type: row.get(4),
            character_maximum_length: row.get(5),
            numeric_precision: row.get(6),
            numeric_scale: row.get(7),
            comment: row.get(8),
        })
        .collect())
}

/// List table names in `schema_name` whose names match `prefix` case
/// insensitively, or every table when the prefix is empty.
pub async fn tables_matching(
    client: &Client,
    schema_name: &str,
    prefix: &str,
) -> EditorResult<Vec<String>> {
    let pattern = format!("{}%", prefix);
    let rows = client
        .query(
            "SELECT t.table_name::text FROM information_schema.tables t \
             WHERE t.table_schema = $1 AND (t.table_name ILIKE $2 OR $3 = '') \
             ORDER BY t.table_name",
            &[&schema_name, &pattern, &prefix],
        )
        .await
        .map_err(|e| EditorError::schema(SchemaStage::Tables, e))?;
    Ok(rows.iter().map(|r| r.get(0)).collect())
}

async fn indexes_for_table(
    client: &Client,
    schema_name: &str,
    table_name: &str,
) -> EditorResult<Vec<IndexDetails>> {
    let rows = client
        .query(INDEXES_SQL, &[&table_name, &schema_name])
        .await
        .map_err(|e| EditorError::schema(SchemaStage::Indexes, e))?;

    let index_rows: Vec<IndexRow> = rows
        .iter()
        .map(|row| IndexRow {
            name: row.get(0),
            is_unique: row.get(1),
            is_primary: row.get(2),
            definition: row.get(3),
            column: row.get(4),
            index_type: row.get(5),
        })
        .collect();

    Ok(fold_indexes(index_rows))
}

async fn constraints_for_table(
    client: &Client,
    schema_name: &str,
    table_name: &str,
) -> EditorResult<Vec<ConstraintDetails>> {
    let params: &[&(dyn tokio_postgres::types::ToSql + Sync)] = &[&schema_name, &table_name];

    let key_rows = client
        .query(KEY_CONSTRAINTS_SQL, params)
        .await
        .map_err(|e| EditorError::schema(SchemaStage::KeyConstraints, e))?
        .iter()
        .map(|row| KeyConstraintRow {
            name: row.get(0),
            constraint_type: row.get(1),
            column: row.get(2),
            deferrable: row.get::<_, String>(3) == "YES",
            initially_deferred: row.get::<_, String>(4) == "YES",
        })
        .collect::<Vec<_>>();

    let fk_rows = client
        .query(FK_DETAILS_SQL, params)
        .await
        .map_err(|e| EditorError::schema(SchemaStage::ForeignKeyDetails, e))?
        .iter()
        .map(|row| ForeignKeyRow {
            name: row.get(0),
            foreign_table: row.get(1),
            foreign_column: row.get(2),
        })
        .collect::<Vec<_>>();

    let check_rows = client
        .query(CHECK_CONSTRAINTS_SQL, params)
        .await
        .map_err(|e| EditorError::schema(SchemaStage::CheckConstraints, e))?
        .iter()
        .map(|row| CheckConstraintRow {
            name: row.get(0),
            clause: row.get(1),
            deferrable: row.get::<_, String>(2) == "YES",
            initially_deferred: row.get::<_, String>(3) == "YES",
        })
        .collect::<Vec<_>>();

    let mut fold = ConstraintFold::new();
    fold.apply_key_rows(key_rows);
    fold.apply_foreign_key_rows(fk_rows);
    fold.apply_check_rows(check_rows);
    Ok(fold.finish())
}

// ── Fold helpers ────────────────────────────────────────────

/// One row of the per-(index, column) catalog query.
#[derive(Debug, Clone)]
pub(crate) struct IndexRow {
    pub name: Option<String>,
    pub definition: Option<String>,
    pub is_unique: bool,
    pub is_primary: bool,
    pub column: Option<String>,
    pub index_type: Option<String>,
}

/// Fold per-column index rows into one [`IndexDetails`] per index name,
/// preserving first-seen order and key-position column order. Rows missing
/// the name, definition, or column are skipped.
pub(crate) fn fold_indexes(rows: Vec<IndexRow>) -> Vec<IndexDetails> {
    let mut by_name: HashMap<String, IndexDetails> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for row in rows {
        let (Some(name), Some(definition), Some(column)) = (row.name, row.definition, row.column)
        else {
            warn!("skipping index row with NULL essential fields");
            continue;
        };

        let entry = by_name.entry(name.clone()).or_insert_with(|| {
            order.push(name.clone());
            IndexDetails {
                index_name: name,
                index_definition: definition,
                is_unique: row.is_unique,
                is_primary: row.is_primary,
                index_type: row.index_type.unwrap_or_default(),
                columns: Vec::new(),
            }
        });
        entry.columns.push(column);
    }

    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}

#[derive(Debug, Clone)]
pub(crate) struct KeyConstraintRow {
    pub name: String,
    pub constraint_type: String,
    pub column: String,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ForeignKeyRow {
    pub name: String,
    pub foreign_table: String,
    pub foreign_column: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CheckConstraintRow {
    pub name: String,
    pub clause: String,
    pub deferrable: bool,
    pub initially_deferred: bool,
}

/// Order-preserving merge of the three constraint passes.
pub(crate) struct ConstraintFold {
    by_name: HashMap<String, ConstraintDetails>,
    order: Vec<String>,
}

impl ConstraintFold {
    pub(crate) fn new() -> Self {
        Self {
            by_name: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Key pass: group PRIMARY KEY / FOREIGN KEY / UNIQUE rows by name,
    /// appending columns in ordinal order.
    pub(crate) fn apply_key_rows(&mut self, rows: Vec<KeyConstraintRow>) {
        let Self { by_name, order } = self;
        for row in rows {
            let Some(constraint_type) = ConstraintType::parse(&row.constraint_type) else {
                warn!(
                    "skipping constraint '{}' with unrecognized type '{}'",
                    row.name, row.constraint_type
                );
                continue;
            };

            let entry = by_name.entry(row.name.clone()).or_insert_with(|| {
                order.push(row.name.clone());
                ConstraintDetails {
                    constraint_name: row.name.clone(),
                    constraint_type,
                    column_names: Vec::new(),
                    foreign_table_name: None,
                    foreign_column_names: Vec::new(),
                    check_clause: None,
                    deferrable: row.deferrable,
                    initially_deferred: row.initially_deferred,
                }
            });
            entry.column_names.push(row.column);
        }
    }

    /// Foreign-key detail pass: attach the referenced table and columns to
    /// the matching FOREIGN KEY entry, columns aligned with the key pass.
    pub(crate) fn apply_foreign_key_rows(&mut self, rows: Vec<ForeignKeyRow>) {
        let mut targets: HashMap<String, (String, Vec<String>)> = HashMap::new();
        for row in rows {
            let entry = targets
                .entry(row.name)
                .or_insert_with(|| (row.foreign_table, Vec::new()));
            entry.1.push(row.foreign_column);
        }

        for (name, (foreign_table, foreign_columns)) in targets {
            if let Some(constraint) = self.by_name.get_mut(&name) {
                if constraint.constraint_type == ConstraintType::ForeignKey {
                    constraint.foreign_table_name = Some(foreign_table);
                    constraint.foreign_column_names = foreign_columns;
                }
            }
        }
    }

    /// Check pass: insert or update the matching entry with its clause;
    /// new entries are appended to the emission order.
    pub(crate) fn apply_check_rows(&mut self, rows: Vec<CheckConstraintRow>) {
        for row in rows {
            match self.by_name.get_mut(&row.name) {
                Some(existing) => {
                    existing.check_clause = Some(row.clause);
                    existing.constraint_type = ConstraintType::Check;
                }
                None => {
                    self.order.push(row.name.clone());
                    self.by_name.insert(
                        row.name.clone(),
                        ConstraintDetails {
                            constraint_name: row.name,
                            constraint_type: ConstraintType::Check,
                            column_names: Vec::new(),
                            foreign_table_name: None,
                            foreign_column_names: Vec::new(),
                            check_clause: Some(row.clause),
                            deferrable: row.deferrable,
                            initially_deferred: row.initially_deferred,
                        },
                    );
                }
            }
        }
    }

    /// Emit constraints in recorded order.
    pub(crate) fn finish(mut self) -> Vec<ConstraintDetails> {
        self.order
            .into_iter()
            .filter_map(|name| self.by_name.remove(&name))
            .collect()
    }
}
