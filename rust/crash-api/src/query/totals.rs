use super::{bundle::ColumnBundle, filters::CrashFilter, rewrite_placeholders, SqlBindValue};
use crate::{
    error::{Result, ServiceError},
    models::CrashColumn,
    schema::CRASH_YEAR_SQL,
    serialize::ResultRow,
};
use diesel::pg::Pg;
use diesel::sql_query;
use diesel::sql_types::{Array, Int4, Nullable, Numeric};
use diesel::QueryableByName;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
struct TotalsSql {
    sql: String,
    binds: Vec<SqlBindValue>,
}

#[derive(QueryableByName)]
struct ZipTotalsRow {
    #[diesel(sql_type = Nullable<Int4>)]
    zip_code: Option<i32>,
    #[diesel(sql_type = Array<Nullable<Numeric>>)]
    totals: Vec<Option<Decimal>>,
}

pub(super) async fn execute(
    conn: &mut AsyncPgConnection,
    bundle: &ColumnBundle,
    filter: &CrashFilter,
) -> Result<Vec<Value>> {
    let totals = build_totals_query(bundle, filter)?;
    debug!(?filter, sql = %totals.sql, "running zip code totals");

    let mut query = sql_query(rewrite_placeholders(&totals.sql)).into_boxed::<Pg>();
    for bind in &totals.binds {
        query = bind.apply(query);
    }
    let rows: Vec<ZipTotalsRow> = query
        .load(conn)
        .await
        .map_err(|err| ServiceError::Internal(err.into()))?;

    rows.into_iter()
        .map(|row| {
            let totals = bundle.label_values(row.totals)?;
            Ok(ResultRow::new()
                .with("zip_code", row.zip_code)
                .with(bundle.name(), totals)
                .into_json())
        })
        .collect()
}

fn build_totals_query(bundle: &ColumnBundle, filter: &CrashFilter) -> Result<TotalsSql> {
    bundle.ensure_aggregated_counts()?;

    let zip = CrashColumn::ZipCode.qualified();
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(value) = filter.zip_code {
        clauses.push(format!("{zip} = ?"));
        binds.push(SqlBindValue::Int(value));
    }
    if let Some(value) = &filter.borough {
        clauses.push(format!("{} = ?", CrashColumn::Borough.qualified()));
        binds.push(SqlBindValue::Text(value.clone()));
    }
    if let Some(value) = filter.year {
        clauses.push(format!("{CRASH_YEAR_SQL} = ?"));
        binds.push(SqlBindValue::Int(value));
    }

    let totals = bundle
        .members()
        .iter()
        .map(|member| format!("CAST({} AS NUMERIC)", member.sql()))
        .collect::<Vec<_>>()
        .join(", ");

    let mut sql = format!("SELECT {zip} AS zip_code, ARRAY[{totals}] AS totals\nFROM \"crash\"");
    if !clauses.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!("\nGROUP BY {zip}\nORDER BY {zip} ASC NULLS LAST"));

    Ok(TotalsSql { sql, binds })
}
