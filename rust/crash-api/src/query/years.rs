use crate::{
    error::{Result, ServiceError},
    schema::{
        crash::dsl::{crash, date},
        crash_year,
    },
    serialize::ResultRow,
};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSelectStatement, FromClause};
use diesel::sql_types::{Int4, Nullable};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::Value;

type YearsQuery<'a> =
    BoxedSelectStatement<'a, Nullable<Int4>, FromClause<crate::schema::crash::table>, Pg>;

pub(super) async fn execute(conn: &mut AsyncPgConnection) -> Result<Vec<Value>> {
    let years: Vec<Option<i32>> = build_query()
        .load(conn)
        .await
        .map_err(|err| ServiceError::Internal(err.into()))?;

    Ok(years
        .into_iter()
        .flatten()
        .map(|year| ResultRow::new().with("year", year).into_json())
        .collect())
}

fn build_query() -> YearsQuery<'static> {
    crash
        .select(crash_year())
        .filter(date.is_not_null())
        .distinct()
        .order(crash_year().asc())
        .into_boxed::<Pg>()
}
