use crate::{
    error::{Result, ServiceError},
    schema::crash::dsl::{crash, latitude, longitude, unique_key, zip_code},
    serialize::ResultRow,
};
use diesel::dsl::{IntoBoxed, Select};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::Value;
use std::collections::HashMap;

type PointQuery<'a> = IntoBoxed<'a, Select<crash, (unique_key, latitude, longitude)>, Pg>;

/// Rectangle between two corners. Bounds are exclusive and not reordered, so
/// `lat1 >= lat2` or `lng1 >= lng2` matches nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat1: f64,
    pub lng1: f64,
    pub lat2: f64,
    pub lng2: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRequest {
    pub bounds: BoundingBox,
    /// Only crashes carrying the unknown-zip sentinel.
    pub zip_less_only: bool,
}

impl MapRequest {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let bounds = BoundingBox {
            lat1: coordinate(params, "lat1")?,
            lng1: coordinate(params, "lng1")?,
            lat2: coordinate(params, "lat2")?,
            lng2: coordinate(params, "lng2")?,
        };
        let zip_less_only = match required(params, "zip")?.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(ServiceError::InvalidRequest(
                    "zip must be 'True' or 'False'".into(),
                ))
            }
        };

        Ok(Self {
            bounds,
            zip_less_only,
        })
    }
}

fn required<'a>(params: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::InvalidRequest(format!("missing required parameter '{key}'")))
}

fn coordinate(params: &HashMap<String, String>, key: &str) -> Result<f64> {
    let raw = required(params, key)?;
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ServiceError::InvalidRequest(format!("{key} must be a finite number")))
}

pub(super) async fn execute(conn: &mut AsyncPgConnection, request: &MapRequest) -> Result<Vec<Value>> {
    let rows: Vec<(i32, Option<f64>, Option<f64>)> = build_query(request)
        .load(conn)
        .await
        .map_err(|err| ServiceError::Internal(err.into()))?;

    Ok(rows
        .into_iter()
        .map(|(key, lat, lng)| {
            ResultRow::new()
                .with("unique_key", key)
                .with("latitude", lat)
                .with("longitude", lng)
                .into_json()
        })
        .collect())
}

fn build_query(request: &MapRequest) -> PointQuery<'static> {
    let BoundingBox {
        lat1,
        lng1,
        lat2,
        lng2,
    } = request.bounds;

    let mut query = crash
        .select((unique_key, latitude, longitude))
        .into_boxed::<Pg>()
        .filter(latitude.gt(lat1))
        .filter(latitude.lt(lat2))
        .filter(longitude.gt(lng1))
        .filter(longitude.lt(lng2));

    if request.zip_less_only {
        query = query.filter(zip_code.is_null().or(zip_code.lt(1)));
    }

    query.order(unique_key.asc())
}
