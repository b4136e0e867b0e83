//! Conversion of labeled query results into JSON.
//!
//! Query builders hand back [`ResultRow`]s: ordered `(label, value)` pairs whose
//! values may themselves be labeled bundles. Serialization walks the tree and
//! turns each row into a JSON object with one key per label, in row order
//! (`serde_json` is built with `preserve_order`). `NUMERIC` values
//! arrive as [`Decimal`] and are converted to `f64` through their decimal
//! string, so `12.50` becomes exactly `12.5`.

use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Null,
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bundle(ResultRow),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    fields: Vec<(String, ResultValue)>,
}

impl ResultRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, label: impl Into<String>, value: impl Into<ResultValue>) -> Self {
        self.push(label, value);
        self
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<ResultValue>) {
        self.fields.push((label.into(), value.into()));
    }

    pub fn into_json(self) -> Value {
        let mut object = Map::with_capacity(self.fields.len());
        for (label, value) in self.fields {
            object.insert(label, value.into_json());
        }
        Value::Object(object)
    }
}

impl ResultValue {
    pub fn into_json(self) -> Value {
        match self {
            ResultValue::Null => Value::Null,
            ResultValue::Int(value) => Value::from(value),
            ResultValue::Float(value) => float_json(value),
            ResultValue::Decimal(value) => decimal_json(&value),
            ResultValue::Text(value) => Value::String(value),
            ResultValue::Bundle(row) => row.into_json(),
        }
    }
}

/// Normalizes a decimal through its string form; non-finite results become `null`.
pub fn decimal_json(value: &Decimal) -> Value {
    value
        .to_string()
        .parse::<f64>()
        .map(float_json)
        .unwrap_or(Value::Null)
}

fn float_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

impl From<i32> for ResultValue {
    fn from(value: i32) -> Self {
        ResultValue::Int(i64::from(value))
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        ResultValue::Int(value)
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Float(value)
    }
}

impl From<Decimal> for ResultValue {
    fn from(value: Decimal) -> Self {
        ResultValue::Decimal(value)
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::Text(value)
    }
}

impl From<ResultRow> for ResultValue {
    fn from(row: ResultRow) -> Self {
        ResultValue::Bundle(row)
    }
}

impl<T> From<Option<T>> for ResultValue
where
    T: Into<ResultValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(ResultValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn decimal_is_normalized_through_its_string_form() {
        let value = Decimal::from_str("12.50").unwrap();
        assert_eq!(decimal_json(&value), json!(12.5));
        assert_eq!(decimal_json(&value).as_f64(), Some(12.5));
    }

    #[test]
    fn whole_decimals_become_floats() {
        let value = ResultValue::Decimal(Decimal::from(3));
        assert_eq!(value.into_json().as_f64(), Some(3.0));
    }

    #[test]
    fn nested_bundles_keep_every_label() {
        let totals = ResultRow::new()
            .with(
                "sum_number_of_pedestrians_injured",
                Decimal::from_str("3").unwrap(),
            )
            .with("sum_number_of_cyclist_killed", None::<Decimal>);
        let row = ResultRow::new()
            .with("zip_code", Some(10001))
            .with("crash_totals", totals);

        assert_eq!(
            row.into_json(),
            json!({
                "zip_code": 10001,
                "crash_totals": {
                    "sum_number_of_pedestrians_injured": 3.0,
                    "sum_number_of_cyclist_killed": null,
                }
            })
        );
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(ResultValue::from(7_i32).into_json(), json!(7));
        assert_eq!(ResultValue::from(40.6774).into_json(), json!(40.6774));
        assert_eq!(
            ResultValue::from("BRONX".to_string()).into_json(),
            json!("BRONX")
        );
        assert_eq!(ResultValue::from(None::<f64>).into_json(), Value::Null);
        assert_eq!(ResultValue::Float(f64::NAN).into_json(), Value::Null);
    }

    #[test]
    fn objects_keep_row_order() {
        let totals = ResultRow::new()
            .with("avg_number_of_pedestrians_injured", Decimal::ONE)
            .with("avg_number_of_cyclist_injured", Decimal::ZERO);
        let row = ResultRow::new()
            .with("zip_code", 10469_i32)
            .with("crash_totals", totals);

        assert_eq!(
            serde_json::to_string(&row.into_json()).unwrap(),
            r#"{"zip_code":10469,"crash_totals":{"avg_number_of_pedestrians_injured":1.0,"avg_number_of_cyclist_injured":0.0}}"#
        );
    }
}
