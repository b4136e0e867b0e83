//! Diesel schema definition for the collision table served by the crash API.

use diesel::expression::SqlLiteral;
use diesel::sql_types::{Int4, Nullable};

diesel::table! {
    use diesel::sql_types::*;

    crash (unique_key) {
        unique_key -> Int4,
        borough -> Nullable<Text>,
        zip_code -> Nullable<Int4>,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        location -> Nullable<Text>,
        on_street_name -> Nullable<Text>,
        cross_street_name -> Nullable<Text>,
        off_street_name -> Nullable<Text>,
        number_of_persons_injured -> Nullable<Int4>,
        number_of_persons_killed -> Nullable<Int4>,
        number_of_pedestrians_injured -> Nullable<Int4>,
        number_of_pedestrians_killed -> Nullable<Int4>,
        number_of_cyclist_injured -> Nullable<Int4>,
        number_of_cyclist_killed -> Nullable<Int4>,
        number_of_motorist_injured -> Nullable<Int4>,
        number_of_motorist_killed -> Nullable<Int4>,
        contributing_factor_vehicle_1 -> Nullable<Text>,
        contributing_factor_vehicle_2 -> Nullable<Text>,
        contributing_factor_vehicle_3 -> Nullable<Text>,
        contributing_factor_vehicle_4 -> Nullable<Text>,
        contributing_factor_vehicle_5 -> Nullable<Text>,
        vehicle_type_code_1 -> Nullable<Text>,
        vehicle_type_code_2 -> Nullable<Text>,
        vehicle_type_code_3 -> Nullable<Text>,
        vehicle_type_code_4 -> Nullable<Text>,
        vehicle_type_code_5 -> Nullable<Text>,
        time -> Nullable<Time>,
        date -> Nullable<Date>,
    }
}

/// SQL for the year derived from `crash.date`. Kept as a single literal so the
/// same text can appear in a `SELECT DISTINCT` list and its `ORDER BY`.
pub const CRASH_YEAR_SQL: &str = "CAST(EXTRACT(YEAR FROM \"crash\".\"date\") AS INTEGER)";

/// The derived year as a Diesel expression.
pub fn crash_year() -> SqlLiteral<Nullable<Int4>> {
    diesel::dsl::sql(CRASH_YEAR_SQL)
}
