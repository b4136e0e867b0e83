//! Row types and the column catalog for the `crash` table.

use chrono::{Datelike, NaiveDate, NaiveTime};
use diesel::prelude::*;

/// One reported collision, as stored.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::crash)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CrashRecord {
    pub unique_key: i32,
    pub borough: Option<String>,
    pub zip_code: Option<i32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location: Option<String>,
    pub on_street_name: Option<String>,
    pub cross_street_name: Option<String>,
    pub off_street_name: Option<String>,

    pub number_of_persons_injured: Option<i32>,
    pub number_of_persons_killed: Option<i32>,
    pub number_of_pedestrians_injured: Option<i32>,
    pub number_of_pedestrians_killed: Option<i32>,
    pub number_of_cyclist_injured: Option<i32>,
    pub number_of_cyclist_killed: Option<i32>,
    pub number_of_motorist_injured: Option<i32>,
    pub number_of_motorist_killed: Option<i32>,

    pub contributing_factor_vehicle_1: Option<String>,
    pub contributing_factor_vehicle_2: Option<String>,
    pub contributing_factor_vehicle_3: Option<String>,
    pub contributing_factor_vehicle_4: Option<String>,
    pub contributing_factor_vehicle_5: Option<String>,
    pub vehicle_type_code_1: Option<String>,
    pub vehicle_type_code_2: Option<String>,
    pub vehicle_type_code_3: Option<String>,
    pub vehicle_type_code_4: Option<String>,
    pub vehicle_type_code_5: Option<String>,

    pub time: Option<NaiveTime>,
    pub date: Option<NaiveDate>,
}

impl CrashRecord {
    /// Calendar year of the crash, derived from `date`.
    pub fn year(&self) -> Option<i32> {
        self.date.map(|date| date.year())
    }
}

/// Explicit name-to-column catalog for the `crash` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrashColumn {
    UniqueKey,
    Borough,
    ZipCode,
    Latitude,
    Longitude,
    Location,
    OnStreetName,
    CrossStreetName,
    OffStreetName,
    PersonsInjured,
    PersonsKilled,
    PedestriansInjured,
    PedestriansKilled,
    CyclistInjured,
    CyclistKilled,
    MotoristInjured,
    MotoristKilled,
    ContributingFactorVehicle1,
    ContributingFactorVehicle2,
    ContributingFactorVehicle3,
    ContributingFactorVehicle4,
    ContributingFactorVehicle5,
    VehicleTypeCode1,
    VehicleTypeCode2,
    VehicleTypeCode3,
    VehicleTypeCode4,
    VehicleTypeCode5,
    Time,
    Date,
}

impl CrashColumn {
    pub const ALL: [CrashColumn; 29] = [
        CrashColumn::UniqueKey,
        CrashColumn::Borough,
        CrashColumn::ZipCode,
        CrashColumn::Latitude,
        CrashColumn::Longitude,
        CrashColumn::Location,
        CrashColumn::OnStreetName,
        CrashColumn::CrossStreetName,
        CrashColumn::OffStreetName,
        CrashColumn::PersonsInjured,
        CrashColumn::PersonsKilled,
        CrashColumn::PedestriansInjured,
        CrashColumn::PedestriansKilled,
        CrashColumn::CyclistInjured,
        CrashColumn::CyclistKilled,
        CrashColumn::MotoristInjured,
        CrashColumn::MotoristKilled,
        CrashColumn::ContributingFactorVehicle1,
        CrashColumn::ContributingFactorVehicle2,
        CrashColumn::ContributingFactorVehicle3,
        CrashColumn::ContributingFactorVehicle4,
        CrashColumn::ContributingFactorVehicle5,
        CrashColumn::VehicleTypeCode1,
        CrashColumn::VehicleTypeCode2,
        CrashColumn::VehicleTypeCode3,
        CrashColumn::VehicleTypeCode4,
        CrashColumn::VehicleTypeCode5,
        CrashColumn::Time,
        CrashColumn::Date,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CrashColumn::UniqueKey => "unique_key",
            CrashColumn::Borough => "borough",
            CrashColumn::ZipCode => "zip_code",
            CrashColumn::Latitude => "latitude",
            CrashColumn::Longitude => "longitude",
            CrashColumn::Location => "location",
            CrashColumn::OnStreetName => "on_street_name",
            CrashColumn::CrossStreetName => "cross_street_name",
            CrashColumn::OffStreetName => "off_street_name",
            CrashColumn::PersonsInjured => "number_of_persons_injured",
            CrashColumn::PersonsKilled => "number_of_persons_killed",
            CrashColumn::PedestriansInjured => "number_of_pedestrians_injured",
            CrashColumn::PedestriansKilled => "number_of_pedestrians_killed",
            CrashColumn::CyclistInjured => "number_of_cyclist_injured",
            CrashColumn::CyclistKilled => "number_of_cyclist_killed",
            CrashColumn::MotoristInjured => "number_of_motorist_injured",
            CrashColumn::MotoristKilled => "number_of_motorist_killed",
            CrashColumn::ContributingFactorVehicle1 => "contributing_factor_vehicle_1",
            CrashColumn::ContributingFactorVehicle2 => "contributing_factor_vehicle_2",
            CrashColumn::ContributingFactorVehicle3 => "contributing_factor_vehicle_3",
            CrashColumn::ContributingFactorVehicle4 => "contributing_factor_vehicle_4",
            CrashColumn::ContributingFactorVehicle5 => "contributing_factor_vehicle_5",
            CrashColumn::VehicleTypeCode1 => "vehicle_type_code_1",
            CrashColumn::VehicleTypeCode2 => "vehicle_type_code_2",
            CrashColumn::VehicleTypeCode3 => "vehicle_type_code_3",
            CrashColumn::VehicleTypeCode4 => "vehicle_type_code_4",
            CrashColumn::VehicleTypeCode5 => "vehicle_type_code_5",
            CrashColumn::Time => "time",
            CrashColumn::Date => "date",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.name() == name)
    }

    /// The injury/fatality counters; the only columns that may be aggregated.
    pub fn is_count(self) -> bool {
        matches!(
            self,
            CrashColumn::PersonsInjured
                | CrashColumn::PersonsKilled
                | CrashColumn::PedestriansInjured
                | CrashColumn::PedestriansKilled
                | CrashColumn::CyclistInjured
                | CrashColumn::CyclistKilled
                | CrashColumn::MotoristInjured
                | CrashColumn::MotoristKilled
        )
    }

    /// Quoted, table-qualified identifier, e.g. `"crash"."zip_code"`.
    pub fn qualified(self) -> String {
        format!("\"crash\".\"{}\"", self.name())
    }
}
