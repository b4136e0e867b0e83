//! Query-string cleaning for the aggregate endpoint.

use crate::error::{Result, ServiceError};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    ZipCode,
    Borough,
    Year,
}

impl FilterKey {
    pub const ALLOWED: [FilterKey; 3] = [FilterKey::ZipCode, FilterKey::Borough, FilterKey::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::ZipCode => "zip_code",
            FilterKey::Borough => "borough",
            FilterKey::Year => "year",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALLOWED.iter().copied().find(|key| key.as_str() == raw)
    }
}

pub type CleanedFilters = BTreeMap<FilterKey, String>;

/// Keeps allowed keys with non-empty values and rejects anything else.
/// When a key repeats, its first non-empty value wins.
pub fn clean_filters<I, K, V>(pairs: I) -> Result<CleanedFilters>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut cleaned = CleanedFilters::new();

    for (key, value) in pairs {
        let key = key.as_ref();
        let filter_key = FilterKey::parse(key).ok_or_else(|| {
            ServiceError::InvalidRequest(format!(
                "unsupported filter key '{key}'; expected one of zip_code, borough, year"
            ))
        })?;

        let value = value.into();
        if value.is_empty() {
            continue;
        }
        cleaned.entry(filter_key).or_insert(value);
    }

    Ok(cleaned)
}

/// Typed form of the cleaned filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrashFilter {
    pub zip_code: Option<i32>,
    pub borough: Option<String>,
    pub year: Option<i32>,
}

impl CrashFilter {
    pub fn is_empty(&self) -> bool {
        self.zip_code.is_none() && self.borough.is_none() && self.year.is_none()
    }
}

impl TryFrom<CleanedFilters> for CrashFilter {
    type Error = ServiceError;

    fn try_from(mut cleaned: CleanedFilters) -> Result<Self> {
        let zip_code = cleaned
            .remove(&FilterKey::ZipCode)
            .map(|raw| parse_i32(FilterKey::ZipCode, &raw))
            .transpose()?;
        let year = cleaned
            .remove(&FilterKey::Year)
            .map(|raw| parse_i32(FilterKey::Year, &raw))
            .transpose()?;
        let borough = cleaned.remove(&FilterKey::Borough);

        Ok(Self {
            zip_code,
            borough,
            year,
        })
    }
}

fn parse_i32(key: FilterKey, raw: &str) -> Result<i32> {
    raw.trim().parse::<i32>().map_err(|_| {
        ServiceError::InvalidRequest(format!("{} must be an integer", key.as_str()))
    })
}
