//! Named groups of columns, optionally wrapped in an aggregate function.

use crate::{
    error::{Result, ServiceError},
    models::CrashColumn,
    serialize::{ResultRow, ResultValue},
};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl Aggregate {
    /// Lowercase name used in result labels.
    pub fn name(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Count => "count",
        }
    }

    fn sql_function(self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Count => "COUNT",
        }
    }
}

impl FromStr for Aggregate {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "sum" => Ok(Aggregate::Sum),
            "avg" => Ok(Aggregate::Avg),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            "count" => Ok(Aggregate::Count),
            other => Err(ServiceError::InvalidRequest(format!(
                "unsupported aggregate function '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMember {
    pub label: String,
    pub column: CrashColumn,
    pub aggregate: Option<Aggregate>,
}

impl BundleMember {
    pub fn sql(&self) -> String {
        match self.aggregate {
            Some(aggregate) => format!("{}({})", aggregate.sql_function(), self.column.qualified()),
            None => self.column.qualified(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBundle {
    name: String,
    members: Vec<BundleMember>,
}

impl ColumnBundle {
    /// Resolves every field against the `crash` column catalog. With an
    /// aggregate each member is labeled `<fn>_<column>`, otherwise it keeps the
    /// column name. Any unknown field fails the whole bundle.
    pub fn generate<S>(fields: &[S], bundle_name: &str, aggregate: Option<Aggregate>) -> Result<Self>
    where
        S: AsRef<str>,
    {
        if fields.is_empty() {
            return Err(ServiceError::InvalidRequest(format!(
                "column bundle '{bundle_name}' has no fields"
            )));
        }

        let members = fields
            .iter()
            .map(|field| {
                let field = field.as_ref().trim();
                let column = CrashColumn::from_name(field)
                    .ok_or_else(|| ServiceError::UnknownField(field.to_string()))?;
                let label = match aggregate {
                    Some(aggregate) => format!("{}_{}", aggregate.name(), column.name()),
                    None => column.name().to_string(),
                };
                Ok(BundleMember {
                    label,
                    column,
                    aggregate,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            name: bundle_name.to_string(),
            members,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[BundleMember] {
        &self.members
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|member| member.label.as_str())
    }

    /// Grouped totals may only aggregate the injury/fatality counters. A
    /// violation is a server misconfiguration, never a client error.
    pub fn ensure_aggregated_counts(&self) -> Result<()> {
        for member in &self.members {
            if member.aggregate.is_none() {
                return Err(ServiceError::Config(format!(
                    "bundle '{}' member '{}' is not aggregated",
                    self.name, member.label
                )));
            }
            if !member.column.is_count() {
                return Err(ServiceError::Config(format!(
                    "column '{}' cannot be aggregated",
                    member.column.name()
                )));
            }
        }
        Ok(())
    }

    /// Pairs loaded values with member labels, in bundle order.
    pub fn label_values<I>(&self, values: I) -> Result<ResultRow>
    where
        I: IntoIterator,
        I::Item: Into<ResultValue>,
    {
        let values: Vec<ResultValue> = values.into_iter().map(Into::into).collect();
        if values.len() != self.members.len() {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "bundle '{}' expected {} values but got {}",
                self.name,
                self.members.len(),
                values.len()
            )));
        }

        let mut row = ResultRow::new();
        for (member, value) in self.members.iter().zip(values) {
            row.push(member.label.clone(), value);
        }
        Ok(row)
    }
}
