//! Offset-based pagination with lenient number parsing

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Raw `page`/`limit` query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Resolved page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Resolve raw parameters. Missing, unparseable or non-positive values
    /// fall back to page 1 and `default_limit`. There is no upper bound.
    pub fn resolve(page: Option<&str>, limit: Option<&str>, default_limit: i64) -> Self {
        Self {
            page: page.and_then(parse_positive).unwrap_or(1),
            limit: limit.and_then(parse_positive).unwrap_or(default_limit),
        }
    }

    /// Number of records to skip
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl PageQuery {
    pub fn resolve(&self, default_limit: i64) -> Pagination {
        Pagination::resolve(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }
}

/// "3", " 3 " and "3.9" all read as 3
fn parse_positive(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let value = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))?;
    (value >= 1).then_some(value)
}
