//! `$filter` expressions

use crate::resources::key::quote;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

/// Literal operand of a filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    Guid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    /// Qualified enum member, rendered `Ns.Type'Member'`
    Enum { type_name: String, member: String },
    Null,
    /// Emitted verbatim (e.g. another property path)
    Raw(String),
}

impl FilterValue {
    pub fn to_literal(&self) -> String {
        match self {
            FilterValue::String(s) => quote(s),
            FilterValue::Integer(n) => n.to_string(),
            FilterValue::Number(n) => n.to_string(),
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Guid(g) => g.hyphenated().to_string(),
            FilterValue::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            FilterValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FilterValue::Enum { type_name, member } => format!("{}'{}'", type_name, member),
            FilterValue::Null => "null".to_string(),
            FilterValue::Raw(raw) => raw.clone(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Integer(value.into())
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Number(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Guid(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::DateTime(value)
    }
}

impl From<NaiveDate> for FilterValue {
    fn from(value: NaiveDate) -> Self {
        FilterValue::Date(value)
    }
}

/// Filter expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, FilterValue),
    Ne(String, FilterValue),
    Gt(String, FilterValue),
    Ge(String, FilterValue),
    Lt(String, FilterValue),
    Le(String, FilterValue),
    Contains(String, FilterValue),
    StartsWith(String, FilterValue),
    EndsWith(String, FilterValue),
    In(String, Vec<FilterValue>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Raw(String),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    pub fn ge(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    pub fn le(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::Contains(field.into(), value.into())
    }

    pub fn starts_with(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::StartsWith(field.into(), value.into())
    }

    pub fn ends_with(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Filter::EndsWith(field.into(), value.into())
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FilterValue>,
    {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    pub fn raw(expression: impl Into<String>) -> Self {
        Filter::Raw(expression.into())
    }

    /// Render as a `$filter` expression
    pub fn to_odata_string(&self) -> String {
        match self {
            Filter::Eq(field, value) => format!("{} eq {}", field, value.to_literal()),
            Filter::Ne(field, value) => format!("{} ne {}", field, value.to_literal()),
            Filter::Gt(field, value) => format!("{} gt {}", field, value.to_literal()),
            Filter::Ge(field, value) => format!("{} ge {}", field, value.to_literal()),
            Filter::Lt(field, value) => format!("{} lt {}", field, value.to_literal()),
            Filter::Le(field, value) => format!("{} le {}", field, value.to_literal()),
            Filter::Contains(field, value) => {
                format!("contains({},{})", field, value.to_literal())
            }
            Filter::StartsWith(field, value) => {
                format!("startswith({},{})", field, value.to_literal())
            }
            Filter::EndsWith(field, value) => {
                format!("endswith({},{})", field, value.to_literal())
            }
            Filter::In(field, values) => {
                let literals: Vec<String> = values.iter().map(FilterValue::to_literal).collect();
                format!("{} in ({})", field, literals.join(","))
            }
            Filter::And(filters) => join(filters, "and"),
            Filter::Or(filters) => join(filters, "or"),
            Filter::Not(inner) => format!("not ({})", inner.to_odata_string()),
            Filter::Raw(raw) => raw.clone(),
        }
    }

    fn is_compound(&self) -> bool {
        match self {
            Filter::And(filters) | Filter::Or(filters) => filters.len() > 1,
            Filter::Raw(raw) => raw.contains(" and ") || raw.contains(" or "),
            _ => false,
        }
    }
}

fn join(filters: &[Filter], operator: &str) -> String {
    let separator = format!(" {} ", operator);
    filters
        .iter()
        .map(|filter| {
            if filters.len() > 1 && filter.is_compound() {
                format!("({})", filter.to_odata_string())
            } else {
                filter.to_odata_string()
            }
        })
        .collect::<Vec<_>>()
        .join(&separator)
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_odata_string())
    }
}
