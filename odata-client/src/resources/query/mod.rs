//! Query option set
//!
//! A name -> value map over the system query options plus custom
//! parameters. Resources own one set each; factories clear or filter it
//! depending on the kind of resource they create.

pub mod expand;
pub mod filters;
pub mod orderby;
pub mod transform;

pub use expand::{ExpandItem, Levels, render_expand};
pub use filters::{Filter, FilterValue};
pub use orderby::{OrderBy, OrderDirection, render_orderby};
pub use transform::{AggregateMethod, Aggregation, Transform, render_apply};

use std::collections::BTreeMap;

/// Option names, in rendering order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryOptionName {
    Select,
    Expand,
    Filter,
    Search,
    OrderBy,
    Top,
    Skip,
    SkipToken,
    Format,
    Apply,
    Custom,
}

impl QueryOptionName {
    /// Query parameter name; custom parameters carry their own names
    pub fn param(&self) -> Option<&'static str> {
        match self {
            QueryOptionName::Select => Some("$select"),
            QueryOptionName::Expand => Some("$expand"),
            QueryOptionName::Filter => Some("$filter"),
            QueryOptionName::Search => Some("$search"),
            QueryOptionName::OrderBy => Some("$orderby"),
            QueryOptionName::Top => Some("$top"),
            QueryOptionName::Skip => Some("$skip"),
            QueryOptionName::SkipToken => Some("$skiptoken"),
            QueryOptionName::Format => Some("$format"),
            QueryOptionName::Apply => Some("$apply"),
            QueryOptionName::Custom => None,
        }
    }
}

/// Typed value of a query option
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOptionValue {
    Select(Vec<String>),
    Expand(Vec<ExpandItem>),
    /// Conjunction of filters
    Filter(Vec<Filter>),
    Search(String),
    OrderBy(Vec<OrderBy>),
    Top(u64),
    Skip(u64),
    SkipToken(String),
    Format(String),
    Apply(Vec<Transform>),
    Custom(BTreeMap<String, String>),
}

impl QueryOptionValue {
    pub fn name(&self) -> QueryOptionName {
        match self {
            QueryOptionValue::Select(_) => QueryOptionName::Select,
            QueryOptionValue::Expand(_) => QueryOptionName::Expand,
            QueryOptionValue::Filter(_) => QueryOptionName::Filter,
            QueryOptionValue::Search(_) => QueryOptionName::Search,
            QueryOptionValue::OrderBy(_) => QueryOptionName::OrderBy,
            QueryOptionValue::Top(_) => QueryOptionName::Top,
            QueryOptionValue::Skip(_) => QueryOptionName::Skip,
            QueryOptionValue::SkipToken(_) => QueryOptionName::SkipToken,
            QueryOptionValue::Format(_) => QueryOptionName::Format,
            QueryOptionValue::Apply(_) => QueryOptionName::Apply,
            QueryOptionValue::Custom(_) => QueryOptionName::Custom,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            QueryOptionValue::Select(v) => v.is_empty(),
            QueryOptionValue::Expand(v) => v.is_empty(),
            QueryOptionValue::Filter(v) => v.is_empty(),
            QueryOptionValue::OrderBy(v) => v.is_empty(),
            QueryOptionValue::Apply(v) => v.is_empty(),
            QueryOptionValue::Custom(v) => v.is_empty(),
            QueryOptionValue::Search(s)
            | QueryOptionValue::SkipToken(s)
            | QueryOptionValue::Format(s) => s.is_empty(),
            QueryOptionValue::Top(_) | QueryOptionValue::Skip(_) => false,
        }
    }

    /// Rendered parameter value
    fn render(&self) -> String {
        match self {
            QueryOptionValue::Select(fields) => fields.join(","),
            QueryOptionValue::Expand(items) => render_expand(items),
            QueryOptionValue::Filter(filters) => match filters.as_slice() {
                [single] => single.to_odata_string(),
                many => Filter::And(many.to_vec()).to_odata_string(),
            },
            QueryOptionValue::Search(s)
            | QueryOptionValue::SkipToken(s)
            | QueryOptionValue::Format(s) => s.clone(),
            QueryOptionValue::OrderBy(items) => render_orderby(items),
            QueryOptionValue::Top(n) | QueryOptionValue::Skip(n) => n.to_string(),
            QueryOptionValue::Apply(steps) => render_apply(steps),
            QueryOptionValue::Custom(_) => String::new(),
        }
    }
}

/// Query options of a resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    values: BTreeMap<QueryOptionName, QueryOptionValue>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = QueryOptionName> + '_ {
        self.values.keys().copied()
    }

    /// Current value of an option
    pub fn option(&self, name: QueryOptionName) -> Option<&QueryOptionValue> {
        self.values.get(&name)
    }

    /// Replace an option and return the stored value
    pub fn set_option(&mut self, value: QueryOptionValue) -> &QueryOptionValue {
        let name = value.name();
        self.values.insert(name, value);
        &self.values[&name]
    }

    pub fn remove(&mut self, name: QueryOptionName) -> Option<QueryOptionValue> {
        self.values.remove(&name)
    }

    /// Drop every option
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Drop every option not in `names`
    pub fn keep(&mut self, names: &[QueryOptionName]) {
        self.values.retain(|name, _| names.contains(name));
    }

    pub fn select_mut(&mut self) -> &mut Vec<String> {
        match self
            .values
            .entry(QueryOptionName::Select)
            .or_insert_with(|| QueryOptionValue::Select(Vec::new()))
        {
            QueryOptionValue::Select(fields) => fields,
            other => unreachable_option(other),
        }
    }

    pub fn expand_mut(&mut self) -> &mut Vec<ExpandItem> {
        match self
            .values
            .entry(QueryOptionName::Expand)
            .or_insert_with(|| QueryOptionValue::Expand(Vec::new()))
        {
            QueryOptionValue::Expand(items) => items,
            other => unreachable_option(other),
        }
    }

    pub fn filter_mut(&mut self) -> &mut Vec<Filter> {
        match self
            .values
            .entry(QueryOptionName::Filter)
            .or_insert_with(|| QueryOptionValue::Filter(Vec::new()))
        {
            QueryOptionValue::Filter(filters) => filters,
            other => unreachable_option(other),
        }
    }

    pub fn orderby_mut(&mut self) -> &mut Vec<OrderBy> {
        match self
            .values
            .entry(QueryOptionName::OrderBy)
            .or_insert_with(|| QueryOptionValue::OrderBy(Vec::new()))
        {
            QueryOptionValue::OrderBy(items) => items,
            other => unreachable_option(other),
        }
    }

    pub fn apply_mut(&mut self) -> &mut Vec<Transform> {
        match self
            .values
            .entry(QueryOptionName::Apply)
            .or_insert_with(|| QueryOptionValue::Apply(Vec::new()))
        {
            QueryOptionValue::Apply(steps) => steps,
            other => unreachable_option(other),
        }
    }

    pub fn custom_mut(&mut self) -> &mut BTreeMap<String, String> {
        match self
            .values
            .entry(QueryOptionName::Custom)
            .or_insert_with(|| QueryOptionValue::Custom(BTreeMap::new()))
        {
            QueryOptionValue::Custom(params) => params,
            other => unreachable_option(other),
        }
    }

    /// Render to query parameters in a stable order, custom parameters last
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        for value in self.values.values() {
            if value.is_empty() {
                continue;
            }
            match (value.name().param(), value) {
                (Some(param), value) => params.push((param.to_string(), value.render())),
                (None, QueryOptionValue::Custom(custom)) => {
                    params.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())))
                }
                (None, _) => {}
            }
        }
        params
    }
}

// Entries are only inserted by `set_option` and the typed accessors, both keyed
// by `QueryOptionValue::name`, so a typed accessor always finds its own variant.
fn unreachable_option<T>(value: &mut QueryOptionValue) -> T {
    unreachable!("query option stored under the wrong name: {:?}", value.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QueryOptions {
        let mut options = QueryOptions::new();
        options.select_mut().extend(["id".to_string(), "name".to_string()]);
        options.filter_mut().push(Filter::eq("name", "Ann"));
        options.set_option(QueryOptionValue::Top(5));
        options.set_option(QueryOptionValue::Format("json".into()));
        options.custom_mut().insert("lang".into(), "en".into());
        options
    }

    #[test]
    fn test_render_order() {
        let params = sample().to_params();
        let names: Vec<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["$select", "$filter", "$top", "$format", "lang"]);
        assert_eq!(params[1].1, "name eq 'Ann'");
    }

    #[test]
    fn test_filters_are_conjoined() {
        let mut options = QueryOptions::new();
        options.filter_mut().push(Filter::eq("a", 1));
        options.filter_mut().push(Filter::or(vec![Filter::eq("b", 2), Filter::eq("c", 3)]));
        assert_eq!(
            options.to_params(),
            vec![("$filter".to_string(), "a eq 1 and (b eq 2 or c eq 3)".to_string())]
        );
    }

    #[test]
    fn test_set_option_returns_new_value() {
        let mut options = QueryOptions::new();
        let value = options.set_option(QueryOptionValue::Skip(10)).clone();
        assert_eq!(value, QueryOptionValue::Skip(10));
        assert_eq!(
            options.option(QueryOptionName::Skip),
            Some(&QueryOptionValue::Skip(10))
        );

        options.set_option(QueryOptionValue::Skip(20));
        assert_eq!(options.to_params(), vec![("$skip".to_string(), "20".to_string())]);
    }

    #[test]
    fn test_replaced_options_keep_typed_handles_usable() {
        let mut options = QueryOptions::new();
        options.set_option(QueryOptionValue::Select(vec!["id".into()]));
        options.set_option(QueryOptionValue::Top(3));
        options.select_mut().push("name".into());
        options.set_option(QueryOptionValue::Expand(Vec::new()));
        options.expand_mut().push(ExpandItem::new("friends"));

        assert_eq!(options.option(QueryOptionName::Top), Some(&QueryOptionValue::Top(3)));
        assert_eq!(
            options.option(QueryOptionName::Select),
            Some(&QueryOptionValue::Select(vec!["id".into(), "name".into()]))
        );
        assert_eq!(options.expand_mut().len(), 1);
    }

    #[test]
    fn test_keep_is_idempotent() {
        let mut once = sample();
        once.keep(&[QueryOptionName::Filter, QueryOptionName::Search]);
        let mut twice = once.clone();
        twice.keep(&[QueryOptionName::Filter, QueryOptionName::Search]);

        assert_eq!(once, twice);
        assert_eq!(once.names().collect::<Vec<_>>(), vec![QueryOptionName::Filter]);
    }

    #[test]
    fn test_clear() {
        let mut options = sample();
        options.clear();
        assert!(options.is_empty());
        assert!(options.to_params().is_empty());
    }

    #[test]
    fn test_empty_composites_are_not_rendered() {
        let mut options = QueryOptions::new();
        options.select_mut();
        options.expand_mut().push(ExpandItem::new("friends"));
        assert_eq!(
            options.to_params(),
            vec![("$expand".to_string(), "friends".to_string())]
        );
    }
}
