//! `$apply` transformations

use super::filters::Filter;

/// Aggregation method used in `with <method>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateMethod {
    Sum,
    Min,
    Max,
    Average,
    CountDistinct,
}

impl AggregateMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateMethod::Sum => "sum",
            AggregateMethod::Min => "min",
            AggregateMethod::Max => "max",
            AggregateMethod::Average => "average",
            AggregateMethod::CountDistinct => "countdistinct",
        }
    }
}

/// `<field> with <method> as <alias>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub field: String,
    pub method: AggregateMethod,
    pub alias: String,
}

impl Aggregation {
    pub fn new(
        field: impl Into<String>,
        method: AggregateMethod,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            method,
            alias: alias.into(),
        }
    }

    fn to_odata_string(&self) -> String {
        format!("{} with {} as {}", self.field, self.method.as_str(), self.alias)
    }
}

/// One step of an `$apply` pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    Filter(Filter),
    GroupBy {
        properties: Vec<String>,
        aggregate: Vec<Aggregation>,
    },
    Aggregate(Vec<Aggregation>),
}

impl Transform {
    pub fn group_by<I, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Transform::GroupBy {
            properties: properties.into_iter().map(Into::into).collect(),
            aggregate: Vec::new(),
        }
    }

    /// Attach an aggregation to a `groupby` step
    pub fn with_aggregate(mut self, aggregation: Aggregation) -> Self {
        match &mut self {
            Transform::GroupBy { aggregate, .. } | Transform::Aggregate(aggregate) => {
                aggregate.push(aggregation)
            }
            Transform::Filter(_) => {
                log::warn!("Ignoring aggregation {} on a filter step", aggregation.alias)
            }
        }
        self
    }

    pub fn to_odata_string(&self) -> String {
        match self {
            Transform::Filter(filter) => format!("filter({})", filter.to_odata_string()),
            Transform::GroupBy {
                properties,
                aggregate,
            } => {
                let group = format!("({})", properties.join(","));
                if aggregate.is_empty() {
                    format!("groupby({})", group)
                } else {
                    format!("groupby({},{})", group, render_aggregate(aggregate))
                }
            }
            Transform::Aggregate(aggregate) => render_aggregate(aggregate),
        }
    }
}

fn render_aggregate(aggregations: &[Aggregation]) -> String {
    let parts: Vec<String> = aggregations
        .iter()
        .map(Aggregation::to_odata_string)
        .collect();
    format!("aggregate({})", parts.join(","))
}

/// Slash-separated `$apply` value
pub fn render_apply(steps: &[Transform]) -> String {
    steps
        .iter()
        .map(Transform::to_odata_string)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline() {
        let steps = vec![
            Transform::Filter(Filter::eq("active", true)),
            Transform::group_by(["department"]).with_aggregate(Aggregation::new(
                "salary",
                AggregateMethod::Sum,
                "total",
            )),
        ];
        assert_eq!(
            render_apply(&steps),
            "filter(active eq true)/groupby((department),aggregate(salary with sum as total))"
        );
    }

    #[test]
    fn test_aggregate_only() {
        let step = Transform::Aggregate(vec![
            Aggregation::new("salary", AggregateMethod::Average, "avg"),
            Aggregation::new("id", AggregateMethod::CountDistinct, "people"),
        ]);
        assert_eq!(
            step.to_odata_string(),
            "aggregate(salary with average as avg,id with countdistinct as people)"
        );
        assert_eq!(
            Transform::group_by(["a", "b"]).to_odata_string(),
            "groupby((a,b))"
        );
    }
}
