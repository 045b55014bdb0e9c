//! `$orderby` items

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort on a single property path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }

    pub fn to_odata_string(&self) -> String {
        match self.direction {
            OrderDirection::Asc => self.field.clone(),
            OrderDirection::Desc => format!("{} desc", self.field),
        }
    }
}

/// Comma-separated `$orderby` value
pub fn render_orderby(items: &[OrderBy]) -> String {
    items
        .iter()
        .map(OrderBy::to_odata_string)
        .collect::<Vec<_>>()
        .join(",")
}
