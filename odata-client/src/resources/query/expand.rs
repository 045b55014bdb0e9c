//! `$expand` items with nested options

use super::filters::Filter;
use super::orderby::{OrderBy, render_orderby};

/// Depth of a recursive expand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Levels {
    Max,
    Depth(u32),
}

impl Levels {
    fn to_odata_string(self) -> String {
        match self {
            Levels::Max => "max".to_string(),
            Levels::Depth(depth) => depth.to_string(),
        }
    }
}

/// One expanded navigation property
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpandItem {
    pub path: String,
    pub select: Vec<String>,
    pub expand: Vec<ExpandItem>,
    pub filter: Option<Filter>,
    pub search: Option<String>,
    pub orderby: Vec<OrderBy>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub count: bool,
    pub levels: Option<Levels>,
}

impl ExpandItem {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn expand(mut self, item: ExpandItem) -> Self {
        self.expand.push(item);
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn orderby(mut self, item: OrderBy) -> Self {
        self.orderby.push(item);
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn levels(mut self, levels: Levels) -> Self {
        self.levels = Some(levels);
        self
    }

    /// `path` or `path($select=...;$filter=...)`
    pub fn to_odata_string(&self) -> String {
        let mut options = Vec::new();
        if !self.select.is_empty() {
            options.push(format!("$select={}", self.select.join(",")));
        }
        if !self.expand.is_empty() {
            options.push(format!("$expand={}", render_expand(&self.expand)));
        }
        if let Some(filter) = &self.filter {
            options.push(format!("$filter={}", filter.to_odata_string()));
        }
        if let Some(search) = &self.search {
            options.push(format!("$search={}", search));
        }
        if !self.orderby.is_empty() {
            options.push(format!("$orderby={}", render_orderby(&self.orderby)));
        }
        if let Some(top) = self.top {
            options.push(format!("$top={}", top));
        }
        if let Some(skip) = self.skip {
            options.push(format!("$skip={}", skip));
        }
        if self.count {
            options.push("$count=true".to_string());
        }
        if let Some(levels) = self.levels {
            options.push(format!("$levels={}", levels.to_odata_string()));
        }

        if options.is_empty() {
            self.path.clone()
        } else {
            format!("{}({})", self.path, options.join(";"))
        }
    }
}

impl From<&str> for ExpandItem {
    fn from(path: &str) -> Self {
        ExpandItem::new(path)
    }
}

/// Comma-separated `$expand` value
pub fn render_expand(items: &[ExpandItem]) -> String {
    items
        .iter()
        .map(ExpandItem::to_odata_string)
        .collect::<Vec<_>>()
        .join(",")
}
