//! Query parameters for the route list endpoint.
//!
//! Logical filter names are what a UI works with; the backend expects its
//! own parameter names. The translation is a fixed table.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A filter the list endpoint understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteFilter {
    Name,
    Id,
    MinDistance,
    MaxDistance,
    ExactDistance,
    FromName,
    ToName,
    CoordinatesX,
    CoordinatesY,
    FromX,
    FromY,
    ToX,
    ToY,
    CreationDateFrom,
    CreationDateTo,
}

impl RouteFilter {
    pub const ALL: [RouteFilter; 15] = [
        RouteFilter::Name,
        RouteFilter::Id,
        RouteFilter::MinDistance,
        RouteFilter::MaxDistance,
        RouteFilter::ExactDistance,
        RouteFilter::FromName,
        RouteFilter::ToName,
        RouteFilter::CoordinatesX,
        RouteFilter::CoordinatesY,
        RouteFilter::FromX,
        RouteFilter::FromY,
        RouteFilter::ToX,
        RouteFilter::ToY,
        RouteFilter::CreationDateFrom,
        RouteFilter::CreationDateTo,
    ];

    /// Name used by callers.
    pub fn logical_name(self) -> &'static str {
        match self {
            RouteFilter::Name => "name",
            RouteFilter::Id => "id",
            RouteFilter::MinDistance => "minDistance",
            RouteFilter::MaxDistance => "maxDistance",
            RouteFilter::ExactDistance => "exactDistance",
            RouteFilter::FromName => "fromName",
            RouteFilter::ToName => "toName",
            RouteFilter::CoordinatesX => "coordinatesX",
            RouteFilter::CoordinatesY => "coordinatesY",
            RouteFilter::FromX => "fromX",
            RouteFilter::FromY => "fromY",
            RouteFilter::ToX => "toX",
            RouteFilter::ToY => "toY",
            RouteFilter::CreationDateFrom => "creationDateFrom",
            RouteFilter::CreationDateTo => "creationDateTo",
        }
    }

    /// Query parameter name on the wire.
    pub fn wire_name(self) -> &'static str {
        match self {
            RouteFilter::Name => "filterName",
            RouteFilter::Id => "filter.id",
            RouteFilter::MinDistance => "filter.distance.min",
            RouteFilter::MaxDistance => "filter.distance.max",
            RouteFilter::ExactDistance => "filter.distance.equals",
            RouteFilter::FromName => "filter.fromName",
            RouteFilter::ToName => "filter.toName",
            RouteFilter::CoordinatesX => "filter.coordinatesX",
            RouteFilter::CoordinatesY => "filter.coordinatesY",
            RouteFilter::FromX => "filter.fromX",
            RouteFilter::FromY => "filter.fromY",
            RouteFilter::ToX => "filter.toX",
            RouteFilter::ToY => "filter.toY",
            RouteFilter::CreationDateFrom => "filter.creationDate.from",
            RouteFilter::CreationDateTo => "filter.creationDate.to",
        }
    }
}

impl FromStr for RouteFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteFilter::ALL
            .into_iter()
            .find(|f| f.logical_name() == s)
            .ok_or_else(|| format!("unknown filter: {s}"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// One `field,direction` sort token. Field names are passed through as
/// the backend knows them (`id`, `name`, `distance`, `creationDate`,
/// `coordinatesX`, `fromName`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.field, self.direction.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    /// Accepts `field` or `field,asc|desc` (direction is case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(',') {
            Some((field, dir)) => (field.trim(), dir.trim()),
            None => (s.trim(), "asc"),
        };
        if field.is_empty() {
            return Err(format!("empty sort field in {s:?}"));
        }
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(format!("unknown sort direction: {other}")),
        };
        Ok(SortOrder {
            field: field.to_string(),
            direction,
        })
    }
}

/// Page, filters and sort for a list call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    filters: Vec<(RouteFilter, String)>,
    pub sort: Vec<SortOrder>,
}

impl RouteQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// A size of 0 is treated as unset.
    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    /// Set a filter. An empty (or whitespace-only) value clears it.
    pub fn filter(mut self, filter: RouteFilter, value: impl ToString) -> Self {
        self.set_filter(filter, value.to_string());
        self
    }

    pub fn sort_by(mut self, order: SortOrder) -> Self {
        self.sort.push(order);
        self
    }

    pub fn set_filter(&mut self, filter: RouteFilter, value: String) {
        self.filters.retain(|(f, _)| *f != filter);
        if !value.trim().is_empty() {
            self.filters.push((filter, value));
        }
    }

    pub fn filters(&self) -> &[(RouteFilter, String)] {
        &self.filters
    }

    /// Wire parameters: `page`, `size`, the filters in the order they were
    /// set, then one `sort` per sort token.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let size = self.size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        let mut params = vec![
            ("page".to_string(), self.page.unwrap_or(DEFAULT_PAGE).to_string()),
            ("size".to_string(), size.to_string()),
        ];
        params.extend(
            self.filters
                .iter()
                .map(|(f, v)| (f.wire_name().to_string(), v.clone())),
        );
        params.extend(self.sort.iter().map(|s| ("sort".to_string(), s.to_string())));
        params
    }
}
