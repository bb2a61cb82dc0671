//! Domain records for the route-management and navigator services.
//!
//! # Design
//! These are the shapes the rest of the program consumes, not the wire
//! shapes: the XML dialect lives entirely in `codec`. Every record derives
//! serde so a host across the FFI boundary can receive it as JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named point. The same shape is used for a route's origin
/// (`fromLocation`) and destination (`toLocation`).
///
/// `id` is `None` when the service did not return one; such a location can
/// only be referred to by name and coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Option<i64>,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            x,
            y,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub fn midpoint(a: &Location, b: &Location) -> Self {
        Self {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// A route as decoded from the primary or navigator service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub coordinates: Coordinates,
    pub from: Location,
    pub to: Location,
    pub distance: f64,
    pub creation_date: Option<DateTime<Utc>>,
}

/// Payload for creating a route. Location ids are never sent; the service
/// assigns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRoute {
    pub name: String,
    pub coordinates: Coordinates,
    pub from: Location,
    pub to: Location,
    pub distance: f64,
}

/// Payload for updating a route. Only name and distance can change once a
/// route exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteUpdate {
    pub name: String,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_elements: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub page_size: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total_elements: 0,
            total_pages: 1,
            current_page: 0,
            page_size: 10,
        }
    }
}

/// One page of routes.
///
/// `pagination` is `None` only when the document could not be parsed at all
/// and the list was degraded to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub routes: Vec<Route>,
    pub pagination: Option<Pagination>,
}

impl PageResult {
    pub fn is_degraded(&self) -> bool {
        self.pagination.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceSum {
    pub total_sum: f64,
    pub route_count: u64,
    pub average_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceGroupEntry {
    pub distance: f64,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceGroup {
    pub groups: Vec<DistanceGroupEntry>,
    pub total_groups: u64,
    pub total_routes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreaterThanResult {
    pub routes: Vec<Route>,
    pub count: u64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub average_distance: f64,
}

/// Order in which the navigator returns routes between two locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Distance,
    Name,
    CreationDate,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Distance => "distance",
            SortKey::Name => "name",
            SortKey::CreationDate => "creationDate",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(SortKey::Distance),
            "name" => Ok(SortKey::Name),
            "creationDate" => Ok(SortKey::CreationDate),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

/// Routes found between two locations, in a uniform shape whether the
/// navigator returned data or answered 404.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathfindingResult {
    pub routes: Vec<Route>,
    pub from_location_id: i64,
    pub to_location_id: i64,
    pub sorted_by: SortKey,
    pub total_found: usize,
    pub total_elements: usize,
    pub search_timestamp: DateTime<Utc>,
}

impl PathfindingResult {
    pub fn new(routes: Vec<Route>, from_location_id: i64, to_location_id: i64, sorted_by: SortKey) -> Self {
        let found = routes.len();
        Self {
            routes,
            from_location_id,
            to_location_id,
            sorted_by,
            total_found: found,
            total_elements: found,
            search_timestamp: Utc::now(),
        }
    }

    /// The navigator answered 404: no routes connect the two locations.
    pub fn empty(from_location_id: i64, to_location_id: i64, sorted_by: SortKey) -> Self {
        Self::new(Vec::new(), from_location_id, to_location_id, sorted_by)
    }
}

/// Outcome of a create, update or delete call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
    pub message: String,
    /// Raw response body, kept for create so callers can inspect the echo.
    pub data: Option<String>,
}

impl MutationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Which service ends up creating an edge between two locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeStrategy {
    TryNavigator,
    FallbackToPrimary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeResult {
    pub success: bool,
    pub message: String,
    pub created_by: Option<String>,
    pub route: Option<Route>,
    pub strategy: EdgeStrategy,
}

/// Distinct identified locations seen in a page of routes, split by role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationDirectory {
    pub origins: Vec<Location>,
    pub destinations: Vec<Location>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults() {
        let p = Pagination::default();
        assert_eq!((p.total_elements, p.total_pages, p.current_page, p.page_size), (0, 1, 0, 10));
    }

    #[test]
    fn midpoint_averages_both_axes() {
        let a = Location::new("A", 1.0, 10.0);
        let b = Location::new("B", 4.0, -2.0);
        assert_eq!(Coordinates::midpoint(&a, &b), Coordinates { x: 2.5, y: 4.0 });
    }

    #[test]
    fn sort_key_parses_wire_names() {
        assert_eq!("creationDate".parse::<SortKey>().unwrap(), SortKey::CreationDate);
        assert_eq!(SortKey::Name.to_string(), "name");
        assert!("length".parse::<SortKey>().is_err());
    }

    #[test]
    fn empty_pathfinding_result_is_well_formed() {
        let r = PathfindingResult::empty(3, 7, SortKey::Name);
        assert!(r.routes.is_empty());
        assert_eq!((r.total_found, r.total_elements), (0, 0));
        assert_eq!((r.from_location_id, r.to_location_id), (3, 7));
        assert_eq!(r.sorted_by, SortKey::Name);
    }

    #[test]
    fn route_serializes_camel_case() {
        let json = serde_json::to_value(Route::default()).unwrap();
        assert!(json.get("creationDate").is_some());
        assert_eq!(json["from"]["id"], serde_json::Value::Null);
    }
}
