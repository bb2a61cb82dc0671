//! In-memory stand-in for the route-management and navigator services.
//!
//! Both services share one store and speak the same XML dialect as the real
//! deployment. They are mounted under `/route-management-service` and
//! `/navigator-service`.

use std::{cmp::Ordering, str::FromStr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const PRIMARY_PREFIX: &str = "/route-management-service";
pub const NAVIGATOR_PREFIX: &str = "/navigator-service";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const WADL: &str = r#"<application xmlns="http://wadl.dev.java.net/2009/02"/>"#;

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename = "route")]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub coordinates: Point,
    #[serde(rename = "creationDate")]
    pub creation_date: DateTime<Utc>,
    #[serde(rename = "fromLocation")]
    pub from: Location,
    #[serde(rename = "toLocation")]
    pub to: Location,
    pub distance: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LocationInput {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RouteCreateRequest {
    pub name: String,
    pub coordinates: Point,
    #[serde(rename = "fromLocation")]
    pub from: LocationInput,
    #[serde(rename = "toLocation")]
    pub to: LocationInput,
    pub distance: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RouteUpdateRequest {
    pub name: String,
    pub distance: f64,
}

#[derive(Serialize)]
struct RouteList {
    route: Vec<Route>,
}

#[derive(Serialize)]
#[serde(rename = "RouteListResponse", rename_all = "camelCase")]
struct RouteListResponse {
    routes: RouteList,
    total_elements: usize,
    total_pages: usize,
    current_page: usize,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename = "RoutesResponse")]
struct RoutesResponse {
    route: Vec<Route>,
}

#[derive(Serialize)]
#[serde(rename = "DistanceSumResponse", rename_all = "camelCase")]
struct DistanceSumResponse {
    total_sum: f64,
    route_count: usize,
    average_distance: f64,
    min_distance: f64,
    max_distance: f64,
}

#[derive(Serialize)]
struct GroupEntry {
    distance: f64,
    count: usize,
    percentage: f64,
}

#[derive(Serialize)]
struct Groups {
    group: Vec<GroupEntry>,
}

#[derive(Serialize)]
#[serde(rename = "DistanceGroupResponse", rename_all = "camelCase")]
struct DistanceGroupResponse {
    groups: Groups,
    total_groups: usize,
    total_routes: usize,
}

#[derive(Serialize)]
#[serde(rename = "GreaterThanResponse", rename_all = "camelCase")]
struct GreaterThanResponse {
    routes: RouteList,
    count: usize,
    min_distance: f64,
    max_distance: f64,
    average_distance: f64,
}

#[derive(Serialize)]
#[serde(rename = "AddRouteResponse", rename_all = "camelCase")]
struct AddRouteResponse {
    message: String,
    created_by: String,
    route: Route,
}

#[derive(Serialize)]
struct Details {
    detail: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename = "ErrorResponse")]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Details>,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Store {
    routes: Vec<Route>,
    locations: Vec<Location>,
    next_route_id: i64,
    next_location_id: i64,
}

impl Store {
    /// Reuse a location with the same name and coordinates, or register a
    /// new one.
    fn location(&mut self, input: &LocationInput) -> Location {
        let name = input.name.trim();
        if let Some(existing) = self
            .locations
            .iter()
            .find(|l| l.name == name && l.x == input.x && l.y == input.y)
        {
            return existing.clone();
        }
        self.next_location_id += 1;
        let location = Location {
            id: self.next_location_id,
            name: name.to_string(),
            x: input.x,
            y: input.y,
        };
        self.locations.push(location.clone());
        location
    }

    fn location_by_id(&self, id: i64) -> Option<Location> {
        self.locations.iter().find(|l| l.id == id).cloned()
    }

    fn insert(&mut self, name: String, coordinates: Point, from: Location, to: Location, distance: f64) -> Route {
        self.next_route_id += 1;
        let route = Route {
            id: self.next_route_id,
            name,
            coordinates,
            creation_date: Utc::now(),
            from,
            to,
            distance,
        };
        self.routes.push(route.clone());
        route
    }

    /// Route between two known locations, named after them and placed at
    /// their integer midpoint.
    fn connect(&mut self, from: Location, to: Location, distance: f64) -> Route {
        let coordinates = Point {
            x: ((from.x + to.x) / 2.0).floor(),
            y: ((from.y + to.y) / 2.0).floor(),
        };
        let name = format!("Маршрут {} - {}", from.name, to.name);
        self.insert(name, coordinates, from, to, distance)
    }

    fn connected(&self, from_id: i64, to_id: i64) -> impl Iterator<Item = &Route> {
        self.routes
            .iter()
            .filter(move |r| r.from.id == from_id && r.to.id == to_id)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));

    let primary: Router<Db> = Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/{id}", put(update_route).delete(delete_route))
        .route("/routes/distance/sum", get(distance_sum))
        .route("/routes/distance/group", get(distance_group))
        .route("/routes/distance/greater-than", get(greater_than))
        .route("/routes/add/{from}/{to}/{distance}", post(add_between))
        .route("/application.wadl", get(wadl));

    let navigator: Router<Db> = Router::new()
        .route("/navigator/route/add/{from}/{to}/{distance}", post(navigator_add))
        .route("/navigator/routes/{from}/{to}/{sort}", get(find_between))
        .route("/application.wadl", get(wadl));

    Router::new()
        .nest(PRIMARY_PREFIX, primary)
        .nest(NAVIGATOR_PREFIX, navigator)
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

fn xml<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match quick_xml::se::to_string(body) {
        Ok(text) => (
            status,
            [(header::CONTENT_TYPE, "application/xml")],
            format!("{XML_DECL}{text}"),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    xml(
        status,
        &ErrorBody {
            message: message.into(),
            details: None,
        },
    )
}

fn validation_failed(details: Vec<String>) -> Response {
    xml(
        StatusCode::BAD_REQUEST,
        &ErrorBody {
            message: "Validation failed".to_string(),
            details: Some(Details { detail: details }),
        },
    )
}

fn validate(name: &str, distance: f64) -> Vec<String> {
    let mut details = Vec::new();
    if name.trim().is_empty() {
        details.push("name is blank".to_string());
    }
    if distance.is_nan() || distance <= 1.0 {
        details.push("distance must be > 1".to_string());
    }
    details
}

// ---------------------------------------------------------------------------
// List query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Name(String),
    Id(i64),
    MinDistance(f64),
    MaxDistance(f64),
    Distance(f64),
    FromName(String),
    ToName(String),
    CoordinatesX(f64),
    CoordinatesY(f64),
    FromX(f64),
    FromY(f64),
    ToX(f64),
    ToY(f64),
    CreatedFrom(NaiveDate),
    CreatedTo(NaiveDate),
}

impl Filter {
    fn matches(&self, r: &Route) -> bool {
        match self {
            Filter::Name(n) => r.name.to_lowercase().contains(n),
            Filter::Id(id) => r.id == *id,
            Filter::MinDistance(d) => r.distance >= *d,
            Filter::MaxDistance(d) => r.distance <= *d,
            Filter::Distance(d) => r.distance == *d,
            Filter::FromName(n) => r.from.name.to_lowercase().contains(n),
            Filter::ToName(n) => r.to.name.to_lowercase().contains(n),
            Filter::CoordinatesX(x) => r.coordinates.x == *x,
            Filter::CoordinatesY(y) => r.coordinates.y == *y,
            Filter::FromX(x) => r.from.x == *x,
            Filter::FromY(y) => r.from.y == *y,
            Filter::ToX(x) => r.to.x == *x,
            Filter::ToY(y) => r.to.y == *y,
            Filter::CreatedFrom(d) => r.creation_date.date_naive() >= *d,
            Filter::CreatedTo(d) => r.creation_date.date_naive() <= *d,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortField {
    Id,
    Name,
    Distance,
    CreationDate,
    CoordinatesX,
    CoordinatesY,
    FromName,
    ToName,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "id" => SortField::Id,
            "name" => SortField::Name,
            "distance" => SortField::Distance,
            "creationDate" => SortField::CreationDate,
            "coordinatesX" => SortField::CoordinatesX,
            "coordinatesY" => SortField::CoordinatesY,
            "fromName" => SortField::FromName,
            "toName" => SortField::ToName,
            other => return Err(format!("Unknown sort field: {other}")),
        })
    }
}

impl SortField {
    fn compare(self, a: &Route, b: &Route) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Distance => a.distance.total_cmp(&b.distance),
            SortField::CreationDate => a.creation_date.cmp(&b.creation_date),
            SortField::CoordinatesX => a.coordinates.x.total_cmp(&b.coordinates.x),
            SortField::CoordinatesY => a.coordinates.y.total_cmp(&b.coordinates.y),
            SortField::FromName => a.from.name.cmp(&b.from.name),
            SortField::ToName => a.to.name.cmp(&b.to.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ListQuery {
    page: usize,
    size: usize,
    filters: Vec<Filter>,
    sort: Vec<(SortField, bool)>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value for {key}: {value}"))
}

impl ListQuery {
    fn parse(params: &[(String, String)]) -> Result<Self, String> {
        let mut query = ListQuery {
            page: 0,
            size: 10,
            filters: Vec::new(),
            sort: Vec::new(),
        };
        for (key, value) in params {
            let filter = match key.as_str() {
                "page" => {
                    query.page = parse_value(key, value)?;
                    continue;
                }
                "size" => {
                    query.size = parse_value::<usize>(key, value)?.max(1);
                    continue;
                }
                "sort" => {
                    let (field, direction) = value.split_once(',').unwrap_or((value.as_str(), "asc"));
                    let descending = direction.trim().eq_ignore_ascii_case("desc");
                    query.sort.push((field.trim().parse()?, descending));
                    continue;
                }
                "filterName" => Filter::Name(value.to_lowercase()),
                "filter.id" => Filter::Id(parse_value(key, value)?),
                "filter.distance.min" => Filter::MinDistance(parse_value(key, value)?),
                "filter.distance.max" => Filter::MaxDistance(parse_value(key, value)?),
                "filter.distance.equals" => Filter::Distance(parse_value(key, value)?),
                "filter.fromName" => Filter::FromName(value.to_lowercase()),
                "filter.toName" => Filter::ToName(value.to_lowercase()),
                "filter.coordinatesX" => Filter::CoordinatesX(parse_value(key, value)?),
                "filter.coordinatesY" => Filter::CoordinatesY(parse_value(key, value)?),
                "filter.fromX" => Filter::FromX(parse_value(key, value)?),
                "filter.fromY" => Filter::FromY(parse_value(key, value)?),
                "filter.toX" => Filter::ToX(parse_value(key, value)?),
                "filter.toY" => Filter::ToY(parse_value(key, value)?),
                "filter.creationDate.from" => Filter::CreatedFrom(parse_value(key, value)?),
                "filter.creationDate.to" => Filter::CreatedTo(parse_value(key, value)?),
                _ => continue,
            };
            query.filters.push(filter);
        }
        Ok(query)
    }

    fn matches(&self, route: &Route) -> bool {
        self.filters.iter().all(|f| f.matches(route))
    }

    fn order(&self, a: &Route, b: &Route) -> Ordering {
        self.sort
            .iter()
            .map(|(field, descending)| {
                let ord = field.compare(a, b);
                if *descending {
                    ord.reverse()
                } else {
                    ord
                }
            })
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

// ---------------------------------------------------------------------------
// Route management handlers
// ---------------------------------------------------------------------------

async fn list_routes(State(db): State<Db>, Query(params): Query<Vec<(String, String)>>) -> Response {
    let query = match ListQuery::parse(&params) {
        Ok(query) => query,
        Err(message) => return error(StatusCode::BAD_REQUEST, message),
    };

    let store = db.read().await;
    let mut routes: Vec<Route> = store.routes.iter().filter(|r| query.matches(r)).cloned().collect();
    routes.sort_by(|a, b| query.order(a, b));

    let total = routes.len();
    let page: Vec<Route> = routes
        .into_iter()
        .skip(query.page * query.size)
        .take(query.size)
        .collect();
    tracing::debug!(total, page = query.page, size = query.size, "list routes");

    xml(
        StatusCode::OK,
        &RouteListResponse {
            routes: RouteList { route: page },
            total_elements: total,
            total_pages: total.div_ceil(query.size),
            current_page: query.page,
            page_size: query.size,
        },
    )
}

async fn create_route(State(db): State<Db>, body: String) -> Response {
    let input: RouteCreateRequest = match quick_xml::de::from_str(&body) {
        Ok(input) => input,
        Err(e) => return error(StatusCode::BAD_REQUEST, format!("Malformed XML: {e}")),
    };

    let mut details = validate(&input.name, input.distance);
    if input.from.name.trim().is_empty() {
        details.push("fromLocation.name is blank".to_string());
    }
    if input.to.name.trim().is_empty() {
        details.push("toLocation.name is blank".to_string());
    }
    if !details.is_empty() {
        return validation_failed(details);
    }

    let mut store = db.write().await;
    let from = store.location(&input.from);
    let to = store.location(&input.to);
    let route = store.insert(input.name.trim().to_string(), input.coordinates, from, to, input.distance);
    tracing::info!(id = route.id, name = %route.name, "route created");
    xml(StatusCode::CREATED, &route)
}

async fn update_route(State(db): State<Db>, Path(id): Path<i64>, body: String) -> Response {
    let input: RouteUpdateRequest = match quick_xml::de::from_str(&body) {
        Ok(input) => input,
        Err(e) => return error(StatusCode::BAD_REQUEST, format!("Malformed XML: {e}")),
    };
    let details = validate(&input.name, input.distance);
    if !details.is_empty() {
        return validation_failed(details);
    }

    let mut store = db.write().await;
    let Some(route) = store.routes.iter_mut().find(|r| r.id == id) else {
        return error(StatusCode::NOT_FOUND, format!("Route {id} not found"));
    };
    route.name = input.name.trim().to_string();
    route.distance = input.distance;
    tracing::info!(id, "route updated");
    xml(StatusCode::OK, &*route)
}

async fn delete_route(State(db): State<Db>, Path(id): Path<i64>) -> Response {
    let mut store = db.write().await;
    let before = store.routes.len();
    store.routes.retain(|r| r.id != id);
    if store.routes.len() == before {
        return error(StatusCode::NOT_FOUND, format!("Route {id} not found"));
    }
    tracing::info!(id, "route deleted");
    StatusCode::NO_CONTENT.into_response()
}

async fn distance_sum(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let count = store.routes.len();
    let total: f64 = store.routes.iter().map(|r| r.distance).sum();
    let min = store.routes.iter().map(|r| r.distance).reduce(f64::min).unwrap_or(0.0);
    let max = store.routes.iter().map(|r| r.distance).reduce(f64::max).unwrap_or(0.0);

    xml(
        StatusCode::OK,
        &DistanceSumResponse {
            total_sum: total,
            route_count: count,
            average_distance: if count == 0 { 0.0 } else { total / count as f64 },
            min_distance: min,
            max_distance: max,
        },
    )
}

async fn distance_group(State(db): State<Db>) -> Response {
    let store = db.read().await;
    let mut distances: Vec<f64> = store.routes.iter().map(|r| r.distance).collect();
    distances.sort_by(f64::total_cmp);

    let mut groups: Vec<GroupEntry> = Vec::new();
    for distance in distances {
        match groups.last_mut() {
            Some(last) if last.distance == distance => last.count += 1,
            _ => groups.push(GroupEntry {
                distance,
                count: 1,
                percentage: 0.0,
            }),
        }
    }
    let total = store.routes.len();
    for group in &mut groups {
        group.percentage = (group.count as f64 * 10000.0 / total as f64).round() / 100.0;
    }

    xml(
        StatusCode::OK,
        &DistanceGroupResponse {
            total_groups: groups.len(),
            total_routes: total,
            groups: Groups { group: groups },
        },
    )
}

#[derive(Debug, Deserialize)]
struct GreaterThanParams {
    #[serde(rename = "minDistance")]
    min_distance: f64,
}

async fn greater_than(State(db): State<Db>, Query(params): Query<GreaterThanParams>) -> Response {
    let store = db.read().await;
    let mut routes: Vec<Route> = store
        .routes
        .iter()
        .filter(|r| r.distance > params.min_distance)
        .cloned()
        .collect();
    routes.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    let count = routes.len();
    let max = routes.iter().map(|r| r.distance).reduce(f64::max).unwrap_or(0.0);
    let sum: f64 = routes.iter().map(|r| r.distance).sum();

    xml(
        StatusCode::OK,
        &GreaterThanResponse {
            routes: RouteList { route: routes },
            count,
            min_distance: params.min_distance,
            max_distance: max,
            average_distance: if count == 0 { 0.0 } else { sum / count as f64 },
        },
    )
}

async fn add_between(State(db): State<Db>, Path((from_id, to_id, distance)): Path<(i64, i64, f64)>) -> Response {
    let mut store = db.write().await;
    let (Some(from), Some(to)) = (store.location_by_id(from_id), store.location_by_id(to_id)) else {
        return error(StatusCode::NOT_FOUND, "Location not found");
    };
    if distance.is_nan() || distance <= 1.0 {
        return validation_failed(vec!["distance must be > 1".to_string()]);
    }
    let route = store.connect(from, to, distance);
    tracing::info!(id = route.id, from_id, to_id, "route added between locations");
    xml(StatusCode::CREATED, &route)
}

async fn wadl() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/vnd.sun.wadl+xml")],
        format!("{XML_DECL}{WADL}"),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Navigator handlers
// ---------------------------------------------------------------------------

async fn navigator_add(State(db): State<Db>, Path((from_id, to_id, distance)): Path<(i64, i64, f64)>) -> Response {
    if from_id == to_id || distance.is_nan() || distance <= 1.0 {
        return error(StatusCode::BAD_REQUEST, "Invalid route parameters");
    }
    let mut store = db.write().await;
    let (Some(from), Some(to)) = (store.location_by_id(from_id), store.location_by_id(to_id)) else {
        return error(StatusCode::NOT_FOUND, "Location not found");
    };
    if store.connected(from_id, to_id).next().is_some() {
        return error(StatusCode::CONFLICT, "Route already exists");
    }

    let route = store.connect(from, to, distance);
    tracing::info!(id = route.id, from_id, to_id, "navigator added route");
    xml(
        StatusCode::CREATED,
        &AddRouteResponse {
            message: format!("Маршрут \"{}\" успешно создан", route.name),
            created_by: "navigator-service".to_string(),
            route,
        },
    )
}

async fn find_between(State(db): State<Db>, Path((from_id, to_id, sort)): Path<(i64, i64, String)>) -> Response {
    let field = match sort.as_str() {
        "distance" => SortField::Distance,
        "name" => SortField::Name,
        "creationDate" => SortField::CreationDate,
        other => return error(StatusCode::BAD_REQUEST, format!("Unknown sort key: {other}")),
    };

    let store = db.read().await;
    let mut routes: Vec<Route> = store.connected(from_id, to_id).cloned().collect();
    if routes.is_empty() {
        return error(
            StatusCode::NOT_FOUND,
            format!("No routes between {from_id} and {to_id}"),
        );
    }
    routes.sort_by(|a, b| field.compare(a, b));
    xml(StatusCode::OK, &RoutesResponse { route: routes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn sample(id: i64, name: &str, distance: f64) -> Route {
        Route {
            id,
            name: name.to_string(),
            coordinates: Point { x: 1.0, y: 2.0 },
            creation_date: "2024-03-05T12:00:00Z".parse().unwrap(),
            from: Location {
                id: 1,
                name: "Depot".to_string(),
                x: 0.0,
                y: 0.0,
            },
            to: Location {
                id: 2,
                name: "Harbour".to_string(),
                x: 6.0,
                y: 8.0,
            },
            distance,
        }
    }

    #[test]
    fn route_serializes_with_location_tags() {
        let text = quick_xml::se::to_string(&sample(7, "Long haul", 42.5)).unwrap();
        assert!(text.starts_with("<route><id>7</id><name>Long haul</name>"));
        assert!(text.contains("<fromLocation><id>1</id><name>Depot</name>"));
        assert!(text.contains("<toLocation><id>2</id>"));
        assert!(text.contains("<distance>42.5</distance>"));
    }

    #[test]
    fn create_request_deserializes() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?><RouteCreateRequest><name>Run</name><coordinates><x>10</x><y>-4</y></coordinates><fromLocation><name>A</name><x>1</x><y>2</y></fromLocation><toLocation><name>B</name><x>-1</x><y>7</y></toLocation><distance>12.5</distance></RouteCreateRequest>"#;
        let input: RouteCreateRequest = quick_xml::de::from_str(body).unwrap();
        assert_eq!(input.name, "Run");
        assert_eq!(input.coordinates, Point { x: 10.0, y: -4.0 });
        assert_eq!(input.from.name, "A");
        assert_eq!(input.to.y, 7.0);
        assert_eq!(input.distance, 12.5);
    }

    #[test]
    fn validation_reports_every_problem() {
        assert_eq!(validate(" ", 0.5), vec!["name is blank", "distance must be > 1"]);
        assert!(validate("ok", 1.5).is_empty());
    }

    #[test]
    fn list_query_translates_filters_and_sort() {
        let query = ListQuery::parse(&params(&[
            ("page", "2"),
            ("size", "5"),
            ("filter.distance.min", "10"),
            ("filterName", "Haul"),
            ("sort", "distance,desc"),
            ("sort", "name"),
        ]))
        .unwrap();
        assert_eq!((query.page, query.size), (2, 5));
        assert_eq!(
            query.filters,
            vec![Filter::MinDistance(10.0), Filter::Name("haul".to_string())]
        );
        assert_eq!(
            query.sort,
            vec![(SortField::Distance, true), (SortField::Name, false)]
        );
    }

    #[test]
    fn list_query_rejects_bad_values() {
        assert!(ListQuery::parse(&params(&[("filter.distance.max", "far")])).is_err());
        assert!(ListQuery::parse(&params(&[("sort", "colour,asc")])).is_err());
        assert!(ListQuery::parse(&params(&[("filter.creationDate.from", "yesterday")])).is_err());
    }

    #[test]
    fn filters_and_order_apply() {
        let long = sample(1, "Long haul", 42.5);
        let short = sample(2, "Short hop", 11.0);
        let query = ListQuery::parse(&params(&[("filter.distance.min", "20")])).unwrap();
        assert!(query.matches(&long));
        assert!(!query.matches(&short));

        let by_distance = ListQuery::parse(&params(&[("sort", "distance,asc")])).unwrap();
        assert_eq!(by_distance.order(&long, &short), Ordering::Greater);

        let dated = ListQuery::parse(&params(&[("filter.creationDate.to", "2024-03-04")])).unwrap();
        assert!(!dated.matches(&long));
    }

    #[test]
    fn store_reuses_locations() {
        let mut store = Store::default();
        let input = LocationInput {
            name: "Depot".to_string(),
            x: 1.0,
            y: 2.0,
        };
        let a = store.location(&input);
        let b = store.location(&input);
        assert_eq!(a.id, b.id);
        assert_eq!(store.locations.len(), 1);
    }

    #[test]
    fn connect_names_route_after_locations() {
        let mut store = Store::default();
        let from = store.location(&LocationInput {
            name: "Depot".to_string(),
            x: 0.0,
            y: 0.0,
        });
        let to = store.location(&LocationInput {
            name: "Port".to_string(),
            x: 5.0,
            y: 8.0,
        });
        let route = store.connect(from, to, 15.0);
        assert_eq!(route.name, "Маршрут Depot - Port");
        assert_eq!(route.coordinates, Point { x: 2.0, y: 4.0 });
        assert_eq!(store.connected(1, 2).count(), 1);
    }
}
