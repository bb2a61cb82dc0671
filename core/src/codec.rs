//! XML dialect of the route-management and navigator services.
//!
//! # Design
//! Encoding is exact: element names, nesting and the integer truncation of
//! coordinates on create are the contract the backend validates against.
//!
//! Decoding is defensive: every field has a default and a missing or
//! unparseable value never fails the call, because the two services evolve
//! independently and their documents drift (locations without `id` have
//! been observed). A malformed route list degrades to an empty page and a
//! malformed add-edge echo to the default echo; the analytics decoders
//! report `ApiError::Decode`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::ApiError;
use crate::types::{
    Coordinates, DistanceGroup, DistanceGroupEntry, DistanceSum, GreaterThanResult, Location,
    NewRoute, PageResult, Pagination, Route, RouteUpdate,
};
use crate::xml::{parse_document, Element};

const DEFAULT_EDGE_MESSAGE: &str = "Маршрут успешно создан";
const DEFAULT_EDGE_CREATOR: &str = "navigator-service";
const ERROR_MESSAGE_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// `RouteCreateRequest` body. Coordinates of the route and of both
/// locations are floored to integers; distance is sent as given.
pub fn encode_create_route(route: &NewRoute) -> Result<String, ApiError> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    open(&mut w, "RouteCreateRequest")?;
    leaf(&mut w, "name", &route.name)?;
    point(&mut w, "coordinates", None, route.coordinates.x, route.coordinates.y)?;
    point(&mut w, "fromLocation", Some(&route.from.name), route.from.x, route.from.y)?;
    point(&mut w, "toLocation", Some(&route.to.name), route.to.x, route.to.y)?;
    leaf(&mut w, "distance", &route.distance.to_string())?;
    close(&mut w, "RouteCreateRequest")?;
    finish(w)
}

/// `RouteUpdateRequest` body: name and distance only. Endpoints cannot be
/// moved through an update.
pub fn encode_update_route(update: &RouteUpdate) -> Result<String, ApiError> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    open(&mut w, "RouteUpdateRequest")?;
    leaf(&mut w, "name", &update.name)?;
    leaf(&mut w, "distance", &update.distance.to_string())?;
    close(&mut w, "RouteUpdateRequest")?;
    finish(w)
}

fn encode_error(e: impl std::fmt::Display) -> ApiError {
    ApiError::Request(format!("не удалось сформировать XML: {e}"))
}

fn declaration(w: &mut Writer<Vec<u8>>) -> Result<(), ApiError> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(encode_error)
}

fn open(w: &mut Writer<Vec<u8>>, tag: &str) -> Result<(), ApiError> {
    w.write_event(Event::Start(BytesStart::new(tag))).map_err(encode_error)
}

fn close(w: &mut Writer<Vec<u8>>, tag: &str) -> Result<(), ApiError> {
    w.write_event(Event::End(BytesEnd::new(tag))).map_err(encode_error)
}

fn leaf(w: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<(), ApiError> {
    open(w, tag)?;
    w.write_event(Event::Text(BytesText::new(text))).map_err(encode_error)?;
    close(w, tag)
}

fn point(w: &mut Writer<Vec<u8>>, tag: &str, name: Option<&str>, x: f64, y: f64) -> Result<(), ApiError> {
    open(w, tag)?;
    if let Some(name) = name {
        leaf(w, "name", name)?;
    }
    leaf(w, "x", &truncate(x).to_string())?;
    leaf(w, "y", &truncate(y).to_string())?;
    close(w, tag)
}

/// Floor to an integer; non-finite input becomes 0.
fn truncate(value: f64) -> i64 {
    if value.is_finite() {
        value.floor() as i64
    } else {
        0
    }
}

fn finish(w: Writer<Vec<u8>>) -> Result<String, ApiError> {
    String::from_utf8(w.into_inner()).map_err(encode_error)
}

// ---------------------------------------------------------------------------
// Decode: routes
// ---------------------------------------------------------------------------

/// Decode a page of routes. A document the parser rejects yields an empty
/// page with no pagination instead of an error.
pub fn decode_route_list(xml: &str) -> PageResult {
    let doc = match parse_document(xml) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "route list is not valid XML, showing an empty page");
            return degraded_page();
        }
    };

    let routes = routes_in(&doc).into_iter().map(decode_single_route).collect();
    let pagination = Pagination {
        total_elements: count_or(&doc, "totalElements", 0),
        total_pages: nonzero_or(&doc, "totalPages", 1),
        current_page: count_or(&doc, "currentPage", 0),
        page_size: nonzero_or(&doc, "pageSize", 10),
    };

    PageResult {
        routes,
        pagination: Some(pagination),
    }
}

/// Empty page returned when the list document cannot be parsed.
pub fn degraded_page() -> PageResult {
    PageResult {
        routes: Vec::new(),
        pagination: None,
    }
}

/// Decode one `route` element. Route-level fields are read from direct
/// children so the nested locations' `id` and `name` never shadow them.
pub fn decode_single_route(element: &Element) -> Route {
    let coordinates = element
        .child("coordinates")
        .map(|c| Coordinates {
            x: number_in(c, "x"),
            y: number_in(c, "y"),
        })
        .unwrap_or_default();

    Route {
        id: element
            .child("id")
            .and_then(|e| parse_int(&e.text_content()))
            .unwrap_or(0),
        name: element.child("name").map(Element::text_content).unwrap_or_default(),
        coordinates,
        from: decode_location(element, "fromLocation"),
        to: decode_location(element, "toLocation"),
        distance: element
            .child("distance")
            .and_then(|e| parse_number(&e.text_content()))
            .unwrap_or(0.0),
        creation_date: element
            .child("creationDate")
            .map(Element::text_content)
            .and_then(|text| parse_creation_date(&text)),
    }
}

fn decode_location(route: &Element, tag: &str) -> Location {
    let Some(el) = route.find(tag) else {
        return Location::default();
    };
    Location {
        // An id of 0 is treated the same as a missing one.
        id: el
            .text_of("id")
            .and_then(|t| parse_int(&t))
            .filter(|id| *id != 0),
        name: el.text_of("name").unwrap_or_default(),
        x: number_in(el, "x"),
        y: number_in(el, "y"),
    }
}

fn routes_in(doc: &Element) -> Vec<&Element> {
    if doc.name == "route" {
        vec![doc]
    } else {
        doc.find_all("route")
    }
}

/// Parse a creation timestamp. Unparseable text is logged and dropped.
fn parse_creation_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    // Java's ZonedDateTime appends the zone id in brackets.
    let text = text.split('[').next().unwrap_or(text);

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.and_utc());
    }
    if let Some(dt) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some(dt.and_utc());
    }

    tracing::warn!(value = text, "could not parse route creationDate");
    None
}

// ---------------------------------------------------------------------------
// Decode: analytics
// ---------------------------------------------------------------------------

pub fn decode_distance_sum(xml: &str) -> Result<DistanceSum, ApiError> {
    let doc = parse_document(xml).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(DistanceSum {
        total_sum: number_in(&doc, "totalSum"),
        route_count: count_or(&doc, "routeCount", 0),
        average_distance: number_in(&doc, "averageDistance"),
        min_distance: number_in(&doc, "minDistance"),
        max_distance: number_in(&doc, "maxDistance"),
    })
}

/// Groups missing either `distance` or `count` are skipped.
pub fn decode_distance_group(xml: &str) -> Result<DistanceGroup, ApiError> {
    let doc = parse_document(xml).map_err(|e| ApiError::Decode(e.to_string()))?;

    let groups = doc
        .find_all("group")
        .into_iter()
        .filter_map(|group| {
            let distance = group.text_of("distance").filter(|t| !t.is_empty())?;
            let count = group.text_of("count").filter(|t| !t.is_empty())?;
            Some(DistanceGroupEntry {
                distance: parse_number(&distance).unwrap_or(0.0),
                count: parse_int(&count).and_then(|c| u64::try_from(c).ok()).unwrap_or(0),
                percentage: number_in(group, "percentage"),
            })
        })
        .collect();

    Ok(DistanceGroup {
        groups,
        total_groups: count_or(&doc, "totalGroups", 0),
        total_routes: count_or(&doc, "totalRoutes", 0),
    })
}

/// `count` falls back to the number of routes in the document and
/// `minDistance` to the threshold that was asked for.
pub fn decode_greater_than(xml: &str, requested_min: f64) -> Result<GreaterThanResult, ApiError> {
    let doc = parse_document(xml).map_err(|e| ApiError::Decode(e.to_string()))?;
    let routes: Vec<Route> = routes_in(&doc).into_iter().map(decode_single_route).collect();
    let found = routes.len() as u64;

    Ok(GreaterThanResult {
        count: nonzero_or(&doc, "count", found),
        min_distance: doc
            .text_of("minDistance")
            .and_then(|t| parse_number(&t))
            .filter(|v| *v != 0.0)
            .unwrap_or(requested_min),
        max_distance: number_in(&doc, "maxDistance"),
        average_distance: number_in(&doc, "averageDistance"),
        routes,
    })
}

// ---------------------------------------------------------------------------
// Decode: navigator echo
// ---------------------------------------------------------------------------

/// What the navigator says back after creating an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEcho {
    pub message: String,
    pub created_by: String,
    pub route: Option<Route>,
}

impl Default for EdgeEcho {
    fn default() -> Self {
        Self {
            message: DEFAULT_EDGE_MESSAGE.to_string(),
            created_by: DEFAULT_EDGE_CREATOR.to_string(),
            route: None,
        }
    }
}

/// Decode an add-edge response. The edge already exists once the navigator
/// answers 200/201, so an empty, plain-text or malformed body is still a
/// plain success.
pub fn decode_add_edge(xml: &str) -> EdgeEcho {
    if !looks_like_xml(xml) {
        return EdgeEcho::default();
    }
    let doc = match parse_document(xml) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(error = %e, "add-edge echo is not valid XML, using defaults");
            return EdgeEcho::default();
        }
    };
    let defaults = EdgeEcho::default();
    EdgeEcho {
        message: doc
            .text_of("message")
            .filter(|t| !t.is_empty())
            .unwrap_or(defaults.message),
        created_by: doc
            .text_of("createdBy")
            .filter(|t| !t.is_empty())
            .unwrap_or(defaults.created_by),
        route: routes_in(&doc).first().map(|el| decode_single_route(el)),
    }
}

// ---------------------------------------------------------------------------
// Decode: error bodies
// ---------------------------------------------------------------------------

/// True when the body should be treated as an XML document.
pub fn looks_like_xml(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

/// Text of the first `error`, `message` or `faultstring` element, tried in
/// that order.
pub fn decode_error_message(body: &str) -> Option<String> {
    if !looks_like_xml(body) {
        return None;
    }
    let doc = parse_document(body).ok()?;
    ["error", "message", "faultstring"]
        .iter()
        .find_map(|tag| doc.text_of(tag))
}

/// `message` text plus every `detail` text, for validation failures.
/// Returns `None` when the body is not a parseable document.
pub fn decode_error_details(body: &str) -> Option<(Option<String>, Vec<String>)> {
    if !looks_like_xml(body) {
        return None;
    }
    let doc = parse_document(body).ok()?;
    let message = doc.text_of("message");
    let details = doc
        .find_all("detail")
        .into_iter()
        .map(Element::text_content)
        .collect();
    Some((message, details))
}

/// First 500 characters of a body that carries no structured message.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_MESSAGE_LIMIT).collect()
}

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------

/// Float with surrounding whitespace ignored; non-finite values rejected.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer; a float literal is accepted and truncated toward zero.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    text.parse::<i64>()
        .ok()
        .or_else(|| parse_number(text).map(|v| v.trunc() as i64))
}

fn number_in(el: &Element, tag: &str) -> f64 {
    el.text_of(tag).and_then(|t| parse_number(&t)).unwrap_or(0.0)
}

fn count_or(el: &Element, tag: &str, default: u64) -> u64 {
    el.text_of(tag)
        .and_then(|t| parse_int(&t))
        .and_then(|v| u64::try_from(v).ok())
        .unwrap_or(default)
}

fn nonzero_or(el: &Element, tag: &str, default: u64) -> u64 {
    match count_or(el, tag, 0) {
        0 => default,
        v => v,
    }
}
