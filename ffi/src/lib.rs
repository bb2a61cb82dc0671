//! C-ABI wrapper around `routes-core`.
//!
//! # Overview
//! Exposes both gateways through `extern "C"` functions so a UI host written
//! in any language with a C FFI can build requests, perform the HTTP call
//! itself, and hand the response back for parsing. The FFI surface never
//! calls into the async runtime; `RoutesClient` and its transport stay
//! unused here.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `routes_build_*` / `routes_parse_*` mirrors the gateways.
//!   `routes_build_*` returns null when an argument is null or unusable.
//! - Structured inputs (list query, new route) and every success payload
//!   travel as JSON in the camelCase shape of the core records.
//! - The add-edge fallback needs several round trips, so it stays with the
//!   host. On a `Transport` result from the navigator add-edge call, list
//!   up to 1000 routes (`routes_build_list` with `{"size":1000}`), look up
//!   the two locations by id, then create `Маршрут {from} - {to}` at their
//!   midpoint with the requested distance (`routes_build_create`). The
//!   primary service's own `/routes/add` endpoint
//!   (`routes_build_primary_add_edge`) is a separate operation, not this
//!   fallback.
//! - The C caller owns all returned pointers and must call the matching
//!   `routes_free_*` function to release them.

pub mod types;

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use routes_core::error::{ApiError, TransportError};
use routes_core::http::{HttpRequest, HttpResponse};
use routes_core::{routes, NewRoute, RouteFilter, RouteQuery, RouteUpdate, ServiceConfig, SortKey};
use serde::{Deserialize, Serialize};

use types::*;

/// Borrow a C string. Null and invalid UTF-8 both yield `None`.
fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to the primary and navigator base URLs, using the
/// default timeouts.
///
/// Returns null if either URL is null or if an internal panic occurs.
/// The caller must free the returned pointer with `routes_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn routes_client_new(
    primary_url: *const c_char,
    navigator_url: *const c_char,
) -> *mut FfiRoutesClient {
    catch_unwind(|| {
        let (Some(primary), Some(navigator)) = (c_str(primary_url), c_str(navigator_url)) else {
            return std::ptr::null_mut();
        };
        client_from_config(&ServiceConfig::new(primary, navigator))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Create a client from the `ROUTES_*` environment variables.
#[unsafe(no_mangle)]
pub extern "C" fn routes_client_from_env() -> *mut FfiRoutesClient {
    catch_unwind(|| client_from_config(&ServiceConfig::from_env())).unwrap_or(std::ptr::null_mut())
}

fn client_from_config(config: &ServiceConfig) -> *mut FfiRoutesClient {
    Box::into_raw(Box::new(FfiRoutesClient {
        routes: routes_core::RouteGateway::from_config(config),
        navigator: routes_core::NavigatorGateway::from_config(config),
    }))
}

/// Free a client. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn routes_client_free(client: *mut FfiRoutesClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

fn build_with(
    client: *const FfiRoutesClient,
    build: impl FnOnce(&FfiRoutesClient) -> Option<HttpRequest>,
) -> *mut FfiHttpRequest {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        match build(unsafe { &*client }) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// JSON accepted by `routes_build_list`. Filters are keyed by their logical
/// name (`minDistance`, `fromName`, ...); values may be strings or numbers.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListInput {
    page: Option<u32>,
    size: Option<u32>,
    filters: HashMap<String, serde_json::Value>,
    sort: Vec<String>,
}

impl ListInput {
    fn into_query(self) -> Result<RouteQuery, String> {
        let mut values = HashMap::new();
        for (name, value) in self.filters {
            let filter: RouteFilter = name.parse()?;
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            values.insert(filter, value);
        }

        let mut query = RouteQuery::new();
        query.page = self.page;
        query.size = self.size;
        // canonical order so the wire query is stable
        for filter in RouteFilter::ALL {
            if let Some(value) = values.remove(&filter) {
                query.set_filter(filter, value);
            }
        }
        for token in &self.sort {
            query.sort.push(token.parse()?);
        }
        Ok(query)
    }
}

/// Build a paged list request.
///
/// `query_json` may be null for the first page with default size, or an
/// object such as `{"page":0,"size":20,"filters":{"minDistance":5},
/// "sort":["distance,desc"]}`. Returns null on malformed JSON, an unknown
/// filter name, or a bad sort token.
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_list(
    client: *const FfiRoutesClient,
    query_json: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let input = if query_json.is_null() {
            ListInput::default()
        } else {
            serde_json::from_str::<ListInput>(c_str(query_json)?).ok()?
        };
        let query = input.into_query().ok()?;
        Some(c.routes.build_list(&query))
    })
}

/// Build the request behind a lookup by id (a large first page).
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_get_by_id(client: *const FfiRoutesClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_get_by_id()))
}

/// Build a create request from a `NewRoute` JSON object:
/// `{"name":..,"coordinates":{"x":..,"y":..},"from":{"name":..,"x":..,"y":..},
/// "to":{..},"distance":..}`.
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_create(
    client: *const FfiRoutesClient,
    route_json: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let route: NewRoute = serde_json::from_str(c_str(route_json)?).ok()?;
        c.routes.build_create(&route).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_update(
    client: *const FfiRoutesClient,
    id: i64,
    name: *const c_char,
    distance: f64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        let update = RouteUpdate {
            name: c_str(name)?.to_string(),
            distance,
        };
        c.routes.build_update(id, &update).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_delete(client: *const FfiRoutesClient, id: i64) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_delete(id)))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_distance_sum(client: *const FfiRoutesClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_distance_sum()))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_distance_groups(client: *const FfiRoutesClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_distance_groups()))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_greater_than(
    client: *const FfiRoutesClient,
    min_distance: f64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_greater_than(min_distance)))
}

/// Build the primary service's own add-between request.
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_primary_add_edge(
    client: *const FfiRoutesClient,
    from_id: i64,
    to_id: i64,
    distance: f64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_add_edge(from_id, to_id, distance)))
}

/// Build the navigator add-edge request.
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_add_edge(
    client: *const FfiRoutesClient,
    from_id: i64,
    to_id: i64,
    distance: f64,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.navigator.build_add_edge(from_id, to_id, distance)))
}

/// Parse a sort key, null meaning the default (`distance`).
fn sort_key(sort: *const c_char) -> Option<SortKey> {
    if sort.is_null() {
        return Some(SortKey::default());
    }
    c_str(sort)?.parse().ok()
}

/// Build a find-between request. `sort` is `distance`, `name`,
/// `creationDate` or null; anything else returns null.
#[unsafe(no_mangle)]
pub extern "C" fn routes_build_find_between(
    client: *const FfiRoutesClient,
    from_id: i64,
    to_id: i64,
    sort: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        Some(c.navigator.build_find_between(from_id, to_id, sort_key(sort)?))
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_probe_primary(client: *const FfiRoutesClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.routes.build_probe()))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_build_probe_navigator(client: *const FfiRoutesClient) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.navigator.build_probe()))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is an
/// empty body.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = if resp.body.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(resp.body) }
            .to_string_lossy()
            .into_owned()
    };
    HttpResponse::new(resp.status, body)
}

fn parse_with<T: Serialize>(
    op: &str,
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&FfiRoutesClient, HttpResponse) -> Result<T, ApiError>,
) -> *mut FfiRoutesResult {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiRoutesResult::null_arg("client");
        }
        if response.is_null() {
            return FfiRoutesResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        match parse(client, resp) {
            Ok(value) => FfiRoutesResult::ok_json(&value),
            Err(e) => FfiRoutesResult::from_error(e),
        }
    }))
    .unwrap_or_else(|_| FfiRoutesResult::panic(&format!("panic in {op}")))
}

/// `data_json` is a `PageResult`. A malformed body is an empty page, not an
/// error.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_list(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_list", client, response, |c, r| c.routes.parse_list(r))
}

/// `data_json` is a `LocationDirectory` built from a list response: the
/// distinct origins and destinations in first-seen order.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_locations(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_locations", client, response, |c, r| {
        c.routes.parse_list(r).map(|page| routes::locations(&page))
    })
}

/// `data_json` is the matching `Route`, or `null` when no route has `id`.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_get_by_id(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
    id: i64,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_get_by_id", client, response, |c, r| {
        c.routes.parse_get_by_id(r, id)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_create(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_create", client, response, |c, r| c.routes.parse_create(r))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_update(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_update", client, response, |c, r| c.routes.parse_update(r))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_delete(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_delete", client, response, |c, r| c.routes.parse_delete(r))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_distance_sum(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_distance_sum", client, response, |c, r| {
        c.routes.parse_distance_sum(r)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_distance_groups(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_distance_groups", client, response, |c, r| {
        c.routes.parse_distance_groups(r)
    })
}

/// `min_distance` must match the value the request was built with; it fills
/// in a missing `minDistance` element.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_greater_than(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
    min_distance: f64,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_greater_than", client, response, |c, r| {
        c.routes.parse_greater_than(r, min_distance)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_primary_add_edge(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_primary_add_edge", client, response, |c, r| {
        c.routes.parse_add_edge(r)
    })
}

/// `data_json` is an `EdgeResult` with `strategy` `tryNavigator`.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_add_edge(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_add_edge", client, response, |c, r| {
        c.navigator.parse_add_edge(r)
    })
}

/// `data_json` is a `PathfindingResult`; a 404 is an empty one. The ids and
/// sort must match the request.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_find_between(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
    from_id: i64,
    to_id: i64,
    sort: *const c_char,
) -> *mut FfiRoutesResult {
    parse_with("routes_parse_find_between", client, response, |c, r| {
        let sort = sort_key(sort).ok_or_else(|| ApiError::Request("unknown sort key".to_string()))?;
        c.navigator.parse_find_between(r, from_id, to_id, sort)
    })
}

fn probe_with(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
    accept: impl FnOnce(&FfiRoutesClient, &HttpResponse) -> bool,
) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() || response.is_null() {
            return false;
        }
        let resp = ffi_response_to_core(unsafe { &*response });
        accept(unsafe { &*client }, &resp)
    }))
    .unwrap_or(false)
}

/// True when the primary service answered the probe. A host that got no
/// response at all should treat the service as unavailable without calling
/// this.
#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_probe_primary(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> bool {
    probe_with(client, response, |c, r| c.routes.parse_probe(r))
}

#[unsafe(no_mangle)]
pub extern "C" fn routes_parse_probe_navigator(
    client: *const FfiRoutesClient,
    response: *const FfiHttpResponse,
) -> bool {
    probe_with(client, response, |c, r| c.navigator.parse_probe(r))
}

/// Build the result for a call that got no response. `reason` is optional
/// and only kept for diagnostics; `error_message` is always the standard
/// guidance text.
#[unsafe(no_mangle)]
pub extern "C" fn routes_transport_error(reason: *const c_char) -> *mut FfiRoutesResult {
    catch_unwind(|| {
        let reason = c_str(reason).unwrap_or("no response").to_string();
        FfiRoutesResult::from_error(ApiError::from_transport(TransportError::NoResponse(reason), ""))
    })
    .unwrap_or_else(|_| FfiRoutesResult::panic("panic in routes_transport_error"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `routes_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn routes_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_string(req.url);
        free_string(req.body);
        if !req.headers.is_null() && req.headers_len > 0 {
            let headers = unsafe {
                Vec::from_raw_parts(req.headers, req.headers_len as usize, req.headers_len as usize)
            };
            for h in headers {
                free_string(h.key);
                free_string(h.value);
            }
        }
    });
}

/// Free an `FfiRoutesResult` returned by any `routes_parse_*` function or
/// `routes_transport_error`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn routes_free_result(result: *mut FfiRoutesResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_string(result.error_message);
        free_string(result.data_json);
    });
}

fn free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
