//! Request builder and response parser for the route-management service.
//!
//! # Design
//! `RouteGateway` holds only a base URL and timeouts and carries no mutable
//! state between calls. Each operation is a `build_*` method producing an
//! `HttpRequest` and a `parse_*` method consuming the `HttpResponse`; the
//! caller (a `Transport`, or an FFI host) performs the round-trip.
//!
//! There is no single-route endpoint in use. `build_get_by_id` fetches one
//! page of up to 1000 routes and `parse_get_by_id` scans it, so a lookup on a
//! larger dataset can miss routes beyond that page.

use std::time::Duration;

use crate::codec;
use crate::config::{ServiceConfig, DEFAULT_PROBE_TIMEOUT, DEFAULT_TIMEOUT};
use crate::error::ApiError;
use crate::filter::RouteQuery;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    DistanceGroup, DistanceSum, GreaterThanResult, Location, LocationDirectory, MutationResult,
    NewRoute, PageResult, Route, RouteUpdate,
};

/// Page size used when a lookup has to scan the whole collection.
pub const FIND_ALL_LIMIT: u32 = 1000;

pub(crate) const XML: &str = "application/xml";

pub const LIST_FAILED: &str = "Не удалось загрузить маршруты";
pub const FIND_FAILED: &str = "Не удалось найти маршрут";
pub const CREATE_FAILED: &str = "Не удалось создать маршрут";
pub const UPDATE_FAILED: &str = "Не удалось обновить маршрут";
pub const DELETE_FAILED: &str = "Не удалось удалить маршрут";
pub const SUM_FAILED: &str = "Не удалось получить сумму дистанций";
pub const GROUP_FAILED: &str = "Не удалось получить группировку по дистанции";
pub const GREATER_THAN_FAILED: &str = "Не удалось найти маршруты";
pub const ADD_EDGE_FAILED: &str = "Не удалось создать маршрут между локациями";

#[derive(Debug, Clone)]
pub struct RouteGateway {
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl RouteGateway {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            timeout: config.timeout,
            probe_timeout: config.probe_timeout,
            ..Self::new(&config.primary_url)
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            query: Vec::new(),
            headers: vec![("accept".to_string(), XML.to_string())],
            body: None,
            timeout: self.timeout,
        }
    }

    fn with_xml_body(mut req: HttpRequest, body: String) -> HttpRequest {
        req.headers.push(("content-type".to_string(), XML.to_string()));
        req.body = Some(body);
        req
    }

    // -- list ---------------------------------------------------------------

    pub fn build_list(&self, query: &RouteQuery) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, "/routes");
        req.query = query.to_params();
        req
    }

    /// Decode a page. A malformed document is an empty page, not an error.
    pub fn parse_list(&self, response: HttpResponse) -> Result<PageResult, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response, LIST_FAILED));
        }
        Ok(codec::decode_route_list(&response.body))
    }

    // -- get by id ----------------------------------------------------------

    pub fn build_get_by_id(&self) -> HttpRequest {
        self.build_list(&RouteQuery::new().size(FIND_ALL_LIMIT))
    }

    pub fn parse_get_by_id(&self, response: HttpResponse, id: i64) -> Result<Option<Route>, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response, FIND_FAILED));
        }
        let page = codec::decode_route_list(&response.body);
        Ok(page.routes.into_iter().find(|r| r.id == id))
    }

    // -- create -------------------------------------------------------------

    pub fn build_create(&self, route: &NewRoute) -> Result<HttpRequest, ApiError> {
        let body = codec::encode_create_route(route)?;
        Ok(Self::with_xml_body(self.request(HttpMethod::Post, "/routes"), body))
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<MutationResult, ApiError> {
        match response.status {
            200 | 201 => Ok(MutationResult {
                success: true,
                message: "Маршрут создан успешно".to_string(),
                data: Some(response.body),
            }),
            status => Err(ApiError::detailed(
                &response,
                &format!("Ошибка создания маршрута (статус {status})"),
            )),
        }
    }

    // -- update -------------------------------------------------------------

    pub fn build_update(&self, id: i64, update: &RouteUpdate) -> Result<HttpRequest, ApiError> {
        let body = codec::encode_update_route(update)?;
        Ok(Self::with_xml_body(
            self.request(HttpMethod::Put, &format!("/routes/{id}")),
            body,
        ))
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<MutationResult, ApiError> {
        match response.status {
            200 => Ok(MutationResult::ok("Маршрут обновлен")),
            status => Err(ApiError::from_response(
                &response,
                &format!("Ошибка обновления: статус {status}"),
            )),
        }
    }

    // -- delete -------------------------------------------------------------

    pub fn build_delete(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/routes/{id}"))
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<MutationResult, ApiError> {
        match response.status {
            200 | 204 => Ok(MutationResult::ok("Маршрут удален")),
            status => Err(ApiError::from_response(
                &response,
                &format!("Ошибка удаления: статус {status}"),
            )),
        }
    }

    // -- analytics ----------------------------------------------------------

    pub fn build_distance_sum(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/routes/distance/sum")
    }

    pub fn parse_distance_sum(&self, response: HttpResponse) -> Result<DistanceSum, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response, SUM_FAILED));
        }
        codec::decode_distance_sum(&response.body)
    }

    pub fn build_distance_groups(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/routes/distance/group")
    }

    pub fn parse_distance_groups(&self, response: HttpResponse) -> Result<DistanceGroup, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response, GROUP_FAILED));
        }
        codec::decode_distance_group(&response.body)
    }

    pub fn build_greater_than(&self, min_distance: f64) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, "/routes/distance/greater-than");
        req.query = vec![("minDistance".to_string(), min_distance.to_string())];
        req
    }

    pub fn parse_greater_than(&self, response: HttpResponse, min_distance: f64) -> Result<GreaterThanResult, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(&response, GREATER_THAN_FAILED));
        }
        codec::decode_greater_than(&response.body, min_distance)
    }

    // -- add edge -----------------------------------------------------------

    /// Connect two existing locations through the primary service.
    pub fn build_add_edge(&self, from_id: i64, to_id: i64, distance: f64) -> HttpRequest {
        self.request(HttpMethod::Post, &format!("/routes/add/{from_id}/{to_id}/{distance}"))
    }

    pub fn parse_add_edge(&self, response: HttpResponse) -> Result<MutationResult, ApiError> {
        match response.status {
            200 | 201 => Ok(MutationResult::ok("Маршрут создан между существующими локациями")),
            _ => Err(ApiError::from_response(&response, ADD_EDGE_FAILED)),
        }
    }

    // -- availability -------------------------------------------------------

    pub fn build_probe(&self) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, "/application.wadl");
        req.timeout = self.probe_timeout;
        req
    }

    pub fn parse_probe(&self, response: &HttpResponse) -> bool {
        response.status == 200
    }
}

/// Distinct origins and destinations that carry an id and a name, in the
/// order they first appear. These are the ids add-edge and find-between
/// accept.
pub fn locations(page: &PageResult) -> LocationDirectory {
    fn push_unique(into: &mut Vec<Location>, location: &Location) {
        let Some(id) = location.id else { return };
        if location.name.is_empty() || into.iter().any(|l| l.id == Some(id)) {
            return;
        }
        into.push(location.clone());
    }

    let mut directory = LocationDirectory::default();
    for route in &page.routes {
        push_unique(&mut directory.origins, &route.from);
        push_unique(&mut directory.destinations, &route.to);
    }
    directory
}
