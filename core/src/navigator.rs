//! Request builder and response parser for the navigator service.
//!
//! # Design
//! Same build/parse split as `RouteGateway`. The navigator's status codes
//! carry meaning of their own: on find-between a 404 means "no routes
//! connect these locations" and yields an empty result, and on add-edge each
//! 4xx maps to a fixed explanation.

use std::time::Duration;

use crate::codec;
use crate::config::{ServiceConfig, DEFAULT_PROBE_TIMEOUT, DEFAULT_TIMEOUT};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::routes::XML;
use crate::types::{EdgeResult, EdgeStrategy, PathfindingResult, SortKey};

pub const ADD_EDGE_FAILED: &str = "Не удалось добавить маршрут в навигатор";
pub const FIND_BETWEEN_FAILED: &str = "Не удалось найти маршруты между точками";

const LOCATIONS_NOT_FOUND: &str = "Одна или обе локации не найдены в системе";
const INVALID_EDGE: &str = "Некорректные параметры запроса (дистанция должна быть > 1 или ID совпадают)";
const EDGE_EXISTS: &str = "Маршрут между указанными локациями уже существует";
const SERVER_FAILED: &str = "Ошибка сервера";

#[derive(Debug, Clone)]
pub struct NavigatorGateway {
    base_url: String,
    timeout: Duration,
    probe_timeout: Duration,
}

impl NavigatorGateway {
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
            ..Self::new(&config.navigator_url)
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

    pub fn build_add_edge(&self, from_id: i64, to_id: i64, distance: f64) -> HttpRequest {
        self.request(
            HttpMethod::Post,
            &format!("/navigator/route/add/{from_id}/{to_id}/{distance}"),
        )
    }

    pub fn parse_add_edge(&self, response: HttpResponse) -> Result<EdgeResult, ApiError> {
        let status = response.status;
        let fixed = |message: &str| -> Result<EdgeResult, ApiError> {
            Err(ApiError::Server {
                status,
                message: message.to_string(),
            })
        };
        match status {
            200 | 201 => {
                let echo = codec::decode_add_edge(&response.body);
                Ok(EdgeResult {
                    success: true,
                    message: echo.message,
                    created_by: Some(echo.created_by),
                    route: echo.route,
                    strategy: EdgeStrategy::TryNavigator,
                })
            }
            404 => fixed(LOCATIONS_NOT_FOUND),
            400 => fixed(INVALID_EDGE),
            409 => fixed(EDGE_EXISTS),
            _ => fixed(SERVER_FAILED),
        }
    }

    pub fn build_find_between(&self, from_id: i64, to_id: i64, sort: SortKey) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/navigator/routes/{from_id}/{to_id}/{sort}"),
        )
    }

    /// 200 decodes the routes, 404 is an empty result, anything else is an
    /// error. Unlike the route list, a malformed 200 body is reported.
    pub fn parse_find_between(
        &self,
        response: HttpResponse,
        from_id: i64,
        to_id: i64,
        sort: SortKey,
    ) -> Result<PathfindingResult, ApiError> {
        match response.status {
            200 => {
                let page = codec::decode_route_list(&response.body);
                if page.is_degraded() {
                    return Err(ApiError::Decode(
                        "Ошибка парсинга XML ответа от навигатора".to_string(),
                    ));
                }
                Ok(PathfindingResult::new(page.routes, from_id, to_id, sort))
            }
            404 => {
                tracing::info!(from_id, to_id, "navigator found no routes between locations");
                Ok(PathfindingResult::empty(from_id, to_id, sort))
            }
            status => Err(ApiError::from_response(
                &response,
                &format!("Ошибка сервера: статус {status}"),
            )),
        }
    }

    pub fn build_probe(&self) -> HttpRequest {
        let mut req = self.request(HttpMethod::Get, "/application.wadl");
        req.timeout = self.probe_timeout;
        req
    }

    pub fn parse_probe(&self, response: &HttpResponse) -> bool {
        response.status == 200
    }
}
