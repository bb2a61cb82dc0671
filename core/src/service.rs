//! Async client that drives both gateways over a `Transport`.
//!
//! # Design
//! Every operation is build → `Transport::execute` → parse. The client
//! adds nothing but transport error mapping and logging, with one exception:
//! `add_edge`, which chooses between two creation strategies.
//!
//! `add_edge` starts in `EdgeStrategy::TryNavigator`. Only a failure with no
//! response at all moves it to `EdgeStrategy::FallbackToPrimary`; any HTTP
//! error from the navigator is returned as-is. The fallback runs once and is
//! not a retry of the same call: it creates an equivalent route through the
//! primary service instead.

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::error::{ApiError, TransportError};
use crate::filter::RouteQuery;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::navigator::{self, NavigatorGateway};
use crate::routes::{self, RouteGateway, FIND_ALL_LIMIT};
use crate::types::{
    Coordinates, DistanceGroup, DistanceSum, EdgeResult, EdgeStrategy, GreaterThanResult, Location,
    LocationDirectory, MutationResult, NewRoute, PageResult, PathfindingResult, Route, RouteUpdate,
    SortKey,
};

/// How many routes are scanned to build the location directory.
pub const LOCATION_SCAN_SIZE: u32 = 100;

/// Executes a plain-data request. Implementations must report every status
/// code as a response; only a missing response is an error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ServiceConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

/// A timeout is a missing response like any other network failure.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::Request(err.to_string())
    } else if err.is_timeout() {
        TransportError::NoResponse(format!("timed out: {err}"))
    } else {
        TransportError::NoResponse(err.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, request.path.as_str())
            .query(&request.query)
            .timeout(request.timeout);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect();
        let body = response.text().await.map_err(classify)?;
        Ok(HttpResponse { status, headers, body })
    }
}

impl EdgeStrategy {
    /// Strategy to switch to after `err`, or `None` when `err` must be
    /// returned to the caller.
    pub fn after(self, err: &ApiError) -> Option<EdgeStrategy> {
        match self {
            EdgeStrategy::TryNavigator if err.is_transport() => Some(EdgeStrategy::FallbackToPrimary),
            _ => None,
        }
    }
}

/// Both services behind one async API.
pub struct RoutesClient<T = ReqwestTransport> {
    routes: RouteGateway,
    navigator: NavigatorGateway,
    transport: T,
}

impl RoutesClient<ReqwestTransport> {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config)
            .map_err(|e| ApiError::from_transport(e, "Не удалось инициализировать HTTP клиент"))?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> RoutesClient<T> {
    pub fn new(config: &ServiceConfig, transport: T) -> Self {
        Self {
            routes: RouteGateway::from_config(config),
            navigator: NavigatorGateway::from_config(config),
            transport,
        }
    }

    async fn send(&self, request: HttpRequest, default_message: &str) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), path = %request.path, query = ?request.query, "sending request");
        match self.transport.execute(request).await {
            Ok(response) => {
                tracing::debug!(status = response.status, "response received");
                Ok(response)
            }
            Err(e) => {
                tracing::error!(error = %e, "request failed");
                Err(ApiError::from_transport(e, default_message))
            }
        }
    }

    fn logged<R>(result: Result<R, ApiError>) -> Result<R, ApiError> {
        if let Err(e) = &result {
            tracing::error!(error = %e, status = ?e.status(), "operation failed");
        }
        result
    }

    // -- route management -----------------------------------------------------

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, query: &RouteQuery) -> Result<PageResult, ApiError> {
        let response = self.send(self.routes.build_list(query), routes::LIST_FAILED).await?;
        Self::logged(self.routes.parse_list(response))
    }

    /// Linear scan over the first 1000 routes.
    #[tracing::instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Route>, ApiError> {
        let response = self.send(self.routes.build_get_by_id(), routes::FIND_FAILED).await?;
        Self::logged(self.routes.parse_get_by_id(response, id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, route: &NewRoute) -> Result<MutationResult, ApiError> {
        let request = self.routes.build_create(route)?;
        let response = self.send(request, routes::CREATE_FAILED).await?;
        Self::logged(self.routes.parse_create(response))
    }

    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: i64, update: &RouteUpdate) -> Result<MutationResult, ApiError> {
        let request = self.routes.build_update(id, update)?;
        let response = self.send(request, routes::UPDATE_FAILED).await?;
        Self::logged(self.routes.parse_update(response))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<MutationResult, ApiError> {
        let response = self.send(self.routes.build_delete(id), routes::DELETE_FAILED).await?;
        Self::logged(self.routes.parse_delete(response))
    }

    #[tracing::instrument(skip(self))]
    pub async fn distance_sum(&self) -> Result<DistanceSum, ApiError> {
        let response = self.send(self.routes.build_distance_sum(), routes::SUM_FAILED).await?;
        Self::logged(self.routes.parse_distance_sum(response))
    }

    #[tracing::instrument(skip(self))]
    pub async fn distance_groups(&self) -> Result<DistanceGroup, ApiError> {
        let response = self.send(self.routes.build_distance_groups(), routes::GROUP_FAILED).await?;
        Self::logged(self.routes.parse_distance_groups(response))
    }

    #[tracing::instrument(skip(self))]
    pub async fn greater_than(&self, min_distance: f64) -> Result<GreaterThanResult, ApiError> {
        let response = self
            .send(self.routes.build_greater_than(min_distance), routes::GREATER_THAN_FAILED)
            .await?;
        Self::logged(self.routes.parse_greater_than(response, min_distance))
    }

    /// Connect two existing locations through the primary service's own
    /// add endpoint.
    #[tracing::instrument(skip(self))]
    pub async fn add_edge_via_primary(&self, from_id: i64, to_id: i64, distance: f64) -> Result<MutationResult, ApiError> {
        let response = self
            .send(self.routes.build_add_edge(from_id, to_id, distance), routes::ADD_EDGE_FAILED)
            .await?;
        Self::logged(self.routes.parse_add_edge(response))
    }

    /// Identified origins and destinations from the first page of routes.
    #[tracing::instrument(skip(self))]
    pub async fn locations(&self) -> Result<LocationDirectory, ApiError> {
        let page = self.list(&RouteQuery::new().size(LOCATION_SCAN_SIZE)).await?;
        Ok(routes::locations(&page))
    }

    // -- navigator ------------------------------------------------------------

    /// Create an edge between two locations, falling back to the primary
    /// service when the navigator does not answer.
    #[tracing::instrument(skip(self))]
    pub async fn add_edge(&self, from_id: i64, to_id: i64, distance: f64) -> Result<EdgeResult, ApiError> {
        let mut strategy = EdgeStrategy::TryNavigator;
        loop {
            let outcome = match strategy {
                EdgeStrategy::TryNavigator => self.add_edge_on_navigator(from_id, to_id, distance).await,
                EdgeStrategy::FallbackToPrimary => {
                    return Self::logged(
                        self.synthesize_edge(from_id, to_id, distance)
                            .await
                            .map_err(|e| ApiError::Fallback(Box::new(e))),
                    );
                }
            };
            let err = match outcome {
                Ok(result) => return Ok(result),
                Err(err) => err,
            };
            match strategy.after(&err) {
                Some(next) => {
                    tracing::warn!(?next, "navigator unreachable, switching strategy");
                    strategy = next;
                }
                None => return Self::logged(Err(err)),
            }
        }
    }

    async fn add_edge_on_navigator(&self, from_id: i64, to_id: i64, distance: f64) -> Result<EdgeResult, ApiError> {
        let response = self
            .send(self.navigator.build_add_edge(from_id, to_id, distance), navigator::ADD_EDGE_FAILED)
            .await?;
        self.navigator.parse_add_edge(response)
    }

    /// Build the edge as an ordinary route on the primary service: named
    /// after both locations and placed at their midpoint.
    async fn synthesize_edge(&self, from_id: i64, to_id: i64, distance: f64) -> Result<EdgeResult, ApiError> {
        let page = self.list(&RouteQuery::new().size(FIND_ALL_LIMIT)).await?;
        let from = page.routes.iter().find(|r| r.from.id == Some(from_id)).map(|r| r.from.clone());
        let to = page.routes.iter().find(|r| r.to.id == Some(to_id)).map(|r| r.to.clone());
        let (Some(from), Some(to)) = (from, to) else {
            return Err(ApiError::Request("Не удалось найти информацию о локациях".to_string()));
        };

        let new_route = NewRoute {
            name: format!("Маршрут {} - {}", from.name, to.name),
            coordinates: Coordinates::midpoint(&from, &to),
            from: Location::new(from.name.clone(), from.x, from.y),
            to: Location::new(to.name.clone(), to.x, to.y),
            distance,
        };
        let created = self.create(&new_route).await?;

        // Take the id the service assigned, if it echoed the route back.
        let echo = created
            .data
            .as_deref()
            .map(crate::codec::decode_route_list)
            .and_then(|page| page.routes.into_iter().next());

        let route = Route {
            id: echo.as_ref().map(|r| r.id).unwrap_or(0),
            name: new_route.name.clone(),
            coordinates: new_route.coordinates,
            from,
            to,
            distance,
            creation_date: echo.and_then(|r| r.creation_date),
        };
        Ok(EdgeResult {
            success: true,
            message: format!(
                "Маршрут \"{}\" создан через основной сервис (навигатор недоступен)",
                route.name
            ),
            created_by: None,
            route: Some(route),
            strategy: EdgeStrategy::FallbackToPrimary,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_between(&self, from_id: i64, to_id: i64, sort: SortKey) -> Result<PathfindingResult, ApiError> {
        let response = self
            .send(
                self.navigator.build_find_between(from_id, to_id, sort),
                navigator::FIND_BETWEEN_FAILED,
            )
            .await?;
        Self::logged(self.navigator.parse_find_between(response, from_id, to_id, sort))
    }

    // -- availability -----------------------------------------------------------

    pub async fn check_primary(&self) -> bool {
        self.probe(self.routes.build_probe(), |r| self.routes.parse_probe(r), "primary")
            .await
    }

    pub async fn check_navigator(&self) -> bool {
        self.probe(self.navigator.build_probe(), |r| self.navigator.parse_probe(r), "navigator")
            .await
    }

    async fn probe(&self, request: HttpRequest, accept: impl Fn(&HttpResponse) -> bool, service: &str) -> bool {
        match self.transport.execute(request).await {
            Ok(response) => {
                tracing::info!(service, status = response.status, "availability probe");
                accept(&response)
            }
            Err(e) => {
                tracing::info!(service, error = %e, "service unavailable");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers by path prefix; paths with no rule get no response.
    struct ScriptedTransport {
        rules: Vec<(&'static str, u16, String)>,
        unreachable: Vec<&'static str>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                rules: Vec::new(),
                unreachable: Vec::new(),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn on(mut self, base: &'static str, status: u16, body: &str) -> Self {
            self.rules.push((base, status, body.to_string()));
            self
        }

        fn down(mut self, base: &'static str) -> Self {
            self.unreachable.push(base);
            self
        }

        fn seen(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request.clone());
            if self.unreachable.iter().any(|p| request.path.starts_with(p)) {
                return Err(TransportError::NoResponse("connection refused".to_string()));
            }
            let key = format!("{} {}", request.method.as_str(), request.path);
            self.rules
                .iter()
                .find(|(prefix, _, _)| key.starts_with(prefix))
                .map(|(_, status, body)| HttpResponse::new(*status, body.clone()))
                .ok_or_else(|| TransportError::NoResponse(format!("no rule for {key}")))
        }
    }

    const PRIMARY: &str = "http://primary";
    const NAVIGATOR: &str = "http://navigator";

    fn client(transport: ScriptedTransport) -> RoutesClient<ScriptedTransport> {
        RoutesClient::new(&ServiceConfig::new(PRIMARY, NAVIGATOR), transport)
    }

    const KNOWN_ROUTES: &str = "<RouteListResponse><routes>\
        <route><id>1</id><name>r1</name><fromLocation><id>10</id><name>Depot</name><x>0</x><y>0</y></fromLocation>\
        <toLocation><id>11</id><name>Mill</name><x>3</x><y>3</y></toLocation><distance>4</distance></route>\
        <route><id>2</id><name>r2</name><fromLocation><id>12</id><name>Farm</name><x>1</x><y>1</y></fromLocation>\
        <toLocation><id>20</id><name>Port</name><x>5</x><y>8</y></toLocation><distance>9</distance></route>\
        </routes><totalElements>2</totalElements></RouteListResponse>";

    #[test]
    fn only_transport_errors_trigger_fallback() {
        let transport = ApiError::Transport { reason: "refused".into() };
        let http = ApiError::Server { status: 500, message: "x".into() };
        assert_eq!(
            EdgeStrategy::TryNavigator.after(&transport),
            Some(EdgeStrategy::FallbackToPrimary)
        );
        assert_eq!(EdgeStrategy::TryNavigator.after(&http), None);
        assert_eq!(EdgeStrategy::FallbackToPrimary.after(&transport), None);
    }

    #[tokio::test]
    async fn add_edge_uses_navigator_when_it_answers() {
        let transport = ScriptedTransport::new().on(
            "POST http://navigator/navigator/route/add/10/20/15",
            201,
            "<AddRouteResponse><message>ok</message><createdBy>navigator-service</createdBy></AddRouteResponse>",
        );
        let client = client(transport);
        let result = client.add_edge(10, 20, 15.0).await.unwrap();
        assert_eq!(result.strategy, EdgeStrategy::TryNavigator);
        assert_eq!(result.message, "ok");
        assert_eq!(client.transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn add_edge_http_error_does_not_fall_back() {
        let transport = ScriptedTransport::new().on("POST http://navigator/", 409, "");
        let client = client(transport);
        let err = client.add_edge(10, 20, 15.0).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert_eq!(client.transport.seen().len(), 1);
    }

    #[tokio::test]
    async fn add_edge_falls_back_to_primary_when_navigator_is_down() {
        let transport = ScriptedTransport::new()
            .down(NAVIGATOR)
            .on("GET http://primary/routes", 200, KNOWN_ROUTES)
            .on("POST http://primary/routes", 201, "<route><id>77</id></route>");
        let client = client(transport);

        let result = client.add_edge(10, 20, 15.0).await.unwrap();
        assert_eq!(result.strategy, EdgeStrategy::FallbackToPrimary);
        let route = result.route.unwrap();
        assert_eq!(route.name, "Маршрут Depot - Port");
        assert_eq!(route.coordinates, Coordinates { x: 2.5, y: 4.0 });
        assert_eq!(route.id, 77);
        assert_eq!(route.distance, 15.0);
        assert!(result.message.contains("навигатор недоступен"));

        let seen = client.transport.seen();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].query_value("size"), Some("1000"));
        let body = seen[2].body.as_deref().unwrap();
        assert!(body.contains("<name>Маршрут Depot - Port</name>"));
        assert!(body.contains("<coordinates><x>2</x><y>4</y></coordinates>"));
        assert!(body.contains("<distance>15</distance>"));
    }

    #[tokio::test]
    async fn fallback_without_known_locations_fails() {
        let transport = ScriptedTransport::new()
            .down(NAVIGATOR)
            .on("GET http://primary/routes", 200, KNOWN_ROUTES);
        let err = client(transport).add_edge(10, 99, 15.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Fallback(_)));
        assert_eq!(
            err.to_string(),
            "Не удалось создать маршрут: Не удалось найти информацию о локациях"
        );
    }

    #[tokio::test]
    async fn transport_failure_is_normalized() {
        let transport = ScriptedTransport::new().down(PRIMARY);
        let err = client(transport).list(&RouteQuery::new()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(err.to_string(), crate::error::NO_RESPONSE_MESSAGE);
    }

    #[tokio::test]
    async fn find_between_404_is_not_an_error() {
        let transport = ScriptedTransport::new().on("GET http://navigator/navigator/routes/1/2/name", 404, "");
        let result = client(transport).find_between(1, 2, SortKey::Name).await.unwrap();
        assert_eq!(result.total_found, 0);
        assert_eq!(result.sorted_by, SortKey::Name);
    }

    #[tokio::test]
    async fn get_by_id_scans_first_thousand() {
        let transport = ScriptedTransport::new().on("GET http://primary/routes", 200, KNOWN_ROUTES);
        let client = client(transport);
        assert_eq!(client.get_by_id(2).await.unwrap().unwrap().name, "r2");
        assert!(client.get_by_id(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn probes_report_availability() {
        let transport = ScriptedTransport::new()
            .on("GET http://primary/application.wadl", 200, "<application/>")
            .down(NAVIGATOR);
        let client = client(transport);
        assert!(client.check_primary().await);
        assert!(!client.check_navigator().await);
        assert_eq!(client.transport.seen()[0].timeout, crate::config::DEFAULT_PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn locations_come_from_a_page_of_100() {
        let transport = ScriptedTransport::new().on("GET http://primary/routes", 200, KNOWN_ROUTES);
        let client = client(transport);
        let dir = client.locations().await.unwrap();
        assert_eq!(dir.origins.len(), 2);
        assert_eq!(dir.destinations.len(), 2);
        assert_eq!(client.transport.seen()[0].query_value("size"), Some("100"));
    }
}
