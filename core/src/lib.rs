//! Client core for the route-management and navigator services.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A host can execute the
//! round-trip itself (see the `routes-ffi` crate), or use `RoutesClient`,
//! which drives the same gateways over an async `Transport`.
//!
//! # Design
//! - `RouteGateway` and `NavigatorGateway` hold only a base URL and
//!   timeouts. Each operation is split into `build_*` and `parse_*`, so the
//!   I/O boundary is explicit.
//! - Both services speak XML. `codec` owns the dialect; domain types in
//!   `types` never see an element name.
//! - Every failure is an `ApiError` whose `Display` is operator-facing text.
//! - `RoutesClient::add_edge` is the only operation that talks to both
//!   services: it falls back to the primary service when the navigator does
//!   not answer.

pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod navigator;
pub mod routes;
pub mod service;
pub mod types;
pub mod xml;

pub use config::ServiceConfig;
pub use error::{ApiError, TransportError};
pub use filter::{RouteFilter, RouteQuery, SortDirection, SortOrder};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use navigator::NavigatorGateway;
pub use routes::RouteGateway;
pub use service::{ReqwestTransport, RoutesClient, Transport};
pub use types::{
    Coordinates, DistanceGroup, DistanceGroupEntry, DistanceSum, EdgeResult, EdgeStrategy,
    GreaterThanResult, Location, LocationDirectory, MutationResult, NewRoute, PageResult,
    Pagination, PathfindingResult, Route, RouteUpdate, SortKey,
};
