//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Requests are flat C structs: the host needs method, URL, headers, body
//! and timeout to perform the call, and nothing else. Parse results carry
//! their payload as a JSON C string instead of a mirrored struct tree; the
//! domain records are nested and optional-heavy, and every host language
//! with a C FFI also has a JSON parser. Conversion functions live here to
//! keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use routes_core::error::ApiError;
use routes_core::http::HttpMethod;
use routes_core::{NavigatorGateway, RouteGateway};
use serde::Serialize;

/// Opaque handle to both gateways. C callers receive a pointer to this and
/// pass it back into every FFI function.
pub struct FfiRoutesClient {
    pub(crate) routes: RouteGateway,
    pub(crate) navigator: NavigatorGateway,
}

/// Owned C string; interior NUL bytes yield an empty string.
pub(crate) fn into_c(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `routes_build_*` functions. `url` already carries the
/// percent-encoded query string. The C caller executes the request, giving
/// up after `timeout_ms`, and passes the response back through
/// `routes_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
    pub timeout_ms: u64,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    /// Returns null when the URL cannot be assembled.
    pub(crate) fn from_core(req: routes_core::HttpRequest) -> *mut Self {
        let Ok(url) = req.url() else {
            return std::ptr::null_mut();
        };
        let body = match req.body {
            Some(b) => into_c(b),
            None => std::ptr::null_mut(),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: into_c(k),
                    value: into_c(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: into_c(url),
            headers,
            headers_len,
            body,
            timeout_ms: req.timeout.as_millis() as u64,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `routes_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiRoutesResult`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    /// The server answered with a status the operation does not accept.
    Server = 1,
    /// No response arrived. Reported through `routes_transport_error`.
    Transport = 2,
    Request = 3,
    Decode = 4,
    Serialization = 5,
    Panic = 6,
    NullArg = 7,
}

impl FfiErrorCode {
    fn of(err: &ApiError) -> Self {
        match err {
            ApiError::Server { .. } => FfiErrorCode::Server,
            ApiError::Transport { .. } => FfiErrorCode::Transport,
            ApiError::Request(_) => FfiErrorCode::Request,
            ApiError::Decode(_) => FfiErrorCode::Decode,
            ApiError::Fallback(inner) => FfiErrorCode::of(inner),
        }
    }
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data_json`
/// holds the parsed payload as JSON (`null` for "nothing found").
/// On failure `error_code` describes the category, `error_message` is the
/// operator-facing message, `http_status` is set for `Server` errors, and
/// `data_json` is null.
#[repr(C)]
pub struct FfiRoutesResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_json: *mut c_char,
}

impl FfiRoutesResult {
    fn boxed(
        error_code: FfiErrorCode,
        error_message: *mut c_char,
        http_status: u16,
        data_json: *mut c_char,
    ) -> *mut Self {
        Box::into_raw(Box::new(FfiRoutesResult {
            error_code,
            error_message,
            http_status,
            data_json,
        }))
    }

    /// Build a success result carrying `value` as JSON.
    pub(crate) fn ok_json<T: Serialize>(value: &T) -> *mut Self {
        match serde_json::to_string(value) {
            Ok(json) => Self::boxed(FfiErrorCode::Ok, std::ptr::null_mut(), 0, into_c(json)),
            Err(e) => Self::boxed(
                FfiErrorCode::Serialization,
                into_c(format!("failed to encode result: {e}")),
                0,
                std::ptr::null_mut(),
            ),
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        Self::boxed(
            FfiErrorCode::of(&err),
            into_c(err.to_string()),
            err.status().unwrap_or(0),
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a null or unusable argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::boxed(
            FfiErrorCode::NullArg,
            into_c(format!("null argument: {name}")),
            0,
            std::ptr::null_mut(),
        )
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::boxed(FfiErrorCode::Panic, into_c(msg.to_string()), 0, std::ptr::null_mut())
    }
}
