//! Error taxonomy shared by both gateways.
//!
//! # Design
//! Every failure reaches the caller as an `ApiError` whose `Display` output
//! is safe to show to an operator as-is. The three ways a call can fail map
//! to three variants: the server answered with an error status (`Server`),
//! nothing answered (`Transport`), or the request never left (`Request`).
//! `Decode` covers a success status whose body a strict read path could not
//! use, and `Fallback` wraps a failure of the add-edge fallback.
//!
//! Two outcomes that look like failures are deliberately not errors: a
//! malformed route list degrades to an empty page (`codec::degraded_page`),
//! and a 404 from find-between is an empty `PathfindingResult`.

use std::fmt;

use crate::codec;
use crate::http::HttpResponse;

/// Shown whenever a service did not answer at all.
pub const NO_RESPONSE_MESSAGE: &str =
    "Сервер не отвечает. Проверьте:\n1. SSH туннель активен\n2. Сервисы запущены на helios";

/// Failure reported by a `Transport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request was sent (or attempted) but no response arrived:
    /// connection refused, TLS failure, timeout.
    NoResponse(String),

    /// The request could not be constructed.
    Request(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::NoResponse(reason) => write!(f, "no response: {reason}"),
            TransportError::Request(reason) => write!(f, "invalid request: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Errors returned by gateway `parse_*` methods and `RoutesClient`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The server returned a status the operation does not accept.
    Server { status: u16, message: String },

    /// No response was received. `reason` is for logs; the displayed text is
    /// always `NO_RESPONSE_MESSAGE`.
    Transport { reason: String },

    /// The request could not be built or sent. Carries the operation's
    /// default message.
    Request(String),

    /// A success response whose body could not be decoded.
    Decode(String),

    /// The primary-service fallback for add-edge failed.
    Fallback(Box<ApiError>),
}

impl ApiError {
    /// Normalize an error status response.
    ///
    /// The message is the first `error`, `message` or `faultstring` text when
    /// the body is an XML document that has one, otherwise the body cut to
    /// 500 characters; an empty body yields `default_message`.
    pub fn from_response(response: &HttpResponse, default_message: &str) -> Self {
        let body = response.body.trim();
        let message = if body.is_empty() {
            default_message.to_string()
        } else {
            codec::decode_error_message(body).unwrap_or_else(|| codec::truncate_body(body))
        };
        ApiError::Server {
            status: response.status,
            message,
        }
    }

    /// Normalize a validation failure: the `message` text followed by every
    /// `detail`, e.g. `"Validation failed: name is blank, distance must be > 1"`.
    pub fn detailed(response: &HttpResponse, default_message: &str) -> Self {
        let body = response.body.trim();
        let message = match codec::decode_error_details(body) {
            Some((message, details)) => {
                let mut text = message.unwrap_or_else(|| default_message.to_string());
                if !details.is_empty() {
                    text.push_str(": ");
                    text.push_str(&details.join(", "));
                }
                text
            }
            None if !body.is_empty() && body.chars().count() < 500 => body.to_string(),
            None => default_message.to_string(),
        };
        ApiError::Server {
            status: response.status,
            message,
        }
    }

    /// Normalize a transport failure.
    pub fn from_transport(err: TransportError, default_message: &str) -> Self {
        match err {
            TransportError::NoResponse(reason) => ApiError::Transport { reason },
            TransportError::Request(_) => ApiError::Request(default_message.to_string()),
        }
    }

    /// HTTP status for `Server` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Fallback(inner) => inner.status(),
            _ => None,
        }
    }

    /// True when no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Server { status, message } => write!(f, "{message} (Статус: {status})"),
            ApiError::Transport { .. } => f.write_str(NO_RESPONSE_MESSAGE),
            ApiError::Request(message) => f.write_str(message),
            ApiError::Decode(message) => write!(f, "Ошибка разбора ответа: {message}"),
            ApiError::Fallback(inner) => write!(f, "Не удалось создать маршрут: {inner}"),
        }
    }
}

impl std::error::Error for ApiError {}
