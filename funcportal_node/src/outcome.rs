// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use funcportal_api::job::Token;
use funcportal_api::ArgumentsDescription;

pub const MSG_MALFORMED_PAYLOAD: &str = "malformed payload";
pub const MSG_INVALID_ARGUMENTS: &str = "invalid arguments";
pub const MSG_INTERNAL_ERROR: &str = "internal server error";
pub const MSG_NO_SUCH_JOB: &str = "no such job";
pub const MSG_RESULT_NOT_AVAILABLE: &str = "result not available";
pub const MSG_NOT_FOUND: &str = "not found";
pub const MSG_METHOD_NOT_ALLOWED: &str = "method not allowed";

const INTERNAL_ERROR_BODY: &[u8] = br#"{"error":"internal server error"}"#;

/// Terminal classification of one request handled by the portal.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(serde_json::Value),
    Accepted(Token),
    MalformedPayload,
    MissingArguments {
        message: String,
        arguments: ArgumentsDescription,
    },
    InvalidArguments,
    RuntimeFailure,
    SerializationFailure,
    JobNotFound,
    JobPending,
    JobFailed,
    NoRoute,
    MethodNotAllowed,
}

impl Outcome {
    pub fn status(&self) -> hyper::StatusCode {
        match self {
            Outcome::Success(_) => hyper::StatusCode::OK,
            Outcome::Accepted(_) => hyper::StatusCode::ACCEPTED,
            Outcome::MalformedPayload | Outcome::MissingArguments { .. } | Outcome::InvalidArguments => hyper::StatusCode::BAD_REQUEST,
            Outcome::JobNotFound | Outcome::JobPending | Outcome::NoRoute => hyper::StatusCode::NOT_FOUND,
            Outcome::MethodNotAllowed => hyper::StatusCode::METHOD_NOT_ALLOWED,
            Outcome::RuntimeFailure | Outcome::SerializationFailure | Outcome::JobFailed => hyper::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            Outcome::Success(value) => serde_json::json!({ "result": value }),
            Outcome::Accepted(token) => serde_json::json!({ "token": token }),
            Outcome::MissingArguments { message, arguments } => serde_json::json!({
                "error": message,
                "arguments": arguments,
            }),
            Outcome::MalformedPayload => error_body(MSG_MALFORMED_PAYLOAD),
            Outcome::InvalidArguments => error_body(MSG_INVALID_ARGUMENTS),
            Outcome::RuntimeFailure | Outcome::SerializationFailure | Outcome::JobFailed => error_body(MSG_INTERNAL_ERROR),
            Outcome::JobNotFound => error_body(MSG_NO_SUCH_JOB),
            Outcome::JobPending => error_body(MSG_RESULT_NOT_AVAILABLE),
            Outcome::NoRoute => error_body(MSG_NOT_FOUND),
            Outcome::MethodNotAllowed => error_body(MSG_METHOD_NOT_ALLOWED),
        }
    }

    /// Encode the outcome as a JSON response.
    ///
    /// If the body cannot be encoded the caller still gets a JSON internal error.
    pub fn render(&self, route: &str) -> funcportal_http::PortalHTTPResponse {
        match serde_json::to_vec(&self.body()) {
            Ok(body) => funcportal_http::PortalHTTPResponse::json(self.status().as_u16(), body),
            Err(err) => {
                log::error!("Error serialising the response of route {} as JSON: {}", route, err);
                funcportal_http::PortalHTTPResponse::json(hyper::StatusCode::INTERNAL_SERVER_ERROR.as_u16(), INTERNAL_ERROR_BODY.to_vec())
            }
        }
    }
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}
