// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::outcome::{MSG_MALFORMED_PAYLOAD, MSG_RESULT_NOT_AVAILABLE};
use funcportal_api::job::Token;
use funcportal_api::{Arguments, ArgumentsDescription};

#[derive(Debug)]
pub enum ClientError {
    MissingArguments {
        message: String,
        arguments: ArgumentsDescription,
    },
    MalformedPayload,
    InvalidArguments,
    ServerError,
    /// The job exists but its result is not available yet.
    NotReady,
    NotFound(String),
    UnexpectedStatus(u16),
    Transport(reqwest::Error),
    Decode(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::MissingArguments { message, .. } => write!(f, "{}", message),
            ClientError::MalformedPayload => write!(f, "bad content sent to server"),
            ClientError::InvalidArguments => write!(f, "invalid arguments sent to server"),
            ClientError::ServerError => write!(f, "an error occurred on the server when handling the request"),
            ClientError::NotReady => write!(f, "result not available yet"),
            ClientError::NotFound(message) => write!(f, "not found: {}", message),
            ClientError::UnexpectedStatus(status) => write!(f, "unexpected response from server with status {}", status),
            ClientError::Transport(err) => write!(f, "transport error: {}", err),
            ClientError::Decode(detail) => write!(f, "could not decode the server response: {}", detail),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

/// Client of the endpoints served by a portal.
#[derive(Clone)]
pub struct FuncPortalClient {
    url: String,
    client: reqwest::Client,
}

impl FuncPortalClient {
    /// `url` is the base address of the portal, e.g., `http://127.0.0.1:7035`.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.url, crate::portal::normalize_route(endpoint))
    }

    /// Call a synchronous endpoint and return its result.
    pub async fn call(&self, endpoint: &str, arguments: &Arguments) -> Result<serde_json::Value, ClientError> {
        let response = self.client.post(self.endpoint_url(endpoint)).json(arguments).send().await?;
        let (status, body) = decode(response).await?;
        match status {
            200 => Ok(take_result(body)),
            _ => Err(classify(status, body)),
        }
    }

    /// Submit a call to an asynchronous endpoint.
    pub async fn submit(&self, endpoint: &str, arguments: &Arguments) -> Result<Token, ClientError> {
        let response = self.client.post(self.endpoint_url(endpoint)).json(arguments).send().await?;
        let (status, body) = decode(response).await?;
        match status {
            202 => match body["token"].as_str() {
                Some(token) => Ok(Token::from(token)),
                None => Err(ClientError::Decode(format!("missing token in: {}", body))),
            },
            _ => Err(classify(status, body)),
        }
    }

    /// Fetch the result of a job once.
    pub async fn fetch(&self, endpoint: &str, token: &Token) -> Result<serde_json::Value, ClientError> {
        let url = format!("{}/{}", self.endpoint_url(endpoint), token);
        let response = self.client.get(url).send().await?;
        let (status, body) = decode(response).await?;
        match status {
            200 => Ok(take_result(body)),
            _ => Err(classify(status, body)),
        }
    }

    /// Poll the result of a job every `interval`, at most `attempts` times.
    pub async fn wait(
        &self,
        endpoint: &str,
        token: &Token,
        interval: std::time::Duration,
        attempts: usize,
    ) -> Result<serde_json::Value, ClientError> {
        let mut remaining = attempts;
        loop {
            match self.fetch(endpoint, token).await {
                Err(ClientError::NotReady) if remaining > 1 => {
                    remaining -= 1;
                    tokio::time::sleep(interval).await;
                }
                res => return res,
            }
        }
    }
}

async fn decode(response: reqwest::Response) -> Result<(u16, serde_json::Value), ClientError> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;
    match serde_json::from_slice::<serde_json::Value>(&bytes) {
        Ok(body) => Ok((status, body)),
        Err(err) => Err(ClientError::Decode(format!("status {}: {}", status, err))),
    }
}

fn take_result(body: serde_json::Value) -> serde_json::Value {
    match body {
        serde_json::Value::Object(mut map) => map.remove("result").unwrap_or_default(),
        _ => serde_json::Value::Null,
    }
}

fn classify(status: u16, body: serde_json::Value) -> ClientError {
    let message = body["error"].as_str().unwrap_or_default().to_string();
    match status {
        400 => {
            if let Some(arguments) = body.get("arguments") {
                match serde_json::from_value::<ArgumentsDescription>(arguments.clone()) {
                    Ok(arguments) => ClientError::MissingArguments { message, arguments },
                    Err(err) => ClientError::Decode(err.to_string()),
                }
            } else if message == MSG_MALFORMED_PAYLOAD {
                ClientError::MalformedPayload
            } else {
                ClientError::InvalidArguments
            }
        }
        404 if message == MSG_RESULT_NOT_AVAILABLE => ClientError::NotReady,
        404 => ClientError::NotFound(message),
        500 => ClientError::ServerError,
        _ => ClientError::UnexpectedStatus(status),
    }
}
