// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PortalHTTPMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
}

#[cfg(feature = "hyper")]
pub fn hyper_method_to_portal(method: &hyper::Method) -> anyhow::Result<PortalHTTPMethod> {
    Ok(match *method {
        hyper::Method::GET => PortalHTTPMethod::Get,
        hyper::Method::HEAD => PortalHTTPMethod::Head,
        hyper::Method::POST => PortalHTTPMethod::Post,
        hyper::Method::PUT => PortalHTTPMethod::Put,
        hyper::Method::DELETE => PortalHTTPMethod::Delete,
        hyper::Method::PATCH => PortalHTTPMethod::Patch,
        _ => {
            return Err(anyhow::anyhow!("Unhandled Method"));
        }
    })
}

impl PortalHTTPMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortalHTTPMethod::Get => "GET",
            PortalHTTPMethod::Head => "HEAD",
            PortalHTTPMethod::Post => "POST",
            PortalHTTPMethod::Put => "PUT",
            PortalHTTPMethod::Delete => "DELETE",
            PortalHTTPMethod::Patch => "PATCH",
        }
    }
}

impl std::fmt::Display for PortalHTTPMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CONTENT_TYPE_JSON: &str = "application/json";

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct PortalHTTPRequest {
    pub method: PortalHTTPMethod,
    pub path: String,
    pub body: Option<Vec<u8>>,
    pub headers: std::collections::HashMap<String, String>,
}

impl PortalHTTPRequest {
    pub fn new(method: PortalHTTPMethod, path: &str, body: Option<Vec<u8>>) -> Self {
        Self {
            method,
            path: path.to_string(),
            body,
            headers: std::collections::HashMap::new(),
        }
    }

    /// Value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// True unless the request declares a content type other than JSON.
    pub fn is_json(&self) -> bool {
        match self.header("content-type") {
            Some(content_type) => content_type
                .split(';')
                .next()
                .map(|media_type| media_type.trim().eq_ignore_ascii_case(CONTENT_TYPE_JSON))
                .unwrap_or(false),
            None => true,
        }
    }

    /// Request path with any query string removed.
    pub fn route_path(&self) -> &str {
        match self.path.split_once('?') {
            Some((path, _)) => path,
            None => &self.path,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct PortalHTTPResponse {
    pub body: Option<Vec<u8>>,
    pub status: u16,
    pub headers: std::collections::HashMap<String, String>,
}

impl PortalHTTPResponse {
    /// Response carrying an already-encoded JSON body.
    pub fn json(status: u16, body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            status,
            headers: std::collections::HashMap::from([("content-type".to_string(), CONTENT_TYPE_JSON.to_string())]),
        }
    }

    /// Decode the body as JSON; an absent body is `null`.
    pub fn json_body(&self) -> anyhow::Result<serde_json::Value> {
        match &self.body {
            Some(body) => Ok(serde_json::from_slice(body)?),
            None => Ok(serde_json::Value::Null),
        }
    }
}
