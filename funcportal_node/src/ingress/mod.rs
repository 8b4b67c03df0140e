// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::outcome::Outcome;
use crate::portal::Portal;
use http_body_util::BodyExt;

#[cfg(test)]
mod test;

/// Adapts a [`Portal`] to a hyper service.
#[derive(Clone)]
struct PortalService {
    portal: std::sync::Arc<Portal>,
}

impl hyper::service::Service<hyper::Request<hyper::body::Incoming>> for PortalService {
    type Response = hyper::Response<http_body_util::Full<hyper::body::Bytes>>;

    type Error = anyhow::Error;

    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: hyper::Request<hyper::body::Incoming>) -> Self::Future {
        let portal = self.portal.clone();
        Box::pin(async move {
            let (parts, body) = req.into_parts();

            let method = match funcportal_http::hyper_method_to_portal(&parts.method) {
                Ok(method) => method,
                Err(_) => {
                    return to_hyper_response(Outcome::MethodNotAllowed.render(parts.uri.path()));
                }
            };
            let data = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(err) => {
                    log::warn!("Could not read the request body of {} {}: {}", parts.method, parts.uri.path(), err);
                    return to_hyper_response(Outcome::MalformedPayload.render(parts.uri.path()));
                }
            };

            let request = funcportal_http::PortalHTTPRequest {
                method,
                path: parts.uri.path().to_string(),
                body: if data.is_empty() { None } else { Some(Vec::from(data)) },
                headers: parts
                    .headers
                    .iter()
                    .filter_map(|(k, v)| match v.to_str() {
                        Ok(header_value) => Some((k.to_string(), header_value.to_string())),
                        Err(_) => {
                            log::warn!("Ignoring non-ASCII value of header {} on {}", k, parts.uri.path());
                            None
                        }
                    })
                    .collect(),
            };

            to_hyper_response(portal.handle(request).await)
        })
    }
}

fn to_hyper_response(
    response: funcportal_http::PortalHTTPResponse,
) -> anyhow::Result<hyper::Response<http_body_util::Full<hyper::body::Bytes>>> {
    let mut hyper_response = hyper::Response::new(http_body_util::Full::new(hyper::body::Bytes::from(response.body.unwrap_or_default())));
    *hyper_response.status_mut() = hyper::StatusCode::from_u16(response.status)?;
    let headers = hyper_response.headers_mut();
    for (header_key, header_val) in response.headers {
        if let (Ok(key), Ok(value)) = (
            hyper::header::HeaderName::from_bytes(header_key.as_bytes()),
            hyper::header::HeaderValue::from_str(&header_val),
        ) {
            headers.append(key, value);
        }
    }
    Ok(hyper_response)
}

/// Parse the socket address to listen on from a URL like `http://127.0.0.1:7035`.
///
/// The host must be an IP address, since no name resolution is performed.
pub fn parse_listen_addr(ingress_url: &str) -> anyhow::Result<std::net::SocketAddr> {
    let uri = ingress_url.parse::<hyper::Uri>()?;
    if uri.scheme_str() != Some("http") {
        anyhow::bail!("unsupported ingress URL, expected http://host:port, got '{}'", ingress_url);
    }
    let host = match uri.host() {
        Some(host) => host.trim_start_matches('[').trim_end_matches(']'),
        None => anyhow::bail!("missing host in ingress URL '{}'", ingress_url),
    };
    let ip = match host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(_) => anyhow::bail!("the ingress host must be an IP address, got '{}'", host),
    };
    Ok(std::net::SocketAddr::new(ip, uri.port_u16().unwrap_or(80)))
}

/// Accept connections on `listener` and serve `portal` on each of them.
pub async fn serve(listener: tokio::net::TcpListener, portal: std::sync::Arc<Portal>) -> anyhow::Result<()> {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(val) => val,
            Err(err) => {
                log::error!("Accept Error: {}", err);
                continue;
            }
        };
        let io = hyper_util::rt::TokioIo::new(stream);
        let service = PortalService { portal: portal.clone() };
        tokio::task::spawn(async move {
            if let Err(err) = hyper::server::conn::http1::Builder::new().serve_connection(io, service).await {
                log::warn!("Error serving connection: {:?}", err);
            }
        });
    }
}

/// Bind the ingress at `ingress_url` and serve `portal` in a background task.
pub async fn ingress_task(
    portal: std::sync::Arc<Portal>,
    ingress_url: &str,
) -> anyhow::Result<tokio::task::JoinHandle<anyhow::Result<()>>> {
    let addr = parse_listen_addr(ingress_url)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("HTTP ingress listening on {}", listener.local_addr()?);
    Ok(tokio::spawn(serve(listener, portal)))
}
