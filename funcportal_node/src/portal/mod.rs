// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use crate::handler::FunctionHandler;
use crate::jobs::JobLifecycle;
use crate::outcome::Outcome;
use funcportal_api::job::{JobStoreAPI, Token};
use funcportal_api::{ExtraArguments, FunctionAdapter};
use funcportal_http::{PortalHTTPMethod, PortalHTTPRequest, PortalHTTPResponse};


/// Route table of function handlers, and the request handler serving it.
///
/// - `POST <route>` calls the function of the route
/// - `GET <route>/<token>` retrieves the result of an asynchronous call
pub struct Portal {
    routes: std::collections::HashMap<String, FunctionHandler>,
    jobs: Option<JobLifecycle>,
    extra_arguments: ExtraArguments,
}

enum Resolution<'a> {
    Call(&'a FunctionHandler),
    Retrieve(&'a FunctionHandler, Token),
    MethodNotAllowed,
    NoRoute,
}

impl Portal {
    /// A portal that only accepts synchronous routes.
    pub fn new() -> Self {
        Self {
            routes: std::collections::HashMap::new(),
            jobs: None,
            extra_arguments: ExtraArguments::default(),
        }
    }

    pub fn with_job_store(store: std::sync::Arc<dyn JobStoreAPI>) -> Self {
        Self {
            routes: std::collections::HashMap::new(),
            jobs: Some(JobLifecycle::new(store)),
            extra_arguments: ExtraArguments::default(),
        }
    }

    /// Policy applied to the functions registered from now on.
    pub fn set_extra_arguments(&mut self, policy: ExtraArguments) {
        self.extra_arguments = policy;
    }

    pub fn register_endpoint(&mut self, route: &str, adapter: FunctionAdapter, asynchronous: bool) -> anyhow::Result<&FunctionHandler> {
        let route = normalize_route(route);
        if self.routes.contains_key(&route) {
            anyhow::bail!("route already registered: {}", route);
        }

        let adapter = adapter.with_extra_arguments(self.extra_arguments);
        let handler = if asynchronous {
            let jobs = match &self.jobs {
                Some(jobs) => jobs.clone(),
                None => anyhow::bail!("cannot register asynchronous route {} without a job store", route),
            };
            if self
                .routes
                .values()
                .any(|handler| handler.is_asynchronous() && handler.adapter().name() == adapter.name())
            {
                anyhow::bail!("another asynchronous route already serves a function named {}", adapter.name());
            }
            FunctionHandler::asynchronous(&route, adapter, jobs)
        } else {
            FunctionHandler::synchronous(&route, adapter)
        };

        log::info!(
            "Registering {} route {} for function {}",
            if asynchronous { "asynchronous" } else { "synchronous" },
            route,
            handler.adapter().name()
        );
        Ok(&*self.routes.entry(route).or_insert(handler))
    }

    pub fn handler(&self, route: &str) -> Option<&FunctionHandler> {
        self.routes.get(&normalize_route(route))
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(|route| route.as_str())
    }

    /// Functions that workers must know to execute the jobs of this portal.
    pub fn async_functions(&self) -> std::collections::HashMap<String, FunctionAdapter> {
        self.routes
            .values()
            .filter(|handler| handler.is_asynchronous())
            .map(|handler| (handler.adapter().name().to_string(), handler.adapter().clone()))
            .collect()
    }

    /// Serve one request. Always answers with a JSON body.
    pub async fn handle(&self, request: PortalHTTPRequest) -> PortalHTTPResponse {
        let path = request.route_path().to_string();
        log::debug!("{} {}", request.method, path);
        if !request.is_json() {
            log::debug!(
                "{} {} declares content type {}, parsing the body as JSON",
                request.method,
                path,
                request.header("content-type").unwrap_or_default()
            );
        }

        match self.resolve(&path, request.method) {
            Resolution::Call(handler) => handler.call(request.body.as_deref()).await.render(handler.route()),
            Resolution::Retrieve(handler, token) => handler.retrieve(&token).await.render(handler.route()),
            Resolution::MethodNotAllowed => Outcome::MethodNotAllowed.render(&path),
            Resolution::NoRoute => Outcome::NoRoute.render(&path),
        }
    }

    fn resolve(&self, path: &str, method: PortalHTTPMethod) -> Resolution<'_> {
        let path = normalize_route(path);
        if let Some(handler) = self.routes.get(&path) {
            return match method {
                PortalHTTPMethod::Post => Resolution::Call(handler),
                _ => Resolution::MethodNotAllowed,
            };
        }

        if let Some((prefix, token)) = path.rsplit_once('/') {
            if !token.is_empty() {
                if let Some(handler) = self.routes.get(&normalize_route(prefix)).filter(|handler| handler.is_asynchronous()) {
                    return match method {
                        PortalHTTPMethod::Get => Resolution::Retrieve(handler, Token::from(token)),
                        _ => Resolution::MethodNotAllowed,
                    };
                }
            }
        }

        Resolution::NoRoute
    }
}

impl Default for Portal {
    fn default() -> Self {
        Self::new()
    }
}

/// Leading slash added, trailing slashes removed.
pub fn normalize_route(route: &str) -> String {
    let trimmed = route.trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}
