//! Bearer-token authentication middleware
//!
//! Tokens map to user ids via configuration. The resolved user is stored in
//! the request extensions as [`AuthenticatedUser`] for handlers to extract.
//! With no tokens configured, authentication is disabled and every request
//! runs as the anonymous user. Operational endpoints bypass auth entirely.

use crate::error::{EngineError, ErrorResponse};
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

/// User id the request is executing as, resolved from its bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub String);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedUser>()
                .cloned()
                .ok_or_else(|| {
                    EngineError::unauthorized("No authenticated user on request").into()
                }),
        )
    }
}

/// Paths that never require a token
fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/ping" | "/metrics")
}

/// Bearer-token authentication middleware
pub struct BearerAuth {
    tokens: Rc<HashMap<String, String>>,
}

impl BearerAuth {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self {
            tokens: Rc::new(tokens),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            tokens: Rc::clone(&self.tokens),
        }))
    }
}

pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    tokens: Rc<HashMap<String, String>>,
}

impl<S, B> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = Rc::clone(&self.tokens);

        Box::pin(async move {
            if is_public_path(req.path()) {
                let response = service.call(req).await?;
                return Ok(response.map_into_left_body());
            }

            if tokens.is_empty() {
                req.extensions_mut()
                    .insert(AuthenticatedUser("anonymous".to_string()));
                let response = service.call(req).await?;
                return Ok(response.map_into_left_body());
            }

            match extract_bearer_token(&req).and_then(|token| tokens.get(&token).cloned()) {
                Some(user_id) => {
                    req.extensions_mut().insert(AuthenticatedUser(user_id));
                    let response = service.call(req).await?;
                    Ok(response.map_into_left_body())
                }
                None => {
                    let error = EngineError::unauthorized("Missing or invalid bearer token");
                    let body: ErrorResponse = error.to_error_response();
                    let response = HttpResponse::Unauthorized().json(body);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Extract the token from an `Authorization: Bearer ...` header
fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
    let auth_header = req.headers().get("Authorization")?.to_str().ok()?;
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
