//! Request logging middleware
//!
//! Logs each request with a generated request id, method, path, status, and
//! timing. Client errors and server errors log at warn.

use crate::utils::generate_request_id;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};
use tracing::{info, warn};

/// Request logging middleware
pub struct RequestLogging;

impl<S, B> Transform<S, ServiceRequest> for RequestLogging
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestLoggingMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestLoggingMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggingMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggingMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let start_time = Instant::now();

        let request_id = generate_request_id();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let remote_addr = req
            .connection_info()
            .peer_addr()
            .unwrap_or("unknown")
            .to_string();

        Box::pin(async move {
            let response = service.call(req).await;
            let duration_ms = start_time.elapsed().as_millis();

            match &response {
                Ok(service_response) => {
                    let status = service_response.status();
                    if status.is_success() {
                        info!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            status = %status,
                            duration_ms = %duration_ms,
                            remote_addr = %remote_addr,
                            "HTTP request completed"
                        );
                    } else {
                        warn!(
                            request_id = %request_id,
                            method = %method,
                            path = %path,
                            status = %status,
                            duration_ms = %duration_ms,
                            remote_addr = %remote_addr,
                            "HTTP request failed"
                        );
                    }
                }
                Err(error) => {
                    warn!(
                        request_id = %request_id,
                        method = %method,
                        path = %path,
                        duration_ms = %duration_ms,
                        remote_addr = %remote_addr,
                        error = %error,
                        "HTTP request failed with error"
                    );
                }
            }

            response
        })
    }
}
