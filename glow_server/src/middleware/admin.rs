//! Admin token middleware.
//!
//! Guards the ledger maintenance routes. The request must carry a `glow_admin_token` header equal to the configured
//! admin token, which the middleware reads from the app's [`AdminToken`] data. When no token is configured, every
//! request is refused.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::ErrorForbidden,
    web,
    Error,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use subtle::ConstantTimeEq;

use crate::config::AdminToken;

pub const ADMIN_TOKEN_HEADER: &str = "glow_admin_token";

#[derive(Default)]
pub struct AdminMiddlewareFactory;

impl AdminMiddlewareFactory {
    pub fn new() -> Self {
        Self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AdminMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminMiddlewareService { service: Rc::new(service) })
    }
}

pub struct AdminMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let expected = req.app_data::<web::Data<AdminToken>>().map(|t| t.0.clone()).unwrap_or_default();
            if expected.is_empty() {
                warn!("💻️ Admin request to {} refused. No admin token is configured.", req.path());
                return Err(ErrorForbidden("Admin routes are disabled"));
            }
            let supplied = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
            // Slices of different lengths compare unequal without looking at their contents
            if supplied.as_bytes().ct_eq(expected.reveal().as_bytes()).into() {
                service.call(req).await
            } else {
                warn!("💻️ Admin request to {} refused. Invalid or missing {ADMIN_TOKEN_HEADER}.", req.path());
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
