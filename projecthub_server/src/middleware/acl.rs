//! Access control list middleware.
//! This middleware can be placed on any route or service.
//!
//! It verifies the bearer token on the incoming request and then checks the claims in the token against the
//! required roles for the route. If the token is valid and the user has the required roles, the claims are
//! stored in the request extensions and the request continues. A missing token is a 401; a bad token or missing
//! role is a 403.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use projecthub_engine::db_types::Role;

use crate::{
    auth::{bearer_token, JwtVerifier},
    errors::{AuthError, ServerError},
};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let verifier = req
                .app_data::<web::Data<JwtVerifier>>()
                .ok_or_else(|| {
                    log::warn!("JwtVerifier is not registered on the app");
                    ServerError::InitializeError("JwtVerifier is not registered on the app".to_string())
                })?
                .clone();
            let token = bearer_token(req.request())
                .map_err(ServerError::from)?
                .ok_or(ServerError::AuthenticationError(AuthError::MissingToken))?
                .to_string();
            let claims = verifier.validate(&token).map_err(ServerError::from)?;
            if required_roles.iter().all(|role| claims.roles.contains(role)) {
                req.extensions_mut().insert(claims);
                service.call(req).await
            } else {
                Err(ServerError::AuthenticationError(AuthError::InsufficientPermissions(format!(
                    "This endpoint requires the {required_roles:?} role(s)"
                )))
                .into())
            }
        })
    }
}
