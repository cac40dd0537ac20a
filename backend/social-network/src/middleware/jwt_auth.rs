/// JWT authentication middleware for Bearer token validation
///
/// Requests without an `Authorization` header pass through anonymously; a
/// header that is present but invalid, expired or revoked is rejected with 401.
/// On success an [`AuthenticatedUser`] is stored in the request extensions.
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::domain::Actor;
use crate::error::AppError;
use crate::models::AuthenticatedUser;
use crate::repository::Repositories;
use crate::services::AuthService;

/// JWT authentication middleware factory
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    repos: Repositories,
}

impl JwtAuthMiddleware {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            auth: AuthService::new(self.repos.clone()),
        }))
    }
}

/// JWT authentication middleware service
pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    auth: AuthService,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
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
        let service = self.service.clone();
        let auth = self.auth.clone();

        Box::pin(async move {
            match resolve_user(&auth, &req).await {
                Ok(Some(user)) => {
                    req.extensions_mut().insert(user);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(error = %e, path = %req.path(), "token rejected");
                    return Ok(req.error_response(e).map_into_right_body());
                }
            }

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

/// `None` when no Authorization header was sent
async fn resolve_user(
    auth: &AuthService,
    req: &ServiceRequest,
) -> Result<Option<AuthenticatedUser>, AppError> {
    // Copy the header out so no borrow of the request outlives this block
    let auth_header = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .map_err(|_| AppError::Authentication("Invalid Authorization header".to_string()))?
            .to_string(),
        None => return Ok(None),
    };

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Authentication("Invalid Authorization scheme, expected Bearer".to_string())
    })?;

    auth.authenticate(token.trim()).await.map(Some)
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(AppError::Authentication(
                "Authentication credentials were not provided.".to_string(),
            )
            .into())),
        }
    }
}

/// Anonymous unless the middleware resolved a user
impl FromRequest for Actor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let actor = match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => Actor {
                user_id: Some(user.user_id),
                is_staff: user.is_staff,
            },
            None => Actor::anonymous(),
        };
        ready(Ok(actor))
    }
}
