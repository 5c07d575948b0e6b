use std::{future::Future, pin::Pin, sync::Arc};

use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures::future::{Ready, ok};

use common::jwt::get_jwt_claims_or_error;

pub struct RequireUserMiddleware {}

impl RequireUserMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireUserMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = RequireUserMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RequireUserMiddlewareService {
            service: Arc::new(service),
        })
    }
}

pub struct RequireUserMiddlewareService<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireUserMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = Arc::clone(&self.service);

        Box::pin(async move {
            match get_jwt_claims_or_error(&req) {
                Ok(claims) => {
                    // plain claims for web::ReqData<JwtClaims>
                    req.extensions_mut().insert(claims);
                    srv.call(req).await.map(|res| res.map_into_boxed_body())
                }
                Err(response) => Ok(req.into_response(response.map_into_boxed_body())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, http::StatusCode, test, web};
    use common::{
        env_config::Config,
        jwt::{ClaimsSpec, JwtClaims, generate_jwt},
    };
    use uuid::Uuid;

    async fn whoami(claims: web::ReqData<JwtClaims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.user_id.to_string())
    }

    #[actix_web::test]
    async fn guard_admits_valid_tokens_only() {
        let config = Config::for_tests("guard-secret");
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .wrap(crate::middleware())
                .service(
                    web::scope("/private")
                        .wrap(crate::require_user())
                        .route("/me", web::get().to(whoami)),
                )
                .route("/public", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let user_id = Uuid::new_v4();
        let token = generate_jwt(
            ClaimsSpec {
                user_id,
                email: None,
            },
            &config.jwt_config,
        )
        .unwrap();

        let req = test::TestRequest::get()
            .uri("/private/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, user_id.to_string());

        let req = test::TestRequest::get().uri("/private/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/private/me")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let json: serde_json::Value = test::read_body_json(res).await;
        assert!(json["error"].is_string());

        // Public routes pass through even with a bad token.
        let req = test::TestRequest::get()
            .uri("/public")
            .insert_header(("Authorization", "Bearer not-a-token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
