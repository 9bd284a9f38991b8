// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod request;

use std::sync::Arc;

use actix_web::{
    HttpRequest, HttpResponse,
    web::{self, ServiceConfig},
};
use serde::Serialize;
use tracing::{debug, error};

use common::{
    auth::{Authenticator, ProtocolAuthorizer, extract_token},
    env_const::{get_discovery_http_path, is_debug},
    error::DiscoveryError,
    http::RequestHead,
};
use request::ActixRequestHead;
use ws_introspection::{
    CatalogBuilder, Clock, DiscoveryResponse, FunctionRegistry, Normalizer, PluginRegistry,
    SiteEnumerations,
};
use wsd_env::{EnvError, Environment};

macro_rules! error_msg {
    ($msg:literal) => {
        concat!(
            "{\"exception\": \"unexpected_failure\", \"message\": \"",
            $msg,
            "\"}"
        )
        .as_bytes()
    };
}

/// The host collaborators a discovery request needs.
pub struct DiscoveryHost {
    pub functions: Arc<dyn FunctionRegistry>,
    pub plugins: Arc<dyn PluginRegistry>,
    pub enumerations: Arc<dyn SiteEnumerations>,
    pub authenticator: Arc<dyn Authenticator>,
    pub authorizer: Arc<dyn ProtocolAuthorizer>,
    pub clock: Arc<dyn Clock>,
}

impl DiscoveryHost {
    /// Use a single host for every collaborator.
    pub fn new<H>(host: Arc<H>, clock: Arc<dyn Clock>) -> Self
    where
        H: FunctionRegistry
            + PluginRegistry
            + SiteEnumerations
            + Authenticator
            + ProtocolAuthorizer
            + 'static,
    {
        Self {
            functions: host.clone(),
            plugins: host.clone(),
            enumerations: host.clone(),
            authenticator: host.clone(),
            authorizer: host,
            clock,
        }
    }

    // A fresh builder per request, so cached plugin information never outlives the request.
    fn catalog_builder(&self) -> CatalogBuilder {
        CatalogBuilder::new(
            self.functions.clone(),
            self.plugins.clone(),
            Normalizer::new(self.clock.clone(), self.enumerations.clone()),
        )
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub http_path: String,
    /// Include debugging information in error responses
    pub debug: bool,
}

impl DiscoverySettings {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            http_path: get_discovery_http_path(env),
            debug: is_debug(env)?,
        })
    }
}

pub fn configure_router(
    host: web::Data<DiscoveryHost>,
    settings: DiscoverySettings,
) -> impl FnOnce(&mut ServiceConfig) {
    move |app| {
        app.app_data(host)
            .route(&settings.http_path, web::get().to(discover))
            .app_data(web::Data::new(settings));
    }
}

/// Describe the functions of the service the caller's token was issued for
async fn discover(
    http_request: HttpRequest,
    host: web::Data<DiscoveryHost>,
    settings: web::Data<DiscoverySettings>,
) -> HttpResponse {
    let head = ActixRequestHead::from_request(&http_request);

    match resolve(&head, &host).await {
        Ok(response) => json_response(http::StatusCode::OK, &response),
        Err(err) => {
            match &err {
                DiscoveryError::Unexpected(source) => {
                    error!("Failed to describe web services: {}", source)
                }
                _ => debug!(exception = err.exception(), "Rejected discovery request: {}", err),
            }
            json_response(err.status_code(), &err.to_envelope(settings.debug))
        }
    }
}

async fn resolve(
    head: &dyn RequestHead,
    host: &DiscoveryHost,
) -> Result<DiscoveryResponse, DiscoveryError> {
    debug!(method = %head.get_method(), path = %head.get_path(), "Discovery request");

    let token = extract_token(head)?;
    let authentication = host
        .authenticator
        .authenticate(&token)
        .await
        .map_err(DiscoveryError::AuthenticationFailure)?;

    let protocols = host
        .authorizer
        .permitted_protocols(&authentication.caller)
        .await?;
    if protocols.is_empty() {
        return Err(DiscoveryError::AuthorizationEmpty);
    }

    let functions = host
        .catalog_builder()
        .build_service_catalog(authentication.service_id)
        .await
        .map_err(DiscoveryError::unexpected)?;

    Ok(DiscoveryResponse {
        protocols,
        functions,
    })
}

fn json_response(status_code: http::StatusCode, body: &impl Serialize) -> HttpResponse {
    let actix_status_code = match to_actix_status_code(status_code) {
        Ok(status_code) => status_code,
        Err(err) => {
            error!("Invalid status code: {}", err);
            return HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(error_msg!("Invalid status code"));
        }
    };

    match serde_json::to_vec_pretty(body) {
        Ok(bytes) => HttpResponse::build(actix_status_code)
            .content_type("application/json")
            .body(bytes),
        Err(err) => {
            error!("Could not serialize the response: {}", err);
            HttpResponse::InternalServerError()
                .content_type("application/json")
                .body(error_msg!("Could not serialize the response"))
        }
    }
}

fn to_actix_status_code(
    status_code: http::StatusCode,
) -> Result<actix_web::http::StatusCode, String> {
    actix_web::http::StatusCode::from_u16(status_code.as_u16())
        .map_err(|_| "Invalid status code".to_string())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use actix_web::{App, test};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    use common::auth::Caller;
    use snapshot_host::{HostSnapshot, SnapshotHost};
    use wsd_env::MapEnvironment;

    use super::*;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> i64 {
            1_760_000_000
        }
    }

    struct BrokenAuthorizer;

    #[async_trait]
    impl ProtocolAuthorizer for BrokenAuthorizer {
        async fn permitted_protocols(
            &self,
            _caller: &Caller,
        ) -> Result<Vec<String>, DiscoveryError> {
            Err(DiscoveryError::unexpected("capability table is unavailable"))
        }
    }

    fn discovery_host() -> DiscoveryHost {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../snapshot-host/tests/fixtures/site.json");
        let snapshot = HostSnapshot::load(&path).unwrap();
        let clock = Arc::new(FixedClock);

        DiscoveryHost::new(Arc::new(SnapshotHost::new(snapshot, clock.clone())), clock)
    }

    fn settings(env: &[(&str, &str)]) -> DiscoverySettings {
        let mut map = MapEnvironment::new();
        for (key, value) in env {
            map.set(key, value);
        }
        DiscoverySettings::from_env(&map).unwrap()
    }

    struct Reply {
        status: actix_web::http::StatusCode,
        content_type: Option<String>,
        body: String,
    }

    async fn call(
        host: DiscoveryHost,
        settings: DiscoverySettings,
        authorization: Option<&str>,
    ) -> Reply {
        let path = settings.http_path.clone();
        let app = test::init_service(
            App::new().configure(configure_router(web::Data::new(host), settings)),
        )
        .await;

        let mut request = test::TestRequest::get().uri(&path);
        if let Some(authorization) = authorization {
            request = request.insert_header(("Authorization", authorization));
        }

        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let content_type = response
            .headers()
            .get(actix_web::http::header::CONTENT_TYPE)
            .map(|value| value.to_str().unwrap().to_string());
        let body = test::read_body(response).await;

        Reply {
            status,
            content_type,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    fn parse(body: &str) -> Value {
        serde_json::from_str(body).unwrap()
    }

    #[actix_web::test]
    async fn lists_the_functions_of_the_token_service() {
        let Reply {
            status,
            content_type,
            body,
        } = call(discovery_host(), settings(&[]), Some("Bearer testtoken")).await;

        assert_eq!(status, 200);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        // Pretty printed
        assert!(body.contains("\n  \"protocols\""));

        let body = parse(&body);
        assert_eq!(body["protocols"], json!(["rest"]));

        let functions = body["functions"].as_array().unwrap();
        assert_eq!(functions.len(), 2);
        assert_eq!(functions[0]["name"], "core_course_get_contents");
        assert_eq!(
            functions[0]["parameters_desc"]["class"],
            "external_function_parameters,external_single_structure"
        );
        assert_eq!(
            functions[0]["returns_desc"]["class"],
            "external_multiple_structure"
        );
        assert!(functions[0].get("methodname").is_none());
        assert_eq!(functions[1]["name"], "core_course_get_courses");
    }

    #[actix_web::test]
    async fn custom_path() {
        let settings = settings(&[("WSD_DISCOVERY_HTTP_PATH", "/ws/discovery")]);

        let reply = call(discovery_host(), settings, Some("testtoken")).await;

        assert_eq!(reply.status, 200);
    }

    #[actix_web::test]
    async fn missing_authorization_header() {
        let Reply {
            status,
            content_type,
            body,
        } = call(discovery_host(), settings(&[]), None).await;

        assert_eq!(status, 401);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(
            parse(&body),
            json!({
                "exception": "authentication_failure",
                "errorcode": "noauthheader",
                "message": "No Authorization header found in request sent to Moodle"
            })
        );
    }

    #[actix_web::test]
    async fn rejected_tokens() {
        for (token, errorcode) in [
            ("Bearer nosuchtoken", "invalidtoken"),
            ("Bearer oldtoken", "expiredtoken"),
            ("Bearer retiredtoken", "servicenotavailable"),
        ] {
            let Reply { status, body, .. } =
                call(discovery_host(), settings(&[]), Some(token)).await;

            assert_eq!(status, 401, "{token}");
            assert_eq!(parse(&body)["errorcode"], errorcode);
        }
    }

    #[actix_web::test]
    async fn callers_without_protocols_are_forbidden() {
        let Reply { status, body, .. } =
            call(discovery_host(), settings(&[]), Some("Bearer guesttoken")).await;

        assert_eq!(status, 403);
        let body = parse(&body);
        assert_eq!(body["exception"], "authorization_empty");
        assert_eq!(body["errorcode"], "noprotocols");
    }

    #[actix_web::test]
    async fn unexpected_failures() {
        let broken_host = || DiscoveryHost {
            authorizer: Arc::new(BrokenAuthorizer),
            ..discovery_host()
        };

        let Reply {
            status,
            content_type,
            body,
        } = call(broken_host(), settings(&[]), Some("testtoken")).await;
        assert_eq!(status, 500);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        let body = parse(&body);
        assert_eq!(body["exception"], "unexpected_failure");
        assert!(body.get("debuginfo").is_none());

        let debug = settings(&[("WSD_DEBUG", "true")]);
        let Reply { status, body, .. } = call(broken_host(), debug, Some("testtoken")).await;
        assert_eq!(status, 500);
        assert_eq!(
            parse(&body)["debuginfo"],
            "capability table is unavailable"
        );
    }
}
