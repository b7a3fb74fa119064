//! Server construction and middleware wiring.
//!
//! [`build_app`] assembles the full ingress pipeline around both API
//! scopes; [`create_server`] binds it to a listener.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::{Repositories, ServiceDeps, build_ports};

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::middleware::from_fn;
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use crate::domain::ports::Translator;
use crate::domain::{ErrorRegistry, PasswordHasher, SessionCodec};
use crate::inbound::http::health::{HealthState, StartupStep, live, ready};
use crate::inbound::http::routes::{API_PREFIX, OPEN_API_PREFIX, configure_api, configure_open_api};
use crate::inbound::http::state::{HttpState, SessionCookiePolicy};
use crate::middleware::{
    AccessLog, AccessTokenAuthenticator, AssignLogId, Envelope, IdentityGate,
    SessionAuthenticator, install_context_cache, select_locale,
};
use crate::outbound::i18n::StaticTranslator;
use crate::outbound::id_generator::TimestampIdGenerator;
use crate::outbound::memory::InMemoryStore;

/// Shared state handed to every worker's `App`.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub sessions: Arc<SessionCodec>,
    pub translator: Arc<dyn Translator>,
}

/// Build the application with the full middleware stack.
///
/// Outermost first: log id, locale, access log, envelope, context cache,
/// then the session gate on the API scope or the access-token gate on the
/// open API scope. Health probes skip both gates.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        sessions,
        translator,
    } = deps;

    let session_gate = IdentityGate::new(SessionAuthenticator::new(
        sessions,
        Arc::clone(&http_state.users),
    ));
    let token_gate = IdentityGate::new(AccessTokenAuthenticator::new(
        Arc::clone(&http_state.api_keys),
        Arc::clone(&http_state.users),
    ));

    let api = web::scope(API_PREFIX)
        .wrap(session_gate)
        .configure(configure_api);
    let open_api = web::scope(OPEN_API_PREFIX)
        .wrap(token_gate)
        .configure(configure_open_api);

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .service(ready)
        .service(live)
        .service(api)
        .service(open_api)
        .wrap(from_fn(install_context_cache))
        .wrap(Envelope::new(translator))
        .wrap(AccessLog)
        .wrap(from_fn(select_locale))
        .wrap(AssignLogId)
}

/// Install the foundation error codes process-wide.
///
/// A registry installed earlier in the process is kept as is.
pub fn install_error_registry(health_state: &HealthState) {
    if ErrorRegistry::foundation().build().install().is_err() {
        warn!("error registry already installed; keeping the existing table");
    }
    health_state.complete(StartupStep::ErrorRegistry);
}

/// Wire services over the configured store.
///
/// Without a database pool the in-memory store is used.
pub fn build_dependencies(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
    health_state: web::Data<HealthState>,
) -> AppDependencies {
    let sessions = Arc::new(SessionCodec::new(
        config.session_secret.as_bytes(),
        Arc::clone(&clock),
    ));
    let deps = ServiceDeps {
        ids: Arc::new(TimestampIdGenerator::new(Arc::clone(&clock))),
        clock,
        sessions: Arc::clone(&sessions),
        hasher: PasswordHasher::default(),
        registration_enabled: config.registration_enabled,
    };
    let ports = match &config.db_pool {
        Some(pool) => build_ports(Repositories::diesel(pool), deps),
        None => {
            warn!("no database configured; accounts are kept in memory");
            build_ports(Repositories::in_memory(&Arc::new(InMemoryStore::new())), deps)
        }
    };
    health_state.complete(StartupStep::Store);
    let cookies = SessionCookiePolicy {
        secure: config.cookie_secure,
    };
    AppDependencies {
        health_state,
        http_state: web::Data::new(HttpState::new(ports, cookies)),
        sessions,
        translator: Arc::new(StaticTranslator::new()),
    }
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let deps = build_dependencies(&config, Arc::new(DefaultClock), health_state.clone());
    let bind_addr = config.bind_addr();

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.complete(StartupStep::Listener);
    info!(%bind_addr, "foundation listening");
    Ok(server)
}
