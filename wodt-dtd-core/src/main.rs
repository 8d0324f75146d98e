use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use tracing::{error, info, warn};

use wodt_dtd_core::config::{Config, ExposeConfig};
use wodt_dtd_core::middleware::auth;
use wodt_dtd_core::middleware::observability::Metrics;
use wodt_dtd_core::platform::PlatformRegistry;
use wodt_dtd_core::protocols::{graphql, rest, GatewayState};
use wodt_dtd_core::{DtdManager, WotDtdManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = parse_config_path_from_args()
        .or_else(|| std::env::var("WODT_CONFIG").ok())
        .unwrap_or_else(|| "./config/wodt.yaml".to_string());
    let cfg = Config::from_path(&config_path).context("loading config")?;
    info!(%config_path, twin = %cfg.twin.uri, "loaded config");

    let manager = build_manager(&cfg);
    let metrics = Metrics::new().context("registering metrics")?;
    let state = GatewayState {
        manager: manager.clone(),
        metrics,
        basic_auth: cfg.core.basic_auth.as_deref().map(Arc::from),
    };
    let metrics_path: Arc<str> = Arc::from(cfg.core.observability.metrics_path.as_str());

    let http_addr: SocketAddr = cfg.core.bind_http.parse().context("invalid core.bind_http")?;
    let graphql_schema = graphql::build_schema(manager);

    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();
        let metrics_path = metrics_path.clone();
        let graphql_schema = graphql_schema.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |req: Request<Body>| {
                let state = state.clone();
                let metrics_path = metrics_path.clone();
                let graphql_schema = graphql_schema.clone();
                async move { handle_http(req, state, metrics_path, graphql_schema).await }
            }))
        }
    });

    let http_server = Server::bind(&http_addr).serve(make_svc);
    info!(%http_addr, "http listening");

    tokio::select! {
        r = http_server => {
            if let Err(e) = r { error!(error=%e, "http server error"); }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    Ok(())
}

fn build_manager(cfg: &Config) -> Arc<dyn DtdManager> {
    let platforms = PlatformRegistry::with_urls(cfg.platforms.iter().cloned());
    let manager = WotDtdManager::new(
        cfg.twin.settings(),
        Arc::new(cfg.ontology.clone()),
        Arc::new(platforms),
        cfg.twin.model.clone(),
    );

    let exposed = expose_configured(&manager, &cfg.expose);
    info!(exposed, "initial affordances registered");

    Arc::new(manager)
}

/// Registers every configured element and returns how many ended up exposed.
fn expose_configured(manager: &dyn DtdManager, expose: &ExposeConfig) -> usize {
    let mut exposed = 0;
    for name in &expose.properties {
        if manager.add_property(name) {
            exposed += 1;
        }
    }
    for name in &expose.relationships {
        if manager.add_relationship(name) {
            exposed += 1;
        }
    }
    for name in &expose.actions {
        if manager.add_action(name) {
            exposed += 1;
        }
    }
    let requested = expose.properties.len() + expose.relationships.len() + expose.actions.len();
    if exposed < requested {
        warn!(exposed, requested, "some configured elements have no semantics and are not exposed");
    }
    exposed
}

async fn handle_http(
    req: Request<Body>,
    state: GatewayState,
    metrics_path: Arc<str>,
    graphql_schema: graphql::SchemaType,
) -> Result<Response<Body>, hyper::Error> {
    let path = req.uri().path().to_string();
    let protected = matches!(path.as_str(), "/dtd" | "/actions" | "/graphql");
    if protected && !auth::authorize(&req, state.basic_auth.as_deref()) {
        return Ok(auth::challenge());
    }

    match (req.method().as_str(), path.as_str()) {
        ("GET", "/healthz") => Ok(Response::new(Body::from("ok"))),
        ("GET", p) if p == &*metrics_path => Ok(state.metrics.render()),
        ("GET", "/dtd") => rest::handle_dtd(state).await,
        ("GET", "/actions") => rest::handle_actions(state).await,
        ("GET", "/graphql") | ("POST", "/graphql") => graphql::handle(req, graphql_schema).await,
        _ => {
            let mut r = Response::new(Body::from("not found"));
            *r.status_mut() = hyper::StatusCode::NOT_FOUND;
            Ok(r)
        }
    }
}

fn parse_config_path_from_args() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--config" {
            return args.next();
        }
        if let Some(v) = a.strip_prefix("--config=") {
            return Some(v.to_string());
        }
    }
    None
}
