use std::time::Instant;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::protocols::GatewayState;

pub async fn handle_dtd(state: GatewayState) -> Result<Response<Body>, hyper::Error> {
    let started = Instant::now();

    let resp = match state.manager.dtd() {
        Ok(thing) => {
            state.metrics.inc_builds("ok");
            let mut r = json(StatusCode::OK, &thing);
            r.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/td+json"));
            r
        }
        Err(e) => {
            // Registry and extraction lists are out of sync; never serve a partial descriptor.
            error!(error=%e, "dtd assembly failed");
            state.metrics.inc_builds("error");
            status(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    };

    state.metrics.observe_latency("dtd", started.elapsed().as_secs_f64());
    Ok(resp)
}

#[derive(Debug, Serialize)]
pub struct ActionIdsResponse {
    pub actions: Vec<String>,
}

pub async fn handle_actions(state: GatewayState) -> Result<Response<Body>, hyper::Error> {
    let actions: Vec<String> = state.manager.available_action_ids().into_iter().collect();
    info!(count = actions.len(), "listing exposed actions");
    Ok(json(StatusCode::OK, &ActionIdsResponse { actions }))
}

fn json<T: Serialize>(code: StatusCode, v: &T) -> Response<Body> {
    match serde_json::to_vec(v) {
        Ok(body) => {
            let mut r = status_body(code, Body::from(body));
            r.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            r
        }
        Err(e) => {
            error!(error=%e, "response serialization failed");
            status(StatusCode::INTERNAL_SERVER_ERROR, "serialization failed")
        }
    }
}

fn status(code: StatusCode, msg: &str) -> Response<Body> {
    status_body(code, Body::from(msg.to_string()))
}

fn status_body(code: StatusCode, body: Body) -> Response<Body> {
    let mut r = Response::new(body);
    *r.status_mut() = code;
    r
}
