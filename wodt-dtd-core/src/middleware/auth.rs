use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hyper::header::{HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use hyper::{Body, Request, Response, StatusCode};

/// Checks the `basic_sc` scheme the descriptor advertises: HTTP Basic credentials in the header.
///
/// Every request passes when no credentials are configured.
pub fn authorize<B>(req: &Request<B>, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded.trim()).ok())
        .is_some_and(|decoded| decoded == expected.as_bytes())
}

pub fn challenge() -> Response<Body> {
    let mut r = Response::new(Body::from("unauthorized"));
    *r.status_mut() = StatusCode::UNAUTHORIZED;
    r.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"wodt\""));
    r
}
