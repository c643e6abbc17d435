use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request, Response},
    middleware::Next,
};

// Pages only load their own stylesheet and script and post back to this host.
const CSP: &str = "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self'; object-src 'none'; base-uri 'self'; form-action 'self'; frame-ancestors 'none'";

const SECURITY_HEADERS: [(&str, &str); 3] = [
    ("content-security-policy", CSP),
    ("referrer-policy", "no-referrer"),
    ("x-content-type-options", "nosniff"),
];

/// Adds security headers to every response unless a handler already set them.
pub async fn csp_middleware(req: Request<Body>, next: Next) -> Response<Body> {
    let mut res = next.run(req).await;

    for (name, value) in SECURITY_HEADERS {
        let name = HeaderName::from_static(name);
        if !res.headers().contains_key(&name) {
            res.headers_mut()
                .insert(name, HeaderValue::from_static(value));
        }
    }

    res
}
