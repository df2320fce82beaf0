use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; \
    style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; \
    connect-src 'self'; frame-ancestors 'none'";

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Security headers configuration
#[derive(Clone, Debug, Default)]
pub struct SecurityHeadersConfig {
    pub is_production: bool,
}

impl SecurityHeadersConfig {
    pub fn new(is_production: bool) -> Self {
        Self { is_production }
    }

    /// HSTS goes out over TLS (direct or behind a proxy) and always in production.
    fn wants_hsts(&self, headers: &HeaderMap, uri: &Uri) -> bool {
        if self.is_production {
            return true;
        }
        let forwarded_https = headers
            .get("X-Forwarded-Proto")
            .and_then(|v| v.to_str().ok())
            .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
            .unwrap_or(false);
        forwarded_https || uri.scheme_str() == Some("https")
    }
}

/// Security headers middleware
///
/// Must sit outside every layer that can short-circuit (rate limiting, panic
/// recovery) so rejections carry the headers too.
pub async fn security_headers_middleware(
    State(config): State<SecurityHeadersConfig>,
    request: Request,
    next: Next,
) -> Response {
    let hsts = config.wants_hsts(request.headers(), request.uri());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert(
        "X-XSS-Protection",
        HeaderValue::from_static("1; mode=block"),
    );
    headers.insert(
        "Referrer-Policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "Permissions-Policy",
        HeaderValue::from_static("geolocation=(), microphone=(), camera=()"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    if hsts {
        headers.insert("Strict-Transport-Security", HeaderValue::from_static(HSTS));
    }

    response
}
