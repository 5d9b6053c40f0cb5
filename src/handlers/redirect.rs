// Public tracked redirect: the route a printed QR code resolves through

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{info, warn};

use crate::{app::AppState, utils::ServiceError};

/// Edge-provided visitor country, when the service runs behind Cloudflare
const COUNTRY_HEADER: &str = "cf-ipcountry";

/// Resolve a slug and redirect, recording the scan on the way out.
/// GET /{slug}
///
/// The redirect is a 307 so clients revisit us on every scan instead of
/// caching the hop.
pub async fn redirect_to_target(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let country = headers
        .get(COUNTRY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    match state.short_links.resolve_active(&slug).await {
        Ok(link) => {
            info!(slug = %slug, target = %link.redirect_url, "Redirecting");
            state.scan_tracking.record_scan(slug, user_agent, country);
            Redirect::temporary(&link.redirect_url).into_response()
        },
        Err(ServiceError::NotFound) => {
            warn!(slug = %slug, "Unknown or inactive slug");
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                not_found_page(&slug),
            )
                .into_response()
        },
        Err(e) => {
            warn!(slug = %slug, error = %e, "Redirect lookup failed");
            e.into_response()
        },
    }
}

/// Minimal standalone page for dead links; scans of retired codes land here
fn not_found_page(slug: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Link Not Found</title>
    <style>
        body {{
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #2b2c2c;
            color: white;
            height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
        }}
        .container {{
            text-align: center;
            padding: 2rem;
        }}
        h1 {{ margin: 0 0 1rem; }}
        p {{ opacity: 0.8; }}
        code {{ background: rgba(255, 255, 255, 0.1); padding: 0.2rem 0.4rem; border-radius: 4px; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>404</h1>
        <p>The link <code>{}</code> does not exist or is no longer active.</p>
    </div>
</body>
</html>"#,
        html_escape(slug)
    )
}

fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_page_escapes_the_slug() {
        let page = not_found_page("<script>alert(1)</script>");
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
