//! # Docs Module
//!
//! Serves interactive documentation for a [`SharedDocument`] under a mount
//! path:
//!
//! | Request | Response |
//! |---|---|
//! | `GET <mount>` | Swagger UI page |
//! | `GET <mount>/openapi.json` | the document as JSON |
//! | `GET <mount>/openapi.yaml` | the document as YAML |
//!
//! The document and the page are rendered on every request, so routes
//! registered after the mount still show up and the page title follows
//! `info.title`.

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::openapi::SharedDocument;
use http::Method;
use minijinja::{context, Environment};
use serde_json::Value;
use tracing::error;

const SWAGGER_UI_TEMPLATE: &str = include_str!("../templates/swagger_ui.html");
/// The `.html` suffix turns on HTML auto-escaping for every value.
const SWAGGER_UI_NAME: &str = "swagger_ui.html";

/// Where the Swagger UI page loads its script and stylesheet from.
pub const DEFAULT_ASSETS_URL: &str = "https://unpkg.com/swagger-ui-dist@5";

/// Documentation endpoints for one document.
#[derive(Debug, Clone)]
pub struct DocsMount {
    mount: String,
    document: SharedDocument,
    spec_url: String,
    assets_url: String,
    env: Environment<'static>,
}

impl DocsMount {
    /// Serve the UI page for `document` under `mount` (e.g. `/docs`).
    pub fn new(mount: &str, document: SharedDocument) -> Result<Self, minijinja::Error> {
        Self::with_assets(mount, document, DEFAULT_ASSETS_URL)
    }

    /// Fails when the page template does not compile.
    pub fn with_assets(
        mount: &str,
        document: SharedDocument,
        assets_url: &str,
    ) -> Result<Self, minijinja::Error> {
        let mount = normalize_mount(mount);
        let spec_url = format!("{}/openapi.json", mount.trim_end_matches('/'));

        let mut env = Environment::new();
        env.add_template(SWAGGER_UI_NAME, SWAGGER_UI_TEMPLATE)?;

        Ok(Self {
            mount,
            document,
            spec_url,
            assets_url: assets_url.trim_end_matches('/').to_string(),
            env,
        })
    }

    /// The UI page with the document's current title.
    pub fn render_page(&self) -> Result<String, minijinja::Error> {
        let title = self.document.read().info.title.clone();
        self.env.get_template(SWAGGER_UI_NAME)?.render(context! {
            title => title,
            spec_url => &self.spec_url,
            assets_url => &self.assets_url,
        })
    }

    #[must_use]
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Answer `req` if it targets this mount.
    #[must_use]
    pub fn serve(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        if req.method != Method::GET && req.method != Method::HEAD {
            return None;
        }
        let base = self.mount.trim_end_matches('/');
        let path = req.path.trim_end_matches('/');
        let rest = path.strip_prefix(base)?;
        match rest {
            "" => Some(self.page()),
            "/openapi.json" => Some(self.json()),
            "/openapi.yaml" => Some(self.yaml()),
            _ => None,
        }
    }

    fn page(&self) -> HandlerResponse {
        match self.render_page() {
            Ok(page) => {
                let mut res = HandlerResponse::text(200, page);
                res.set_header("content-type", "text/html; charset=utf-8");
                res
            }
            Err(e) => {
                error!(error = %e, "Failed to render docs page");
                HandlerResponse::json(500, Value::Null)
            }
        }
    }

    fn json(&self) -> HandlerResponse {
        match self.document.to_json() {
            Ok(doc) => HandlerResponse::json(200, doc),
            Err(e) => {
                error!(error = %e, "Failed to serialize OpenAPI document");
                HandlerResponse::json(500, Value::Null)
            }
        }
    }

    fn yaml(&self) -> HandlerResponse {
        match self.document.to_yaml() {
            Ok(doc) => {
                let mut res = HandlerResponse::text(200, doc);
                res.set_header("content-type", "application/yaml");
                res
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize OpenAPI document");
                HandlerResponse::json(500, Value::Null)
            }
        }
    }
}

fn normalize_mount(mount: &str) -> String {
    let trimmed = mount.trim();
    if trimmed.is_empty() || trimmed == "/" {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::{HttpMethod, Info, OpenApiDocument, PathItem};

    fn doc() -> SharedDocument {
        SharedDocument::new(OpenApiDocument::new(Info::new("Pets API", "1.0.0")))
    }

    #[test]
    fn test_page_rendered_with_title_and_spec_url() {
        let mount = DocsMount::new("docs", doc()).unwrap();
        assert_eq!(mount.mount(), "/docs");
        let res = mount.serve(&HandlerRequest::new(Method::GET, "/docs/")).unwrap();
        assert_eq!(res.get_header("content-type"), Some("text/html; charset=utf-8"));
        let html = res.body.as_str().unwrap().replace("&#x2f;", "/");
        assert!(html.contains("<title>Pets API</title>"));
        assert!(html.contains("data-spec-url=\"/docs/openapi.json\""));
    }

    #[test]
    fn test_title_tracks_document_and_is_escaped() {
        let document = doc();
        let mount = DocsMount::new("/docs", document.clone()).unwrap();
        document.write().info = Info::new("Pets <script>alert(1)</script>", "2.0.0");

        let page = mount.render_page().unwrap();
        assert!(page.contains("<title>Pets &lt;script&gt;"));
        assert!(!page.contains("<script>alert(1)"));
        assert!(!page.contains("Pets API"));
    }

    #[test]
    fn test_document_read_at_request_time() {
        let document = doc();
        let mount = DocsMount::new("/docs", document.clone()).unwrap();
        document
            .write()
            .paths
            .entry("/late".into())
            .or_default()
            .operations
            .insert(HttpMethod::Get, PathItem::default());
        let res = mount
            .serve(&HandlerRequest::new(Method::GET, "/docs/openapi.json"))
            .unwrap();
        assert_eq!(res.status, 200);
        assert!(res.body["paths"]["/late"]["get"].is_object());

        let yaml = mount
            .serve(&HandlerRequest::new(Method::GET, "/docs/openapi.yaml"))
            .unwrap();
        assert!(yaml.body.as_str().unwrap().contains("/late:"));
    }

    #[test]
    fn test_other_requests_fall_through() {
        let mount = DocsMount::new("/docs", doc()).unwrap();
        assert!(mount.serve(&HandlerRequest::new(Method::POST, "/docs")).is_none());
        assert!(mount.serve(&HandlerRequest::new(Method::GET, "/docsx")).is_none());
        assert!(mount.serve(&HandlerRequest::new(Method::GET, "/docs/other")).is_none());
    }
}
