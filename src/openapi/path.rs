//! Router-pattern to OpenAPI-template translation.
//!
//! Router patterns name parameters with a colon (`/users/:id`), OpenAPI path
//! templates with braces (`/users/{id}`). A wildcard token `:*` becomes `{*}`,
//! so a path with two unnamed wildcards documents two parameters both named
//! `*`; that collision is left to the caller.

use super::swg::path_param;
use super::types::Param;
use super::Schema;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static COLON_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([a-zA-Z0-9_*]+)").expect("colon parameter regex"));

#[allow(clippy::expect_used)]
static BRACE_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("brace parameter regex"));

/// Rewrite every `:name` token of a router pattern into `{name}`.
///
/// ```
/// use expressive::openapi::to_openapi_path;
///
/// assert_eq!(
///     to_openapi_path("/voting/nomination/:nominationId/:*/:userId"),
///     "/voting/nomination/{nominationId}/{*}/{userId}"
/// );
/// ```
#[must_use]
pub fn to_openapi_path(route: &str) -> String {
    COLON_PARAM.replace_all(route, "{$1}").into_owned()
}

/// Names enclosed in `{}` in left-to-right order, duplicates included.
#[must_use]
pub fn template_parameter_names(template: &str) -> Vec<&str> {
    BRACE_PARAM
        .captures_iter(template)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// One required `string` path parameter per `{name}` occurrence.
///
/// No deduplication: `/a/{id}/b/{id}` yields two `id` entries.
#[must_use]
pub fn infer_path_parameters(template: &str) -> Vec<Param> {
    template_parameter_names(template)
        .into_iter()
        .map(|name| path_param(name, Schema::string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::ParamLocation;

    #[test]
    fn test_translates_named_tokens() {
        assert_eq!(to_openapi_path("/users/:id"), "/users/{id}");
        assert_eq!(
            to_openapi_path("/users/:user_id/posts/:postId2"),
            "/users/{user_id}/posts/{postId2}"
        );
    }

    #[test]
    fn test_leaves_everything_else_untouched() {
        assert_eq!(to_openapi_path("/"), "/");
        assert_eq!(to_openapi_path("/health-check/v1.2"), "/health-check/v1.2");
        // dashes end an identifier, the rest passes through
        assert_eq!(to_openapi_path("/files/:name-:ext"), "/files/{name}-{ext}");
        // a colon with no identifier is not a token
        assert_eq!(to_openapi_path("/time/12:"), "/time/12:");
    }

    #[test]
    fn test_wildcard_uses_symbol_as_name() {
        assert_eq!(to_openapi_path("/static/:*"), "/static/{*}");
        let params = infer_path_parameters(&to_openapi_path("/a/:*/b/:*"));
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["*", "*"]);
    }

    #[test]
    fn test_infers_in_order_without_dedup() {
        let params = infer_path_parameters("/org/{id}/team/{team}/user/{id}");
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "team", "id"]);
        for p in &params {
            assert_eq!(p.location, ParamLocation::Path);
            assert!(p.required);
            assert_eq!(p.description, "");
            assert_eq!(p.schema, Schema::string());
        }
    }

    #[test]
    fn test_no_braces_no_parameters() {
        assert!(infer_path_parameters("/users").is_empty());
        assert!(infer_path_parameters("/users/{}").is_empty());
    }
}
