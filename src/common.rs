//! Small helpers shared by handlers.

use crate::dispatcher::HandlerRequest;
use crate::error::ApiError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const MAX_PAGE_LIMIT: u64 = 100;
pub const MAX_PAGE: u64 = 1000;

#[allow(clippy::expect_used)]
static SLUG_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_+.]").expect("valid slug separator regex"));
#[allow(clippy::expect_used)]
static REPEATED_DASHES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--+").expect("valid repeated dash regex"));

fn positive_integer(value: &str) -> Option<u64> {
    let number: f64 = value.trim().parse().ok()?;
    if number.fract() == 0.0 && number > 0.0 && number <= u64::MAX as f64 {
        Some(number as u64)
    } else {
        None
    }
}

/// `value` as a positive integer no larger than `max`, otherwise `default`.
///
/// Integral floats (`"5.0"`) are accepted.
#[must_use]
pub fn parse_positive_integer(value: Option<&str>, default: u64, max: Option<u64>) -> u64 {
    value
        .and_then(positive_integer)
        .filter(|v| max.map_or(true, |max| *v <= max))
        .unwrap_or(default)
}

/// Parse a positive integer id or fail with 400 `INVALID_ID`.
pub fn parse_id_or_fail(value: &str) -> Result<u64, ApiError> {
    positive_integer(value).ok_or_else(|| ApiError::new("Invalid Id", 400, "INVALID_ID"))
}

/// Lowercase, trim, and dash-separate: whitespace, `_`, `+` and `.` become
/// `-`, then runs of dashes collapse.
#[must_use]
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let dashed = SLUG_SEPARATORS.replace_all(lowered.trim(), "-");
    REPEATED_DASHES.replace_all(&dashed, "-").into_owned()
}

/// `./tmp`, resolved against the working directory.
pub fn tmp_dir() -> io::Result<PathBuf> {
    Ok(std::env::current_dir()?.join("tmp"))
}

/// A path under [`tmp_dir`].
pub fn tmp_path(steps: &[&str]) -> io::Result<PathBuf> {
    let mut path = tmp_dir()?;
    path.extend(steps);
    Ok(path)
}

/// Raw `limit`/`page` query values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaginationQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

impl PaginationQuery {
    #[must_use]
    pub fn from_request(req: &HandlerRequest) -> Self {
        Self {
            limit: req.get_query_param("limit").map(str::to_string),
            page: req.get_query_param("page").map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

/// Limit defaults to 50 (max 100), page to 1 (max 1000); invalid values fall
/// back to the defaults.
#[must_use]
pub fn parse_default_pagination(query: &PaginationQuery) -> Pagination {
    let limit = parse_positive_integer(query.limit.as_deref(), DEFAULT_PAGE_LIMIT, Some(MAX_PAGE_LIMIT));
    let page = parse_positive_integer(query.page.as_deref(), 1, Some(MAX_PAGE));
    Pagination {
        limit,
        offset: (page - 1) * limit,
    }
}

/// What alerting gets to see of a request: no headers, no body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub user_id: Option<String>,
}

impl RequestSnapshot {
    #[must_use]
    pub fn from_request(req: &HandlerRequest) -> Self {
        Self {
            method: req.method.to_string(),
            path: req.path.clone(),
            query: req
                .query_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            user_id: req.user_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_parse_positive_integer() {
        assert_eq!(parse_positive_integer(Some("7"), 1, None), 7);
        assert_eq!(parse_positive_integer(Some("7.0"), 1, None), 7);
        assert_eq!(parse_positive_integer(Some("7.5"), 1, None), 1);
        assert_eq!(parse_positive_integer(Some("0"), 1, None), 1);
        assert_eq!(parse_positive_integer(Some("-3"), 1, None), 1);
        assert_eq!(parse_positive_integer(Some("abc"), 1, None), 1);
        assert_eq!(parse_positive_integer(Some("101"), 50, Some(100)), 50);
        assert_eq!(parse_positive_integer(None, 50, Some(100)), 50);
    }

    #[test]
    fn test_parse_id_or_fail() {
        assert_eq!(parse_id_or_fail("42").unwrap(), 42);
        let err = parse_id_or_fail("x").unwrap_err();
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.code(), "INVALID_ID");
        assert_eq!(err.message(), "Invalid Id");
        assert!(parse_id_or_fail("").is_err());
        assert!(parse_id_or_fail("0").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("sdfhjk sdfjhs kfhjsd"), "sdfhjk-sdfjhs-kfhjsd");
        assert_eq!(slugify("sdfhjk sdfjhs\nkfhjsd"), "sdfhjk-sdfjhs-kfhjsd");
        assert_eq!(slugify("  Hello__World.v2+beta  "), "hello-world-v2-beta");
        assert_eq!(slugify("ABC"), "abc");
    }

    #[test]
    fn test_pagination() {
        let req = HandlerRequest::new(Method::GET, "/pets?limit=20&page=3");
        let p = parse_default_pagination(&PaginationQuery::from_request(&req));
        assert_eq!(p, Pagination { limit: 20, offset: 40 });

        let p = parse_default_pagination(&PaginationQuery {
            limit: Some("500".into()),
            page: Some("5000".into()),
        });
        assert_eq!(p, Pagination { limit: 50, offset: 0 });
    }

    #[test]
    fn test_tmp_path() {
        let path = tmp_path(&["uploads", "a.png"]).unwrap();
        assert!(path.ends_with("tmp/uploads/a.png"));
    }

    #[test]
    fn test_snapshot_excludes_headers() {
        let mut req = HandlerRequest::new(Method::DELETE, "/pets/1?force=true")
            .with_header("Authorization", "Bearer secret");
        req.user_id = Some("u-9".into());
        let snap = RequestSnapshot::from_request(&req);
        assert_eq!(snap.method, "DELETE");
        assert_eq!(snap.path, "/pets/1");
        assert_eq!(snap.query.get("force").map(String::as_str), Some("true"));
        assert_eq!(snap.user_id.as_deref(), Some("u-9"));
        assert!(!serde_json::to_string(&snap).unwrap().contains("secret"));
    }
}
