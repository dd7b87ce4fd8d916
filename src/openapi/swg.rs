//! Small constructors for parameters, security schemes and content blocks.

use super::schema::Schema;
use super::types::{
    ApiKeyLocation, AuthMethod, AuthorizationCodeFlow, Content, HttpAuthScheme, OAuthFlows,
    Param, ParamLocation, SecurityScheme,
};
use indexmap::IndexMap;

/// Media type used by [`json_schema`].
pub const APPLICATION_JSON: &str = "application/json";

/// Required parameter with an empty description; `id` doubles as the name.
pub fn param(location: ParamLocation, id: &str, schema: impl Into<Schema>) -> Param {
    Param {
        location,
        name: id.to_string(),
        description: String::new(),
        required: true,
        schema: schema.into(),
    }
}

pub fn path_param(id: &str, schema: impl Into<Schema>) -> Param {
    param(ParamLocation::Path, id, schema)
}

pub fn query_param(id: &str, schema: impl Into<Schema>) -> Param {
    param(ParamLocation::Query, id, schema)
}

pub fn header_param(id: &str, schema: impl Into<Schema>) -> Param {
    param(ParamLocation::Header, id, schema)
}

impl Param {
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Document under a different name than the id used to build it.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl SecurityScheme {
    pub fn basic_auth() -> Self {
        SecurityScheme::Http {
            scheme: HttpAuthScheme::Basic,
        }
    }

    pub fn bearer_auth() -> Self {
        SecurityScheme::Http {
            scheme: HttpAuthScheme::Bearer,
        }
    }

    /// API key carried in the named request header.
    pub fn api_key_auth(header_name: impl Into<String>) -> Self {
        SecurityScheme::ApiKey {
            location: ApiKeyLocation::Header,
            name: header_name.into(),
        }
    }

    pub fn open_id(open_id_connect_url: impl Into<String>) -> Self {
        SecurityScheme::OpenIdConnect {
            open_id_connect_url: open_id_connect_url.into(),
        }
    }

    /// OAuth2 authorization-code flow.
    pub fn oauth2<I, K, V>(authorization_url: impl Into<String>, token_url: impl Into<String>, scopes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let scopes: IndexMap<String, String> = scopes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        SecurityScheme::OAuth2 {
            flows: OAuthFlows {
                authorization_code: AuthorizationCodeFlow {
                    authorization_url: authorization_url.into(),
                    token_url: token_url.into(),
                    scopes,
                },
            },
        }
    }
}

/// Reference a registered scheme by name with no scopes.
pub fn security(name: &str) -> AuthMethod {
    AuthMethod::new(name)
}

/// `{"content": {"application/json": {"schema": ...}}}`
pub fn json_schema(schema: impl Into<Schema>) -> Content {
    Content::default().with_media_type(APPLICATION_JSON, schema)
}

/// JSON content whose schema is a `$ref` to a component schema.
pub fn json_schema_ref(name: &str) -> Content {
    json_schema(Schema::reference(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_defaults() {
        let p = query_param("limit", Schema::integer());
        assert_eq!(
            serde_json::to_value(&p).unwrap(),
            json!({
                "in": "query",
                "name": "limit",
                "description": "",
                "required": true,
                "schema": {"type": "integer"}
            })
        );
    }

    #[test]
    fn test_param_overrides() {
        let p = header_param("trace", Schema::string())
            .optional()
            .with_description("Trace id")
            .with_name("X-Trace");
        assert_eq!(p.location, ParamLocation::Header);
        assert_eq!(p.name, "X-Trace");
        assert!(!p.required);
        assert_eq!(p.description, "Trace id");
    }

    #[test]
    fn test_oauth2_scheme() {
        let scheme = SecurityScheme::oauth2(
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
            [("read", "Read access")],
        );
        assert_eq!(
            serde_json::to_value(&scheme).unwrap(),
            json!({
                "type": "oauth2",
                "flows": {
                    "authorizationCode": {
                        "authorizationUrl": "https://auth.example.com/authorize",
                        "tokenUrl": "https://auth.example.com/token",
                        "scopes": {"read": "Read access"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_open_id_and_basic() {
        assert_eq!(
            serde_json::to_value(SecurityScheme::open_id("https://id.example.com")).unwrap(),
            json!({"type": "openIdConnect", "openIdConnectUrl": "https://id.example.com"})
        );
        assert_eq!(
            serde_json::to_value(SecurityScheme::basic_auth()).unwrap(),
            json!({"type": "http", "scheme": "basic"})
        );
    }

    #[test]
    fn test_security_reference_has_no_scopes() {
        assert_eq!(
            serde_json::to_value(security("BearerAuth")).unwrap(),
            json!({"BearerAuth": []})
        );
    }

    #[test]
    fn test_json_schema_ref() {
        assert_eq!(
            serde_json::to_value(json_schema_ref("User")).unwrap(),
            json!({"content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}})
        );
    }
}
