//! OpenAPI Schema Object model.
//!
//! A [`Schema`] node is either a base schema (one concrete `type`, or a `$ref`)
//! decorated with the common modifiers, or exactly one composition keyword
//! (`allOf`, `anyOf`, `oneOf`). The enum shape makes "both at once"
//! unrepresentable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prefix used by [`Schema::reference`] for component schemas.
pub const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    Composition(Composition),
    Base(BaseSchema),
}

/// Composition wrapper. Serializes as `{"allOf": [...]}` and friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Composition {
    #[serde(rename = "allOf")]
    AllOf(Vec<Schema>),
    #[serde(rename = "anyOf")]
    AnyOf(Vec<Schema>),
    #[serde(rename = "oneOf")]
    OneOf(Vec<Schema>),
}

/// A concrete schema plus the modifiers every base variant accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseSchema {
    #[serde(flatten)]
    pub kind: SchemaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaKind {
    Ref(Reference),
    Typed(TypedSchema),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref")]
    pub reference: String,
}

/// The `type`-discriminated schema variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypedSchema {
    String(StringSchema),
    Number(NumericSchema),
    Integer(NumericSchema),
    Boolean,
    Array(ArraySchema),
    Object(ObjectSchema),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArraySchema {
    pub items: Box<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSchema {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an optional property.
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        self.properties.insert(name.into(), schema.into());
        self
    }

    /// Add a property and list it under `required`.
    pub fn required_property(mut self, name: impl Into<String>, schema: impl Into<Schema>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema.into());
        self
    }

    pub fn additional_properties(mut self, additional: AdditionalProperties) -> Self {
        self.additional_properties = Some(additional);
        self
    }
}

impl BaseSchema {
    fn from_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: None,
            enumeration: None,
            description: None,
            default: None,
        }
    }

    pub fn typed(schema: TypedSchema) -> Self {
        Self::from_kind(SchemaKind::Typed(schema))
    }

    pub fn string() -> Self {
        Self::typed(TypedSchema::String(StringSchema::default()))
    }

    /// String with a `format` (e.g. `date-time`, `uuid`, `binary`).
    pub fn formatted_string(format: impl Into<String>) -> Self {
        Self::typed(TypedSchema::String(StringSchema {
            format: Some(format.into()),
            ..StringSchema::default()
        }))
    }

    pub fn number() -> Self {
        Self::typed(TypedSchema::Number(NumericSchema::default()))
    }

    pub fn integer() -> Self {
        Self::typed(TypedSchema::Integer(NumericSchema::default()))
    }

    pub fn boolean() -> Self {
        Self::typed(TypedSchema::Boolean)
    }

    pub fn array(items: impl Into<Schema>) -> Self {
        Self::typed(TypedSchema::Array(ArraySchema {
            items: Box::new(items.into()),
            min_items: None,
            max_items: None,
            unique_items: None,
        }))
    }

    pub fn object(object: ObjectSchema) -> Self {
        Self::typed(TypedSchema::Object(object))
    }

    /// `$ref` pointing at a named component schema.
    pub fn reference(name: &str) -> Self {
        Self::raw_reference(format!("{COMPONENT_SCHEMA_PREFIX}{name}"))
    }

    /// `$ref` with a caller-supplied pointer, used verbatim.
    pub fn raw_reference(pointer: impl Into<String>) -> Self {
        Self::from_kind(SchemaKind::Ref(Reference {
            reference: pointer.into(),
        }))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl From<BaseSchema> for Schema {
    fn from(base: BaseSchema) -> Self {
        Schema::Base(base)
    }
}

impl From<Composition> for Schema {
    fn from(composition: Composition) -> Self {
        Schema::Composition(composition)
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Schema::Base(BaseSchema::object(object))
    }
}

impl Schema {
    pub fn string() -> Self {
        BaseSchema::string().into()
    }

    pub fn formatted_string(format: impl Into<String>) -> Self {
        BaseSchema::formatted_string(format).into()
    }

    pub fn number() -> Self {
        BaseSchema::number().into()
    }

    pub fn integer() -> Self {
        BaseSchema::integer().into()
    }

    pub fn boolean() -> Self {
        BaseSchema::boolean().into()
    }

    pub fn array(items: impl Into<Schema>) -> Self {
        BaseSchema::array(items).into()
    }

    pub fn object(object: ObjectSchema) -> Self {
        BaseSchema::object(object).into()
    }

    pub fn reference(name: &str) -> Self {
        BaseSchema::reference(name).into()
    }

    pub fn all_of(schemas: Vec<Schema>) -> Self {
        Composition::AllOf(schemas).into()
    }

    pub fn any_of(schemas: Vec<Schema>) -> Self {
        Composition::AnyOf(schemas).into()
    }

    pub fn one_of(schemas: Vec<Schema>) -> Self {
        Composition::OneOf(schemas).into()
    }

    /// Mark a base schema `nullable`. Compositions have no `nullable`
    /// keyword of their own and are returned unchanged.
    #[must_use]
    pub fn nullable(self) -> Self {
        match self {
            Schema::Base(base) => Schema::Base(base.nullable()),
            composition @ Schema::Composition(_) => composition,
        }
    }

    #[must_use]
    pub fn is_composition(&self) -> bool {
        matches!(self, Schema::Composition(_))
    }

    /// The `$ref` pointer, when this node is a reference.
    #[must_use]
    pub fn reference_pointer(&self) -> Option<&str> {
        match self {
            Schema::Base(BaseSchema {
                kind: SchemaKind::Ref(r),
                ..
            }) => Some(r.reference.as_str()),
            _ => None,
        }
    }
}
