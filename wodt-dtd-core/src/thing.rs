//! Thing-Description-shaped document model for the Digital Twin Descriptor.
//!
//! The model is addressable in memory and serializes to the W3C WoT TD JSON layout.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::model::ContextExtension;

pub const TD_CONTEXT: &str = "https://www.w3.org/2019/wot/td/v1";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ThingError {
    #[error("thing id must be an absolute URI: '{0}'")]
    InvalidId(String),
    #[error("context extension for '{0}' has an empty prefix")]
    EmptyContextPrefix(String),
}

/// Interaction verb of a form.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    ReadProperty,
    ObserveProperty,
    InvokeAction,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Form {
    pub href: String,
    pub op: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprotocol: Option<String>,
}

impl Form {
    pub fn new(op: Operation, href: impl Into<String>) -> Self {
        Self { href: href.into(), op, subprotocol: None }
    }

    pub fn with_subprotocol(mut self, subprotocol: impl Into<String>) -> Self {
        self.subprotocol = Some(subprotocol.into());
        self
    }
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ThingProperty {
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(rename = "readOnly")]
    pub read_only: bool,
    pub observable: bool,
    pub forms: Vec<Form>,

    /// Extra semantic annotations keyed by vocabulary URI.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ThingAction {
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    pub forms: Vec<Form>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct SecurityScheme {
    pub scheme: String,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// `@context`: the TD base context followed by prefixed extensions in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    base: String,
    extensions: Vec<ContextExtension>,
}

impl Context {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into(), extensions: Vec::new() }
    }

    pub fn add_context(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.extensions.push(ContextExtension { prefix: prefix.into(), uri: uri.into() });
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extensions(&self) -> &[ContextExtension] {
        &self.extensions
    }
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.extensions.is_empty() {
            return serializer.serialize_str(&self.base);
        }
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.base)?;
        seq.serialize_element(&Prefixes(&self.extensions))?;
        seq.end()
    }
}

struct Prefixes<'a>(&'a [ContextExtension]);

impl Serialize for Prefixes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for ext in self.0 {
            map.serialize_entry(&ext.prefix, &ext.uri)?;
        }
        map.end()
    }
}

/// The assembled descriptor document.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Thing {
    #[serde(rename = "@context")]
    pub context: Context,
    pub id: String,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, ThingProperty>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub actions: BTreeMap<String, ThingAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<Link>,
    #[serde(rename = "securityDefinitions", skip_serializing_if = "BTreeMap::is_empty")]
    pub security_definitions: BTreeMap<String, SecurityScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,

    /// Document-level annotations keyed by vocabulary URI.
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Thing {
    pub fn builder(id: impl Into<String>) -> ThingBuilder {
        ThingBuilder { id: id.into(), context: Context::new(TD_CONTEXT), object_type: None }
    }

    /// Inserts or replaces a property, returning the replaced one.
    pub fn add_property(&mut self, name: impl Into<String>, property: ThingProperty) -> Option<ThingProperty> {
        self.properties.insert(name.into(), property)
    }

    pub fn add_action(&mut self, name: impl Into<String>, action: ThingAction) -> Option<ThingAction> {
        self.actions.insert(name.into(), action)
    }

    pub fn property(&self, name: &str) -> Option<&ThingProperty> {
        self.properties.get(name)
    }

    pub fn action(&self, name: &str) -> Option<&ThingAction> {
        self.actions.get(name)
    }

    pub fn put_metadata(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub struct ThingBuilder {
    id: String,
    context: Context,
    object_type: Option<String>,
}

impl ThingBuilder {
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn build(self) -> Result<Thing, ThingError> {
        if !is_absolute_uri(&self.id) {
            return Err(ThingError::InvalidId(self.id));
        }
        if let Some(ext) = self.context.extensions.iter().find(|e| e.prefix.is_empty()) {
            return Err(ThingError::EmptyContextPrefix(ext.uri.clone()));
        }
        Ok(Thing {
            context: self.context,
            id: self.id,
            object_type: self.object_type,
            properties: BTreeMap::new(),
            actions: BTreeMap::new(),
            links: Vec::new(),
            security_definitions: BTreeMap::new(),
            security: None,
            metadata: BTreeMap::new(),
        })
    }
}

// RFC 3986 scheme: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) followed by ':'.
fn is_absolute_uri(s: &str) -> bool {
    let Some((scheme, _)) = s.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
