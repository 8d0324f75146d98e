//! Semantic lookups consumed while registering affordances.

use std::collections::BTreeMap;

use serde::Deserialize;

/// URIs of the WoDT vocabulary used as descriptor metadata keys.
pub mod vocabulary {
    pub const BASE: &str = "https://purl.org/wodt/";
    pub const DOMAIN_PREDICATE: &str = "https://purl.org/wodt/domainPredicate";
    pub const AUGMENTED_INTERACTION: &str = "https://purl.org/wodt/augmentedInteraction";
    pub const PHYSICAL_ASSET_ID: &str = "https://purl.org/wodt/physicalAssetId";
    pub const VERSION: &str = "https://purl.org/wodt/version";
    pub const REGISTERED_TO_PLATFORM: &str = "https://purl.org/wodt/registeredToPlatform";
}

/// A domain property as known to the ontology. The URI may be missing for partially mapped names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Property {
    pub uri: Option<String>,
}

/// Maps raw element names to their semantics.
pub trait Ontology: Send + Sync {
    fn property_value_type(&self, raw_name: &str) -> Option<String>;

    fn property(&self, raw_name: &str) -> Option<Property>;

    fn action_type(&self, raw_name: &str) -> Option<String>;

    fn digital_twin_type(&self) -> String;
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct PropertyMapping {
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub predicate: Option<String>,
}

/// An [`Ontology`] backed by static name mappings, typically read from configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct MappedOntology {
    pub digital_twin_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyMapping>,
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
}

impl MappedOntology {
    pub fn new(digital_twin_type: impl Into<String>) -> Self {
        Self { digital_twin_type: digital_twin_type.into(), ..Default::default() }
    }

    pub fn with_property(mut self, raw_name: &str, value_type: &str, predicate: &str) -> Self {
        self.properties.insert(
            raw_name.to_string(),
            PropertyMapping { value_type: Some(value_type.to_string()), predicate: Some(predicate.to_string()) },
        );
        self
    }

    pub fn with_action(mut self, raw_name: &str, action_type: &str) -> Self {
        self.actions.insert(raw_name.to_string(), action_type.to_string());
        self
    }
}

impl Ontology for MappedOntology {
    fn property_value_type(&self, raw_name: &str) -> Option<String> {
        self.properties.get(raw_name).and_then(|m| m.value_type.clone())
    }

    fn property(&self, raw_name: &str) -> Option<Property> {
        self.properties.get(raw_name).map(|m| Property { uri: m.predicate.clone() })
    }

    fn action_type(&self, raw_name: &str) -> Option<String> {
        self.actions.get(raw_name).cloned()
    }

    fn digital_twin_type(&self) -> String {
        self.digital_twin_type.clone()
    }
}
