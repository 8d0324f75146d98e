use serde::{Deserialize, Serialize};

/// An element statically extracted from the twin's source structure.
///
/// `feature` is the id of the feature the element was extracted from, if any.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThingModelElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,
}

impl ThingModelElement {
    pub fn attribute(name: impl Into<String>) -> Self {
        Self { name: name.into(), feature: None }
    }

    pub fn of_feature(name: impl Into<String>, feature: impl Into<String>) -> Self {
        Self { name: name.into(), feature: Some(feature.into()) }
    }
}

/// A prefixed entry appended to the descriptor's `@context`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContextExtension {
    pub prefix: String,
    pub uri: String,
}

/// The extraction lists supplied to the manager at construction.
///
/// Assumed stable for the manager's lifetime; events are carried but not rendered.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedModel {
    #[serde(default)]
    pub context_extensions: Vec<ContextExtension>,
    #[serde(default)]
    pub properties: Vec<ThingModelElement>,
    #[serde(default)]
    pub actions: Vec<ThingModelElement>,
    #[serde(default)]
    pub events: Vec<ThingModelElement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn featureless_element_omits_feature_in_yaml() {
        let yaml = serde_yaml::to_string(&ThingModelElement::attribute("temp")).unwrap();
        assert!(!yaml.contains("feature"));

        let back: ThingModelElement = serde_yaml::from_str("name: reset\nfeature: Sensor1\n").unwrap();
        assert_eq!(back, ThingModelElement::of_feature("reset", "Sensor1"));
    }
}
