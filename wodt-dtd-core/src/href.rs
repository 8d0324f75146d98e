//! Affordance URLs, laid out like the twin platform's HTTP API.

use crate::model::ThingModelElement;
use crate::naming::FeatureScoped;
use crate::thing::{Form, Operation};

const ATTRIBUTES: &str = "/attributes/";
const FEATURES: &str = "/features/";
const PROPERTIES: &str = "/properties/";
const INBOX: &str = "/inbox/messages/";

/// Sub-protocol advertised on the push-style property form.
pub const OBSERVE_SUBPROTOCOL: &str = "sse";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefBuilder {
    base_url: String,
}

impl HrefBuilder {
    /// A single trailing `/` on `base_url` is dropped before paths are joined.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Href of a property or relationship correlated to `element`.
    pub fn property(&self, name: &str, element: &ThingModelElement) -> String {
        match element.feature.as_deref() {
            Some(feature_id) => {
                let path = FeatureScoped { feature_id, local_path: &element.name }.hierarchical_path();
                format!("{}{FEATURES}{feature_id}{PROPERTIES}{path}", self.base_url)
            }
            None => format!("{}{ATTRIBUTES}{name}", self.base_url),
        }
    }

    /// Href of an action correlated to `element`.
    pub fn action(&self, name: &str, element: &ThingModelElement) -> String {
        match element.feature.as_deref() {
            Some(feature_id) => format!("{}{FEATURES}{feature_id}{INBOX}{}", self.base_url, element.name),
            None => format!("{}{INBOX}{name}", self.base_url),
        }
    }
}

/// Pull-style read plus push-style observation, both on `href`.
pub fn property_forms(href: &str) -> [Form; 2] {
    [
        Form::new(Operation::ReadProperty, href),
        Form::new(Operation::ObserveProperty, href).with_subprotocol(OBSERVE_SUBPROTOCOL),
    ]
}

pub fn action_form(href: &str) -> Form {
    Form::new(Operation::InvokeAction, href)
}
