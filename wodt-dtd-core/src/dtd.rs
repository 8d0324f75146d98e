//! Digital Twin Descriptor management.
//!
//! The descriptor is a WoT Thing Description rebuilt from scratch on every request: the registry is
//! snapshotted, every affordance is correlated to its extracted element and bound to its hrefs, and
//! the document metadata is attached last.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::correlate::correlate;
use crate::error::{DtdError, Result};
use crate::href::{action_form, property_forms, HrefBuilder};
use crate::model::ExtractedModel;
use crate::ontology::{vocabulary, Ontology};
use crate::platform::PlatformManagementInterfaceReader;
use crate::registry::{AffordanceDescriptor, AffordanceKind, AffordanceRegistry, Semantics};
use crate::thing::{Context, Form, Link, Operation, SecurityScheme, Thing, ThingAction, ThingProperty, TD_CONTEXT};

pub const DTD_VERSION: &str = "1.0.0";

pub use crate::registry::SNAPSHOT_PROPERTY;
const SNAPSHOT_SUBPROTOCOL: &str = "websocket";

const BASIC_SECURITY: &str = "basic_sc";

/// Maintains the exposed affordances of a twin and produces its descriptor.
pub trait DtdManager: Send + Sync {
    /// Returns whether the property is now exposed.
    fn add_property(&self, raw_property_name: &str) -> bool;

    fn remove_property(&self, raw_property_name: &str) -> bool;

    fn add_relationship(&self, raw_relationship_name: &str) -> bool;

    fn remove_relationship(&self, raw_relationship_name: &str) -> bool;

    fn add_action(&self, raw_action_name: &str) -> bool;

    fn remove_action(&self, raw_action_name: &str) -> bool;

    fn available_action_ids(&self) -> BTreeSet<String>;

    fn add_event(&self, raw_event_name: &str) -> Result<()>;

    fn remove_event(&self, raw_event_name: &str) -> Result<bool>;

    fn dtd(&self) -> Result<Thing>;
}

/// Fixed identity and addressing of the twin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwinSettings {
    pub digital_twin_uri: String,
    pub physical_asset_id: String,
    /// Port of the affordance server; only used for the snapshot stream.
    pub port: u16,
    pub base_url: String,
}

/// [`DtdManager`] rendering the descriptor as a WoT Thing Description.
pub struct WotDtdManager {
    digital_twin_uri: String,
    physical_asset_id: String,
    port: u16,
    hrefs: HrefBuilder,
    extracted: ExtractedModel,
    platforms: Arc<dyn PlatformManagementInterfaceReader>,
    registry: AffordanceRegistry,
}

impl WotDtdManager {
    pub fn new(
        settings: TwinSettings,
        ontology: Arc<dyn Ontology>,
        platforms: Arc<dyn PlatformManagementInterfaceReader>,
        extracted: ExtractedModel,
    ) -> Self {
        Self {
            digital_twin_uri: settings.digital_twin_uri,
            physical_asset_id: settings.physical_asset_id,
            port: settings.port,
            hrefs: HrefBuilder::new(settings.base_url),
            extracted,
            platforms,
            registry: AffordanceRegistry::new(ontology),
        }
    }

    pub fn registry(&self) -> &AffordanceRegistry {
        &self.registry
    }

    fn context(&self) -> Context {
        let mut context = Context::new(TD_CONTEXT);
        for ext in &self.extracted.context_extensions {
            context.add_context(ext.prefix.as_str(), ext.uri.as_str());
        }
        context
    }

    fn snapshot_property(&self) -> ThingProperty {
        let href = format!("ws://localhost:{}/dtkg", self.port);
        ThingProperty {
            read_only: true,
            observable: true,
            forms: vec![Form::new(Operation::ObserveProperty, href).with_subprotocol(SNAPSHOT_SUBPROTOCOL)],
            ..Default::default()
        }
    }

    fn attach_metadata(&self, thing: &mut Thing) {
        thing.links = self
            .platforms
            .registered_platform_urls()
            .into_iter()
            .map(|href| Link { href, rel: vocabulary::REGISTERED_TO_PLATFORM.to_string() })
            .collect();
        thing.put_metadata(vocabulary::PHYSICAL_ASSET_ID, self.physical_asset_id.as_str());
        thing.put_metadata(vocabulary::VERSION, DTD_VERSION);
        thing.security_definitions.insert(
            BASIC_SECURITY.to_string(),
            SecurityScheme { scheme: "basic".to_string(), location: Some("header".to_string()) },
        );
        thing.security = Some(BASIC_SECURITY.to_string());
    }
}

impl DtdManager for WotDtdManager {
    fn add_property(&self, raw_property_name: &str) -> bool {
        self.registry.add(AffordanceKind::Property, raw_property_name)
    }

    fn remove_property(&self, raw_property_name: &str) -> bool {
        self.registry.remove(AffordanceKind::Property, raw_property_name)
    }

    fn add_relationship(&self, raw_relationship_name: &str) -> bool {
        self.registry.add(AffordanceKind::Relationship, raw_relationship_name)
    }

    fn remove_relationship(&self, raw_relationship_name: &str) -> bool {
        self.registry.remove(AffordanceKind::Relationship, raw_relationship_name)
    }

    fn add_action(&self, raw_action_name: &str) -> bool {
        self.registry.add(AffordanceKind::Action, raw_action_name)
    }

    fn remove_action(&self, raw_action_name: &str) -> bool {
        self.registry.remove(AffordanceKind::Action, raw_action_name)
    }

    fn available_action_ids(&self) -> BTreeSet<String> {
        self.registry.names(AffordanceKind::Action)
    }

    fn add_event(&self, _raw_event_name: &str) -> Result<()> {
        Err(DtdError::Unsupported("event"))
    }

    fn remove_event(&self, _raw_event_name: &str) -> Result<bool> {
        Err(DtdError::Unsupported("event"))
    }

    fn dtd(&self) -> Result<Thing> {
        let snapshot = self.registry.snapshot();

        let mut thing = Thing::builder(self.digital_twin_uri.as_str())
            .context(self.context())
            .object_type(self.registry.ontology().digital_twin_type())
            .build()?;
        thing.add_property(SNAPSHOT_PROPERTY, self.snapshot_property());

        // Relationships go last so they win over a property with the same name.
        for kind in [AffordanceKind::Property, AffordanceKind::Relationship] {
            for (name, descriptor) in snapshot.entries(kind) {
                let element = correlate(kind, name, &self.extracted.properties)?;
                let href = self.hrefs.property(name, element);
                thing.add_property(name.as_str(), render_property(descriptor, &href));
            }
        }
        for (name, descriptor) in snapshot.entries(AffordanceKind::Action) {
            let element = correlate(AffordanceKind::Action, name, &self.extracted.actions)?;
            let href = self.hrefs.action(name, element);
            thing.add_action(name.as_str(), render_action(descriptor, &href));
        }

        self.attach_metadata(&mut thing);
        debug!(properties = thing.properties.len(), actions = thing.actions.len(), "dtd rebuilt");
        Ok(thing)
    }
}

fn render_property(descriptor: &AffordanceDescriptor, href: &str) -> ThingProperty {
    let mut property =
        ThingProperty { read_only: true, observable: true, forms: property_forms(href).to_vec(), ..Default::default() };
    if let Semantics::Valued { value_type, domain_predicate, augmented_interaction } = &descriptor.semantics {
        property.object_type = Some(value_type.clone());
        property.metadata.insert(vocabulary::DOMAIN_PREDICATE.to_string(), domain_predicate.as_str().into());
        if let Some(augmented) = augmented_interaction {
            property.metadata.insert(vocabulary::AUGMENTED_INTERACTION.to_string(), (*augmented).into());
        }
    }
    property
}

fn render_action(descriptor: &AffordanceDescriptor, href: &str) -> ThingAction {
    let object_type = match &descriptor.semantics {
        Semantics::Action { action_type } => Some(action_type.clone()),
        Semantics::Valued { .. } => None,
    };
    ThingAction { object_type, forms: vec![action_form(href)] }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContextExtension, ThingModelElement};
    use crate::ontology::MappedOntology;
    use crate::platform::PlatformRegistry;
    use crate::thing::ThingError;
    use serde_json::json;

    const BASE: &str = "http://localhost:8080/api/2/things/org.eclipse.ditto:lamp";
    const FLOAT: &str = "https://schema.org/Float";

    fn ontology() -> MappedOntology {
        MappedOntology::new("https://example.org/Lamp")
            .with_property("temp", FLOAT, "https://example.org/temperature")
            .with_property("Sensor1_temp", FLOAT, "https://example.org/temperature")
            .with_property("Sensor1_status_level", FLOAT, "https://example.org/level")
            .with_property("isLocatedIn", "https://schema.org/Text", "https://example.org/isLocatedIn")
            .with_property("orphan", FLOAT, "https://example.org/orphan")
            .with_property("room", "https://schema.org/Text", "https://example.org/room")
            .with_property("Sensor1_x", "https://schema.org/Text", "https://example.org/attachedTo")
            .with_action("toggle", "https://example.org/Toggle")
            .with_action("Sensor1_reset", "https://example.org/Reset")
    }

    fn extracted() -> ExtractedModel {
        ExtractedModel {
            context_extensions: vec![ContextExtension { prefix: "ex".into(), uri: "https://example.org/".into() }],
            properties: vec![
                ThingModelElement::attribute("temp"),
                ThingModelElement::attribute("isLocatedIn"),
                ThingModelElement::of_feature("temp", "Sensor1"),
                ThingModelElement::of_feature("status_level", "Sensor1"),
                ThingModelElement::attribute("room"),
                ThingModelElement::of_feature("x", "Sensor1"),
            ],
            actions: vec![ThingModelElement::attribute("toggle"), ThingModelElement::of_feature("reset", "Sensor1")],
            events: vec![],
        }
    }

    fn settings(base_url: &str) -> TwinSettings {
        TwinSettings {
            digital_twin_uri: "https://example.org/dt/lamp".into(),
            physical_asset_id: "lamp-1".into(),
            port: 3000,
            base_url: base_url.into(),
        }
    }

    fn manager_with(settings: TwinSettings, platforms: PlatformRegistry) -> WotDtdManager {
        WotDtdManager::new(settings, Arc::new(ontology()), Arc::new(platforms), extracted())
    }

    fn manager() -> WotDtdManager {
        manager_with(settings(BASE), PlatformRegistry::with_urls(["http://platform.example"]))
    }

    #[test]
    fn attribute_property_gets_read_and_observe_forms() {
        let m = manager();
        assert!(m.add_property("temp"));
        let dtd = m.dtd().unwrap();

        assert_eq!(dtd.properties.len(), 2, "temp plus snapshot");
        let temp = dtd.property("temp").unwrap();
        let href = format!("{BASE}/attributes/temp");
        assert_eq!(temp.forms.len(), 2);
        assert_eq!(temp.forms[0], Form::new(Operation::ReadProperty, href.as_str()));
        assert_eq!(temp.forms[1], Form::new(Operation::ObserveProperty, href.as_str()).with_subprotocol("sse"));
        assert_eq!(temp.object_type.as_deref(), Some(FLOAT));
        assert!(temp.read_only && temp.observable);
        assert_eq!(temp.metadata[vocabulary::DOMAIN_PREDICATE], json!("https://example.org/temperature"));
        assert_eq!(temp.metadata[vocabulary::AUGMENTED_INTERACTION], json!(false));
    }

    #[test]
    fn feature_property_href() {
        let m = manager();
        m.add_property("Sensor1_temp");
        m.add_property("Sensor1_status_level");
        let dtd = m.dtd().unwrap();

        assert_eq!(dtd.property("Sensor1_temp").unwrap().forms[0].href, format!("{BASE}/features/Sensor1/properties/temp"));
        assert_eq!(
            dtd.property("Sensor1_status_level").unwrap().forms[0].href,
            format!("{BASE}/features/Sensor1/properties/status/level")
        );
    }

    #[test]
    fn relationship_has_no_augmentation_flag() {
        let m = manager();
        assert!(m.add_relationship("isLocatedIn"));
        let dtd = m.dtd().unwrap();

        let rel = dtd.property("isLocatedIn").unwrap();
        assert_eq!(rel.forms[0].href, format!("{BASE}/attributes/isLocatedIn"));
        assert!(rel.metadata.contains_key(vocabulary::DOMAIN_PREDICATE));
        assert!(!rel.metadata.contains_key(vocabulary::AUGMENTED_INTERACTION));
    }

    #[test]
    fn relationship_wins_name_clash_with_property() {
        let m = manager();
        assert!(m.add_property("room"));
        assert!(m.add_relationship("room"));
        let dtd = m.dtd().unwrap();

        assert_eq!(dtd.properties.len(), 2, "room plus snapshot");
        let room = dtd.property("room").unwrap();
        assert_eq!(room.forms[0].href, format!("{BASE}/attributes/room"));
        assert!(!room.metadata.contains_key(vocabulary::AUGMENTED_INTERACTION));
    }

    #[test]
    fn feature_relationship_href() {
        let m = manager();
        assert!(m.add_relationship("Sensor1_x"));
        let dtd = m.dtd().unwrap();

        let rel = dtd.property("Sensor1_x").unwrap();
        assert_eq!(rel.forms[0].href, format!("{BASE}/features/Sensor1/properties/x"));
        assert_eq!(rel.forms[1].href, rel.forms[0].href);
        assert!(!rel.metadata.contains_key(vocabulary::AUGMENTED_INTERACTION));
    }

    #[test]
    fn removed_relationship_disappears_on_rebuild() {
        let m = manager();
        assert!(m.add_relationship("isLocatedIn"));
        assert!(m.dtd().unwrap().property("isLocatedIn").is_some());

        assert!(m.remove_relationship("isLocatedIn"));
        assert!(!m.remove_relationship("isLocatedIn"));
        let dtd = m.dtd().unwrap();
        assert!(dtd.property("isLocatedIn").is_none());
        assert_eq!(dtd.properties.len(), 1);
    }

    #[test]
    fn actions_get_invoke_form() {
        let m = manager();
        m.add_action("toggle");
        m.add_action("Sensor1_reset");
        let dtd = m.dtd().unwrap();

        let reset = dtd.action("Sensor1_reset").unwrap();
        assert_eq!(reset.forms, vec![Form::new(Operation::InvokeAction, format!("{BASE}/features/Sensor1/inbox/messages/reset"))]);
        assert_eq!(reset.object_type.as_deref(), Some("https://example.org/Reset"));
        assert_eq!(dtd.action("toggle").unwrap().forms[0].href, format!("{BASE}/inbox/messages/toggle"));
        assert_eq!(m.available_action_ids(), BTreeSet::from(["Sensor1_reset".to_string(), "toggle".to_string()]));
    }

    #[test]
    fn snapshot_is_always_present_and_independent_of_base_url() {
        let empty = manager().dtd().unwrap();
        let other = manager_with(settings("https://elsewhere.example/api"), PlatformRegistry::new()).dtd().unwrap();

        let snapshot = empty.property(SNAPSHOT_PROPERTY).unwrap();
        assert!(snapshot.read_only && snapshot.observable);
        assert_eq!(
            snapshot.forms,
            vec![Form::new(Operation::ObserveProperty, "ws://localhost:3000/dtkg").with_subprotocol("websocket")]
        );
        assert_eq!(other.property(SNAPSHOT_PROPERTY), Some(snapshot));
    }

    #[test]
    fn document_metadata() {
        let dtd = manager().dtd().unwrap();
        assert_eq!(dtd.id, "https://example.org/dt/lamp");
        assert_eq!(dtd.object_type.as_deref(), Some("https://example.org/Lamp"));
        assert_eq!(dtd.context.base(), TD_CONTEXT);
        assert_eq!(dtd.context.extensions()[0].prefix, "ex");
        assert_eq!(dtd.metadata[vocabulary::VERSION], json!(DTD_VERSION));
        assert_eq!(dtd.metadata[vocabulary::PHYSICAL_ASSET_ID], json!("lamp-1"));
        assert_eq!(dtd.security.as_deref(), Some("basic_sc"));
        assert_eq!(dtd.security_definitions["basic_sc"].location.as_deref(), Some("header"));
        assert_eq!(
            dtd.links,
            vec![Link { href: "http://platform.example".into(), rel: vocabulary::REGISTERED_TO_PLATFORM.into() }]
        );
    }

    #[test]
    fn removed_affordances_disappear_on_rebuild() {
        let m = manager();
        m.add_property("temp");
        m.add_action("toggle");
        assert!(m.dtd().unwrap().property("temp").is_some());

        assert!(m.remove_property("temp"));
        assert!(m.remove_action("toggle"));
        let dtd = m.dtd().unwrap();
        assert!(dtd.property("temp").is_none());
        assert!(dtd.actions.is_empty());
    }

    #[test]
    fn events_are_unsupported_and_leave_registry_untouched() {
        let m = manager();
        m.add_property("temp");
        let before = m.registry().snapshot();

        assert!(matches!(m.add_event("alarm"), Err(DtdError::Unsupported("event"))));
        assert!(matches!(m.remove_event("alarm"), Err(DtdError::Unsupported("event"))));
        assert_eq!(m.registry().snapshot(), before);
    }

    #[test]
    fn uncorrelated_affordance_is_fatal() {
        let m = manager();
        m.add_property("temp");
        assert!(m.add_property("orphan"));

        match m.dtd() {
            Err(DtdError::Correlation { kind, name, matches }) => {
                assert_eq!(kind, AffordanceKind::Property);
                assert_eq!(name, "orphan");
                assert_eq!(matches, 0);
            }
            other => panic!("expected correlation failure, got {other:?}"),
        }
    }

    #[test]
    fn invalid_twin_uri_is_illegal_state() {
        let mut s = settings(BASE);
        s.digital_twin_uri = "lamp".into();
        let err = manager_with(s, PlatformRegistry::new()).dtd().unwrap_err();
        assert_eq!(err.to_string(), "the DTD manager cannot operate in its current configuration");
        assert!(matches!(err, DtdError::IllegalState(ThingError::InvalidId(_))));
    }

    #[test]
    fn rebuild_sees_consistent_registry_under_concurrent_mutation() {
        let m = manager();
        std::thread::scope(|s| {
            s.spawn(|| {
                for _ in 0..200 {
                    m.add_property("temp");
                    m.add_action("Sensor1_reset");
                    m.remove_property("temp");
                    m.remove_action("Sensor1_reset");
                }
            });
            let temp_href = format!("{BASE}/attributes/temp");
            let reset_href = format!("{BASE}/features/Sensor1/inbox/messages/reset");
            for _ in 0..200 {
                let dtd = m.dtd().unwrap();
                assert!(dtd.property(SNAPSHOT_PROPERTY).is_some());
                for (name, property) in dtd.properties.iter().filter(|(name, _)| *name != SNAPSHOT_PROPERTY) {
                    assert_eq!(name, "temp");
                    assert!(property.forms.iter().all(|f| f.href == temp_href));
                }
                for (name, action) in &dtd.actions {
                    assert_eq!(name, "Sensor1_reset");
                    assert_eq!(action.forms, vec![Form::new(Operation::InvokeAction, reset_href.as_str())]);
                }
            }
        });
    }
}
