use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::ontology::Ontology;

/// Reserved property streaming the twin's whole knowledge graph.
pub const SNAPSHOT_PROPERTY: &str = "snapshot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AffordanceKind {
    Property,
    Relationship,
    Action,
}

impl fmt::Display for AffordanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffordanceKind::Property => write!(f, "property"),
            AffordanceKind::Relationship => write!(f, "relationship"),
            AffordanceKind::Action => write!(f, "action"),
        }
    }
}

/// Kind-specific semantics resolved from the ontology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Semantics {
    /// Properties and relationships. Only properties carry the augmentation flag.
    Valued { value_type: String, domain_predicate: String, augmented_interaction: Option<bool> },
    Action { action_type: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffordanceDescriptor {
    pub name: String,
    pub kind: AffordanceKind,
    pub semantics: Semantics,
}

impl AffordanceDescriptor {
    /// Resolves `raw_name` against the ontology; `None` when the element has no usable semantics.
    pub fn resolve(ontology: &dyn Ontology, kind: AffordanceKind, raw_name: &str) -> Option<Self> {
        let semantics = match kind {
            AffordanceKind::Property | AffordanceKind::Relationship => {
                let value_type = ontology.property_value_type(raw_name)?;
                let domain_predicate = ontology.property(raw_name).and_then(|p| p.uri)?;
                let augmented_interaction = (kind == AffordanceKind::Property).then_some(false);
                Semantics::Valued { value_type, domain_predicate, augmented_interaction }
            }
            AffordanceKind::Action => Semantics::Action { action_type: ontology.action_type(raw_name)? },
        };
        Some(Self { name: raw_name.to_string(), kind, semantics })
    }
}

/// Point-in-time copy of every exposed affordance, one key-unique map per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    properties: BTreeMap<String, AffordanceDescriptor>,
    relationships: BTreeMap<String, AffordanceDescriptor>,
    actions: BTreeMap<String, AffordanceDescriptor>,
}

impl RegistrySnapshot {
    pub fn entries(&self, kind: AffordanceKind) -> &BTreeMap<String, AffordanceDescriptor> {
        match kind {
            AffordanceKind::Property => &self.properties,
            AffordanceKind::Relationship => &self.relationships,
            AffordanceKind::Action => &self.actions,
        }
    }

    fn entries_mut(&mut self, kind: AffordanceKind) -> &mut BTreeMap<String, AffordanceDescriptor> {
        match kind {
            AffordanceKind::Property => &mut self.properties,
            AffordanceKind::Relationship => &mut self.relationships,
            AffordanceKind::Action => &mut self.actions,
        }
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.relationships.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Live set of exposed properties, relationships and actions.
///
/// Mutations take the write lock; readers only ever get copies, so a descriptor rebuild works
/// on a consistent view of all three kinds at once.
pub struct AffordanceRegistry {
    ontology: Arc<dyn Ontology>,
    state: RwLock<RegistrySnapshot>,
}

impl AffordanceRegistry {
    pub fn new(ontology: Arc<dyn Ontology>) -> Self {
        Self { ontology, state: RwLock::new(RegistrySnapshot::default()) }
    }

    pub fn ontology(&self) -> &dyn Ontology {
        self.ontology.as_ref()
    }

    /// Exposes `raw_name`, replacing any entry with the same name.
    ///
    /// Returns false, leaving the registry untouched, when the ontology cannot resolve the element.
    pub fn add(&self, kind: AffordanceKind, raw_name: &str) -> bool {
        if kind != AffordanceKind::Action && raw_name == SNAPSHOT_PROPERTY {
            warn!(%kind, name = %raw_name, "name is reserved for the snapshot property");
            return false;
        }
        let Some(descriptor) = AffordanceDescriptor::resolve(self.ontology(), kind, raw_name) else {
            debug!(%kind, name = %raw_name, "no semantics for element, not exposed");
            return false;
        };
        self.state.write().entries_mut(kind).insert(raw_name.to_string(), descriptor);
        debug!(%kind, name = %raw_name, "affordance exposed");
        true
    }

    pub fn remove(&self, kind: AffordanceKind, raw_name: &str) -> bool {
        self.state.write().entries_mut(kind).remove(raw_name).is_some()
    }

    pub fn contains(&self, kind: AffordanceKind, raw_name: &str) -> bool {
        self.state.read().entries(kind).contains_key(raw_name)
    }

    pub fn names(&self, kind: AffordanceKind) -> BTreeSet<String> {
        self.state.read().entries(kind).keys().cloned().collect()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.state.read().clone()
    }
}
