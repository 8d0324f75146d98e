use crate::registry::AffordanceKind;
use crate::thing::ThingError;

/// Failures surfaced by the descriptor manager.
///
/// Unresolvable elements never show up here: they are skipped when registered.
#[derive(Debug, thiserror::Error)]
pub enum DtdError {
    /// The registry and the extraction lists have drifted apart.
    #[error("{kind} '{name}' correlates to {matches} extracted elements, expected exactly one")]
    Correlation { kind: AffordanceKind, name: String, matches: usize },

    #[error("{0} affordances are not supported yet")]
    Unsupported(&'static str),

    #[error("the DTD manager cannot operate in its current configuration")]
    IllegalState(#[from] ThingError),
}

pub type Result<T> = std::result::Result<T, DtdError>;
