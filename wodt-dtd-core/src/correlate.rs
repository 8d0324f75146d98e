use crate::error::{DtdError, Result};
use crate::model::ThingModelElement;
use crate::naming;
use crate::registry::AffordanceKind;

/// Finds the extracted element a registered affordance name refers to.
///
/// A feature-scoped name (`<feature>_<path>`) only matches an element with that local name owned by
/// that feature; any other name only matches a featureless element with the same name. Anything but
/// exactly one match means the registry and the extraction list have drifted.
pub fn correlate<'a>(
    kind: AffordanceKind,
    name: &str,
    extracted: &'a [ThingModelElement],
) -> Result<&'a ThingModelElement> {
    let scoped = naming::decompose(name);
    let matches: Vec<&ThingModelElement> = extracted
        .iter()
        .filter(|e| match scoped {
            Some(s) => e.name == s.local_path && e.feature.as_deref() == Some(s.feature_id),
            None => e.name == name && e.feature.is_none(),
        })
        .collect();
    match matches.as_slice() {
        [element] => Ok(*element),
        _ => Err(DtdError::Correlation { kind, name: name.to_string(), matches: matches.len() }),
    }
}
