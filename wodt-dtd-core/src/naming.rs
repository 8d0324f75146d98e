//! Raw element names encode their owning feature as `<featureId>_<localPath>`.
//!
//! Only the first separator is significant: everything after it belongs to the local path,
//! which may itself contain further separators standing in for a hierarchical property path.

/// Joins a feature id to the local path of one of its elements.
pub const SEPARATOR: char = '_';

/// Hierarchical separator used in feature property paths once a local path is turned into an href.
pub const PATH_SEPARATOR: char = '/';

/// A raw name split into the feature that owns it and the element path local to that feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureScoped<'a> {
    pub feature_id: &'a str,
    pub local_path: &'a str,
}

impl FeatureScoped<'_> {
    /// Local path with every separator rewritten to [`PATH_SEPARATOR`].
    pub fn hierarchical_path(&self) -> String {
        self.local_path.replace(SEPARATOR, &PATH_SEPARATOR.to_string())
    }
}

/// Splits `name` at the first [`SEPARATOR`].
///
/// Returns `None` when the name has no separator, i.e. the element belongs to the twin itself.
pub fn decompose(name: &str) -> Option<FeatureScoped<'_>> {
    name.split_once(SEPARATOR).map(|(feature_id, local_path)| FeatureScoped { feature_id, local_path })
}
