//! Stack environment merging

use crate::portainer::EnvVar;
use std::collections::BTreeMap;

/// Merge the current stack environment with caller variables.
///
/// Repeated names in `current` keep their last value. `overlay` wins on
/// every collision.
pub fn merge_env(current: &[EnvVar], overlay: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut merged: BTreeMap<String, String> = current
        .iter()
        .map(|var| (var.name.clone(), var.value.clone()))
        .collect();

    for (name, value) in overlay {
        merged.insert(name.clone(), value.clone());
    }

    merged
}
