use std::collections::{BTreeMap, HashMap};

use super::model::{ExportChanges, KeyValue};
use crate::model::Exportable;

/// Compute which keys to export, re-export and unset
///
/// `lookup` reports the live value of a key, `None` when it is not set.
/// Old keys are removed only when they are currently set; their stored
/// value does not matter. Callers drop old keys that also appear in `new`
/// (see [`chdir_inputs`]) so those are never unset and re-exported.
pub fn compute_export_changes<F>(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
    lookup: F,
) -> ExportChanges
where
    F: Fn(&str) -> Option<String>,
{
    let mut changes = ExportChanges::default();

    for (key, value) in old {
        if lookup(key).is_some() {
            changes.to_remove.push(KeyValue::new(key.as_str(), value.as_str()));
        }
    }

    for (key, value) in new {
        let kv = KeyValue::new(key.as_str(), value.as_str());
        match lookup(key) {
            None => changes.to_add.push(kv),
            Some(live) if live == *value => changes.unchanged.push(kv),
            Some(_) => changes.to_change.push(kv),
        }
    }

    // BTreeMap iteration is already ordered; sort anyway so the contract
    // does not hinge on the input map type.
    for bucket in [
        &mut changes.to_add,
        &mut changes.to_change,
        &mut changes.to_remove,
        &mut changes.unchanged,
    ] {
        bucket.sort_by(|a, b| a.name.cmp(&b.name));
    }

    changes
}

/// Build the `(old, new)` maps for a directory change
///
/// Only enabled exportables of the new environment are exported. Old keys
/// are taken whether enabled or not, since they are about to be unset, but
/// keys the new environment also defines are left out.
pub fn chdir_inputs(
    old_exportables: &[Exportable],
    new_exportables: &[Exportable],
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    let new: BTreeMap<String, String> = new_exportables
        .iter()
        .filter(|e| e.enabled)
        .map(|e| (e.name.clone(), e.value.expose().clone()))
        .collect();

    let old: BTreeMap<String, String> = old_exportables
        .iter()
        .filter(|e| !new.contains_key(&e.name))
        .map(|e| (e.name.clone(), e.value.expose().clone()))
        .collect();

    (old, new)
}

/// Look a key up in the current process environment
pub fn lookup_process_env(key: &str) -> Option<String> {
    std::env::var_os(key).map(|v| v.to_string_lossy().into_owned())
}

/// Look keys up in a fixed map instead of the process environment
pub fn lookup_map(map: HashMap<String, String>) -> impl Fn(&str) -> Option<String> {
    move |key| map.get(key).cloned()
}
