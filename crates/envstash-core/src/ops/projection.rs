use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{Environment, Exportable, Reference, Variable};

/// Flatten local variables and resolved references into exportables
///
/// `refs` and `resolved` are parallel: `resolved[i]` is the variable that
/// `refs[i]` points at. A reference is exported under its own name with its
/// target's value, so it can rename a variable on import.
///
/// When a reference and a local variable share a name the local variable
/// wins. The result is sorted by name.
pub fn project(vars: &[Variable], refs: &[Reference], resolved: &[Variable]) -> Vec<Exportable> {
    let mut by_name: BTreeMap<&str, Exportable> = BTreeMap::new();

    for var in vars {
        by_name.insert(
            var.name.as_str(),
            Exportable {
                name: var.name.clone(),
                value: var.value.clone(),
                enabled: var.enabled,
            },
        );
    }

    for (reference, target) in refs.iter().zip(resolved) {
        if by_name.contains_key(reference.name.as_str()) {
            debug!(
                env_name = %reference.env_name,
                ref_name = %reference.name,
                "reference shadowed by local variable"
            );
            continue;
        }
        by_name.insert(
            reference.name.as_str(),
            Exportable {
                name: reference.name.clone(),
                value: target.value.clone(),
                enabled: reference.enabled,
            },
        );
    }

    by_name.into_values().collect()
}

/// [`project`] for a whole environment; a disabled environment disables
/// every exportable it produces
pub fn project_environment(
    env: &Environment,
    vars: &[Variable],
    refs: &[Reference],
    resolved: &[Variable],
) -> Vec<Exportable> {
    let mut exportables = project(vars, refs, resolved);
    if !env.enabled {
        for e in &mut exportables {
            e.enabled = false;
        }
    }
    exportables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RefCreateArgs, VarCreateArgs};
    use crate::timestamp;

    fn var(env: &str, name: &str, value: &str) -> Variable {
        let args = VarCreateArgs::new(env, name, value, timestamp::now());
        Variable {
            env_name: args.env_name,
            name: args.name,
            comment: args.comment,
            create_time: args.create_time,
            update_time: args.update_time,
            value: args.value,
            enabled: args.enabled,
            completions: args.completions,
        }
    }

    fn reference(env: &str, name: &str, target: &Variable) -> Reference {
        let args = RefCreateArgs::new(env, name, &target.env_name, &target.name, timestamp::now());
        Reference {
            env_name: args.env_name,
            name: args.name,
            comment: args.comment,
            create_time: args.create_time,
            update_time: args.update_time,
            ref_env_name: args.ref_env_name,
            ref_var_name: args.ref_var_name,
            enabled: args.enabled,
        }
    }

    #[test]
    fn test_project_empty() {
        assert!(project(&[], &[], &[]).is_empty());
    }

    #[test]
    fn test_project_reference_takes_own_name_and_target_value() {
        let target = var("E1", "v1", "hello");
        let r = reference("E2", "r1", &target);

        let out = project(&[], &[r], &[target]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "r1");
        assert_eq!(out[0].value.as_str(), "hello");
        assert!(out[0].enabled);
    }

    #[test]
    fn test_project_sorted_by_name() {
        let vars = vec![var("E", "ZED", "z"), var("E", "ALPHA", "a")];
        let target = var("other", "x", "m");
        let refs = vec![reference("E", "MIDDLE", &target)];

        let names: Vec<_> = project(&vars, &refs, &[target])
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["ALPHA", "MIDDLE", "ZED"]);
    }

    #[test]
    fn test_project_local_variable_wins_collision() {
        let local = var("E", "TOKEN", "local");
        let target = var("shared", "TOKEN", "shared");
        let r = reference("E", "TOKEN", &target);

        let out = project(&[local], &[r], &[target]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value.as_str(), "local");
    }

    #[test]
    fn test_project_reference_enabled_flag_is_its_own() {
        let mut target = var("shared", "v", "x");
        target.enabled = false;
        let mut r = reference("E", "r", &target);

        let out = project(&[], &[r.clone()], &[target.clone()]);
        assert!(out[0].enabled);

        r.enabled = false;
        target.enabled = true;
        let out = project(&[], &[r], &[target]);
        assert!(!out[0].enabled);
    }

    #[test]
    fn test_project_environment_disabled_disables_all() {
        let now = timestamp::now();
        let env = Environment {
            name: "E".to_string(),
            comment: String::new(),
            create_time: now,
            update_time: now,
            enabled: false,
        };
        let out = project_environment(&env, &[var("E", "A", "1"), var("E", "B", "2")], &[], &[]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| !e.enabled));
    }
}
