//! zsh script rendering
//!
//! Scripts are meant to be `eval`ed by the shell hook. Each touched key
//! gets a `printf` narrating what happens to it, all on one line that
//! starts with the program name and ends with `echo;`.

use std::fmt::Write as _;

use super::model::{ExportChanges, KeyValue};
use crate::model::Exportable;

const PROGRAM: &str = "envstash";

/// Quote `s` for safe use as one zsh word
///
/// Strings made only of `[A-Za-z0-9@%+=:,./_-]` pass through untouched;
/// anything else is wrapped in single quotes.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    let safe = s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c));
    if safe {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// The key name travels as a quoted `%s` argument, never inside the format
fn narrate(out: &mut String, marker: char, name: &str) {
    let _ = writeln!(
        out,
        "printf '%s' {};",
        shell_quote(&format!(" {}{}", marker, name))
    );
}

fn export(out: &mut String, kv: &KeyValue) {
    let _ = writeln!(
        out,
        "export {}={};",
        shell_quote(&kv.name),
        shell_quote(kv.value.as_str())
    );
}

fn unset(out: &mut String, name: &str) {
    let _ = writeln!(out, "unset {};", shell_quote(name));
}

fn header(out: &mut String) {
    let _ = writeln!(out, "printf '{}:';", PROGRAM);
}

fn footer(out: &mut String) {
    out.push_str("echo;\n");
}

/// Render a directory-change diff; empty when nothing changes
pub fn render_chdir_script(changes: &ExportChanges) -> String {
    let mut out = String::new();
    if changes.is_empty() {
        return out;
    }
    header(&mut out);
    for kv in &changes.to_add {
        narrate(&mut out, '+', &kv.name);
        export(&mut out, kv);
    }
    for kv in &changes.to_change {
        narrate(&mut out, '~', &kv.name);
        export(&mut out, kv);
    }
    for kv in &changes.to_remove {
        narrate(&mut out, '-', &kv.name);
        unset(&mut out, &kv.name);
    }
    for kv in &changes.unchanged {
        narrate(&mut out, '=', &kv.name);
    }
    footer(&mut out);
    out
}

/// Export every enabled exportable; empty when none are enabled
pub fn render_export_script(exportables: &[Exportable]) -> String {
    let enabled: Vec<KeyValue> = exportables
        .iter()
        .filter(|e| e.enabled)
        .map(|e| KeyValue {
            name: e.name.clone(),
            value: e.value.clone(),
        })
        .collect();

    let mut out = String::new();
    if enabled.is_empty() {
        return out;
    }
    header(&mut out);
    for kv in &enabled {
        narrate(&mut out, '+', &kv.name);
        export(&mut out, kv);
    }
    footer(&mut out);
    out
}

/// Unset every enabled exportable; empty when none are enabled
pub fn render_unexport_script(exportables: &[Exportable]) -> String {
    let mut out = String::new();
    let mut enabled = exportables.iter().filter(|e| e.enabled).peekable();
    if enabled.peek().is_none() {
        return out;
    }
    header(&mut out);
    for e in enabled {
        narrate(&mut out, '-', &e.name);
        unset(&mut out, &e.name);
    }
    footer(&mut out);
    out
}

/// The hook script users `eval` from `~/.zshrc`
pub fn render_zsh_init(print_autoload: bool) -> String {
    let mut out = format!(
        r#"
# To initialize {p}, add this to your configuration (usually ~/.zshrc):
#
# eval "$({p} shell zsh init)"
#
"#,
        p = PROGRAM
    );
    if print_autoload {
        out.push_str("\nautoload -Uz add-zsh-hook\n");
    }
    let _ = write!(
        out,
        r#"
add-zsh-hook -Uz chpwd (){{
    eval "$({p} shell zsh chdir --old "$OLDPWD" --new "$PWD")"
}}

export-env() {{ eval "$({p} shell zsh export --env "$1" --no-env-no-problem)" }}
unexport-env() {{ eval "$({p} shell zsh unexport --env "$1" --no-env-no-problem)" }}
"#,
        p = PROGRAM
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use envstash_core_types::Sensitive;

    fn exportable(name: &str, value: &str, enabled: bool) -> Exportable {
        Exportable {
            name: name.to_string(),
            value: Sensitive::new(value.to_string()),
            enabled,
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("PATH"), "PATH");
        assert_eq!(shell_quote("/usr/bin:/bin"), "/usr/bin:/bin");
        assert_eq!(shell_quote("hello world"), "'hello world'");
        assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(shell_quote("$HOME"), "'$HOME'");
    }

    #[test]
    fn test_chdir_script_empty_when_no_changes() {
        assert_eq!(render_chdir_script(&ExportChanges::default()), "");
    }

    #[test]
    fn test_chdir_script_all_buckets_in_order() {
        let changes = ExportChanges {
            to_add: vec![KeyValue::new("A", "1")],
            to_change: vec![KeyValue::new("B", "two words")],
            to_remove: vec![KeyValue::new("C", "ignored")],
            unchanged: vec![KeyValue::new("D", "4")],
        };
        let expected = "printf 'envstash:';\n\
                        printf '%s' ' +A';\n\
                        export A=1;\n\
                        printf '%s' ' ~B';\n\
                        export B='two words';\n\
                        printf '%s' ' -C';\n\
                        unset C;\n\
                        printf '%s' ' =D';\n\
                        echo;\n";
        assert_eq!(render_chdir_script(&changes), expected);
    }

    #[test]
    fn test_export_script_skips_disabled() {
        let script = render_export_script(&[
            exportable("ON", "yes", true),
            exportable("OFF", "no", false),
        ]);
        assert_eq!(
            script,
            "printf 'envstash:';\nprintf '%s' ' +ON';\nexport ON=yes;\necho;\n"
        );
    }

    #[test]
    fn test_export_script_empty_when_all_disabled() {
        assert_eq!(render_export_script(&[exportable("OFF", "no", false)]), "");
        assert_eq!(render_unexport_script(&[]), "");
    }

    #[test]
    fn test_unexport_script() {
        let script = render_unexport_script(&[exportable("A", "1", true), exportable("B", "2", true)]);
        assert_eq!(
            script,
            "printf 'envstash:';\nprintf '%s' ' -A';\nunset A;\nprintf '%s' ' -B';\nunset B;\necho;\n"
        );
    }

    #[test]
    fn test_narration_quotes_hostile_key_names() {
        let name = "A;touch x;it's";
        let changes = ExportChanges {
            to_add: vec![KeyValue::new(name, "1")],
            ..ExportChanges::default()
        };
        let script = render_chdir_script(&changes);
        let narration = script.lines().nth(1).unwrap();
        assert_eq!(narration, r#"printf '%s' ' +A;touch x;it'"'"'s';"#);
        assert!(script.contains(r#"export 'A;touch x;it'"'"'s'=1;"#));
        assert!(!script.contains("A;touch x;it's"));

        let script = render_unexport_script(&[exportable("%n%s", "1", true)]);
        assert!(script.contains("printf '%s' ' -%n%s';"));
    }

    #[test]
    fn test_zsh_init_hooks_chdir() {
        let script = render_zsh_init(true);
        assert!(script.contains("autoload -Uz add-zsh-hook"));
        assert!(script.contains(
            r#"eval "$(envstash shell zsh chdir --old "$OLDPWD" --new "$PWD")""#
        ));
        assert!(script.contains(
            r#"eval "$(envstash shell zsh export --env "$1" --no-env-no-problem)""#
        ));
        assert!(script.contains(
            r#"eval "$(envstash shell zsh unexport --env "$1" --no-env-no-problem)""#
        ));
        assert!(!script.contains("eval $("));

        assert!(!render_zsh_init(false).contains("autoload"));
    }
}
