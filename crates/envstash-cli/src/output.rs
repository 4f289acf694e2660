//! Plain-text rendering of entities
//!
//! Output is a series of sections of `Key: value` lines separated by blank
//! lines. Rows that only restate a default are skipped.

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use envstash_core::{Environment, Reference, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Timezone {
    Local,
    Utc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    ValueOnly,
}

/// Hide all but the first two characters of `value`
pub fn mask(mask: bool, value: &str) -> String {
    if !mask {
        return value.to_string();
    }
    if value.chars().count() < 2 {
        return "**".to_string();
    }
    let head: String = value.chars().take(2).collect();
    format!("{}****", head)
}

pub fn format_time(t: &DateTime<Utc>, tz: Timezone) -> String {
    const FORMAT: &str = "%a %Y-%m-%d";
    match tz {
        Timezone::Local => t.with_timezone(&Local).format(FORMAT).to_string(),
        Timezone::Utc => t.format(FORMAT).to_string(),
    }
}

struct Row {
    key: &'static str,
    value: String,
    skip: bool,
}

fn row(key: &'static str, value: impl Into<String>) -> Row {
    Row {
        key,
        value: value.into(),
        skip: false,
    }
}

impl Row {
    fn skip_if(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }
}

#[derive(Default)]
struct KeyValueTable {
    sections: Vec<Vec<Row>>,
}

impl KeyValueTable {
    fn section(&mut self, rows: Vec<Row>) {
        let rows: Vec<Row> = rows.into_iter().filter(|r| !r.skip).collect();
        if !rows.is_empty() {
            self.sections.push(rows);
        }
    }

    fn render(&self, w: &mut dyn Write) -> io::Result<()> {
        let width = self
            .sections
            .iter()
            .flatten()
            .map(|r| r.key.len() + 1)
            .max()
            .unwrap_or(0);
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(w)?;
            }
            for r in section {
                writeln!(w, "{:<width$} {}", format!("{}:", r.key), r.value, width = width)?;
            }
        }
        Ok(())
    }
}

/// Display options shared by the show and list commands
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    pub mask: bool,
    pub tz: Timezone,
}

fn timestamp_rows(
    create_time: &DateTime<Utc>,
    update_time: &DateTime<Utc>,
    tz: Timezone,
) -> [Row; 2] {
    [
        row("CreateTime", format_time(create_time, tz)),
        row("UpdateTime", format_time(update_time, tz)).skip_if(create_time == update_time),
    ]
}

pub fn print_env_list(w: &mut dyn Write, opts: PrintOptions, envs: &[Environment]) -> io::Result<()> {
    if envs.is_empty() {
        return writeln!(w, "no envs found");
    }
    let mut t = KeyValueTable::default();
    for e in envs {
        let mut rows = vec![
            row("Name", e.name.as_str()),
            row("Comment", e.comment.as_str()).skip_if(e.comment.is_empty()),
        ];
        rows.extend(timestamp_rows(&e.create_time, &e.update_time, opts.tz));
        rows.push(row("Enabled", e.enabled.to_string()).skip_if(e.enabled));
        t.section(rows);
    }
    t.render(w)
}

pub fn print_env_show(
    w: &mut dyn Write,
    opts: PrintOptions,
    env: &Environment,
    vars: &[Variable],
    refs: &[Reference],
    targets: &[Variable],
) -> io::Result<()> {
    writeln!(w, "Env")?;
    print_env_list(w, opts, std::slice::from_ref(env))?;

    if !vars.is_empty() {
        writeln!(w)?;
        writeln!(w, "Vars")?;
        let mut t = KeyValueTable::default();
        for v in vars {
            t.section(vec![
                row("Name", v.name.as_str()),
                row("Value", mask(opts.mask, v.value.expose())),
                row("Comment", v.comment.as_str()).skip_if(v.comment.is_empty()),
                row("Enabled", v.enabled.to_string()).skip_if(v.enabled),
            ]);
        }
        t.render(w)?;
    }

    if !refs.is_empty() {
        writeln!(w)?;
        writeln!(w, "Refs")?;
        let mut t = KeyValueTable::default();
        for (r, target) in refs.iter().zip(targets) {
            t.section(vec![
                row("Name", r.name.as_str()),
                row("RefEnvName", target.env_name.as_str()),
                row("RefVarName", target.name.as_str()),
                row("RefVarValue", mask(opts.mask, target.value.expose())),
                row("Comment", r.comment.as_str()).skip_if(r.comment.is_empty()),
                row("Enabled", r.enabled.to_string()).skip_if(r.enabled),
            ]);
        }
        t.render(w)?;
    }
    Ok(())
}

pub fn print_var_show(
    w: &mut dyn Write,
    opts: PrintOptions,
    format: Format,
    var: &Variable,
    refs: &[Reference],
) -> io::Result<()> {
    if format == Format::ValueOnly {
        return write!(w, "{}", var.value.expose());
    }

    let mut t = KeyValueTable::default();
    let mut rows = vec![
        row("EnvName", var.env_name.as_str()),
        row("Name", var.name.as_str()),
        row("Value", mask(opts.mask, var.value.expose())),
        row("Comment", var.comment.as_str()).skip_if(var.comment.is_empty()),
    ];
    rows.extend(timestamp_rows(&var.create_time, &var.update_time, opts.tz));
    rows.push(row("Enabled", var.enabled.to_string()).skip_if(var.enabled));
    rows.push(row("Completions", var.completions.join(",")).skip_if(var.completions.is_empty()));
    t.section(rows);
    t.render(w)?;

    if !refs.is_empty() {
        writeln!(w)?;
        writeln!(w, "EnvRefs")?;
        let mut t = KeyValueTable::default();
        for r in refs {
            t.section(vec![
                row("EnvName", r.env_name.as_str()),
                row("Name", r.name.as_str()),
                row("Comment", r.comment.as_str()).skip_if(r.comment.is_empty()),
                row("Enabled", r.enabled.to_string()).skip_if(r.enabled),
            ]);
        }
        t.render(w)?;
    }
    Ok(())
}

pub fn print_ref_show(
    w: &mut dyn Write,
    opts: PrintOptions,
    format: Format,
    reference: &Reference,
    target: &Variable,
) -> io::Result<()> {
    if format == Format::ValueOnly {
        return write!(w, "{}", target.value.expose());
    }

    let mut t = KeyValueTable::default();
    let mut rows = vec![
        row("EnvName", reference.env_name.as_str()),
        row("Name", reference.name.as_str()),
        row("Comment", reference.comment.as_str()).skip_if(reference.comment.is_empty()),
    ];
    rows.extend(timestamp_rows(&reference.create_time, &reference.update_time, opts.tz));
    rows.push(row("Enabled", reference.enabled.to_string()).skip_if(reference.enabled));
    rows.push(row("RefEnvName", target.env_name.as_str()));
    rows.push(row("RefVarName", target.name.as_str()));
    rows.push(row("RefVarValue", mask(opts.mask, target.value.expose())));
    t.section(rows);
    t.render(w)
}
