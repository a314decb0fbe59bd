//! Minimal CLI: bind JSON documents against a schema, or show null decisions.
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use rayon::prelude::*;
use serde_json::{json, Value};

use crate::config::{BindSettings, BinderConfig};
use crate::target::TargetKind;
use crate::types::{Schema, TypeKey};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// bind JSON documents to declared types, resolving every `null` through the
/// configured null providers and suppression policy
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// bind documents and print the bound values, one per line
    Bind(BindOut),
    /// print the null decision each binding position would get for a type
    Decide(DecideOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct BindingSettings {
    /// schema (binding plan) JSON file
    #[arg(long)]
    schema: Option<PathBuf>,

    /// declared type of each document (defaults to the schema's root)
    #[arg(long = "type")]
    type_key: Option<String>,

    /// configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// never overwrite existing state with a null (root values unaffected)
    #[arg(long, default_value_t = false)]
    never_set_as_null: bool,

    /// constant substitute for nulls of a type, as TYPE=JSON (repeatable)
    #[arg(long = "null-value", value_name = "TYPE=JSON")]
    null_values: Vec<String>,

    /// drop undeclared properties instead of failing
    #[arg(long, default_value_t = false)]
    ignore_unknown: bool,
}

#[derive(clap::Parser, Debug)]
struct BindOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    binding: BindingSettings,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// pretty-print each bound document
    #[arg(long)]
    pretty: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct DecideOut {
    #[command(flatten)]
    binding: BindingSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Read every input and apply the pointer/jq selection, in input order.
    fn load_documents(&self) -> Result<Vec<(String, Value)>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let documents = if self.ndjson {
                serde_json::Deserializer::from_str(&source)
                    .into_iter::<Value>()
                    .collect::<Result<Vec<_>, _>>()
            } else {
                serde_json::from_str::<Value>(&source).map(|v| vec![v])
            };
            let documents = documents
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            for document in documents {
                for selected in self.select(document, &source_path_str)? {
                    out.push((source_path_str.clone(), selected));
                }
            }
        }
        Ok(out)
    }

    fn select(&self, document: Value, source_path_str: &str) -> Result<Vec<Value>> {
        let document = match self.json_pointer.as_deref() {
            None => document,
            Some(ptr) => document
                .pointer(ptr)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {ptr} matched nothing in {source_path_str}"))?,
        };
        match self.jq_expr.as_ref() {
            None => Ok(vec![document]),
            Some(jq_expr) => crate::jq_exec::select_documents(jq_expr, &document).with_context(|| {
                format!("failed to apply jq expression to source file ({source_path_str})")
            }),
        }
    }
}

impl BindingSettings {
    fn load_schema(&self) -> Result<Schema> {
        let Some(path) = self.schema.as_ref() else {
            return Ok(Schema::new());
        };
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema ({})", path.display()))?;
        Schema::from_json_str(&src).with_context(|| format!("invalid schema ({})", path.display()))
    }

    /// File configuration first, then command line overrides.
    fn load_config(&self) -> Result<BinderConfig> {
        let mut config = match self.config.as_ref() {
            Some(path) => BinderConfig::load(path)
                .with_context(|| format!("invalid configuration ({})", path.display()))?,
            None => BinderConfig::default(),
        };
        config.never_set_as_null |= self.never_set_as_null;
        config.ignore_unknown_properties |= self.ignore_unknown;
        for raw in &self.null_values {
            let (key, value) = parse_null_value(raw)?;
            config.set_null_value(key, value);
        }
        Ok(config)
    }

    fn resolve_type(&self, schema: &Schema) -> Result<TypeKey> {
        let key = match (&self.type_key, &schema.root) {
            (Some(raw), _) => raw.parse::<TypeKey>()?,
            (None, Some(root)) => root.clone(),
            (None, None) => bail!("no --type given and the schema declares no root type"),
        };
        schema.check_key(&key)?;
        Ok(key)
    }

    fn load(&self) -> Result<(Schema, BindSettings, TypeKey)> {
        let schema = self.load_schema()?;
        let settings = self.load_config()?.build(&schema)?;
        let ty = self.resolve_type(&schema)?;
        Ok((schema, settings, ty))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Bind(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(())
                }

                // 1) configuration, frozen before any document is read
                let (schema, settings, ty) = target.binding.load()?;
                info!(
                    "binding as `{ty}` (never_set_as_null: {}, {} null provider(s))",
                    settings.policy.is_enabled(),
                    settings.registry.len()
                );

                // 2) documents bind independently; all share one registry
                let documents = target.input_settings.load_documents()?;
                let binder = settings.binder(&schema);
                let bound = documents
                    .par_iter()
                    .map(|(source, document)| {
                        binder
                            .bind_root(document, &ty)
                            .with_context(|| format!("failed to bind a document from {source}"))
                    })
                    .collect::<Result<Vec<_>>>()?;

                // 3) emit in input order
                let mut rendered = String::new();
                for value in &bound {
                    let line = if target.pretty {
                        serde_json::to_string_pretty(value)?
                    } else {
                        serde_json::to_string(value)?
                    };
                    rendered.push_str(&line);
                    rendered.push('\n');
                }
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &rendered)?;
                } else {
                    print!("{rendered}");
                }
                Ok(())
            }
            Command::Decide(target) => {
                let (schema, settings, ty) = target.binding.load()?;
                let binder = settings.binder(&schema);
                let engine = binder.engine();
                let mut report = serde_json::Map::new();
                for kind in TargetKind::ALL {
                    let decision = engine.resolve_for(&ty, kind, settings.policy, "<decide>")?;
                    let mut entry = json!({ "decision": decision.variant_name() });
                    if let crate::engine::NullDecision::Substitute(v) = &decision {
                        entry["value"] = v.to_json();
                    }
                    report.insert(kind.as_str().to_string(), entry);
                }
                println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn parse_null_value(raw: &str) -> Result<(TypeKey, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected TYPE=JSON, got `{raw}`"))?;
    let key = key.parse::<TypeKey>()?;
    let value = serde_json::from_str::<Value>(value)
        .with_context(|| format!("`{raw}`: substitute is not valid JSON"))?;
    Ok((key, value))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // explicit glob that matched nothing is an error, not an empty run
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
