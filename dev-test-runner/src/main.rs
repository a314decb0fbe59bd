//! Conformance runner for the null handling rules, one scenario per rule.
//!
//! Each scenario binds through both a one-shot binder and a reused one (the
//! "reader" path) and must agree with the expected JSON.
use colored::Colorize;
use serde_json::{json, Value};

use json_nullbind::{
    Binder, Bound, ConstantNull, NullProviderRegistry, ObjectType, Schema, SuppressionPolicy, TypeKey,
};

struct Scenario {
    name: &'static str,
    policy: SuppressionPolicy,
    funny_strings: bool,
    ty: &'static str,
    input: &'static str,
    expected: Value,
}

fn schema() -> Schema {
    Schema::new()
        .with_object("EmptyObject", ObjectType::new().field("foo", TypeKey::String))
        .with_object(
            "TestObject",
            ObjectType::new()
                .field_with_default("string1", TypeKey::String, json!("foo"))
                .field("string2", TypeKey::String)
                .field_with_default("object1", TypeKey::object("EmptyObject"), json!({}))
                .field("object2", TypeKey::object("EmptyObject")),
        )
        .with_object("AnySetter", ObjectType::new().catch_all(TypeKey::String))
}

fn scenarios() -> Vec<Scenario> {
    let off = SuppressionPolicy::DISABLED;
    let on = SuppressionPolicy::NEVER_SET_AS_NULL;
    vec![
        Scenario { name: "any-setter nulls", policy: off, funny_strings: true, ty: "AnySetter",
            input: r#"{"fieldName":null}"#, expected: json!({"fieldName": "funny"}) },
        Scenario { name: "custom root null", policy: off, funny_strings: true, ty: "string",
            input: "null", expected: json!("funny") },
        Scenario { name: "list of nulls", policy: off, funny_strings: true, ty: "seq<string>",
            input: "[null]", expected: json!(["funny"]) },
        Scenario { name: "map of nulls", policy: off, funny_strings: true, ty: "map<string>",
            input: r#"{"key":null}"#, expected: json!({"key": "funny"}) },
        Scenario { name: "never-set-as-null: root", policy: on, funny_strings: false, ty: "string",
            input: "null", expected: Value::Null },
        Scenario { name: "never-set-as-null: single entry", policy: on, funny_strings: false, ty: "map<string>",
            input: r#"{"key":null}"#, expected: json!({}) },
        Scenario { name: "never-set-as-null: mixed entries", policy: on, funny_strings: false, ty: "map<string>",
            input: r#"{"foo":"bar", "fizz": "buzz", "bing":null}"#, expected: json!({"foo": "bar", "fizz": "buzz"}) },
        Scenario { name: "never-set-as-null: object defaults", policy: on, funny_strings: false, ty: "TestObject",
            input: r#"{"string1":null,"string2":null,"object1":null,"object2":null}"#,
            expected: json!({"string1": "foo", "string2": null, "object1": {"foo": null}, "object2": null}) },
        Scenario { name: "provider beats never-set-as-null", policy: on, funny_strings: true, ty: "map<string>",
            input: r#"{"key":null}"#, expected: json!({"key": "funny"}) },
    ]
}

fn run(scenario: &Scenario, schema: &Schema) -> Result<(), String> {
    let mut registry = NullProviderRegistry::new();
    if scenario.funny_strings {
        registry.register(TypeKey::String, ConstantNull(Bound::from("funny")));
    }
    let ty: TypeKey = scenario.ty.parse().map_err(|e| format!("{e}"))?;
    let binder = Binder::new(schema, &registry, scenario.policy);
    for attempt in ["direct", "reused"] {
        let got = binder.bind_str(scenario.input, &ty).map_err(|e| format!("{attempt}: {e}"))?;
        if got.to_json() != scenario.expected {
            return Err(format!("{attempt}: expected {}, got {}", scenario.expected, got.to_json()));
        }
    }
    Ok(())
}

fn main() {
    let schema = schema();
    let mut failed = 0usize;
    for scenario in scenarios() {
        match run(&scenario, &schema) {
            Ok(()) => eprintln!("{} {}", "✅".green(), scenario.name),
            Err(error) => {
                failed += 1;
                eprintln!("{} {}: {error}", "❌".red(), scenario.name);
            }
        }
    }
    if failed > 0 {
        eprintln!("{failed} scenario(s) failed");
        std::process::exit(1);
    }
}
