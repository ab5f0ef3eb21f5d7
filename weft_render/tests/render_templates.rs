//! End-to-end template scenarios: compile with `weft_compiler`, render with
//! `weft_render`, assert on the produced text.

use std::collections::BTreeMap;
use weft_compiler::compile_template;
use weft_render::{RenderContext, Renderer, Value};

fn render(source: &str, context: &RenderContext) -> String {
    let compiled = compile_template("tests/fixture.weft", source).expect("compile");
    Renderer::new(&compiled.program)
        .expect("valid program")
        .render(context)
        .expect("render")
        .body
}

fn user(name: &str, active: bool) -> Value {
    Value::Map(BTreeMap::from([
        ("name".to_string(), Value::Str(name.to_string())),
        ("active".to_string(), Value::Bool(active)),
    ]))
}

#[test]
fn page_with_loop_conditional_and_translation() {
    let context = RenderContext::new()
        .with_value(
            "users",
            Value::Array(vec![
                user("Ada", true),
                user("Brin", false),
                user("Cleo", true),
            ]),
        )
        .with_translation("badge.inactive", "(inactive)");

    let source = "\
<ul>
{{ for user in users }}  <li>{{ loop.index }}. {{ user.name }}{{ if user.active == false }} {{ translate badge.inactive }}{{ endif }}</li>
{{ endfor }}</ul>
";

    let expected = "\
<ul>
  <li>1. Ada</li>
  <li>2. Brin (inactive)</li>
  <li>3. Cleo</li>
</ul>
";

    assert_eq!(render(source, &context), expected);
}

#[test]
fn newlines_come_only_from_the_template() {
    let context = RenderContext::new().with_value(
        "items",
        Value::Array(vec![Value::Str("x".into()), Value::Str("y".into())]),
    );

    let source = "{{ for item in items }}{{ item }}{{ endfor }}";
    assert_eq!(render(source, &context), "xy");
}

#[test]
fn sequential_loops_share_nothing() {
    let context = RenderContext::new()
        .with_value("a", Value::Array(vec![Value::Int(1), Value::Int(2)]))
        .with_value("b", Value::Array(vec![Value::Int(9)]));

    let source = "{{ for x in a }}{{ loop.index }}:{{ x }} {{ endfor }}| {{ for y in b }}{{ loop.index }}:{{ y }}{{ endfor }}";
    assert_eq!(render(source, &context), "1:1 2:2 | 1:9");
}

#[test]
fn nested_groups_render_with_parent_metadata() {
    let group = |name: &str, members: &[&str]| {
        Value::Map(BTreeMap::from([
            ("name".to_string(), Value::Str(name.to_string())),
            (
                "members".to_string(),
                Value::Array(members.iter().map(|m| Value::Str(m.to_string())).collect()),
            ),
        ]))
    };
    let context = RenderContext::new().with_value(
        "groups",
        Value::Array(vec![group("staff", &["Ada"]), group("crew", &["Brin", "Cleo"])]),
    );

    let source = "{{ for group in groups }}{{ group.name }}[{{ for member in group.members }}{{ loop.parent.index }}.{{ loop.index }} {{ member }};{{ endfor }}]{{ endfor }}";

    assert_eq!(
        render(source, &context),
        "staff[1.1 Ada;]crew[2.1 Brin;2.2 Cleo;]"
    );
}

#[test]
fn form_section_and_fallback_compose() {
    let context = RenderContext::new()
        .with_entity(
            "account",
            Value::Map(BTreeMap::from([(
                "email".to_string(),
                Value::Str("ada@example.com".into()),
            )])),
        )
        .with_value("title", Value::Str("Settings".into()));

    let source = "{{ section head }}{{ title ?? 'Untitled' }}{{ endsection }}{{ form account }}{{ account.email }}{{ endform }}{{ theme ?? 'light' }}";

    let compiled = compile_template("tests/fixture.weft", source).expect("compile");
    let output = Renderer::new(&compiled.program)
        .expect("valid program")
        .render(&context)
        .expect("render");

    assert_eq!(output.body, "Settingsada@example.comlight");
    assert_eq!(output.sections.get("head").map(String::as_str), Some("Settings"));
}

#[test]
fn json_context_round_trip() {
    let context = RenderContext::from_json(serde_json::json!({
        "site": {"title": "Weft"},
        "tags": ["fast", "small"]
    }));

    let source = "{{ site.title }}: {{ for tag in tags }}#{{ tag }} {{ endfor }}";
    assert_eq!(render(source, &context), "Weft: #fast #small ");
}

#[test]
fn compile_twice_render_identically() {
    let context = RenderContext::new().with_value(
        "items",
        Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
    );
    let source = "{{ for i in items }}{{ if loop.last }}{{ i }}{{ else }}{{ i }}, {{ endif }}{{ endfor }}";

    let first = render(source, &context);
    let second = render(source, &context);
    assert_eq!(first, second);
    assert_eq!(first, "1, 2, 3");
}
