//! End-to-end tests for template resolution and rendering.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use plates::engine::{self, format_parser, html_parser, text_parser};
use plates::{Abortable, Factory, Functions, RenderError, Template, TemplateCache};
use serde_json::{json, Value};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn echo(args: &[Value]) -> Result<Value, plates::FunctionError> {
    let s = args.first().and_then(Value::as_str).unwrap_or_default();
    Ok(json!(format!("ECHO:'{}'", s)))
}

fn echo_funcs() -> Functions {
    Functions::new().with("echo", echo)
}

fn factory(name: &str) -> Factory {
    Factory::new(name)
        .default_parser(text_parser)
        .add_funcs([&echo_funcs()])
        .with_stdlib()
}

fn error_reader(path: &Path) -> io::Result<Vec<u8>> {
    Err(io::Error::other(format!("bad file: {}", path.display())))
}

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata")
}

// ============================================================================
// String parsing
// ============================================================================

#[test]
fn string_parsing_table() {
    type ParserFn = fn(&str, &Functions, &str) -> plates::Result<Template>;

    struct Case {
        name: &'static str,
        parser: ParserFn,
        input: &'static str,
        data: Value,
        want: Option<&'static str>,
    }

    let cases = [
        Case {
            name: "basic text",
            parser: text_parser,
            input: r#"{{ echo("<h1>A header!</h1>") }}"#,
            data: Value::Null,
            want: Some("ECHO:'<h1>A header!</h1>'"),
        },
        Case {
            name: "bad text",
            parser: text_parser,
            input: "{{ badFunc() }}",
            data: Value::Null,
            want: None,
        },
        Case {
            name: "basic html",
            parser: html_parser,
            input: r#"{{ echo("<h1>A header!</h1>") }}"#,
            data: Value::Null,
            want: Some("ECHO:&#x27;&lt;h1&gt;A header!&lt;&#x2f;h1&gt;&#x27;"),
        },
        Case {
            name: "bad html",
            parser: html_parser,
            input: "{{ badFunc() }}",
            data: Value::Null,
            want: None,
        },
        Case {
            name: "basic format",
            parser: format_parser,
            input: "test{}test",
            data: json!("foo"),
            want: Some("testfootest"),
        },
        Case {
            name: "complex format",
            parser: format_parser,
            input: "test{}test{}",
            data: json!(["1", "2"]),
            want: Some("test1test2"),
        },
        Case {
            name: "bad format",
            parser: format_parser,
            input: "test{name}",
            data: json!("foo"),
            want: None,
        },
    ];

    for case in cases {
        let result = Factory::new(case.name)
            .default_parser(case.parser)
            .add_funcs([&echo_funcs()])
            .with_stdlib()
            .from_source(case.input)
            .render(&case.data);

        match (result, case.want) {
            (Ok(got), Some(want)) => assert_eq!(got, want, "case `{}`", case.name),
            (Err(_), None) => {}
            (Ok(got), None) => panic!("case `{}`: expected error, got `{}`", case.name, got),
            (Err(err), Some(_)) => panic!("case `{}`: unexpected error: {}", case.name, err),
        }
    }
}

#[test]
fn hello_world_end_to_end() {
    let out = factory("hello")
        .from_source("Hello {{name}}")
        .render(&json!({"name": "World"}))
        .unwrap();
    assert_eq!(out, "Hello World");
}

#[test]
fn markup_engine_escapes_script() {
    let out = Factory::new("html")
        .default_parser(html_parser)
        .from_source("<div>{{ comment }}</div>")
        .render(&json!({"comment": "<script>alert('x')</script>"}))
        .unwrap();

    assert!(out.starts_with("<div>&lt;script&gt;"));
    assert!(!out.contains("<script>"));
}

#[test]
fn same_template_renders_independently() {
    let tmpl = factory("iso").from_source("{{ who }}:{% for i in items %}{{ i }}{% endfor %}");

    let a = tmpl.render(&json!({"who": "a", "items": [1, 2]})).unwrap();
    let b = tmpl.render(&json!({"who": "b", "items": []})).unwrap();
    let a_again = tmpl.render(&json!({"who": "a", "items": [1, 2]})).unwrap();

    assert_eq!(a, "a:12");
    assert_eq!(b, "b:");
    assert_eq!(a, a_again);
}

// ============================================================================
// File parsing
// ============================================================================

#[test]
fn file_parsing_fixtures() {
    let w = factory("test");
    let mut checked = 0;

    for entry in fs::read_dir(testdata()).unwrap() {
        let path = entry.unwrap().path();
        let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
        if file_name.ends_with("_want") {
            continue;
        }

        let ctx = Abortable::new(json!({"name": "World"}));
        let result = w.from_file(&path).render(&ctx);

        if file_name.starts_with("error") {
            assert!(result.is_err(), "{} should fail", file_name);
            continue;
        }

        let got = result.unwrap_or_else(|e| panic!("{}: {}", file_name, e));
        let want = fs::read_to_string(format!("{}_want", path.display())).unwrap();
        assert_eq!(got, want, "{}", file_name);
        checked += 1;
    }

    assert_eq!(checked, 4);
}

#[test]
fn abort_fixture_reports_abort() {
    let err = factory("test")
        .from_file(testdata().join("error_abort.tmpl"))
        .render(&Abortable::new(json!({})))
        .unwrap_err();
    assert!(err.is_aborted());
}

#[test]
fn syntax_fixture_reports_parse_error() {
    let tmpl = factory("test").from_file(testdata().join("error_syntax.tmpl"));
    assert!(tmpl.is_failed());
    assert!(matches!(
        tmpl.render(&()).unwrap_err(),
        RenderError::Parse(_)
    ));
}

#[test]
fn missing_file_fails_every_operation_identically() {
    let parsed = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&parsed);

    let w = Factory::new("test")
        .default_parser_fn(move |name, funcs, source| {
            seen.fetch_add(1, Ordering::SeqCst);
            text_parser(name, funcs, source)
        })
        .add_matcher_fn(move |_: &str| Some(engine::EngineKind::Text.parser()))
        .file_reader_fn(error_reader);

    let tmpl = w.from_file("FILE DOES NOT EXIST");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("blah");

    let a = tmpl.render(&Abortable::new(json!({}))).unwrap_err();
    let b = tmpl
        .render_to_file(&target, &Abortable::new(json!({})))
        .unwrap_err();
    let c = tmpl
        .render_to_writer(&mut io::sink(), &Abortable::new(json!({})))
        .unwrap_err();

    assert_eq!(
        a.to_string(),
        "error reading template: FILE DOES NOT EXIST: bad file: FILE DOES NOT EXIST"
    );
    assert_eq!(a.to_string(), b.to_string());
    assert_eq!(b.to_string(), c.to_string());
    assert_eq!(parsed.load(Ordering::SeqCst), 0);
    assert!(!target.exists());
}

#[test]
fn default_reader_loads_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("note.format");
    fs::write(&path, "[{0}]").unwrap();

    let out = factory("disk")
        .from_file(&path)
        .render(&json!(["x"]))
        .unwrap();
    assert_eq!(out, "[x]");
}

// ============================================================================
// Rendering to files
// ============================================================================

#[test]
fn render_to_file_targets() {
    let e = factory("test").from_source(r#"{{ echo("<h1>A header!</h1>") }}"#);

    e.render_to_file(plates::STDOUT, &Abortable::new(json!({})))
        .unwrap();
    e.render_to_file(plates::STDERR, &Abortable::new(json!({})))
        .unwrap();

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("test_output.txt");
    e.render_to_file(&target, &Abortable::new(json!({})))
        .unwrap();
    assert_eq!(
        fs::read_to_string(&target).unwrap(),
        "ECHO:'<h1>A header!</h1>'"
    );
}

#[test]
fn read_failure_does_not_write_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("test_output.txt");

    let err = factory("test")
        .file_reader_fn(error_reader)
        .from_file("blah")
        .render_to_file(&target, &Abortable::new(json!({})))
        .unwrap_err();

    assert!(matches!(err, RenderError::Read { .. }));
    assert!(!target.exists());
}

#[test]
fn abort_prevents_output_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("does/not/matter.txt");

    let err = factory("test")
        .file_reader_fn(error_reader)
        .from_source("start {{ abort() }} end")
        .render_to_file(&target, &Abortable::new(json!({})))
        .unwrap_err();

    assert!(err.is_aborted());
    assert!(!target.exists());
    assert!(!dir.path().join("does").exists());
}

#[test]
fn abort_takes_priority_over_execution_error() {
    let ctx = Abortable::new(json!({}));
    let err = factory("test")
        .from_source("{{ abort('stop') }}{{ missing_value }}")
        .render(&ctx)
        .unwrap_err();
    assert_eq!(err.to_string(), "stop");
}

#[test]
fn execution_error_before_abort_is_not_an_abort() {
    let ctx = Abortable::new(json!({}));
    let err = factory("test")
        .from_source("{{ missing_value }}{{ abort('stop') }}")
        .render(&ctx)
        .unwrap_err();
    assert!(!err.is_aborted());
    assert!(!ctx.signal().is_aborted());
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn cache_avoids_reparsing() {
    let parses = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&parses);

    let w = Factory::new("cached").default_parser_fn(move |name, funcs, source| {
        counter.fetch_add(1, Ordering::SeqCst);
        text_parser(name, funcs, source)
    });
    let cache = TemplateCache::new();

    for who in ["a", "b", "c"] {
        let tmpl = cache.get_or_insert_with("greet", || w.from_source("hi {{ who }}"));
        assert_eq!(
            tmpl.render(&json!({ "who": who })).unwrap(),
            format!("hi {}", who)
        );
    }

    assert_eq!(parses.load(Ordering::SeqCst), 1);

    cache.remove("greet");
    assert!(cache.get("greet").is_none());
}
