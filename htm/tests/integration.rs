use std::cell::Cell;
use std::rc::Rc;

use htm::{AstChild, AstNode, Fill, HtmlError, MergePolicy};
use tagstr::dom::Attrs;
use tagstr::{
    AttrValue, Child, EagerInterpolation, HtmlNode, Item, LazyInterpolation, Value, t,
};

fn text(s: &str) -> Item {
    Item::text(s)
}

fn interp(expr: &str, value: impl Into<Value>) -> Item {
    Item::interpolation(EagerInterpolation::new(expr, value))
}

fn render(items: Vec<Item>) -> String {
    htm::html(items).expect("render failed").to_string()
}

fn render_err(items: Vec<Item>) -> HtmlError {
    htm::html(items).expect_err("expected an error")
}

fn texts(children: &[Child]) -> Vec<&str> {
    children
        .iter()
        .filter_map(|child| match child {
            Child::Text(text) => Some(text.as_str()),
            Child::Node(_) => None,
        })
        .collect()
}

#[test]
fn tag_balance() {
    let ast = htm::parse(&[text("<div>Hello World</div>")]).unwrap();
    assert_eq!(ast.tag.as_deref(), Some("div"));
    assert_eq!(ast.children, vec![AstChild::Text("Hello World".to_string())]);
}

#[test]
fn placeholder_indexing() {
    let items = vec![text("<div>Hello "), interp("name", "World"), text("</div>")];
    let ast = htm::parse(&items).unwrap();
    assert_eq!(ast.texts(), vec!["Hello ", "x$1x"]);

    let node = Fill::new(&items).interpolate(&ast).unwrap();
    assert_eq!(texts(&node.children), vec!["Hello ", "World"]);
}

#[test]
fn dynamic_tag_name() {
    let level = 1;
    let title = "The Greeting";
    let name = "World";
    let template = t!("<h" {level} " title=" {title} ">Hello " {name} "</h" {level} ">");
    let node = htm::html_template(&template).unwrap();

    assert_eq!(node.tag, "h1");
    assert_eq!(
        node.attrs,
        Attrs::from([("title".to_string(), AttrValue::Text("The Greeting".to_string()))])
    );
    assert_eq!(texts(&node.children), vec!["Hello ", "World"]);
}

#[test]
fn stringify_round_trip() {
    let title = "The Greeting";
    let name = "World";
    let node = htm::html!("<div title=" {title} ">Hello " {name} "</div>").unwrap();
    assert_eq!(node.to_string(), r#"<div title="The Greeting">Hello World</div>"#);
}

#[test]
fn mismatched_close_names_both_tags() {
    let err = render_err(vec![text("<h1>Hello</h2>")]);
    match &err {
        HtmlError::MismatchedTag {
            expected, found, ..
        } => {
            assert_eq!(expected, "h1");
            assert_eq!(found, "h2");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(err.to_string().contains("</h2>"));
}

#[test]
fn mismatched_close_reports_item_index() {
    let x = "body";
    let err = htm::html_template(&t!("<div>" {x} "</span>")).unwrap_err();
    assert_eq!(err.item(), Some(2));
}

#[test]
fn dynamic_close_compares_expressions() {
    let level = 2;
    let other = 2;
    let err = htm::html_template(&t!("<h" {level} ">x</h" {other} ">")).unwrap_err();
    match err {
        HtmlError::MismatchedTag {
            expected, found, ..
        } => {
            assert_eq!(expected, "h{level}");
            assert_eq!(found, "h{other}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn generator_expansion() {
    let items = Value::iter((0..5).map(|i| HtmlNode::new("li").with_child(format!("Item {}", i))));
    let node = htm::html!("<ol>" {items} "</ol>").unwrap();
    assert_eq!(
        node.to_string(),
        "<ol><li>Item 0</li><li>Item 1</li><li>Item 2</li><li>Item 3</li><li>Item 4</li></ol>"
    );
}

#[test]
fn generator_is_consumed_once() {
    let items = Value::iter(vec!["a", "b"]);
    let first = htm::html!("<p>" {items} "</p>").unwrap();
    assert_eq!(first.to_string(), "<p>ab</p>");
}

#[test]
fn list_children_flatten_recursively() {
    let nested = Value::List(vec![
        Value::from("a"),
        Value::List(vec![Value::from("b"), Value::List(vec![Value::from(3)])]),
    ]);
    let node = htm::html!("<p>" {nested} "</p>").unwrap();
    assert_eq!(texts(&node.children), vec!["a", "b", "3"]);
}

#[test]
fn literal_dollar_survives_markers() {
    assert_eq!(
        render(vec![text("<p>Price: $5, not x$1x</p>")]),
        "<p>Price: $5, not x$1x</p>"
    );
    let price = 5;
    assert_eq!(
        htm::html!("<p>$$" {price} "</p>").unwrap().to_string(),
        "<p>$$5</p>"
    );
}

#[test]
fn resolution_is_idempotent() {
    let items = vec![
        text("<ul class="),
        interp("cls", "menu"),
        text("><li>"),
        interp("label", "Home"),
        text("</li></ul>"),
    ];
    let ast = htm::parse(&items).unwrap();
    let fill = Fill::new(&items);
    assert_eq!(fill.interpolate(&ast).unwrap(), fill.interpolate(&ast).unwrap());
}

#[test]
fn lazy_interpolation_sees_late_updates() {
    let count = Rc::new(Cell::new(1));
    let captured = Rc::clone(&count);
    let items = vec![
        text("<p>"),
        Item::interpolation(LazyInterpolation::new("count", move || {
            Value::from(captured.get())
        })),
        text("</p>"),
    ];
    count.set(7);
    assert_eq!(render(items), "<p>7</p>");
}

#[test]
fn boolean_and_empty_attributes() {
    let node = htm::html(vec![text(r#"<input disabled value="">"#), text("</input>")]).unwrap();
    assert_eq!(node.attrs.get("disabled"), Some(&AttrValue::Bool(true)));
    assert_eq!(node.attrs.get("value"), Some(&AttrValue::Text(String::new())));
    assert_eq!(node.to_string(), r#"<input disabled value=""/>"#);
}

#[test]
fn spread_attributes() {
    let attrs = Value::from([
        ("id", Value::from("main")),
        ("hidden", Value::from(true)),
        ("draggable", Value::from(false)),
        ("tabindex", Value::from(3)),
    ]);
    let node = htm::html!("<div " {attrs} ">x</div>").unwrap();
    assert_eq!(
        node.to_string(),
        r#"<div id="main" hidden draggable tabindex="3">x</div>"#
    );
}

#[test]
fn false_spread_attribute_keeps_bare_key() {
    let attrs = Value::from([("disabled", false)]);
    let node = htm::html!("<button " {attrs} ">x</button>").unwrap();
    assert_eq!(node.attrs.get("disabled"), Some(&AttrValue::Bool(false)));
    assert_eq!(node.to_string(), "<button disabled>x</button>");
}

#[test]
fn map_child_yields_its_keys() {
    let map = Value::from([("a", 1), ("<b>", 2)]);
    let node = htm::html!("<p>" {map} "</p>").unwrap();
    assert_eq!(texts(&node.children), vec!["a", "&lt;b&gt;"]);
}

#[test]
fn interpolated_bare_attribute_is_boolean() {
    let flag = "checked";
    let node = htm::html!("<input " {flag} "/>").unwrap();
    assert_eq!(node.attrs.get("checked"), Some(&AttrValue::Bool(true)));
}

#[test]
fn style_declarations() {
    let style = Value::from([("color", "red"), ("font-weight", "bold")]);
    let node = htm::html!("<p style=" {style} ">hi</p>").unwrap();
    assert_eq!(node.to_string(), r#"<p style="color: red; font-weight: bold">hi</p>"#);
}

#[test]
fn later_attributes_overwrite_earlier() {
    let attrs = Value::from([("id", "spread")]);
    let node = htm::html!("<p id=\"literal\" " {attrs} ">x</p>").unwrap();
    assert_eq!(node.attrs.get("id"), Some(&AttrValue::Text("spread".to_string())));
}

#[test]
fn interpolated_strings_are_escaped() {
    let name = "<b>Tom & Jerry</b>";
    let node = htm::html!("<p>" {name} "</p>").unwrap();
    assert_eq!(texts(&node.children), vec!["&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"]);
}

#[test]
fn scalar_children_are_stringified() {
    let n = 42;
    let ok = true;
    let node = htm::html!("<p>" {n} " " {ok} "</p>").unwrap();
    assert_eq!(node.to_string(), "<p>42 true</p>");
}

#[test]
fn component_child_is_invoked() {
    let greeting = Value::component("greeting", || HtmlNode::new("b").with_child("hi").into());
    let node = htm::html!("<p>" {greeting} "</p>").unwrap();
    assert_eq!(node.to_string(), "<p><b>hi</b></p>");
}

#[test]
fn format_spec_applies_before_conversion() {
    let items = vec![
        text("<p>"),
        Item::interpolation(EagerInterpolation::new("n", 1234567).with_format_spec(",")),
        text("</p>"),
    ];
    assert_eq!(render(items), "<p>1,234,567</p>");
}

fn my_component() -> HtmlNode {
    HtmlNode::new("div")
        .with_attr("class", "custom")
        .with_child("My component")
}

#[test]
fn subcomponent_merge_node_wins() {
    let component = my_component();
    let node = htm::html!("<" {component} " class=\"other\" id=\"x\"><p>Extra</p><//>").unwrap();
    assert_eq!(
        node.to_string(),
        r#"<div class="custom" id="x">My component<p>Extra</p></div>"#
    );
}

#[test]
fn subcomponent_merge_call_site_wins() {
    let component = my_component();
    let template = t!("<" {component} " class=\"other\"><p>Extra</p><//>");
    let node = htm::html_template_with(&template, MergePolicy::CallSiteWins).unwrap();
    assert_eq!(node.attrs.get("class"), Some(&AttrValue::Text("other".to_string())));
}

#[test]
fn subcomponent_from_factory() {
    let factory = Value::component("MyComponent", || my_component().into());
    let node = htm::html!("<" {factory} "/>").unwrap();
    assert_eq!(node.to_string(), r#"<div class="custom">My component</div>"#);
}

#[test]
fn subcomponent_mixed_with_text_is_ambiguous() {
    let component = my_component();
    let err = htm::html!("<my-" {component.clone()} ">x</my-" {component.clone()} ">").unwrap_err();
    assert_eq!(err, HtmlError::AmbiguousComponent { count: 2 });
}

#[test]
fn invalid_tag_names() {
    for bad in ["1abc", "-1x", "a--b", "a b", ""] {
        let err = htm::html!("<" {bad} "/>").unwrap_err();
        assert_eq!(err, HtmlError::InvalidTagName(bad.to_string()), "tag {:?}", bad);
    }
    let ok = "my-element";
    assert_eq!(htm::html!("<" {ok} "/>").unwrap().to_string(), "<my-element/>");
}

#[test]
fn invalid_attribute_key() {
    let key = "bad key";
    let err = htm::html!("<p " {key} "=\"v\">x</p>").unwrap_err();
    assert_eq!(err, HtmlError::InvalidAttributeName("bad key".to_string()));
}

#[test]
fn attribute_value_must_be_single() {
    let x = "b";
    let err = htm::html!("<p title=\"a" {x} "\">y</p>").unwrap_err();
    assert!(err.to_string().contains("value must be single"), "{}", err);
}

#[test]
fn type_errors() {
    let list = vec![1, 2];
    let err = htm::html!("<p title=" {list} ">y</p>").unwrap_err();
    assert!(matches!(err, HtmlError::TypeError { got, .. } if got.contains("[1, 2]")));

    let flag = true;
    let err = htm::html!("<p title=" {flag} ">y</p>").unwrap_err();
    assert!(matches!(err, HtmlError::TypeError { got, .. } if got.starts_with("bool")));
}

#[test]
fn empty_template_is_an_error() {
    assert_eq!(render_err(vec![text("")]), HtmlError::Empty);
    assert_eq!(render_err(vec![text("<!-- nothing -->")]), HtmlError::Empty);
}

#[test]
fn multiple_roots_become_a_fragment() {
    let node = htm::html(vec![text("<p>a</p><p>b</p>")]).unwrap();
    assert!(node.is_fragment());
    assert_eq!(node.children.len(), 2);
    assert_eq!(node.to_string(), "<p>a</p><p>b</p>");
}

#[test]
fn lone_text_becomes_a_fragment() {
    let node = htm::html(vec![text("just text")]).unwrap();
    assert!(node.is_fragment());
    assert_eq!(node.to_string(), "just text");
}

#[test]
fn unclosed_and_stray_tags() {
    assert!(matches!(
        render_err(vec![text("<div>hi")]),
        HtmlError::UnclosedTag { name, item: 0 } if name == "div"
    ));
    assert!(matches!(
        render_err(vec![text("hi</p>")]),
        HtmlError::StrayClosingTag { found, .. } if found == "p"
    ));
    assert!(matches!(
        render_err(vec![text("<div><p>hi</div>")]),
        HtmlError::MismatchedTag { expected, found, .. } if expected == "p" && found == "div"
    ));
}

#[test]
fn empty_elements_self_close() {
    assert_eq!(render(vec![text("<br/>")]), "<br/>");
    assert_eq!(render(vec![text("<div></div>")]), "<div/>");
}

#[test]
fn comments_and_doctype_are_skipped() {
    assert_eq!(
        render(vec![text("<!DOCTYPE html><p>a<!-- note -->b</p>")]),
        "<p>ab</p>"
    );
}

#[test]
fn character_references_are_decoded() {
    let node = htm::html(vec![text("<p title=\"&quot;q&quot;\">a &amp; b &#60; &#x3E;</p>")]).unwrap();
    assert_eq!(texts(&node.children), vec!["a & b < >"]);
    assert_eq!(node.attrs.get("title"), Some(&AttrValue::Text("\"q\"".to_string())));
    assert_eq!(node.to_string(), "<p title=\"&quot;q&quot;\">a &amp; b &lt; &gt;</p>");
}

#[test]
fn names_are_lowercased() {
    assert_eq!(render(vec![text("<DIV ID=\"a\">x</Div>")]), r#"<div id="a">x</div>"#);
}

#[test]
fn dangling_placeholder() {
    let ast = AstNode {
        tag: Some("p".to_string()),
        attrs: Vec::new(),
        children: vec![AstChild::Text("x$5x".to_string())],
    };
    let items = vec![text("<p>")];
    assert_eq!(
        Fill::new(&items).interpolate(&ast).unwrap_err(),
        HtmlError::DanglingPlaceholder(5)
    );
}

#[test]
fn nesting_limit() {
    let mut value = Value::from("x");
    for _ in 0..300 {
        value = Value::List(vec![value]);
    }
    let err = htm::html!("<p>" {value} "</p>").unwrap_err();
    assert_eq!(err, HtmlError::NestingTooDeep(htm::convert::MAX_DEPTH));
}

#[test]
fn unbounded_iterator_is_cut_off() {
    let forever = Value::iter(std::iter::repeat("a"));
    let err = htm::html!("<p>" {forever} "</p>").unwrap_err();
    assert_eq!(err, HtmlError::TooManyValues(htm::convert::MAX_ITEMS));
}

#[test]
fn original_demo_document() {
    let x = Value::from([("bar", 42)]);
    let y = "abc";
    let my_component = my_component();
    let template = t!(
        "<html><head><title>Test</title></head>"
        "<body><h1 class=\"foo\" " {x} ">Parse " {y} "</h1>"
        "<" {my_component} " baz=\"bar\"><p>Extra</p><//>"
        "</body></html>"
    );
    let node = htm::html_template(&template).unwrap();
    assert_eq!(
        node.to_string(),
        concat!(
            "<html><head><title>Test</title></head>",
            "<body><h1 class=\"foo\" bar=\"42\">Parse abc</h1>",
            "<div class=\"custom\" baz=\"bar\">My component<p>Extra</p></div>",
            "</body></html>"
        )
    );
}
