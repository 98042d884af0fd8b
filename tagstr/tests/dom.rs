use indexmap::IndexMap;
use tagstr::dom::{Declarations, escape};
use tagstr::{AttrValue, Child, HtmlNode, Value};

#[test]
fn element_with_attrs_and_children() {
    let node = HtmlNode::new("p")
        .with_attr("class", "x")
        .with_attr("tabindex", 2i64)
        .with_child("a < b")
        .with_child(HtmlNode::new("br"));
    assert_eq!(node.to_string(), r#"<p class="x" tabindex="2">a &lt; b<br/></p>"#);
}

#[test]
fn boolean_attributes_render_bare_keys() {
    let node = HtmlNode::new("input")
        .with_attr("disabled", true)
        .with_attr("hidden", false);
    assert_eq!(node.to_string(), "<input disabled hidden/>");
}

#[test]
fn attribute_values_are_escaped() {
    let node = HtmlNode::new("a").with_attr("title", r#"say "hi" & 'bye'"#);
    assert_eq!(
        node.to_string(),
        r#"<a title="say &quot;hi&quot; &amp; &#x27;bye&#x27;"/>"#
    );
}

#[test]
fn style_declarations() {
    let mut style = Declarations::new();
    style.insert("color".into(), "red".into());
    style.insert("content".into(), "\"x\"".into());
    let node = HtmlNode::new("p").with_attr("style", style).with_child("hi");
    assert_eq!(
        node.to_string(),
        r#"<p style="color: red; content: &quot;x&quot;">hi</p>"#
    );
}

#[test]
fn fragment_renders_children_only() {
    let node = HtmlNode::fragment(vec![
        Child::from(HtmlNode::new("p").with_child("a")),
        Child::from("&"),
    ]);
    assert!(node.is_fragment());
    assert_eq!(node.to_string(), "<p>a</p>&amp;");
}

#[test]
fn text_content_is_unescaped() {
    let node = HtmlNode::new("div")
        .with_child("a & ")
        .with_child(HtmlNode::new("b").with_child("b"));
    assert_eq!(node.text_content(), "a & b");
}

#[test]
fn escape_covers_html_specials() {
    assert_eq!(escape("<a href='x'>&\"</a>"), "&lt;a href=&#x27;x&#x27;&gt;&amp;&quot;&lt;/a&gt;");
}

#[test]
fn attribute_order_is_kept() {
    let node = HtmlNode::new("i")
        .with_attr("z", "1")
        .with_attr("a", "2")
        .with_attr("m", AttrValue::Int(3));
    assert_eq!(node.to_string(), r#"<i z="1" a="2" m="3"/>"#);
}

#[test]
fn value_display_and_repr() {
    assert_eq!(Value::from(2.0).to_string(), "2.0");
    assert_eq!(Value::from(2.5).to_string(), "2.5");
    assert_eq!(Value::from("s").to_string(), "s");
    assert_eq!(Value::from("s").repr(), "\"s\"");
    assert_eq!(Value::from(vec!["a", "b"]).repr(), "[\"a\", \"b\"]");
    assert_eq!(Value::from([("k", 1)]).repr(), "{\"k\": 1}");
    assert_eq!(Value::from(vec![1]).type_name(), "list");
}

#[test]
fn value_lookup() {
    let value = Value::from([("items", Value::from(vec![10, 20]))]);
    assert_eq!(value.lookup("items.1"), Some(&Value::Int(20)));
    assert_eq!(value.lookup("items.5"), None);
    assert_eq!(value.lookup("other"), None);
}

#[test]
fn iterator_clones_share_progress() {
    let value = Value::iter(vec![1, 2, 3]);
    let Value::Iter(first) = value.clone() else {
        panic!("expected an iterator");
    };
    let Value::Iter(second) = value else {
        panic!("expected an iterator");
    };
    assert_eq!(first.next_value(), Some(Value::Int(1)));
    assert_eq!(second.next_value(), Some(Value::Int(2)));
    assert_eq!(first, second);
}

#[test]
fn component_is_called_on_demand() {
    let component = Value::component("Badge", || HtmlNode::new("span").into());
    let Value::Component(component) = component else {
        panic!("expected a component");
    };
    assert_eq!(component.name(), "Badge");
    assert_eq!(component.call(), Value::Html(HtmlNode::new("span")));
}

#[test]
fn ordered_maps_convert() {
    let mut map: IndexMap<String, Value> = IndexMap::new();
    map.insert("b".into(), Value::from(1));
    map.insert("a".into(), Value::from(2));
    let Value::Map(map) = Value::from(map) else {
        panic!("expected a map");
    };
    assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
}
