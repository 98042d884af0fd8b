use htm::placeholder::{self, Segment};
use htm::tokenizer::{Token, Tokenizer, decode_entities};

fn start(name: &str, attrs: &[(&str, Option<&str>)], self_closing: bool) -> Token {
    Token::StartTag {
        name: name.to_string(),
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect(),
        self_closing,
    }
}

fn end(name: &str) -> Token {
    Token::EndTag {
        name: name.to_string(),
    }
}

fn text(s: &str) -> Token {
    Token::Text(s.to_string())
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = tokenizer.feed(input);
    tokens.extend(tokenizer.close());
    tokens
}

#[test]
fn placeholder_escape_round_trip() {
    for sample in ["", "plain", "$", "$$", "cost: $5", "x$1x", "a$$$b"] {
        assert_eq!(placeholder::unescape(&placeholder::escape(sample)), sample);
    }
}

#[test]
fn placeholder_markers() {
    assert_eq!(placeholder::marker(12), "x$12x");
    assert_eq!(placeholder::marker_index("x$12x"), Some(12));
    assert_eq!(placeholder::marker_index("x$12x "), None);
    assert_eq!(placeholder::marker_index("x$$12x"), None);
}

#[test]
fn placeholder_split_interleaves() {
    let escaped = format!(
        "{}{}{}{}",
        placeholder::escape("a $ b "),
        placeholder::marker(1),
        placeholder::marker(3),
        placeholder::escape(" x$9x")
    );
    assert_eq!(
        placeholder::split(&escaped),
        vec![
            Segment::Literal("a $ b ".to_string()),
            Segment::Marker(1),
            Segment::Marker(3),
            Segment::Literal(" x$9x".to_string()),
        ]
    );
}

#[test]
fn placeholder_substitute() {
    let recovered = placeholder::substitute("hx$1x-x$2x", |i| format!("{{e{}}}", i));
    assert_eq!(recovered, "h{e1}-{e2}");
}

#[test]
fn simple_document() {
    assert_eq!(
        tokenize("<div class=\"a\">Hi</div>"),
        vec![start("div", &[("class", Some("a"))], false), text("Hi"), end("div")]
    );
}

#[test]
fn attribute_forms() {
    assert_eq!(
        tokenize("<input a b=\"\" c='1' d=2 E = \"3\">"),
        vec![start(
            "input",
            &[
                ("a", None),
                ("b", Some("")),
                ("c", Some("1")),
                ("d", Some("2")),
                ("e", Some("3"))
            ],
            false
        )]
    );
}

#[test]
fn self_closing_and_generic_close() {
    assert_eq!(
        tokenize("<br/><x$1x><//>"),
        vec![start("br", &[], true), start("x$1x", &[], false), Token::GenericClose]
    );
}

#[test]
fn markup_split_across_feeds() {
    let mut tokenizer = Tokenizer::new();
    assert_eq!(tokenizer.feed("<a hr"), vec![]);
    assert_eq!(tokenizer.feed("ef=\"/x"), vec![]);
    assert_eq!(
        tokenizer.feed("\">go</"),
        vec![start("a", &[("href", Some("/x"))], false), text("go")]
    );
    assert_eq!(tokenizer.feed("a>"), vec![end("a")]);
    assert_eq!(tokenizer.close(), vec![]);
}

#[test]
fn text_is_emitted_per_feed() {
    let mut tokenizer = Tokenizer::new();
    assert_eq!(tokenizer.feed("<p>Hello "), vec![start("p", &[], false), text("Hello ")]);
    assert_eq!(tokenizer.feed("x$1x"), vec![text("x$1x")]);
}

#[test]
fn partial_entity_waits() {
    let mut tokenizer = Tokenizer::new();
    assert_eq!(tokenizer.feed("a &am"), vec![text("a ")]);
    assert_eq!(tokenizer.feed("p; b"), vec![text("& b")]);
}

#[test]
fn incomplete_markup_flushes_as_text_on_close() {
    let mut tokenizer = Tokenizer::new();
    assert_eq!(tokenizer.feed("a <b"), vec![text("a ")]);
    assert_eq!(tokenizer.close(), vec![text("<b")]);
}

#[test]
fn literal_less_than() {
    assert_eq!(tokenize("1 < 2"), vec![text("1 "), text("< 2")]);
}

#[test]
fn comments_and_declarations_are_dropped() {
    assert_eq!(
        tokenize("<!doctype html><?xml x?><!-- <p> -->a</>"),
        vec![text("a")]
    );
}

#[test]
fn script_is_raw_text() {
    assert_eq!(
        tokenize("<script>if (a < b && c) {}</SCRIPT>"),
        vec![
            start("script", &[], false),
            text("if (a < b && c) {}"),
            end("script")
        ]
    );
}

#[test]
fn entities() {
    assert_eq!(decode_entities("&lt;&gt;&amp;&quot;&apos;&#65;&#x42;"), "<>&\"'AB");
    assert_eq!(decode_entities("&nbsp;"), "\u{a0}");
    assert_eq!(decode_entities("AT&T &unknown; &"), "AT&T &unknown; &");
    assert_eq!(decode_entities("&#0;"), "\u{fffd}");
}
