pub mod ast;
pub mod builder;
pub mod convert;
pub mod error;
pub mod fill;
pub mod placeholder;
pub mod tokenizer;

pub use ast::{AstChild, AstNode};
pub use builder::AstBuilder;
pub use error::HtmlError;
pub use fill::{Fill, MergePolicy};

use tagstr::{HtmlNode, Item, Template};

#[doc(hidden)]
pub use tagstr as __tagstr;

/// Build and resolve HTML from template items, fed in order.
///
/// Items are used as given: marker indices are positions in `items`.
pub fn html(items: impl IntoIterator<Item = Item>) -> Result<HtmlNode, HtmlError> {
    let items: Vec<Item> = items.into_iter().collect();
    render(&items, MergePolicy::default())
}

pub fn html_template(template: &Template) -> Result<HtmlNode, HtmlError> {
    render(template.items(), MergePolicy::default())
}

pub fn html_template_with(
    template: &Template,
    merge_policy: MergePolicy,
) -> Result<HtmlNode, HtmlError> {
    render(template.items(), merge_policy)
}

/// Parse the items into an AST without resolving it.
pub fn parse(items: &[Item]) -> Result<AstNode, HtmlError> {
    let mut builder = AstBuilder::new();
    for item in items {
        builder.feed(item)?;
    }
    builder.result()
}

fn render(items: &[Item], merge_policy: MergePolicy) -> Result<HtmlNode, HtmlError> {
    let ast = parse(items)?;
    Fill::new(items)
        .with_merge_policy(merge_policy)
        .interpolate(&ast)
}

/// `html!("<p>Hello " {name} "</p>")`: build a template with
/// [`tagstr::t!`] and resolve it.
///
/// ```
/// let name = "World";
/// let node = htm::html!("<p>Hello " {name} "</p>").unwrap();
/// assert_eq!(node.to_string(), "<p>Hello World</p>");
/// ```
#[macro_export]
macro_rules! html {
    ($($part:tt)*) => {
        $crate::html_template(&$crate::__tagstr::t!($($part)*))
    };
}
