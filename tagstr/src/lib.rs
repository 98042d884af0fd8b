pub mod dom;
pub mod format;
pub mod interpolation;
pub mod parser;
pub mod template;
pub mod value;

pub use dom::{AttrValue, Child, HtmlNode};
pub use format::{FormatError, format_value};
pub use interpolation::{Conversion, EagerInterpolation, Interpolation, LazyInterpolation};
pub use template::{Item, Template, TextChunk};
pub use value::{Value, ValueMap};

/// Build a [`Template`] from string literals and `{expr}` groups.
///
/// ```
/// let name = "World";
/// let template = tagstr::t!("<p>Hello " {name} "</p>");
/// assert_eq!(template.source(), vec!["<p>Hello ", "</p>"]);
/// assert_eq!(template.exprs(), vec!["name"]);
/// ```
///
/// Each `{expr}` becomes an eager interpolation whose `expr()` is the
/// expression's source text.
#[macro_export]
macro_rules! t {
    ($($part:tt)*) => {{
        #[allow(unused_mut)]
        let mut items: ::std::vec::Vec<$crate::template::Item> = ::std::vec::Vec::new();
        $( $crate::__t_part!(items, $part); )*
        $crate::template::Template::new(items)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __t_part {
    ($items:ident, { $expr:expr }) => {
        $items.push($crate::template::Item::interpolation(
            $crate::interpolation::EagerInterpolation::new(stringify!($expr), $expr),
        ));
    };
    ($items:ident, $text:literal) => {
        $items.push($crate::template::Item::Text(
            $crate::template::TextChunk::new($text),
        ));
    };
}
