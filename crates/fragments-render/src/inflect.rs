//! Name inflection for template identifiers.

use deunicode::deunicode;

/// Converts a camel-cased word into a lowercase, underscored identifier.
///
/// An underscore is inserted before every uppercase letter that follows
/// another word character, so acronyms are split letter by letter. Non-ASCII
/// text is transliterated first, and anything that is not an ASCII letter,
/// digit or underscore becomes `_`, so the result is always safe to use as a
/// file name.
///
/// # Example
///
/// ```rust
/// use fragments_render::underscore;
///
/// assert_eq!(underscore("smallList"), "small_list");
/// assert_eq!(underscore("TagCloud"), "tag_cloud");
/// assert_eq!(underscore("top-rated"), "top_rated");
/// assert_eq!(underscore("already_done"), "already_done");
/// ```
pub fn underscore(word: &str) -> String {
    let ascii = deunicode(word);
    let mut result = String::with_capacity(ascii.len() + 4);

    for c in ascii.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        };
        if c.is_ascii_uppercase() && !result.is_empty() {
            result.push('_');
        }
        result.push(c.to_ascii_lowercase());
    }

    result
}

/// Normalizes a template name the way views expect it.
///
/// Plain names are underscored; names containing a path separator are
/// returned verbatim.
///
/// ```rust
/// use fragments_render::template_name;
///
/// assert_eq!(template_name("smallList"), "small_list");
/// assert_eq!(template_name("Shared/smallList"), "Shared/smallList");
/// ```
pub fn template_name(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        underscore(name)
    }
}
