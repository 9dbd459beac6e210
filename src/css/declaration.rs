//! Inline style declaration block: the parsed form of a `style` attribute.

use indexmap::IndexMap;

use super::value::is_valid;

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub value: String,
    pub important: bool,
}

/// An ordered set of validated declarations.
///
/// Invalid values never enter the block: [`StyleDeclaration::set_property`]
/// ignores them and [`StyleDeclaration::parse`] drops them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclaration {
    entries: IndexMap<String, Declaration>,
}

impl StyleDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration list such as `color: red; font-size: 4px`.
    ///
    /// Malformed or invalid declarations are skipped. A later declaration
    /// of the same property replaces an earlier one.
    pub fn parse(css_text: &str) -> Self {
        let mut style = Self::new();
        for chunk in split_declarations(css_text) {
            let Some((name, value)) = chunk.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            if name.is_empty() {
                continue;
            }
            let (value, important) = strip_important(value.trim());
            if is_valid(&name, value) {
                style.entries.insert(
                    name,
                    Declaration {
                        value: value.to_owned(),
                        important,
                    },
                );
            }
        }
        style
    }

    /// Serialized form: `color: red; font-size: 4px;`.
    pub fn css_text(&self) -> String {
        self.entries
            .iter()
            .map(|(name, d)| {
                if d.important {
                    format!("{name}: {} !important;", d.value)
                } else {
                    format!("{name}: {};", d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace every declaration with the parsed `css_text`.
    pub fn set_css_text(&mut self, css_text: &str) {
        *self = Self::parse(css_text);
    }

    /// Value of a property, or `""` when absent.
    pub fn get_property_value(&self, name: &str) -> &str {
        self.entries
            .get(&name.trim().to_ascii_lowercase())
            .map(|d| d.value.as_str())
            .unwrap_or("")
    }

    /// Set a property. An empty value removes it; an invalid value is ignored.
    ///
    /// Returns `true` if the block changed.
    pub fn set_property(&mut self, name: &str, value: &str) -> bool {
        let name = name.trim().to_ascii_lowercase();
        let (value, important) = strip_important(value.trim());
        if value.is_empty() {
            return self.remove_property(&name).is_some();
        }
        if !is_valid(&name, value) {
            return false;
        }
        let declaration = Declaration {
            value: value.to_owned(),
            important,
        };
        if self.entries.get(&name) == Some(&declaration) {
            return false;
        }
        self.entries.insert(name, declaration);
        true
    }

    /// Remove a property, returning its old value.
    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        self.entries
            .shift_remove(&name.trim().to_ascii_lowercase())
            .map(|d| d.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(property, declaration)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Declaration)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn strip_important(value: &str) -> (&str, bool) {
    let lower = value.to_ascii_lowercase();
    match lower.strip_suffix("!important") {
        Some(rest) => (value[..rest.len()].trim_end(), true),
        None => (value, false),
    }
}

/// Split on `;` outside of quotes and parentheses.
fn split_declarations(css_text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in css_text.char_indices() {
        match (quote, c) {
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&css_text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&css_text[start..]);
    parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_drops_invalid_declarations() {
        let style = StyleDeclaration::parse("color:unknowncolor;font-size:4px");
        assert_eq!(style.get_property_value("color"), "");
        assert_eq!(style.get_property_value("font-size"), "4px");
        assert_eq!(style.len(), 1);
    }

    #[test]
    fn parse_empty_values() {
        let style = StyleDeclaration::parse("color:;font-size:px");
        assert!(style.is_empty());
        assert_eq!(style.css_text(), "");
    }

    #[test]
    fn later_declaration_wins() {
        let style = StyleDeclaration::parse("color: red; color: blue");
        assert_eq!(style.get_property_value("color"), "blue");
    }

    #[test]
    fn css_text_roundtrip() {
        let style = StyleDeclaration::parse("Color: red;  margin: 0 auto ; ");
        assert_eq!(style.css_text(), "color: red; margin: 0 auto;");
        assert_eq!(StyleDeclaration::parse(&style.css_text()), style);
    }

    #[test]
    fn important_flag() {
        let style = StyleDeclaration::parse("color: red !important");
        assert_eq!(style.get_property_value("color"), "red");
        assert_eq!(style.css_text(), "color: red !important;");
    }

    #[test]
    fn semicolons_inside_strings_and_functions() {
        let style = StyleDeclaration::parse(r#"content: "a;b"; background-image: url(x;y)"#);
        assert_eq!(style.get_property_value("content"), "\"a;b\"");
        assert_eq!(style.len(), 2);
    }

    #[test]
    fn set_property_ignores_invalid_values() {
        let mut style = StyleDeclaration::new();
        assert!(style.set_property("color", "red"));
        assert!(!style.set_property("color", "unknowncolor"));
        assert_eq!(style.get_property_value("color"), "red");
        assert!(!style.set_property("font-size", "NaNpx"));
        assert_eq!(style.get_property_value("font-size"), "");
    }

    #[test]
    fn set_property_empty_removes() {
        let mut style = StyleDeclaration::parse("color: red");
        assert!(style.set_property("color", ""));
        assert!(style.is_empty());
        assert!(!style.set_property("color", ""));
    }

    #[test]
    fn set_property_unchanged_reports_false() {
        let mut style = StyleDeclaration::parse("color: red");
        assert!(!style.set_property("color", "red"));
    }
}
