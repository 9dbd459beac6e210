//! Property value validation for inline styles.
//!
//! Colors and lengths are checked against their grammar; any other property
//! accepts a non-empty value that lexes cleanly.

use super::tokenizer::{tokenize_strict, Token};

/// CSS-wide keywords valid for every property.
const GLOBAL_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

/// Units accepted in a `<length>`.
const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "q", "in", "pt", "pc",
    "lh", "rlh", "svw", "svh", "lvw", "lvh", "dvw", "dvh",
];

/// Absolute and relative `font-size` keywords.
const FONT_SIZE_KEYWORDS: &[&str] = &[
    "xx-small", "x-small", "small", "medium", "large", "x-large", "xx-large", "xxx-large",
    "smaller", "larger",
];

/// Color functions accepted as a color value.
const COLOR_FUNCTIONS: &[&str] = &["rgb(", "rgba(", "hsl(", "hsla(", "hwb(", "lab(", "lch("];

/// Named colors from CSS Color Module Level 4.
const NAMED_COLORS: &[&str] = &[
    "aliceblue", "antiquewhite", "aqua", "aquamarine", "azure", "beige", "bisque", "black",
    "blanchedalmond", "blue", "blueviolet", "brown", "burlywood", "cadetblue", "chartreuse",
    "chocolate", "coral", "cornflowerblue", "cornsilk", "crimson", "cyan", "darkblue",
    "darkcyan", "darkgoldenrod", "darkgray", "darkgreen", "darkgrey", "darkkhaki",
    "darkmagenta", "darkolivegreen", "darkorange", "darkorchid", "darkred", "darksalmon",
    "darkseagreen", "darkslateblue", "darkslategray", "darkslategrey", "darkturquoise",
    "darkviolet", "deeppink", "deepskyblue", "dimgray", "dimgrey", "dodgerblue", "firebrick",
    "floralwhite", "forestgreen", "fuchsia", "gainsboro", "ghostwhite", "gold", "goldenrod",
    "gray", "green", "greenyellow", "grey", "honeydew", "hotpink", "indianred", "indigo",
    "ivory", "khaki", "lavender", "lavenderblush", "lawngreen", "lemonchiffon", "lightblue",
    "lightcoral", "lightcyan", "lightgoldenrodyellow", "lightgray", "lightgreen", "lightgrey",
    "lightpink", "lightsalmon", "lightseagreen", "lightskyblue", "lightslategray",
    "lightslategrey", "lightsteelblue", "lightyellow", "lime", "limegreen", "linen", "magenta",
    "maroon", "mediumaquamarine", "mediumblue", "mediumorchid", "mediumpurple",
    "mediumseagreen", "mediumslateblue", "mediumspringgreen", "mediumturquoise",
    "mediumvioletred", "midnightblue", "mintcream", "mistyrose", "moccasin", "navajowhite",
    "navy", "oldlace", "olive", "olivedrab", "orange", "orangered", "orchid", "palegoldenrod",
    "palegreen", "paleturquoise", "palevioletred", "papayawhip", "peachpuff", "peru", "pink",
    "plum", "powderblue", "purple", "rebeccapurple", "red", "rosybrown", "royalblue",
    "saddlebrown", "salmon", "sandybrown", "seagreen", "seashell", "sienna", "silver",
    "skyblue", "slateblue", "slategray", "slategrey", "snow", "springgreen", "steelblue",
    "tan", "teal", "thistle", "tomato", "turquoise", "violet", "wheat", "white", "whitesmoke",
    "yellow", "yellowgreen", "transparent", "currentcolor",
];

/// The value grammar a property is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    /// Up to `max` space-separated lengths.
    Length { max: usize, auto: bool },
    FontSize,
    /// Lengths or unitless numbers.
    LineHeight,
    Any,
}

impl ValueKind {
    /// Classify a (lowercase) property name.
    pub fn of(property: &str) -> Self {
        if property.starts_with("--") {
            return Self::Any;
        }
        if property == "color" || property.ends_with("-color") {
            return Self::Color;
        }
        match property {
            "font-size" => Self::FontSize,
            "line-height" => Self::LineHeight,
            "margin" | "inset" => Self::Length { max: 4, auto: true },
            "padding" | "border-width" | "border-radius" => Self::Length { max: 4, auto: false },
            "gap" => Self::Length { max: 2, auto: false },
            "width" | "height" | "min-width" | "min-height" | "max-width" | "max-height" | "top"
            | "right" | "bottom" | "left" | "flex-basis" | "letter-spacing" | "word-spacing"
            | "text-indent" => Self::Length { max: 1, auto: true },
            p if p.starts_with("margin-") => Self::Length { max: 1, auto: true },
            p if p.starts_with("padding-")
                || p.ends_with("-gap")
                || (p.starts_with("border-") && (p.ends_with("-width") || p.ends_with("-radius"))) =>
            {
                Self::Length { max: 1, auto: false }
            }
            _ => Self::Any,
        }
    }
}

/// Whether `value` is acceptable for `property`.
pub fn is_valid(property: &str, value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() {
        return false;
    }
    let Some(tokens) = tokenize_strict(value) else {
        return false;
    };
    if tokens.is_empty() || !balanced(&tokens) {
        return false;
    }
    if let [(Token::Ident, word)] = tokens.as_slice() {
        if GLOBAL_KEYWORDS.contains(&word.to_ascii_lowercase().as_str()) {
            return true;
        }
    }
    // `calc()`/`var()` are accepted wherever a typed value is expected.
    if tokens.first().is_some_and(|(t, text)| {
        *t == Token::Function && matches!(text.to_ascii_lowercase().as_str(), "calc(" | "var(" | "env(")
    }) {
        return true;
    }

    match ValueKind::of(property) {
        ValueKind::Color => is_color(&tokens),
        ValueKind::Length { max, auto } => {
            (1..=max).contains(&tokens.len())
                && tokens.iter().all(|(t, text)| is_length(*t, text, auto))
        }
        ValueKind::FontSize => match tokens.as_slice() {
            [(Token::Ident, word)] => FONT_SIZE_KEYWORDS.contains(&word.to_ascii_lowercase().as_str()),
            [(t, text)] => is_length(*t, text, false),
            _ => false,
        },
        ValueKind::LineHeight => match tokens.as_slice() {
            [(Token::Ident, word)] => word.eq_ignore_ascii_case("normal"),
            [(Token::Number, _)] => true,
            [(t, text)] => is_length(*t, text, false),
            _ => false,
        },
        ValueKind::Any => true,
    }
}

fn balanced(tokens: &[(Token, String)]) -> bool {
    let mut depth = 0usize;
    for (token, _) in tokens {
        match token {
            Token::Function | Token::ParenOpen => depth += 1,
            Token::ParenClose => {
                let Some(d) = depth.checked_sub(1) else {
                    return false;
                };
                depth = d;
            }
            _ => {}
        }
    }
    depth == 0
}

fn is_color(tokens: &[(Token, String)]) -> bool {
    match tokens {
        [(Token::Ident, word)] => NAMED_COLORS.contains(&word.to_ascii_lowercase().as_str()),
        [(Token::HexColor, hex)] => matches!(hex.len() - 1, 3 | 4 | 6 | 8),
        [(Token::Function, name), args @ .., (Token::ParenClose, _)] => {
            COLOR_FUNCTIONS.contains(&name.to_ascii_lowercase().as_str())
                && !args.is_empty()
                && args.iter().all(|(t, text)| {
                    matches!(
                        t,
                        Token::Number | Token::Percentage | Token::Comma | Token::Slash
                    ) || (*t == Token::Dimension && is_angle(text))
                        || (*t == Token::Ident && text.eq_ignore_ascii_case("none"))
                })
        }
        _ => false,
    }
}

fn is_angle(text: &str) -> bool {
    let unit = unit_of(text);
    ["deg", "rad", "grad", "turn"].contains(&unit.as_str())
}

fn is_length(token: Token, text: &str, auto: bool) -> bool {
    match token {
        Token::Dimension => LENGTH_UNITS.contains(&unit_of(text).as_str()),
        Token::Percentage => true,
        Token::Number => text.parse::<f64>().is_ok_and(|n| n == 0.0),
        Token::Ident => auto && text.eq_ignore_ascii_case("auto"),
        _ => false,
    }
}

fn unit_of(text: &str) -> String {
    text.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '+' | '-'))
        .to_ascii_lowercase()
}
