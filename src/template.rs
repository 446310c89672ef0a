//! Operator text patterns.
//!
//! A pattern is literal text with argument slots:
//!
//! | slot        | rendering                                                   |
//! |-------------|-------------------------------------------------------------|
//! | `{0}`       | the argument, visited normally                              |
//! | `{0s}`      | a constant argument inlined as raw text                     |
//! | `{0l}`      | lower-cased: constants are bound lower-cased, others wrapped|
//! | `{0u}`      | upper-cased, like `{0l}`                                    |
//! | `{%0}`      | LIKE suffix match (`%` prepended after escaping)            |
//! | `{0%}`      | LIKE prefix match                                           |
//! | `{%0%}`     | LIKE containment                                            |
//! | `{%%0%%}`   | lower-cased containment, `%%` works on either side alone    |
//! | `{*}`       | every argument, comma separated                             |
//!
//! `{{` and `}}` stand for literal braces.

use std::{fmt, sync::Arc};

use smol_str::SmolStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Case {
    Lower,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Text(SmolStr),
    Arg(usize),
    Inline(usize),
    Cased(usize, Case),
    Like {
        index: usize,
        leading: bool,
        trailing: bool,
        lower: bool,
    },
    All,
}

/// A parsed pattern; cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template {
    pattern: SmolStr,
    elements: Arc<[Element]>,
}

impl Template {
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidTemplate {
            pattern: SmolStr::new(pattern),
            reason,
        };

        let mut elements = Vec::new();
        let mut text = String::new();
        let mut chars = pattern.char_indices().peekable();

        while let Some((start, ch)) = chars.next() {
            match ch {
                '{' if matches!(chars.peek(), Some((_, '{'))) => {
                    chars.next();
                    text.push('{');
                }
                '}' if matches!(chars.peek(), Some((_, '}'))) => {
                    chars.next();
                    text.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                '{' => {
                    let body_start = start + 1;
                    let end = loop {
                        match chars.next() {
                            Some((index, '}')) => break index,
                            Some(_) => {}
                            None => return Err(invalid("unterminated '{'")),
                        }
                    };
                    let element = parse_slot(&pattern[body_start..end]).ok_or_else(|| invalid("malformed argument slot"))?;
                    if !text.is_empty() {
                        elements.push(Element::Text(SmolStr::new(&text)));
                        text.clear();
                    }
                    elements.push(element);
                }
                ch => text.push(ch),
            }
        }
        if !text.is_empty() {
            elements.push(Element::Text(SmolStr::new(&text)));
        }

        Ok(Self {
            pattern: SmolStr::new(pattern),
            elements: elements.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Highest argument slot referenced, `None` for argument-free patterns.
    pub fn max_index(&self) -> Option<usize> {
        self.elements
            .iter()
            .filter_map(|element| match element {
                Element::Arg(index)
                | Element::Inline(index)
                | Element::Cased(index, _)
                | Element::Like { index, .. } => Some(*index),
                Element::Text(_) | Element::All => None,
            })
            .max()
    }

    pub fn has_all(&self) -> bool {
        self.elements.iter().any(|element| matches!(element, Element::All))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

fn parse_slot(body: &str) -> Option<Element> {
    if body == "*" {
        return Some(Element::All);
    }

    let (leading, lower_leading, rest) = if let Some(rest) = body.strip_prefix("%%") {
        (true, true, rest)
    } else if let Some(rest) = body.strip_prefix('%') {
        (true, false, rest)
    } else {
        (false, false, body)
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let index: usize = rest[..digits].parse().ok()?;
    let suffix = &rest[digits..];

    let (trailing, lower_trailing) = match suffix {
        "%%" => (true, true),
        "%" => (true, false),
        _ => (false, false),
    };

    if leading || trailing {
        if !(trailing || suffix.is_empty()) {
            return None;
        }
        return Some(Element::Like {
            index,
            leading,
            trailing,
            lower: lower_leading || lower_trailing,
        });
    }

    match suffix {
        "" => Some(Element::Arg(index)),
        "s" => Some(Element::Inline(index)),
        "l" => Some(Element::Cased(index, Case::Lower)),
        "u" => Some(Element::Cased(index, Case::Upper)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slots() {
        let template = Template::parse("{0} like {%%1%%} escape '!'").unwrap();
        assert_eq!(
            &[
                Element::Arg(0),
                Element::Text(" like ".into()),
                Element::Like {
                    index: 1,
                    leading: true,
                    trailing: true,
                    lower: true
                },
                Element::Text(" escape '!'".into()),
            ],
            template.elements()
        );
        assert_eq!(Some(1), template.max_index());
    }

    #[test]
    fn test_modifiers() {
        let template = Template::parse("{0s}{1l}{2u}{%3}{4%}{5%%}{*}").unwrap();
        assert_eq!(
            &[
                Element::Inline(0),
                Element::Cased(1, Case::Lower),
                Element::Cased(2, Case::Upper),
                Element::Like {
                    index: 3,
                    leading: true,
                    trailing: false,
                    lower: false
                },
                Element::Like {
                    index: 4,
                    leading: false,
                    trailing: true,
                    lower: false
                },
                Element::Like {
                    index: 5,
                    leading: false,
                    trailing: true,
                    lower: true
                },
                Element::All,
            ],
            template.elements()
        );
        assert!(template.has_all());
    }

    #[test]
    fn test_brace_escapes() {
        let template = Template::parse("{{fn now()}}").unwrap();
        assert_eq!(&[Element::Text("{fn now()}".into())], template.elements());
        assert_eq!(None, template.max_index());
    }

    #[test]
    fn test_rejects_malformed() {
        for pattern in ["{0", "{}", "{x}", "{0q}", "a}b", "{%0s}"] {
            assert!(Template::parse(pattern).is_err(), "{pattern} should fail");
        }
    }
}
