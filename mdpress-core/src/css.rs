//! A small CSS cascade for the stylesheets the pipeline ships
//!
//! Supports type, class, id, universal and attribute selectors joined by descendant or child
//! combinators. Rules using pseudo-classes, sibling combinators or at-rules are skipped rather
//! than approximated. Declarations are applied by specificity, then source order; `!important`
//! is accepted and ignored.

use crate::dom;
use markup5ever_rcdom::Handle;
use once_cell::sync::Lazy;
use regex::Regex;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, node: &Handle) -> bool {
        let Some(tag) = dom::tag_name(node) else {
            return false;
        };
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(&tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if dom::get_attr(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|class| dom::has_class(node, class)) {
            return false;
        }
        self.attrs.iter().all(|(name, value)| match value {
            Some(expected) => dom::get_attr(node, name).as_deref() == Some(expected.as_str()),
            None => dom::has_attr(node, name),
        })
    }
}

/// A complex selector; `parts[i].1` is the combinator linking part `i` to part `i - 1`
#[derive(Debug, Clone, PartialEq)]
struct Selector {
    parts: Vec<(Compound, Combinator)>,
    specificity: (u32, u32, u32),
}

impl Selector {
    fn parse(source: &str) -> Option<Selector> {
        if source.contains([':', '+', '~']) || source.trim().is_empty() {
            return None;
        }
        let spaced = source.replace('>', " > ");
        let mut parts = Vec::new();
        let mut pending = Combinator::Descendant;
        for token in spaced.split_whitespace() {
            if token == ">" {
                if parts.is_empty() {
                    return None;
                }
                pending = Combinator::Child;
                continue;
            }
            parts.push((parse_compound(token)?, pending));
            pending = Combinator::Descendant;
        }
        if parts.is_empty() || pending == Combinator::Child {
            return None;
        }
        let specificity = parts.iter().fold((0, 0, 0), |(a, b, c), (part, _)| {
            (
                a + part.id.is_some() as u32,
                b + (part.classes.len() + part.attrs.len()) as u32,
                c + part.tag.is_some() as u32,
            )
        });
        Some(Selector { parts, specificity })
    }

    fn matches(&self, node: &Handle) -> bool {
        self.matches_at(node, self.parts.len() - 1)
    }

    fn matches_at(&self, node: &Handle, index: usize) -> bool {
        let (compound, combinator) = &self.parts[index];
        if !compound.matches(node) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => dom::parent(node)
                .map(|parent| self.matches_at(&parent, index - 1))
                .unwrap_or(false),
            Combinator::Descendant => {
                let mut current = dom::parent(node);
                while let Some(ancestor) = current {
                    if self.matches_at(&ancestor, index - 1) {
                        return true;
                    }
                    current = dom::parent(&ancestor);
                }
                false
            }
        }
    }
}

fn parse_compound(token: &str) -> Option<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;
    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '-' || chars[end] == '_') {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    while i < chars.len() {
        match chars[i] {
            '*' => i += 1,
            '.' => {
                let (ident, end) = read_ident(i + 1);
                if ident.is_empty() {
                    return None;
                }
                compound.classes.push(ident);
                i = end;
            }
            '#' => {
                let (ident, end) = read_ident(i + 1);
                if ident.is_empty() {
                    return None;
                }
                compound.id = Some(ident);
                i = end;
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']')? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let attr = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim().to_string(),
                        Some(value.trim().trim_matches(['"', '\'']).to_string()),
                    ),
                    None => (inner.trim().to_string(), None),
                };
                if attr.0.is_empty() || attr.0.ends_with(['^', '$', '*', '~', '|']) {
                    return None;
                }
                compound.attrs.push(attr);
                i = close + 1;
            }
            c if c.is_alphabetic() && i == 0 => {
                let (ident, end) = read_ident(i);
                compound.tag = Some(ident.to_ascii_lowercase());
                i = end;
            }
            _ => return None,
        }
    }
    Some(compound)
}

#[derive(Debug, Clone)]
struct Rule {
    selector: Selector,
    order: usize,
    declarations: Vec<Declaration>,
}

/// Parsed rules from one or more style sheets
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn parse(source: &str) -> Self {
        let mut sheet = Stylesheet::default();
        sheet.add_source(source);
        sheet
    }

    /// Append rules from another sheet; later sources win ties
    pub fn add_source(&mut self, source: &str) {
        let cleaned = COMMENT.replace_all(source, "");
        let mut rest: &str = &cleaned;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let Some(close) = rest[open..].find('}').map(|offset| offset + open) else {
                break;
            };
            let prelude = &rest[..open];
            let declarations = parse_declarations(&rest[open + 1..close]);
            for selector in prelude.split(',').filter_map(Selector::parse) {
                let order = self.rules.len();
                self.rules.push(Rule {
                    selector,
                    order,
                    declarations: declarations.clone(),
                });
            }
            rest = &rest[close + 1..];
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations of every rule matching `node`, lowest precedence first
    pub fn matching_declarations(&self, node: &Handle) -> Vec<Declaration> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(node))
            .collect();
        matched.sort_by_key(|rule| (rule.selector.specificity, rule.order));
        matched
            .into_iter()
            .flat_map(|rule| rule.declarations.iter().cloned())
            .collect()
    }
}

fn skip_at_rule(source: &str) -> &str {
    let semicolon = source.find(';');
    let brace = source.find('{');
    match (semicolon, brace) {
        (Some(semi), Some(open)) if semi < open => &source[semi + 1..],
        (_, Some(open)) => {
            let mut depth = 0usize;
            for (offset, ch) in source[open..].char_indices() {
                match ch {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return &source[open + offset + 1..];
                        }
                    }
                    _ => {}
                }
            }
            ""
        }
        (Some(semi), None) => &source[semi + 1..],
        (None, None) => "",
    }
}

/// Parse a declaration block (`a: b; c: d`), dropping `!important`
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut pieces = Vec::new();
    for (index, ch) in block.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                pieces.push(&block[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    pieces.push(&block[start..]);

    for piece in pieces {
        let Some((property, value)) = piece.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = strip_important(value.trim());
        if property.is_empty() || value.is_empty() {
            continue;
        }
        declarations.push(Declaration {
            property,
            value: value.to_string(),
        });
    }
    declarations
}

/// Drops a trailing `!important`, which may be spaced or in any case
fn strip_important(value: &str) -> &str {
    match value.rfind('!') {
        Some(bang) if value[bang + 1..].trim().eq_ignore_ascii_case("important") => {
            value[..bang].trim_end()
        }
        _ => value,
    }
}
