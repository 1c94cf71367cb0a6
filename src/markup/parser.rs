//! Tokenizer and parser for report markup.
//!
//! Tags are found by scanning for `{{` / `}}`; block tags are matched with an
//! explicit stack rather than by recursion. Parsing
//! never fails: an unmatched `{{/if}}`, a stray `{{else}}`, an unknown block
//! tag or an unterminated `{{` is kept as literal text, and a block that is
//! never closed is flattened back into its opening tag followed by its body.
//!
//! Block nesting is capped. A block opened at the cap is kept as literal
//! text up to and including its matching close tag.

use lazy_static::lazy_static;
use regex::Regex;
use smallvec::SmallVec;

use crate::metrics::EvaluationMetrics;
use crate::value::Value;

use super::ast::{Arg, Expression, Node};

/// Default cap on nested `#if` / `#each` blocks
pub const DEFAULT_MAX_BLOCK_DEPTH: usize = 64;

lazy_static! {
    static ref NUMBER_LITERAL: Regex = Regex::new(r"^-?\d+(\.\d+)?$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Each,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Each => "each",
        }
    }
}

enum Tag<'a> {
    Open(BlockKind, &'a str),
    Close(BlockKind),
    Else,
    Partial(&'a str),
    Expression(&'a str),
    Unsupported,
}

fn block_argument<'a>(tag: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = tag.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn classify(inner: &str) -> Tag<'_> {
    let tag = inner.trim();
    if let Some(cond) = block_argument(tag, "#if") {
        return Tag::Open(BlockKind::If, cond);
    }
    if let Some(path) = block_argument(tag, "#each") {
        return Tag::Open(BlockKind::Each, path);
    }
    match tag {
        "/if" => Tag::Close(BlockKind::If),
        "/each" => Tag::Close(BlockKind::Each),
        "else" => Tag::Else,
        _ if tag.starts_with('>') => Tag::Partial(tag[1..].trim()),
        _ if tag.starts_with('#') || tag.starts_with('/') => Tag::Unsupported,
        _ => Tag::Expression(tag),
    }
}

/// An open block awaiting its closing tag
struct Frame {
    kind: BlockKind,
    open_raw: String,
    expr: Expression,
    primary: Vec<Node>,
    else_raw: Option<String>,
    alternate: Vec<Node>,
}

impl Frame {
    fn new(kind: BlockKind, open_raw: &str, argument: &str) -> Self {
        Self {
            kind,
            open_raw: open_raw.to_string(),
            expr: parse_expression(argument),
            primary: Vec::new(),
            else_raw: None,
            alternate: Vec::new(),
        }
    }

    fn target(&mut self) -> &mut Vec<Node> {
        if self.else_raw.is_some() {
            &mut self.alternate
        } else {
            &mut self.primary
        }
    }

    fn into_node(self) -> Node {
        match self.kind {
            BlockKind::If => Node::If {
                condition: self.expr,
                then_branch: self.primary,
                else_branch: self.alternate,
            },
            BlockKind::Each => Node::Each {
                source: self.expr,
                body: self.primary,
                else_branch: self.alternate,
            },
        }
    }

    /// Unclosed block: opening tag as text, then its content in place
    fn into_verbatim(self) -> Vec<Node> {
        let mut nodes = Vec::with_capacity(self.primary.len() + self.alternate.len() + 2);
        nodes.push(Node::Text(self.open_raw));
        nodes.extend(self.primary);
        if let Some(else_raw) = self.else_raw {
            nodes.push(Node::Text(else_raw));
            nodes.extend(self.alternate);
        }
        nodes
    }
}

struct Parser {
    root: Vec<Node>,
    stack: Vec<Frame>,
    max_depth: usize,
    /// Blocks past the cap, kept as text until their close tags
    verbatim: Vec<BlockKind>,
}

impl Parser {
    fn target(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => frame.target(),
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: &str) {
        let target = self.target();
        if let Some(Node::Text(previous)) = target.last_mut() {
            previous.push_str(text);
        } else {
            target.push(Node::Text(text.to_string()));
        }
    }

    fn unwind(&mut self, frame: Frame) {
        tracing::warn!(
            block = frame.kind.name(),
            tag = %frame.open_raw,
            "Unterminated block left verbatim"
        );
        let nodes = frame.into_verbatim();
        self.target().extend(nodes);
    }

    fn handle_tag(&mut self, raw: &str, inner: &str) {
        let tag = classify(inner);
        if !self.verbatim.is_empty() {
            match tag {
                Tag::Open(kind, _) => self.verbatim.push(kind),
                Tag::Close(kind) if self.verbatim.last() == Some(&kind) => {
                    self.verbatim.pop();
                }
                _ => {}
            }
            self.push_text(raw);
            return;
        }

        match tag {
            Tag::Open(kind, _) if self.stack.len() >= self.max_depth => {
                tracing::warn!(
                    block = kind.name(),
                    max_depth = self.max_depth,
                    "Block nesting too deep, left verbatim"
                );
                EvaluationMetrics::record_depth_exceeded();
                self.verbatim.push(kind);
                self.push_text(raw);
            }
            Tag::Open(kind, argument) => self.stack.push(Frame::new(kind, raw, argument)),
            Tag::Close(kind) => self.close(kind, raw),
            Tag::Else => {
                let accepted = match self.stack.last_mut() {
                    Some(frame) if frame.else_raw.is_none() => {
                        frame.else_raw = Some(raw.to_string());
                        true
                    }
                    _ => false,
                };
                if !accepted {
                    self.push_text(raw);
                }
            }
            Tag::Partial(body) => match parse_partial(body) {
                Some((name, args)) => self.target().push(Node::Partial {
                    raw: raw.to_string(),
                    name,
                    args,
                }),
                None => self.push_text(raw),
            },
            Tag::Expression(source) => self.target().push(Node::Expression {
                raw: raw.to_string(),
                expr: parse_expression(source),
            }),
            Tag::Unsupported => self.push_text(raw),
        }
    }

    fn close(&mut self, kind: BlockKind, raw: &str) {
        let Some(position) = self.stack.iter().rposition(|frame| frame.kind == kind) else {
            tracing::warn!(block = kind.name(), "Closing tag without matching open tag");
            self.push_text(raw);
            return;
        };

        while self.stack.len() > position + 1 {
            if let Some(frame) = self.stack.pop() {
                self.unwind(frame);
            }
        }

        if let Some(frame) = self.stack.pop() {
            let node = frame.into_node();
            self.target().push(node);
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(frame) = self.stack.pop() {
            self.unwind(frame);
        }
        self.root
    }
}

/// Parse markup into a node tree with the default nesting cap
pub fn parse(source: &str) -> Vec<Node> {
    parse_with_depth(source, DEFAULT_MAX_BLOCK_DEPTH)
}

/// Parse markup, keeping blocks nested deeper than `max_depth` as text
pub fn parse_with_depth(source: &str, max_depth: usize) -> Vec<Node> {
    let mut parser = Parser {
        root: Vec::new(),
        stack: Vec::new(),
        max_depth,
        verbatim: Vec::new(),
    };

    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        let (text, tagged) = rest.split_at(start);
        if !text.is_empty() {
            parser.push_text(text);
        }

        match tagged[2..].find("}}") {
            Some(end) => {
                let raw = &tagged[..end + 4];
                let inner = &tagged[2..end + 2];
                parser.handle_tag(raw, inner);
                rest = &tagged[end + 4..];
            }
            None => {
                parser.push_text(tagged);
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        parser.push_text(rest);
    }

    parser.finish()
}

/// Split on whitespace, keeping double-quoted strings (with `\"` escapes) whole
fn split_words(source: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escaped = false;

    for ch in source.chars() {
        if in_quotes {
            current.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_quotes = false;
            }
        } else if ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            if ch == '"' {
                in_quotes = true;
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn parse_literal(word: &str) -> Option<Value> {
    if word.len() >= 2 && word.starts_with('"') && word.ends_with('"') {
        let inner = &word[1..word.len() - 1];
        return Some(Value::String(inner.replace("\\\"", "\"")));
    }
    if NUMBER_LITERAL.is_match(word) {
        return word.parse::<f64>().ok().map(Value::Number);
    }
    match word {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => None,
    }
}

fn parse_arg(word: &str) -> Arg {
    parse_literal(word)
        .map(Arg::Literal)
        .unwrap_or_else(|| Arg::Path(word.to_string()))
}

/// Split an expression token into head, arguments and literal form
pub fn parse_expression(source: &str) -> Expression {
    let source = source.trim();
    let words = split_words(source);
    let literal = match words.as_slice() {
        [only] => parse_literal(only),
        _ => None,
    };
    let args: SmallVec<[Arg; 4]> = words.iter().skip(1).map(|w| parse_arg(w)).collect();

    Expression {
        source: source.to_string(),
        head: words.first().cloned().unwrap_or_default(),
        args,
        literal,
    }
}

/// `name key=path key2="literal"` -> name and named arguments
fn parse_partial(body: &str) -> Option<(String, Vec<(String, Arg)>)> {
    let words = split_words(body);
    let (name, rest) = words.split_first()?;

    let mut args = Vec::with_capacity(rest.len());
    for word in rest {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                args.push((key.to_string(), parse_arg(value)));
            }
            _ => {
                tracing::debug!(partial = %name, argument = %word, "Ignoring partial argument without key=value form");
            }
        }
    }
    Some((name.clone(), args))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("no tags here"), vec![text("no tags here")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_expression_with_helper_arguments() {
        let nodes = parse(r#"Value: {{formatCurrency business_data.value "EUR" 2}}"#);
        assert_eq!(nodes.len(), 2);
        let Node::Expression { raw, expr } = &nodes[1] else {
            panic!("expected expression, got {:?}", nodes[1]);
        };
        assert_eq!(raw, r#"{{formatCurrency business_data.value "EUR" 2}}"#);
        assert_eq!(expr.head, "formatCurrency");
        assert_eq!(
            expr.args.as_slice(),
            &[
                Arg::Path("business_data.value".to_string()),
                Arg::Literal(Value::from("EUR")),
                Arg::Literal(Value::Number(2.0)),
            ]
        );
        assert_eq!(expr.literal, None);
    }

    #[test]
    fn test_quoted_argument_with_spaces() {
        let expr = parse_expression(r#"eq status "fully \"approved\" deal""#);
        assert_eq!(expr.args.len(), 2);
        assert_eq!(
            expr.args[1],
            Arg::Literal(Value::from(r#"fully "approved" deal"#))
        );
    }

    #[test]
    fn test_single_literal_expressions() {
        assert_eq!(parse_expression("0").literal, Some(Value::Number(0.0)));
        assert_eq!(parse_expression("-2.5").literal, Some(Value::Number(-2.5)));
        assert_eq!(parse_expression("\"a\"").literal, Some(Value::from("a")));
        assert_eq!(parse_expression("true").literal, Some(Value::Bool(true)));
        assert_eq!(parse_expression("items.0").literal, None);
    }

    #[test]
    fn test_nested_blocks() {
        let nodes = parse("{{#if a}}{{#each items}}{{#if this}}x{{/if}}{{/each}}{{/if}}");
        assert_eq!(nodes.len(), 1);
        let Node::If { then_branch, .. } = &nodes[0] else {
            panic!("expected if");
        };
        let Node::Each { body, .. } = &then_branch[0] else {
            panic!("expected each");
        };
        assert!(matches!(body[0], Node::If { .. }));
    }

    #[test]
    fn test_else_branches() {
        let nodes = parse("{{#if ok}}yes{{else}}no{{/if}}");
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: parse_expression("ok"),
                then_branch: vec![text("yes")],
                else_branch: vec![text("no")],
            }]
        );

        let nodes = parse("{{#each items}}x{{else}}empty{{/each}}");
        let Node::Each { else_branch, .. } = &nodes[0] else {
            panic!("expected each");
        };
        assert_eq!(else_branch, &vec![text("empty")]);
    }

    #[test]
    fn test_unmatched_close_is_text() {
        assert_eq!(parse("a{{/if}}b"), vec![text("a{{/if}}b")]);
        assert_eq!(parse("{{else}}"), vec![text("{{else}}")]);
    }

    #[test]
    fn test_unterminated_block_is_flattened() {
        let nodes = parse("{{#if a}}body");
        assert_eq!(nodes, vec![text("{{#if a}}"), text("body")]);
    }

    #[test]
    fn test_mismatched_close_unwinds_inner_block() {
        let nodes = parse("{{#each items}}{{#if x}}in{{/each}}");
        let Node::Each { body, .. } = &nodes[0] else {
            panic!("expected each");
        };
        assert_eq!(body, &vec![text("{{#if x}}"), text("in")]);
    }

    #[test]
    fn test_unterminated_tag_is_text() {
        assert_eq!(parse("before {{name"), vec![text("before {{name")]);
    }

    #[test]
    fn test_unsupported_block_is_text() {
        assert_eq!(
            parse("{{#with a}}x{{/with}}"),
            vec![text("{{#with a}}x{{/with}}")]
        );
    }

    #[test]
    fn test_partial_arguments() {
        let nodes = parse(r#"{{> kpi_card label="Revenue" value=business_data.revenue stray}}"#);
        let Node::Partial { name, args, .. } = &nodes[0] else {
            panic!("expected partial");
        };
        assert_eq!(name, "kpi_card");
        assert_eq!(
            args,
            &vec![
                ("label".to_string(), Arg::Literal(Value::from("Revenue"))),
                (
                    "value".to_string(),
                    Arg::Path("business_data.revenue".to_string())
                ),
            ]
        );
    }

    #[test]
    fn test_empty_partial_name_is_text() {
        assert_eq!(parse("{{>}}"), vec![text("{{>}}")]);
    }

    #[test]
    fn test_nesting_at_cap_is_parsed() {
        let source = format!("{}x{}", "{{#if t}}".repeat(3), "{{/if}}".repeat(3));
        let nodes = parse_with_depth(&source, 3);
        let Node::If { then_branch, .. } = &nodes[0] else {
            panic!("expected if");
        };
        let Node::If { then_branch, .. } = &then_branch[0] else {
            panic!("expected if");
        };
        assert!(matches!(then_branch[0], Node::If { .. }));
    }

    #[test]
    fn test_nesting_past_cap_is_text() {
        let source = "{{#if a}}{{#each b}}{{#if c}}{{x}}{{else}}y{{/if}}{{/each}}z{{/if}}";
        let nodes = parse_with_depth(source, 1);
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: parse_expression("a"),
                then_branch: vec![text("{{#each b}}{{#if c}}{{x}}{{else}}y{{/if}}{{/each}}z")],
                else_branch: vec![],
            }]
        );
    }

    #[test]
    fn test_very_deep_nesting_does_not_recurse() {
        let depth = 100_000;
        let source = format!("{}x{}", "{{#if t}}".repeat(depth), "{{/if}}".repeat(depth));
        let nodes = parse(&source);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_if_prefix_is_not_block() {
        let nodes = parse("{{#iffy}}");
        assert_eq!(nodes, vec![text("{{#iffy}}")]);
    }
}
