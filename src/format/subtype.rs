//! Subtype tagging.
//!
//! Disambiguates tokens whose spacing and splitting behavior differs by
//! syntactic role: the `=` of a keyword argument vs. a default parameter,
//! dictionary colons vs. subscript colons vs. annotations, unary vs. binary
//! operators, decorator `@` vs. matrix multiply, comprehension clauses and
//! dictionary keys/values. The assigner is a single scan over each logical
//! line with a bracket-context stack.

use crate::format::logical_lines::LogicalLine;
use crate::parser::token::{subtypes, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketKind {
    /// Call argument list: `name(...)`.
    Call,
    /// Parameter list of a `def`.
    DefParams,
    /// Subscript or slice: `name[...]`.
    Subscript,
    /// List display: `[...]` not preceded by a subscriptable token.
    List,
    /// Dict or set display: `{...}`.
    DictSet,
    /// Grouping parentheses or tuple display.
    Paren,
}

#[derive(Debug)]
struct BracketFrame {
    kind: BracketKind,
    open_index: usize,
    /// `{...}` containing a top-level `:` (a dict, not a set).
    is_dict: bool,
    /// Between a dict `:` and the next top-level `,`.
    after_colon: bool,
    /// The next frame-level token starts a dict key.
    pending_key: bool,
    /// A comprehension `for` was seen at this level.
    saw_comp_for: bool,
    /// Current `def` parameter carries a type annotation.
    param_annotated: bool,
}

/// Keywords after which `+`, `-` and `*` are unary.
const UNARY_CONTEXT_KEYWORDS: &[&str] = &[
    "and", "assert", "await", "elif", "else", "from", "if", "import", "in", "is", "lambda", "not",
    "or", "raise", "return", "while", "yield",
];

const BINARY_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "//", "%", "@", "**", "<<", ">>", "&", "|", "^", "<", ">", "<=", ">=",
    "==", "!=",
];

const AUGMENTED_ASSIGNS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "@=", "&=", "|=", "^=", "<<=", ">>=", "**=",
];

/// Assign subtype tags to every token of a logical line.
#[allow(clippy::too_many_lines)]
pub fn assign_subtypes(line: &mut LogicalLine) {
    let is_def_stmt = matches!(line.effective_first_value(), "def");
    let mut stack: Vec<BracketFrame> = Vec::new();
    // Bracket depths at which a lambda parameter list is open.
    let mut lambda_params: Vec<usize> = Vec::new();
    // Bracket depths of lambda bodies still being collected.
    let mut lambda_bodies: Vec<usize> = Vec::new();
    let mut prev_code: Option<usize> = None;
    let mut pending_dict_value = false;
    let mut def_seen = false;

    for i in 0..line.tokens.len() {
        let text = line.tokens[i].text.clone();
        let kind = line.tokens[i].kind;

        if kind == TokenKind::Comment || kind == TokenKind::Continuation {
            continue;
        }

        if !lambda_params.is_empty() || !lambda_bodies.is_empty() {
            line.tokens[i].add_subtype(subtypes::LAMBDEF);
        }

        if pending_dict_value {
            line.tokens[i].add_subtype(subtypes::DICTIONARY_VALUE);
            pending_dict_value = false;
        }

        // Dictionary key parts: every token inside a key expression of an
        // enclosing dict, including nested brackets.
        if stack
            .iter()
            .any(|f| f.kind == BracketKind::DictSet && f.is_dict && !f.after_colon)
            && !line.tokens[i].opens_scope()
            && !line.tokens[i].closes_scope()
        {
            line.tokens[i].add_subtype(subtypes::DICTIONARY_KEY_PART);
        }
        if let Some(frame) = stack.last_mut() {
            if frame.kind == BracketKind::DictSet
                && frame.is_dict
                && frame.pending_key
                && !line.tokens[i].closes_scope()
            {
                line.tokens[i].add_subtype(subtypes::DICTIONARY_KEY);
                frame.pending_key = false;
            }
        }

        match (kind, text.as_str()) {
            (TokenKind::Keyword, "def") => def_seen = true,
            (TokenKind::Keyword, "lambda") => {
                line.tokens[i].add_subtype(subtypes::LAMBDEF);
                lambda_params.push(stack.len());
            }
            (TokenKind::Keyword, "for") => {
                if let Some(frame) = stack.last_mut() {
                    frame.saw_comp_for = true;
                    let open = frame.open_index;
                    line.tokens[i].add_subtype(subtypes::COMP_FOR);
                    line.tokens[open].add_subtype(subtypes::COMP_START);
                    if line.tokens[open].text == "{" {
                        line.tokens[i].add_subtype(subtypes::DICT_SET_GENERATOR);
                    }
                }
            }
            (TokenKind::Keyword, "if") => {
                if stack.last().is_some_and(|f| f.saw_comp_for) {
                    line.tokens[i].add_subtype(subtypes::COMP_IF);
                }
            }
            (TokenKind::Keyword, "not") => {
                line.tokens[i].add_subtype(subtypes::UNARY_OPERATOR);
            }
            (TokenKind::Keyword, "and" | "or" | "in" | "is") => {
                line.tokens[i].add_subtype(subtypes::BINARY_OPERATOR);
            }
            (TokenKind::Name, _) => {
                if def_seen && is_def_stmt && !line.tokens[i].has_subtype(subtypes::FUNC_DEF) {
                    line.tokens[i].add_subtype(subtypes::FUNC_DEF);
                    def_seen = false;
                }
            }
            (TokenKind::Operator, "(" | "[" | "{") => {
                let bracket_kind = classify_bracket(line, &text, prev_code, is_def_stmt);
                let is_dict = text == "{" && has_top_level(line, i, ":");
                let display_mask = match bracket_kind {
                    BracketKind::Subscript => subtypes::SUBSCRIPT_BRACKET,
                    BracketKind::List => subtypes::LIST_BRACKET,
                    BracketKind::DictSet => subtypes::DICT_BRACKET,
                    BracketKind::Paren if has_top_level(line, i, ",") => subtypes::TUPLE_BRACKET,
                    _ => subtypes::NONE,
                };
                line.tokens[i].add_subtype(display_mask);
                if let Some(close) = line.tokens[i].matching_bracket {
                    line.tokens[close].add_subtype(display_mask);
                }
                stack.push(BracketFrame {
                    kind: bracket_kind,
                    open_index: i,
                    is_dict,
                    after_colon: false,
                    pending_key: is_dict,
                    saw_comp_for: false,
                    param_annotated: false,
                });
            }
            (TokenKind::Operator, ")" | "]" | "}") => {
                stack.pop();
                lambda_bodies.retain(|&depth| depth <= stack.len());
                lambda_params.retain(|&depth| depth <= stack.len());
            }
            (TokenKind::Operator, ",") => {
                if let Some(frame) = stack.last_mut() {
                    frame.after_colon = false;
                    frame.pending_key = frame.is_dict;
                    frame.param_annotated = false;
                }
                // A comma ends the innermost lambda body at this depth.
                lambda_bodies.retain(|&depth| depth != stack.len());
            }
            (TokenKind::Operator, ":") => {
                if lambda_params.last() == Some(&stack.len()) {
                    lambda_params.pop();
                    lambda_bodies.push(stack.len());
                    line.tokens[i].add_subtype(subtypes::LAMBDEF);
                } else {
                    match stack.last_mut() {
                        Some(frame) if frame.kind == BracketKind::Subscript => {
                            line.tokens[i].add_subtype(subtypes::SUBSCRIPT_COLON);
                        }
                        Some(frame) if frame.kind == BracketKind::DictSet && frame.is_dict => {
                            if !frame.after_colon {
                                frame.after_colon = true;
                                line.tokens[i].add_subtype(subtypes::DICT_COLON);
                                pending_dict_value = true;
                            }
                        }
                        Some(frame) if frame.kind == BracketKind::DefParams => {
                            frame.param_annotated = true;
                            line.tokens[i].add_subtype(subtypes::TYPED_NAME);
                            if let Some(p) = prev_code {
                                line.tokens[p].add_subtype(subtypes::TYPED_NAME);
                            }
                        }
                        Some(_) => {}
                        None => {
                            // Annotated assignment at statement level.
                            if line.first().is_name() {
                                line.tokens[i].add_subtype(subtypes::TYPED_NAME);
                            }
                        }
                    }
                }
            }
            (TokenKind::Operator, "=") => {
                let frame_kind = stack.last().map(|f| f.kind);
                match frame_kind {
                    Some(BracketKind::Call) => {
                        line.tokens[i].add_subtype(subtypes::NAMED_ASSIGN);
                    }
                    Some(BracketKind::DefParams) => {
                        line.tokens[i].add_subtype(subtypes::DEFAULT_ASSIGN);
                        if stack.last().is_some_and(|f| f.param_annotated) {
                            line.tokens[i].add_subtype(subtypes::TYPED_NAME);
                        }
                    }
                    _ if lambda_params.last() == Some(&stack.len()) => {
                        line.tokens[i].add_subtype(subtypes::DEFAULT_ASSIGN);
                    }
                    None => line.tokens[i].add_subtype(subtypes::ASSIGN_OPERATOR),
                    _ => {}
                }
            }
            (TokenKind::Operator, "*" | "**") => {
                let in_arg_list = matches!(
                    stack.last().map(|f| f.kind),
                    Some(BracketKind::Call | BracketKind::DefParams)
                ) || lambda_params.last() == Some(&stack.len());
                let after_separator = prev_code.is_none_or(|p| {
                    matches!(line.tokens[p].text.as_str(), "(" | "," | "lambda" | "=" | "return")
                });
                if after_separator && (in_arg_list || stack.is_empty()) {
                    let star_mask = if text == "*" {
                        subtypes::VARARGS_STAR
                    } else {
                        subtypes::KWARGS_STAR_STAR
                    };
                    line.tokens[i].add_subtype(star_mask);
                } else if is_unary_position(line, prev_code) {
                    line.tokens[i].add_subtype(subtypes::UNARY_OPERATOR);
                } else {
                    line.tokens[i].add_subtype(subtypes::BINARY_OPERATOR);
                }
            }
            (TokenKind::Operator, "@") => {
                if i == 0 {
                    line.tokens[i].add_subtype(subtypes::DECORATOR);
                } else {
                    line.tokens[i].add_subtype(subtypes::BINARY_OPERATOR);
                }
            }
            (TokenKind::Operator, "+" | "-" | "~") => {
                if is_unary_position(line, prev_code) {
                    line.tokens[i].add_subtype(subtypes::UNARY_OPERATOR);
                } else {
                    line.tokens[i].add_subtype(subtypes::BINARY_OPERATOR);
                }
            }
            (TokenKind::Operator, op) if BINARY_OPERATORS.contains(&op) => {
                line.tokens[i].add_subtype(subtypes::BINARY_OPERATOR);
            }
            (TokenKind::Operator, op) if AUGMENTED_ASSIGNS.contains(&op) => {
                if stack.is_empty() {
                    line.tokens[i].add_subtype(subtypes::ASSIGN_OPERATOR);
                }
            }
            _ => {}
        }

        prev_code = Some(i);
    }
}

/// Classify an opening bracket from the token before it.
fn classify_bracket(
    line: &LogicalLine,
    text: &str,
    prev_code: Option<usize>,
    is_def_stmt: bool,
) -> BracketKind {
    let prev = prev_code.map(|p| &line.tokens[p]);
    let subscriptable = prev.is_some_and(|p| p.is_name() || p.is_string() || p.closes_scope());
    match text {
        "(" => {
            if prev.is_some_and(|p| p.has_subtype(subtypes::FUNC_DEF)) && is_def_stmt {
                BracketKind::DefParams
            } else if subscriptable {
                BracketKind::Call
            } else {
                BracketKind::Paren
            }
        }
        "[" => {
            if subscriptable {
                BracketKind::Subscript
            } else {
                BracketKind::List
            }
        }
        _ => BracketKind::DictSet,
    }
}

/// Scan a bracket pair for a token at its own nesting level.
fn has_top_level(line: &LogicalLine, open_index: usize, needle: &str) -> bool {
    let Some(close) = line.tokens[open_index].matching_bracket else {
        return false;
    };
    let mut idx = open_index + 1;
    while idx < close {
        let tok = &line.tokens[idx];
        if tok.opens_scope() {
            idx = tok.matching_bracket.unwrap_or(close);
        } else if tok.text == needle {
            return true;
        } else if tok.text == "lambda" {
            // A lambda colon is not a dict colon; skip to the end of the
            // lambda's parameter list.
            while idx < close && line.tokens[idx].text != ":" {
                idx += 1;
            }
        }
        idx += 1;
    }
    false
}

/// True when `+`, `-`, `*` or `~` at this position is a unary operator.
fn is_unary_position(line: &LogicalLine, prev_code: Option<usize>) -> bool {
    let Some(p) = prev_code else {
        return true;
    };
    let prev = &line.tokens[p];
    match prev.kind {
        TokenKind::Operator => !prev.closes_scope(),
        TokenKind::Keyword => UNARY_CONTEXT_KEYWORDS.contains(&prev.text.as_str()),
        _ => false,
    }
}
