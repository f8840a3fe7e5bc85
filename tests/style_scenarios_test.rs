//! Scenario tests against expected output
//!
//! These tests verify concrete end-to-end formatting scenarios and the
//! formatter's documented invariants: idempotence, token preservation,
//! line-length conformance, disabled-region verbatim output and
//! determinism.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use pyprettier::parser::{tokenize, TokenKind};
use pyprettier::{format_source, Style};

fn fmt(source: &str) -> String {
    format_source(source, &Style::default(), None)
        .unwrap_or_else(|e| panic!("formatting failed: {e}"))
        .text
}

fn fmt_with(source: &str, style: &Style) -> String {
    format_source(source, style, None)
        .unwrap_or_else(|e| panic!("formatting failed: {e}"))
        .text
}

/// The non-whitespace token texts of a source buffer, in order.
fn token_texts(source: &str) -> Vec<String> {
    tokenize(source)
        .unwrap_or_else(|e| panic!("tokenize failed: {e}"))
        .into_iter()
        .filter(|tok| {
            !matches!(
                tok.kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::EndMarker
            )
        })
        .map(|tok| tok.text)
        .collect()
}

#[test]
fn scenario_ugly_spacing_normalization() {
    let input = "x = {  'a':37,'b':42,\n\n'c':927}\n";
    assert_eq!(fmt(input), "x = {'a': 37, 'b': 42, 'c': 927}\n");
}

#[test]
fn scenario_compound_statement_joining() {
    let input = "if a == 42:\n    continue\n";
    assert_eq!(fmt(input), "if a == 42: continue\n");
}

#[test]
fn scenario_joining_disabled() {
    let style = Style {
        join_multiple_lines: false,
        ..Style::default()
    };
    let input = "if a == 42:\n    continue\n";
    assert_eq!(fmt_with(input, &style), "if a == 42:\n    continue\n");
}

#[test]
fn scenario_trailing_comma_split() {
    let input = "f(a, b, c,)\n";
    let expected = "\
f(
    a,
    b,
    c,
)
";
    assert_eq!(fmt(input), expected);
}

#[test]
fn scenario_comment_in_list_default() {
    let input = "[a, b,  #\n c]\n";
    assert_eq!(fmt(input), "[\n    a,\n    b,  #\n    c\n]\n");
}

#[test]
fn scenario_comment_in_list_split_disabled() {
    let style = Style {
        disable_split_list_with_comment: true,
        ..Style::default()
    };
    let input = "[a, b,  #\n c]\n";
    assert_eq!(fmt_with(input, &style), "[\n    a, b,  #\n    c\n]\n");
}

#[test]
fn scenario_arithmetic_precedence_indication() {
    let style = Style {
        arithmetic_precedence_indication: true,
        ..Style::default()
    };
    assert_eq!(fmt_with("a = 1 * 2 + 3 / 4\n", &style), "a = 1*2 + 3/4\n");
}

#[test]
fn invariant_idempotence() {
    let sources = [
        "x = {  'a':37,'b':42,\n\n'c':927}\n",
        "f(a, b, c,)\n",
        "[a, b,  #\n c]\n",
        "if a == 42:\n    continue\n",
        "def f(a: int, b=2, *args, **kwargs) -> int:\n    return a\n",
        "class A:\n    def m(self):\n        return {'k': [1, 2, 3]}\n",
        "x = 1 if condition else 2\n",
        "total = alpha + beta * gamma - delta\n",
    ];
    for source in sources {
        let once = fmt(source);
        let twice = fmt(&once);
        assert_eq!(once, twice, "format is not idempotent for {source:?}");
    }
}

#[test]
fn invariant_token_preservation() {
    let sources = [
        "x = {  'a':37,'b':42,\n\n'c':927}\n",
        "f(a, b, c,)\n",
        "def f(a,b=2):\n  return (a,b)\n",
        "result = [i * 2 for i in range(100) if i % 3]\n",
        "x = 1 + \\\n    2\n",
    ];
    for source in sources {
        let out = fmt(source);
        assert_eq!(
            token_texts(source),
            token_texts(&out),
            "token stream changed for {source:?}"
        );
    }
}

#[test]
fn invariant_line_length() {
    let style = Style {
        column_limit: 40,
        ..Style::default()
    };
    let sources = [
        "x = function_with_long_name(argument_one, argument_two, argument_three)\n",
        "values = {'first': 1, 'second': 2, 'third': 3, 'fourth': 4}\n",
        "flags = [enable_alpha, enable_beta, enable_gamma, enable_delta]\n",
    ];
    for source in sources {
        let out = fmt_with(source, &style);
        for line in out.lines() {
            assert!(
                line.chars().count() <= 40,
                "line over limit in output of {source:?}: {line:?}"
            );
        }
    }
}

#[test]
fn invariant_line_length_suppression_comment_exempt() {
    let style = Style {
        column_limit: 30,
        ..Style::default()
    };
    let source = "x = a_rather_long_expression_here  # noqa\n";
    let out = fmt_with(source, &style);
    assert_eq!(out, source, "suppressed line must not be reflowed");
}

#[test]
fn invariant_disabled_region_verbatim() {
    let disabled_body = "w   =  [ 1,2 ,  3 ]\nz=w [0]\n";
    let source = format!(
        "a = 1\n# disable-formatter\n{disabled_body}# enable-formatter\nb   =   2\n"
    );
    let out = fmt(&source);
    assert!(
        out.contains(disabled_body),
        "disabled region was altered:\n{out}"
    );
    assert!(out.contains("b = 2\n"));
}

#[test]
fn invariant_determinism() {
    let source = "def process(data, *, limit=100, verbose=False):\n    return [transform(item) for item in data if item.valid][:limit]\n";
    let first = fmt(source);
    for _ in 0..5 {
        assert_eq!(fmt(source), first);
    }
}

#[test]
fn invariant_range_formatting_verbatim_outside() {
    use pyprettier::process::parse_line_ranges;
    let source = "a  =  1\nb  =  2\nc  =  3\n";
    let ranges = parse_line_ranges(&["2-2".to_string()]).unwrap();
    let out = format_source(source, &Style::default(), Some(&ranges))
        .unwrap()
        .text;
    assert_eq!(out, "a  =  1\nb = 2\nc  =  3\n");
}

#[test]
fn knob_force_multiline_dict() {
    let style = Style {
        force_multiline_dict: true,
        ..Style::default()
    };
    let out = fmt_with("x = {'a': 1, 'b': 2}\n", &style);
    assert!(out.lines().count() > 1, "dict must not stay on one line");
    assert!(out.contains("'a': 1,"));
    assert!(out.contains("'b': 2"));
}

#[test]
fn knob_split_all_comma_separated_values() {
    let style = Style {
        split_all_comma_separated_values: true,
        ..Style::default()
    };
    let out = fmt_with("f(a, b)\n", &style);
    assert_eq!(out, "f(a,\n  b)\n");
}

#[test]
fn knob_split_all_top_level_leaves_fitting_subexpressions() {
    let style = Style {
        column_limit: 30,
        split_all_top_level_comma_separated_values: true,
        ..Style::default()
    };
    let out = fmt_with("x = outer(inner(a, b), second_argument)\n", &style);
    // The fitting inner call stays intact.
    assert!(out.contains("inner(a, b)"));
    assert!(out.lines().count() > 1);
}

#[test]
fn knob_spacing_variants() {
    let style = Style {
        spaces_around_default_or_named_assign: true,
        ..Style::default()
    };
    assert_eq!(fmt_with("f(a=1)\n", &style), "f(a = 1)\n");

    let style = Style {
        spaces_around_subscript_colon: true,
        ..Style::default()
    };
    assert_eq!(fmt_with("y = x[1:2]\n", &style), "y = x[1 : 2]\n");

    let style = Style {
        spaces_around_power_operator: true,
        ..Style::default()
    };
    assert_eq!(fmt_with("z = a**b\n", &style), "z = a ** b\n");
}

#[test]
fn knob_i18n_function_call_protects_line() {
    let style = Style {
        i18n_function_call: vec!["_".to_string()],
        ..Style::default()
    };
    let source = "message   =  _( 'do not touch' )\n";
    assert_eq!(fmt_with(source, &style), source);
}

#[test]
fn directive_single_line_disable() {
    let source = "a   =  1  # disable-formatter\nb   =  2\n";
    let out = fmt(source);
    assert!(out.contains("a   =  1  # disable-formatter"));
    assert!(out.contains("b = 2"));
}
