// Evaluation tests
//
// Programs are run against an explicit environment with `print` output
// captured in a buffer.

use imp::ast::{Block, Expr, Stmt, Variable};
use imp::error::{ErrorKind, ImpError, Span};
use imp::evaluator::{interpret, Environment, Evaluator};
use imp::lexer::{tokenize, TokenKind, TokenValue};
use imp::parser::{parse, Parser, MAX_NESTING};
use imp::runner;
use imp::value::Value;

/// Run `source` against `environment`, returning printed output and the
/// program's final value.
fn run_in(source: &str, environment: &mut Environment) -> Result<(String, Option<Value>), ImpError> {
    let program = parse(tokenize(source))?;
    let mut out: Vec<u8> = Vec::new();
    let value = interpret(&program, environment, &mut out)?;
    Ok((String::from_utf8(out).unwrap(), value))
}

fn run(source: &str) -> Result<(String, Option<Value>), ImpError> {
    run_in(source, &mut Environment::new())
}

fn output(source: &str) -> String {
    match run(source) {
        Ok((out, _)) => out,
        Err(error) => panic!("program failed: {} ({:?})", error, error.kind),
    }
}

fn value(source: &str) -> Value {
    match run(source) {
        Ok((_, Some(value))) => value,
        Ok((_, None)) => panic!("program produced no value"),
        Err(error) => panic!("program failed: {} ({:?})", error, error.kind),
    }
}

fn error_kind(source: &str) -> ErrorKind {
    match run(source) {
        Ok(_) => panic!("expected '{}' to fail", source),
        Err(error) => error.kind,
    }
}

// === Lexer ===

#[test]
fn lexer_produces_tokens_with_values() {
    let tokens = tokenize("x = 42; print \"hi\"")
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();

    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::Print,
            TokenKind::String,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[0].value, Some(TokenValue::Name("x".to_string())));
    assert_eq!(tokens[2].value, Some(TokenValue::Integer(42)));
    assert_eq!(tokens[5].value, Some(TokenValue::Str("hi".to_string())));
    assert_eq!(tokens[5].span, Span::new(14, 18));
}

#[test]
fn lexer_distinguishes_assignment_from_equality() {
    let kinds: Vec<_> = tokenize("a == b = c")
        .map(|t| t.unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexer_recognizes_keywords_but_not_prefixes() {
    let kinds: Vec<_> = tokenize("if then else end while do print iffy ending")
        .map(|t| t.unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::End,
            TokenKind::While,
            TokenKind::Do,
            TokenKind::Print,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lexer_keeps_returning_eof() {
    let mut lexer = tokenize("  1 ");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
}

#[test]
fn lexer_iterator_stops_after_eof() {
    let lexer = tokenize("1 + 2");
    assert_eq!(lexer.count(), 4);
}

#[test]
fn lexer_rejects_unknown_character() {
    let mut lexer = tokenize("1 @ 2");
    assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Integer);

    let error = lexer.next_token().unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
    assert!(error.message.contains('@'));
    assert_eq!(error.span, Span::single(2));
}

#[test]
fn lexer_takes_string_content_verbatim() {
    let token = tokenize(r#""a\n b""#).next_token().unwrap();
    assert_eq!(token.value, Some(TokenValue::Str(r"a\n b".to_string())));
}

#[test]
fn lexer_rejects_unterminated_string() {
    let error = tokenize("\"abc").next_token().unwrap_err();
    assert_eq!(error.kind, ErrorKind::LexError);
    assert_eq!(error.message, "Unterminated string");
}

// === Parser ===

#[test]
fn parser_builds_left_associative_tree() {
    let expr = Parser::new(tokenize("10 - 3 - 2"))
        .unwrap()
        .parse_expression()
        .unwrap();

    match &expr {
        Expr::Binary { left, right, .. } => {
            assert!(matches!(**left, Expr::Binary { .. }));
            assert!(matches!(**right, Expr::Number { value: 2, .. }));
        }
        other => panic!("expected binary expression, got {:?}", other),
    }
}

#[test]
fn parse_expression_rejects_trailing_tokens() {
    let error = Parser::new(tokenize("1 + 2 3"))
        .unwrap()
        .parse_expression()
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::ParseError);
    assert_eq!(error.span, Span::new(6, 7));
}

#[test]
fn parser_wraps_if_in_condition_and_blocks() {
    let program = parse(tokenize("if x < 2 then print 10; else print 20; end")).unwrap();
    assert_eq!(program.statements.len(), 1);

    match &program.statements[0] {
        Stmt::If {
            then_branch,
            else_branch,
            ..
        } => {
            assert_eq!(then_branch.statements.len(), 1);
            assert!(else_branch.is_some());
        }
        other => panic!("expected if statement, got {:?}", other),
    }
}

#[test]
fn empty_program_is_a_single_noop() {
    let program = parse(tokenize("")).unwrap();
    assert_eq!(program.statements.len(), 1);
    assert!(matches!(program.statements[0], Stmt::NoOp { .. }));
}

// === Arithmetic ===

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(value("1 + 2 * 3"), Value::Int(7));
}

#[test]
fn subtraction_is_left_associative() {
    assert_eq!(value("10 - 3 - 2"), Value::Int(5));
}

#[test]
fn parentheses_override_precedence() {
    assert_eq!(value("(1 + 2) * 3"), Value::Int(9));
}

#[test]
fn unary_operators() {
    assert_eq!(value("--5"), Value::Int(5));
    assert_eq!(value("-(2 + 3) * 2"), Value::Int(-10));
    assert_eq!(value("+7"), Value::Int(7));
    assert_eq!(value("2 - -2"), Value::Int(4));
}

#[test]
fn division_is_true_division() {
    assert_eq!(value("7 / 2"), Value::Float(3.5));
    assert_eq!(value("6 / 2"), Value::Float(3.0));
    assert_eq!(output("print 6 / 2; print 7 / 2;"), "3.0\n3.5\n");
}

#[test]
fn mixed_int_and_float_arithmetic() {
    assert_eq!(value("1 / 2 + 1"), Value::Float(1.5));
    assert_eq!(value("(1 / 4) * 2"), Value::Float(0.5));
}

#[test]
fn division_by_zero_fails_without_output() {
    let mut environment = Environment::new();
    let program = parse(tokenize("print 1 / 0;")).unwrap();
    let mut out: Vec<u8> = Vec::new();

    let error = interpret(&program, &mut environment, &mut out).unwrap_err();
    assert_eq!(error.kind, ErrorKind::DivisionError);
    assert!(out.is_empty());
}

#[test]
fn division_by_computed_zero_fails() {
    assert_eq!(error_kind("x = 3; print 1 / (x - 3);"), ErrorKind::DivisionError);
    assert_eq!(error_kind("print 1 / (1 / 2 - 1 / 2);"), ErrorKind::DivisionError);
}

#[test]
fn integer_overflow_is_an_error() {
    assert_eq!(error_kind("9223372036854775807 + 1"), ErrorKind::OverflowError);
    assert_eq!(error_kind("-9223372036854775807 - 2"), ErrorKind::OverflowError);
    assert_eq!(error_kind("4611686018427387904 * 2"), ErrorKind::OverflowError);
}

#[test]
fn strings_concatenate() {
    assert_eq!(
        output("a = \"foo\"; b = \"bar\"; print a + b;"),
        "foobar\n"
    );
}

#[test]
fn arithmetic_on_strings_is_a_type_error() {
    assert_eq!(error_kind("\"a\" - \"b\""), ErrorKind::TypeError);
    assert_eq!(error_kind("\"a\" + 1"), ErrorKind::TypeError);
    assert_eq!(error_kind("-\"a\""), ErrorKind::TypeError);
    assert_eq!(error_kind("\"a\" / 0"), ErrorKind::TypeError);
}

// === Variables ===

#[test]
fn assignment_and_lookup() {
    let mut environment = Environment::new();
    let (out, _) = run_in("x = 5; print x + 1;", &mut environment).unwrap();

    assert_eq!(out, "6\n");
    assert_eq!(environment.get("x"), Some(&Value::Int(5)));
}

#[test]
fn assignment_overwrites_previous_binding() {
    let mut environment = Environment::new();
    run_in("x = 1; x = \"two\";", &mut environment).unwrap();
    assert_eq!(environment.get("x"), Some(&Value::Str("two".to_string())));
    assert_eq!(environment.len(), 1);
}

#[test]
fn unbound_variable_is_a_name_error() {
    let mut environment = Environment::new();
    let mut out: Vec<u8> = Vec::new();
    let mut evaluator = Evaluator::new(&mut environment, &mut out);

    let expr = Expr::Variable(Variable {
        name: "y".to_string(),
        span: Span::new(0, 1),
    });
    let error = evaluator.evaluate_expression(&expr).unwrap_err();

    assert_eq!(error.kind, ErrorKind::NameError);
    assert!(error.message.contains("'y'"));
}

#[test]
fn zero_and_empty_values_are_still_bound() {
    assert_eq!(output("x = 0; print x;"), "0\n");
    assert_eq!(output("s = \"\"; print s + \"!\";"), "!\n");
}

#[test]
fn seeded_environment_is_visible() {
    let mut environment = Environment::new();
    environment.assign("n", Value::Int(41));

    let (out, _) = run_in("print n + 1", &mut environment).unwrap();
    assert_eq!(out, "42\n");
}

#[test]
fn environment_persists_across_runs() {
    let mut environment = Environment::new();
    run_in("counter = 1;", &mut environment).unwrap();
    run_in("counter = counter + 1;", &mut environment).unwrap();

    let (_, last) = run_in("counter", &mut environment).unwrap();
    assert_eq!(last, Some(Value::Int(2)));
    assert_eq!(environment.bindings(), vec![("counter", &Value::Int(2))]);
}

#[test]
fn failed_run_keeps_earlier_assignments() {
    let mut environment = Environment::new();
    let error = run_in("a = 1; b = a / 0; c = 3;", &mut environment).unwrap_err();

    assert_eq!(error.kind, ErrorKind::DivisionError);
    assert!(environment.contains("a"));
    assert!(!environment.contains("b"));
    assert!(!environment.contains("c"));
}

// === Control flow ===

#[test]
fn if_selects_then_branch() {
    assert_eq!(
        output("x = 1; if x < 2 then print 10; else print 20; end"),
        "10\n"
    );
}

#[test]
fn if_selects_else_branch() {
    assert_eq!(
        output("x = 1; if x > 2 then print 10; else print 20; end"),
        "20\n"
    );
}

#[test]
fn if_without_else_does_nothing_when_false() {
    assert_eq!(output("if 1 > 2 then print 1; end"), "");
}

#[test]
fn while_loop_runs_body_until_condition_fails() {
    let mut environment = Environment::new();
    let (out, _) = run_in(
        "x = 0; n = 0; while x < 3 do x = x + 1; n = n + 1; end print x;",
        &mut environment,
    )
    .unwrap();

    assert_eq!(out, "3\n");
    assert_eq!(environment.get("n"), Some(&Value::Int(3)));
}

#[test]
fn while_loop_with_false_condition_never_runs() {
    assert_eq!(output("x = 5; while x < 3 do print x; end"), "");
}

#[test]
fn nested_control_flow() {
    let source = "
        i = 0;
        while i < 4 do
            if i == 2 then
                print \"two\";
            else
                print i;
            end
            i = i + 1;
        end
    ";
    assert_eq!(output(source), "0\n1\ntwo\n3\n");
}

#[test]
fn deeply_nested_ifs_run() {
    let depth = MAX_NESTING;
    let source = "if 1 < 2 then ".repeat(depth) + "print \"deep\";" + &" end".repeat(depth);
    assert_eq!(output(&source), "deep\n");
}

// === Conditions ===

#[test]
fn numeric_comparisons() {
    assert_eq!(output("if 1 / 2 < 1 then print 1; end"), "1\n");
    assert_eq!(output("if 2 == 4 / 2 then print 1; end"), "1\n");
    assert_eq!(output("if 3 > 3 then print 1; else print 0; end"), "0\n");
}

#[test]
fn large_integers_compare_exactly_with_floats() {
    // 2^53 + 1 has no exact float; the quotient is exactly 2^53
    let equal = "if 9007199254740993 == 9007199254740992 / 1 then print 1; else print 0; end";
    let greater = "if 9007199254740993 > 9007199254740992 / 1 then print 1; else print 0; end";
    let less = "if 9007199254740992 / 1 < 9007199254740993 then print 1; else print 0; end";
    assert_eq!(output(equal), "0\n");
    assert_eq!(output(greater), "1\n");
    assert_eq!(output(less), "1\n");
}

#[test]
fn string_comparisons() {
    assert_eq!(output("if \"abc\" == \"abc\" then print 1; end"), "1\n");
    assert_eq!(output("if \"abc\" < \"abd\" then print 1; end"), "1\n");
}

#[test]
fn mixed_kinds_are_never_equal() {
    assert_eq!(output("if 1 == \"1\" then print 1; else print 0; end"), "0\n");
}

#[test]
fn ordering_mixed_kinds_is_a_type_error() {
    assert_eq!(error_kind("if 1 < \"1\" then print 1; end"), ErrorKind::TypeError);
    assert_eq!(error_kind("if \"b\" > 0 then print 1; end"), ErrorKind::TypeError);
}

#[test]
fn condition_evaluates_to_bool() {
    let program = parse(tokenize("while 1 < 2 do end")).unwrap();
    let condition = match &program.statements[0] {
        Stmt::While { condition, .. } => condition,
        other => panic!("expected while loop, got {:?}", other),
    };

    let mut environment = Environment::new();
    let mut evaluator = Evaluator::new(&mut environment, Vec::<u8>::new());
    assert_eq!(evaluator.evaluate_condition(condition).unwrap(), Value::Bool(true));
}

// === Statement values ===

#[test]
fn program_value_is_last_statement_value() {
    assert_eq!(value("x = 2; x * 21"), Value::Int(42));

    let (_, last) = run("x = 2; print x").unwrap();
    assert_eq!(last, None);
}

#[test]
fn execute_block_runs_statements_in_order() {
    let statements = vec![
        Stmt::Print {
            value: Expr::Number {
                value: 1,
                span: Span::new(0, 1),
            },
            span: Span::new(0, 1),
        },
        Stmt::NoOp {
            span: Span::new(1, 1),
        },
        Stmt::Print {
            value: Expr::StringLiteral {
                value: "two".to_string(),
                span: Span::new(1, 2),
            },
            span: Span::new(1, 2),
        },
    ];
    let block = Block {
        statements,
        span: Span::new(0, 2),
    };

    let mut environment = Environment::new();
    let mut out: Vec<u8> = Vec::new();
    Evaluator::new(&mut environment, &mut out)
        .execute_block(&block)
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "1\ntwo\n");
}

#[test]
fn separate_environments_do_not_interfere() {
    let mut first = Environment::new();
    let mut second = Environment::new();

    run_in("x = 1;", &mut first).unwrap();
    run_in("x = 2;", &mut second).unwrap();

    assert_eq!(first.get("x"), Some(&Value::Int(1)));
    assert_eq!(second.get("x"), Some(&Value::Int(2)));
}

// === Runner ===

#[test]
fn runner_reports_failure_and_keeps_earlier_bindings() {
    let mut environment = Environment::new();
    assert!(!runner::run_in("x = 1; y = x / 0;", None, &mut environment));
    assert_eq!(environment.get("x"), Some(&Value::Int(1)));
    assert!(!environment.contains("y"));

    assert!(runner::run_in("y = x + 1;", None, &mut environment));
    assert_eq!(environment.get("y"), Some(&Value::Int(2)));
}
