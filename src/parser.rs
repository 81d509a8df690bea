use crate::ast::{BinaryOp, Block, CompareOp, Condition, Expr, Program, Stmt, UnaryOp, Variable};
use crate::error::{ImpError, Span};
use crate::lexer::{Lexer, Token, TokenKind, TokenValue};

/// Deepest nesting of parentheses, unary operators or `if`/`while` bodies
/// accepted before parsing gives up with an error. Operator chains like
/// `1 + 2 + 3` are parsed by loops and do not count.
pub const MAX_NESTING: usize = 128;

/// Parse a whole program from `lexer`.
pub fn parse(lexer: Lexer) -> Result<Program, ImpError> {
    Parser::new(lexer)?.parse()
}

/// Recursive-descent parser with one token of lookahead pulled from the lexer.
pub struct Parser {
    lexer: Lexer,
    current: Token,
    previous_end: usize,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ImpError> {
        let current = lexer.next_token()?;
        Ok(Self {
            lexer,
            current,
            previous_end: 0,
            depth: 0,
        })
    }

    /// program := block, followed by end of input.
    pub fn parse(&mut self) -> Result<Program, ImpError> {
        let program = self.block()?;
        self.expect_end_of_input()?;
        Ok(program)
    }

    /// Parse a single expression followed by end of input.
    pub fn parse_expression(&mut self) -> Result<Expr, ImpError> {
        let expr = self.expr()?;
        self.expect_end_of_input()?;
        Ok(expr)
    }

    fn expect_end_of_input(&mut self) -> Result<(), ImpError> {
        if self.check(TokenKind::Eof) {
            return Ok(());
        }

        let found = self.current.kind;
        let help = match found {
            TokenKind::Greater | TokenKind::Less | TokenKind::Equal => {
                "Comparisons are only allowed as 'if' or 'while' conditions.".to_string()
            }
            _ => "Separate statements with ';'.".to_string(),
        };

        Err(ImpError::parse_error_with_help(
            self.current.span,
            format!("Unexpected {} after end of program", found.describe()),
            help,
        ))
    }

    // block := statement (';' statement)* ';'?
    fn block(&mut self) -> Result<Block, ImpError> {
        let start = self.current.span.start;
        let mut statements = vec![self.statement()?];

        loop {
            if self.check(TokenKind::Semicolon) {
                self.advance()?;
                if !self.starts_statement() {
                    break;
                }
            } else if !(statements.last().is_some_and(Stmt::ends_with_keyword)
                && self.starts_statement())
            {
                break;
            }

            statements.push(self.statement()?);
        }

        Ok(Block {
            statements,
            span: Span::new(start, self.previous_end.max(start)),
        })
    }

    fn starts_statement(&self) -> bool {
        matches!(
            self.current.kind,
            TokenKind::Identifier
                | TokenKind::Print
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Integer
                | TokenKind::String
                | TokenKind::LeftParen
                | TokenKind::Plus
                | TokenKind::Minus
        )
    }

    fn statement(&mut self) -> Result<Stmt, ImpError> {
        match self.current.kind {
            TokenKind::Identifier => self.assignment_or_expression(),
            TokenKind::Print => self.print_statement(),
            TokenKind::If => self.nested(Self::if_statement),
            TokenKind::While => self.nested(Self::while_statement),
            TokenKind::Integer
            | TokenKind::String
            | TokenKind::LeftParen
            | TokenKind::Plus
            | TokenKind::Minus => {
                let expr = self.expr()?;
                let span = *expr.span();
                Ok(Stmt::Expression { expr, span })
            }
            _ => {
                let at = self.current.span.start;
                Ok(Stmt::NoOp {
                    span: Span::new(at, at),
                })
            }
        }
    }

    // assignment := IDENTIFIER '=' expr, otherwise an expression led by the variable
    fn assignment_or_expression(&mut self) -> Result<Stmt, ImpError> {
        let target = self.variable()?;

        if self.check(TokenKind::Assign) {
            self.advance()?;
            let value = self.expr()?;
            let span = target.span.to(value.span());
            return Ok(Stmt::Assign {
                target,
                value,
                span,
            });
        }

        let expr = self.expr_from(Expr::Variable(target))?;
        let span = *expr.span();
        Ok(Stmt::Expression { expr, span })
    }

    fn print_statement(&mut self) -> Result<Stmt, ImpError> {
        let keyword = self.advance()?;
        let value = self.expr()?;
        let span = keyword.span.to(value.span());
        Ok(Stmt::Print { value, span })
    }

    // if_stmt := 'if' condition 'then' block ('else' block)? 'end'
    fn if_statement(&mut self) -> Result<Stmt, ImpError> {
        let start = self.advance()?.span.start;
        let condition = self.condition()?;
        self.expect_with_help(
            TokenKind::Then,
            "Expected 'then' after if condition",
            "If statements are written: if condition then ... end".to_string(),
        )?;

        let then_branch = self.block()?;
        let else_branch = if self.check(TokenKind::Else) {
            self.advance()?;
            Some(self.block()?)
        } else {
            None
        };

        self.expect_with_help(
            TokenKind::End,
            "Expected 'end' to close if statement",
            "Every 'if' must be closed with 'end'.".to_string(),
        )?;

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start, self.previous_end),
        })
    }

    // while_stmt := 'while' condition 'do' block 'end'
    fn while_statement(&mut self) -> Result<Stmt, ImpError> {
        let start = self.advance()?.span.start;
        let condition = self.condition()?;
        self.expect_with_help(
            TokenKind::Do,
            "Expected 'do' after while condition",
            "While loops are written: while condition do ... end".to_string(),
        )?;

        let body = self.block()?;
        self.expect_with_help(
            TokenKind::End,
            "Expected 'end' to close while loop",
            "Every 'while' must be closed with 'end'.".to_string(),
        )?;

        Ok(Stmt::While {
            condition,
            body,
            span: Span::new(start, self.previous_end),
        })
    }

    // condition := expr ('>' | '<' | '==') expr
    fn condition(&mut self) -> Result<Condition, ImpError> {
        let left = self.expr()?;

        let operator = match self.current.kind {
            TokenKind::Greater => CompareOp::Greater,
            TokenKind::Less => CompareOp::Less,
            TokenKind::Equal => CompareOp::Equal,
            TokenKind::Assign => {
                return Err(ImpError::parse_error_with_help(
                    self.current.span,
                    "Expected comparison operator in condition, found '='".to_string(),
                    "Use '==' to compare for equality.".to_string(),
                ));
            }
            found => {
                return Err(ImpError::parse_error_with_help(
                    self.current.span,
                    format!(
                        "Expected comparison operator in condition, found {}",
                        found.describe()
                    ),
                    "Conditions compare two expressions with '>', '<' or '=='.".to_string(),
                ));
            }
        };
        self.advance()?;

        let right = self.expr()?;
        let span = left.span().to(right.span());
        Ok(Condition {
            left,
            operator,
            right,
            span,
        })
    }

    fn variable(&mut self) -> Result<Variable, ImpError> {
        let token = self.expect(TokenKind::Identifier, "Expected variable name")?;
        match token.value {
            Some(TokenValue::Name(name)) => Ok(Variable {
                name,
                span: token.span,
            }),
            _ => Err(ImpError::parse_error(
                token.span,
                "Expected variable name".to_string(),
            )),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<Expr, ImpError> {
        let left = self.term()?;
        self.additive(left)
    }

    /// Continue an expression whose first factor has already been parsed.
    fn expr_from(&mut self, first: Expr) -> Result<Expr, ImpError> {
        let left = self.multiplicative(first)?;
        self.additive(left)
    }

    fn additive(&mut self, mut expr: Expr) -> Result<Expr, ImpError> {
        while let Some(operator) = additive_operator(self.current.kind) {
            self.advance()?;
            let right = self.term()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<Expr, ImpError> {
        let left = self.factor()?;
        self.multiplicative(left)
    }

    fn multiplicative(&mut self, mut expr: Expr) -> Result<Expr, ImpError> {
        while let Some(operator) = multiplicative_operator(self.current.kind) {
            self.advance()?;
            let right = self.factor()?;
            expr = binary(expr, operator, right);
        }

        Ok(expr)
    }

    // factor := ('+' | '-') factor | INTEGER | '(' expr ')' | IDENTIFIER | STRING
    fn factor(&mut self) -> Result<Expr, ImpError> {
        match self.current.kind {
            TokenKind::Plus | TokenKind::Minus => {
                let token = self.advance()?;
                let operator = if token.kind == TokenKind::Plus {
                    UnaryOp::Plus
                } else {
                    UnaryOp::Negate
                };
                let operand = self.nested(Self::factor)?;
                let span = token.span.to(operand.span());
                Ok(Expr::Unary {
                    operator,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::Integer => {
                let token = self.advance()?;
                match token.value {
                    Some(TokenValue::Integer(value)) => Ok(Expr::Number {
                        value,
                        span: token.span,
                    }),
                    _ => Err(ImpError::parse_error(
                        token.span,
                        "Malformed integer literal".to_string(),
                    )),
                }
            }
            TokenKind::String => {
                let token = self.advance()?;
                match token.value {
                    Some(TokenValue::Str(value)) => Ok(Expr::StringLiteral {
                        value,
                        span: token.span,
                    }),
                    _ => Err(ImpError::parse_error(
                        token.span,
                        "Malformed string literal".to_string(),
                    )),
                }
            }
            TokenKind::Identifier => Ok(Expr::Variable(self.variable()?)),
            TokenKind::LeftParen => {
                self.advance()?;
                let expr = self.nested(Self::expr)?;
                self.expect_with_help(
                    TokenKind::RightParen,
                    "Expected ')' after expression",
                    "Every '(' needs a matching ')'.".to_string(),
                )?;
                Ok(expr)
            }
            found => Err(ImpError::parse_error(
                self.error_span(),
                format!("Expected expression, found {}", found.describe()),
            )),
        }
    }

    /// Run a rule one nesting level deeper, failing past `MAX_NESTING`.
    fn nested<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Result<T, ImpError>,
    ) -> Result<T, ImpError> {
        if self.depth >= MAX_NESTING {
            return Err(ImpError::parse_error_with_help(
                self.current.span,
                "Program is nested too deeply".to_string(),
                format!("At most {} nested levels are supported.", MAX_NESTING),
            ));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Move to the next token, returning the one just consumed.
    fn advance(&mut self) -> Result<Token, ImpError> {
        let next = self.lexer.next_token()?;
        self.previous_end = self.current.span.end;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn error_span(&self) -> Span {
        if self.check(TokenKind::Eof) && self.previous_end > 0 {
            // Point just past the last real token
            Span::single(self.previous_end)
        } else {
            self.current.span
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token, ImpError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(ImpError::parse_error(
                self.error_span(),
                format!("{}, found {}", message, self.current.kind.describe()),
            ))
        }
    }

    fn expect_with_help(
        &mut self,
        kind: TokenKind,
        message: &str,
        help: String,
    ) -> Result<Token, ImpError> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(ImpError::parse_error_with_help(
                self.error_span(),
                format!("{}, found {}", message, self.current.kind.describe()),
                help,
            ))
        }
    }
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
        span,
    }
}

fn additive_operator(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Subtract),
        _ => None,
    }
}

fn multiplicative_operator(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Multiply => Some(BinaryOp::Multiply),
        TokenKind::Divide => Some(BinaryOp::Divide),
        _ => None,
    }
}
