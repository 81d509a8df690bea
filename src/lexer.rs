use crate::error::{ErrorKind, ImpError, Span};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Integer,
    Identifier,
    String,

    // Operators and punctuation
    Assign,
    Semicolon,
    Plus,
    Minus,
    Multiply,
    Divide,
    LeftParen,
    RightParen,
    Greater,
    Less,
    Equal,

    // Keywords
    Print,
    If,
    Then,
    Else,
    End,
    While,
    Do,

    // Special
    Eof,
}

impl TokenKind {
    /// How the token kind is written in source, for diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Integer => "integer",
            TokenKind::Identifier => "identifier",
            TokenKind::String => "string",
            TokenKind::Assign => "'='",
            TokenKind::Semicolon => "';'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Multiply => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::Greater => "'>'",
            TokenKind::Less => "'<'",
            TokenKind::Equal => "'=='",
            TokenKind::Print => "'print'",
            TokenKind::If => "'if'",
            TokenKind::Then => "'then'",
            TokenKind::Else => "'else'",
            TokenKind::End => "'end'",
            TokenKind::While => "'while'",
            TokenKind::Do => "'do'",
            TokenKind::Eof => "end of input",
        }
    }

    fn keyword(text: &str) -> Option<TokenKind> {
        match text {
            "print" => Some(TokenKind::Print),
            "if" => Some(TokenKind::If),
            "then" => Some(TokenKind::Then),
            "else" => Some(TokenKind::Else),
            "end" => Some(TokenKind::End),
            "while" => Some(TokenKind::While),
            "do" => Some(TokenKind::Do),
            _ => None,
        }
    }
}

/// Literal payload carried by integer, string and identifier tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    Integer(i64),
    Str(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Option<TokenValue>,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            value: None,
            span,
        }
    }

    pub fn with_value(kind: TokenKind, value: TokenValue, span: Span) -> Self {
        Self {
            kind,
            value: Some(value),
            span,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.value {
            Some(TokenValue::Integer(n)) => write!(f, "{:?}({})", self.kind, n),
            Some(TokenValue::Str(s)) => write!(f, "{:?}({:?})", self.kind, s),
            Some(TokenValue::Name(name)) => write!(f, "{:?}({})", self.kind, name),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// Pull-based scanner. Each call to `next_token` scans exactly one token;
/// once the input is exhausted it keeps returning `Eof`.
pub struct Lexer {
    chars: Vec<char>,
    start: usize,
    current: usize,
    finished: bool,
}

/// Start scanning `source`. Nothing is read until the first token is pulled.
pub fn tokenize(source: &str) -> Lexer {
    Lexer::new(source)
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            finished: false,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, ImpError> {
        self.skip_whitespace();
        self.start = self.current;

        let c = match self.advance() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, Span::single(self.current))),
        };

        let kind = match c {
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Multiply,
            '/' => TokenKind::Divide,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '>' => TokenKind::Greater,
            '<' => TokenKind::Less,
            '=' => {
                if self.match_char('=') {
                    TokenKind::Equal
                } else {
                    TokenKind::Assign
                }
            }
            '"' => return self.string(),
            c if c.is_ascii_digit() => return self.integer(),
            c if c.is_alphabetic() || c == '_' => return Ok(self.identifier()),
            _ => {
                return Err(ImpError::lex_error(
                    Span::single(self.start),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        };

        Ok(Token::new(kind, self.span()))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.current += 1;
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.current).copied()?;
        self.current += 1;
        Some(c)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.current).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.current += 1;
            true
        } else {
            false
        }
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.current)
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn string(&mut self) -> Result<Token, ImpError> {
        while self.peek().is_some_and(|c| c != '"') {
            self.current += 1;
        }

        if self.peek().is_none() {
            return Err(ImpError::new_with_help(
                ErrorKind::LexError,
                self.span(),
                "Unterminated string".to_string(),
                "Close the string with a matching '\"'.".to_string(),
            ));
        }

        // Consume the closing "
        self.current += 1;

        // Content is taken verbatim, no escapes
        let content = self.text(self.start + 1, self.current - 1);
        Ok(Token::with_value(
            TokenKind::String,
            TokenValue::Str(content),
            self.span(),
        ))
    }

    fn integer(&mut self) -> Result<Token, ImpError> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.current += 1;
        }

        let digits = self.text(self.start, self.current);
        let value = digits.parse::<i64>().map_err(|_| {
            ImpError::lex_error(self.span(), format!("Invalid integer: {}", digits))
        })?;

        Ok(Token::with_value(
            TokenKind::Integer,
            TokenValue::Integer(value),
            self.span(),
        ))
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.current += 1;
        }

        let text = self.text(self.start, self.current);
        match TokenKind::keyword(&text) {
            Some(kind) => Token::new(kind, self.span()),
            None => Token::with_value(TokenKind::Identifier, TokenValue::Name(text), self.span()),
        }
    }
}

/// Yields every token up to and including `Eof`, then stops. A lexical error
/// is yielded once and ends the sequence.
impl Iterator for Lexer {
    type Item = Result<Token, ImpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_token();
        match &result {
            Ok(token) if token.kind == TokenKind::Eof => self.finished = true,
            Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(result)
    }
}
