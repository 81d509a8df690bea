// imp language interpreter library
//
// Lexer, recursive-descent parser and tree-walking evaluator for a small
// imperative language: integer and string values, assignment, print,
// if/then/else/end and while/do/end over one flat variable table.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod value;

// Re-export commonly used items
pub use ast::{Block, Condition, Expr, Program, Stmt};
pub use error::{ErrorKind, ImpError, Span};
pub use evaluator::{interpret, Environment, Evaluator};
pub use lexer::{tokenize, Lexer, Token, TokenKind, TokenValue};
pub use parser::{parse, Parser};
pub use value::Value;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::run;
