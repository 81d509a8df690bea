use crate::error::Span;

/// A parsed program is its top-level block.
pub type Program = Block;

/// Value-producing nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: i64,
        span: Span,
    },
    StringLiteral {
        value: String,
        span: Span,
    },
    Variable(Variable),
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Number { span, .. } => span,
            Expr::StringLiteral { span, .. } => span,
            Expr::Variable(variable) => &variable.span,
            Expr::Unary { span, .. } => span,
            Expr::Binary { span, .. } => span,
        }
    }
}

// Operator chains such as `1 + 1 + ... + 1` nest as deeply as they are long,
// so children are unlinked onto a worklist instead of dropped recursively.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut expr) = pending.pop() {
            detach_children(&mut expr, &mut pending);
        }
    }
}

fn detach_children(expr: &mut Expr, pending: &mut Vec<Box<Expr>>) {
    match expr {
        Expr::Unary { operand, .. } => detach(operand, pending),
        Expr::Binary { left, right, .. } => {
            detach(left, pending);
            detach(right, pending);
        }
        _ => {}
    }
}

fn detach(slot: &mut Box<Expr>, pending: &mut Vec<Box<Expr>>) {
    if matches!(**slot, Expr::Unary { .. } | Expr::Binary { .. }) {
        let leaf = Box::new(Expr::Number {
            value: 0,
            span: Span::new(0, 0),
        });
        pending.push(std::mem::replace(slot, leaf));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub span: Span,
}

/// A comparison. `if` and `while` only ever test one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Expr,
    pub operator: CompareOp,
    pub right: Expr,
    pub span: Span,
}

/// A compound statement: statements run in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        target: Variable,
        value: Expr,
        span: Span,
    },
    Print {
        value: Expr,
        span: Span,
    },
    If {
        condition: Condition,
        then_branch: Block,
        else_branch: Option<Block>,
        span: Span,
    },
    While {
        condition: Condition,
        body: Block,
        span: Span,
    },
    /// A bare expression whose value is the statement's value.
    Expression {
        expr: Expr,
        span: Span,
    },
    NoOp {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Assign { span, .. } => span,
            Stmt::Print { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::While { span, .. } => span,
            Stmt::Expression { span, .. } => span,
            Stmt::NoOp { span } => span,
        }
    }

    /// Statements closed by the `end` keyword.
    pub fn ends_with_keyword(&self) -> bool {
        matches!(self, Stmt::If { .. } | Stmt::While { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    Less,
    Equal,
}
