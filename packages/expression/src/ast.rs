use crate::value::Value;

/// Source range of a node inside the expression text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value (string, number, boolean, null, undefined, NaN, Infinity)
    Literal { value: Value, span: Span },

    /// Variable reference
    Identifier { name: String, span: Span },

    /// Member access (obj.prop)
    Member {
        object: Box<Expression>,
        property: String,
        span: Span,
    },

    /// Bracketed indexing (obj[expr])
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
        span: Span,
    },

    /// Prefix operation (!a, -a)
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
        span: Span,
    },

    /// Binary operation (a + b)
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },

    /// Ternary (test ? consequent : alternate)
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::Identifier { span, .. }
            | Expression::Member { span, .. }
            | Expression::Index { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Conditional { span, .. } => *span,
        }
    }

    /// Names of free variables, in first-occurrence order.
    ///
    /// Unlike the textual analyzer this never reports property names.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_identifiers(self, &mut names);
        names
    }
}

fn collect_identifiers<'a>(expr: &'a Expression, names: &mut Vec<&'a str>) {
    match expr {
        Expression::Literal { .. } => {}
        Expression::Identifier { name, .. } => {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        Expression::Member { object, .. } => collect_identifiers(object, names),
        Expression::Index { object, index, .. } => {
            collect_identifiers(object, names);
            collect_identifiers(index, names);
        }
        Expression::Unary { operand, .. } => collect_identifiers(operand, names),
        Expression::Binary { left, right, .. } => {
            collect_identifiers(left, names);
            collect_identifiers(right, names);
        }
        Expression::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            collect_identifiers(test, names);
            collect_identifiers(consequent, names);
            collect_identifiers(alternate, names);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    Equals,
    NotEquals,
    StrictEquals,
    StrictNotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Coalesce,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Remainder => "%",
            BinaryOp::Equals => "==",
            BinaryOp::NotEquals => "!=",
            BinaryOp::StrictEquals => "===",
            BinaryOp::StrictNotEquals => "!==",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
        }
    }
}
