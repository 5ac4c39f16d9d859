use crate::ast::*;
use crate::error::{ExprError, ExprResult};
use crate::tokenizer::{tokenize, unquote, Token};
use crate::value::Value;

/// Parser for template expressions
pub struct Parser<'src> {
    tokens: Vec<(Token<'src>, std::ops::Range<usize>)>,
    pos: usize,
    source_len: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ExprResult<Self> {
        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            source_len: source.len(),
        })
    }

    /// Parse a complete expression, rejecting trailing tokens
    pub fn parse(&mut self) -> ExprResult<Expression> {
        if self.tokens.is_empty() {
            return Err(ExprError::Empty);
        }

        let expr = self.parse_expression()?;

        if let Some((token, span)) = self.peek() {
            return Err(ExprError::unexpected_token(
                span.start,
                "end of expression",
                token.to_string(),
            ));
        }

        Ok(expr)
    }

    /// Parse an expression with full operator precedence
    fn parse_expression(&mut self) -> ExprResult<Expression> {
        self.parse_conditional_expression()
    }

    /// Parse ternary expression (lowest precedence, right associative)
    fn parse_conditional_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let test = self.parse_coalesce_expression()?;

        if !self.match_token(Token::Question) {
            return Ok(test);
        }

        let consequent = self.parse_conditional_expression()?;
        self.expect(Token::Colon)?;
        let alternate = self.parse_conditional_expression()?;
        let end = self.previous_end();

        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
            span: Span::new(start, end),
        })
    }

    /// Parse nullish coalescing (??)
    fn parse_coalesce_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_or_expression()?;

        while self.match_token(Token::Coalesce) {
            let right = self.parse_or_expression()?;
            left = self.binary(left, BinaryOp::Coalesce, right, start);
        }

        Ok(left)
    }

    /// Parse OR expression
    fn parse_or_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_and_expression()?;

        while self.match_token(Token::Or) {
            let right = self.parse_and_expression()?;
            left = self.binary(left, BinaryOp::Or, right, start);
        }

        Ok(left)
    }

    /// Parse AND expression
    fn parse_and_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_equality_expression()?;

        while self.match_token(Token::And) {
            let right = self.parse_equality_expression()?;
            left = self.binary(left, BinaryOp::And, right, start);
        }

        Ok(left)
    }

    /// Parse equality expression (== != === !==)
    fn parse_equality_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_comparison_expression()?;

        while let Some(op) = self.match_equality_op() {
            let right = self.parse_comparison_expression()?;
            left = self.binary(left, op, right, start);
        }

        Ok(left)
    }

    /// Parse comparison expression (< > <= >=)
    fn parse_comparison_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_additive_expression()?;

        while let Some(op) = self.match_comparison_op() {
            let right = self.parse_additive_expression()?;
            left = self.binary(left, op, right, start);
        }

        Ok(left)
    }

    /// Parse additive expression (+ -)
    fn parse_additive_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_multiplicative_expression()?;

        while let Some(op) = self.match_additive_op() {
            let right = self.parse_multiplicative_expression()?;
            left = self.binary(left, op, right, start);
        }

        Ok(left)
    }

    /// Parse multiplicative expression (* / %)
    fn parse_multiplicative_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut left = self.parse_unary_expression()?;

        while let Some(op) = self.match_multiplicative_op() {
            let right = self.parse_unary_expression()?;
            left = self.binary(left, op, right, start);
        }

        Ok(left)
    }

    /// Parse prefix operators (! - +)
    fn parse_unary_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();

        let operator = if self.match_token(Token::Bang) {
            UnaryOp::Not
        } else if self.match_token(Token::Minus) {
            UnaryOp::Negate
        } else if self.match_token(Token::Plus) {
            UnaryOp::Plus
        } else {
            return self.parse_postfix_expression();
        };

        let operand = self.parse_unary_expression()?;
        Ok(Expression::Unary {
            operator,
            operand: Box::new(operand),
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Parse member access and indexing chains: a.b[c].d
    fn parse_postfix_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();
        let mut expr = self.parse_primary_expression()?;

        loop {
            if self.match_token(Token::Dot) {
                let property = self.expect_property_name()?;
                expr = Expression::Member {
                    object: Box::new(expr),
                    property,
                    span: Span::new(start, self.previous_end()),
                };
            } else if self.match_token(Token::LBracket) {
                let index = self.parse_expression()?;
                self.expect(Token::RBracket)?;
                expr = Expression::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span: Span::new(start, self.previous_end()),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse primary expression (literals, identifiers, grouping)
    fn parse_primary_expression(&mut self) -> ExprResult<Expression> {
        let start = self.current_pos();

        let Some((token, span)) = self.advance().cloned() else {
            return Err(ExprError::unexpected_eof(self.source_len));
        };

        let literal = |value: Value| Expression::Literal {
            value,
            span: Span::new(span.start, span.end),
        };

        match token {
            Token::True => Ok(literal(Value::Boolean(true))),
            Token::False => Ok(literal(Value::Boolean(false))),
            Token::Null => Ok(literal(Value::Null)),
            Token::Undefined => Ok(literal(Value::Undefined)),
            Token::NaN => Ok(literal(Value::Number(f64::NAN))),
            Token::Infinity => Ok(literal(Value::Number(f64::INFINITY))),
            Token::Number(n) => {
                let value = n
                    .parse::<f64>()
                    .map_err(|_| ExprError::unexpected_token(span.start, "number", n))?;
                Ok(literal(Value::Number(value)))
            }
            Token::String(s) => Ok(literal(Value::String(unquote(s)))),
            Token::Ident(name) => Ok(Expression::Identifier {
                name: name.to_string(),
                span: Span::new(span.start, span.end),
            }),
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            // `{expr}` placeholders are accepted as plain grouping
            Token::LBrace => {
                let expr = self.parse_expression()?;
                self.expect(Token::RBrace)?;
                Ok(expr)
            }
            other => Err(ExprError::unexpected_token(start, "expression", other.to_string())),
        }
    }

    fn binary(&self, left: Expression, operator: BinaryOp, right: Expression, start: usize) -> Expression {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span: Span::new(start, self.previous_end()),
        }
    }

    // Helper methods for matching operators

    fn match_equality_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::StrictEquals) {
            Some(BinaryOp::StrictEquals)
        } else if self.match_token(Token::StrictNotEquals) {
            Some(BinaryOp::StrictNotEquals)
        } else if self.match_token(Token::EqualsEquals) {
            Some(BinaryOp::Equals)
        } else if self.match_token(Token::NotEquals) {
            Some(BinaryOp::NotEquals)
        } else {
            None
        }
    }

    fn match_comparison_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::LessThanEquals) {
            Some(BinaryOp::LessThanOrEqual)
        } else if self.match_token(Token::GreaterThanEquals) {
            Some(BinaryOp::GreaterThanOrEqual)
        } else if self.match_token(Token::LessThan) {
            Some(BinaryOp::LessThan)
        } else if self.match_token(Token::GreaterThan) {
            Some(BinaryOp::GreaterThan)
        } else {
            None
        }
    }

    fn match_additive_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Plus) {
            Some(BinaryOp::Add)
        } else if self.match_token(Token::Minus) {
            Some(BinaryOp::Subtract)
        } else {
            None
        }
    }

    fn match_multiplicative_op(&mut self) -> Option<BinaryOp> {
        if self.match_token(Token::Star) {
            Some(BinaryOp::Multiply)
        } else if self.match_token(Token::Slash) {
            Some(BinaryOp::Divide)
        } else if self.match_token(Token::Percent) {
            Some(BinaryOp::Remainder)
        } else {
            None
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&(Token<'src>, std::ops::Range<usize>)> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn check(&self, token: &Token) -> bool {
        if let Some((t, _)) = self.peek() {
            std::mem::discriminant(t) == std::mem::discriminant(token)
        } else {
            false
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(&token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ExprResult<()> {
        if self.check(&token) {
            self.advance();
            return Ok(());
        }
        match self.peek() {
            Some((found, span)) => Err(ExprError::unexpected_token(
                span.start,
                token.to_string(),
                found.to_string(),
            )),
            None => Err(ExprError::unexpected_eof(self.source_len)),
        }
    }

    /// Property names after `.` may be reserved words (`obj.null`)
    fn expect_property_name(&mut self) -> ExprResult<String> {
        match self.advance().cloned() {
            Some((Token::Ident(name), _)) => Ok(name.to_string()),
            Some((
                token @ (Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
                | Token::NaN
                | Token::Infinity),
                _,
            )) => Ok(token.to_string()),
            Some((token, span)) => Err(ExprError::unexpected_token(span.start, "property name", token.to_string())),
            None => Err(ExprError::unexpected_eof(self.source_len)),
        }
    }

    fn current_pos(&self) -> usize {
        self.peek().map(|(_, span)| span.start).unwrap_or(self.source_len)
    }

    fn previous_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, span)| span.end)
            .unwrap_or(0)
    }
}

/// Parse an expression string into an AST
pub fn parse(source: &str) -> ExprResult<Expression> {
    Parser::new(source)?.parse()
}
