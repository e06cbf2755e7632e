//! FHIRPath parser - converts expression text to an AST
//!
//! Recursive descent over the published grammar. Precedence, loosest first:
//!
//! 1. implies
//! 2. or, xor
//! 3. and
//! 4. in, contains
//! 5. =, ~, !=, !~
//! 6. <, <=, >, >=
//! 7. |
//! 8. is, as
//! 9. +, -, &
//! 10. *, /, div, mod
//! 11. unary +, -
//! 12. indexer `[ ]` and invocation `.`

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::temporal::{PartialDateTime, PartialTime};
use crate::token::{Token, TokenType};

/// Default nesting limit for expressions.
pub const MAX_RECURSION_DEPTH: usize = 200;

/// Binary operator levels, loosest first. The type operators sit between
/// `BINARY_LEVELS[TYPE_LEVEL - 1]` and `BINARY_LEVELS[TYPE_LEVEL]`.
const BINARY_LEVELS: &[&[(TokenType, BinaryOperator)]] = &[
    &[(TokenType::Implies, BinaryOperator::Implies)],
    &[
        (TokenType::Or, BinaryOperator::Or),
        (TokenType::Xor, BinaryOperator::Xor),
    ],
    &[(TokenType::And, BinaryOperator::And)],
    &[
        (TokenType::In, BinaryOperator::In),
        (TokenType::Contains, BinaryOperator::Contains),
    ],
    &[
        (TokenType::Equal, BinaryOperator::Equal),
        (TokenType::Equivalent, BinaryOperator::Equivalent),
        (TokenType::NotEqual, BinaryOperator::NotEqual),
        (TokenType::NotEquivalent, BinaryOperator::NotEquivalent),
    ],
    &[
        (TokenType::LessThan, BinaryOperator::LessThan),
        (TokenType::LessThanOrEqual, BinaryOperator::LessThanOrEqual),
        (TokenType::GreaterThan, BinaryOperator::GreaterThan),
        (TokenType::GreaterThanOrEqual, BinaryOperator::GreaterThanOrEqual),
    ],
    &[(TokenType::Pipe, BinaryOperator::Union)],
    &[
        (TokenType::Plus, BinaryOperator::Add),
        (TokenType::Minus, BinaryOperator::Subtract),
        (TokenType::Ampersand, BinaryOperator::Concat),
    ],
    &[
        (TokenType::Multiply, BinaryOperator::Multiply),
        (TokenType::Divide, BinaryOperator::Divide),
        (TokenType::Div, BinaryOperator::Div),
        (TokenType::Mod, BinaryOperator::Mod),
    ],
];

const TYPE_LEVEL: usize = 7;

const CALENDAR_UNITS: &[&str] = &[
    "year",
    "years",
    "month",
    "months",
    "week",
    "weeks",
    "day",
    "days",
    "hour",
    "hours",
    "minute",
    "minutes",
    "second",
    "seconds",
    "millisecond",
    "milliseconds",
];

/// Parser for FHIRPath expressions
pub struct Parser {
    lexer: Lexer,
    current: Token,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self::with_max_depth(input, MAX_RECURSION_DEPTH)
    }

    pub fn with_max_depth(input: &str, max_depth: usize) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            depth: 0,
            max_depth,
        }
    }

    /// Parse the whole input as one expression.
    pub fn parse(&mut self) -> Result<AstNode> {
        let expr = self.parse_expression()?;
        if !self.is(TokenType::Eof) {
            return Err(self.unexpected());
        }
        Ok(expr)
    }

    fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    fn is(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    fn error_at(&self, token: &Token, message: &str) -> Error {
        Error::Parse(format!(
            "{message} at line {}, column {} near '{}'",
            token.line,
            token.column,
            self.lexer.fragment(token.position)
        ))
    }

    fn unexpected(&self) -> Error {
        let token = &self.current;
        let message = match token.token_type {
            TokenType::Error => token.value.clone(),
            TokenType::Eof => "Unexpected end of expression".to_string(),
            _ => format!("Unexpected token '{}'", token.value),
        };
        self.error_at(token, &message)
    }

    fn expect(&mut self, token_type: TokenType, what: &str) -> Result<Token> {
        if self.is(token_type) {
            Ok(self.advance())
        } else if self.is(TokenType::Error) {
            Err(self.unexpected())
        } else {
            Err(self.error_at(&self.current, &format!("Expected {what}")))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(self.error_at(
                &self.current,
                &format!("Expression too deeply nested (max depth: {})", self.max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_expression(&mut self) -> Result<AstNode> {
        self.enter()?;
        let expr = self.parse_binary(0);
        self.leave();
        expr
    }

    fn parse_binary(&mut self, level: usize) -> Result<AstNode> {
        if level == TYPE_LEVEL {
            return self.parse_type_expression();
        }
        self.parse_operators(level)
    }

    /// Left-associative binary operators of `BINARY_LEVELS[level]`.
    fn parse_operators(&mut self, level: usize) -> Result<AstNode> {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.parse_polarity();
        };

        let mut left = self.parse_binary(level + 1)?;
        while let Some(&(_, operator)) = operators.iter().find(|(t, _)| self.is(*t)) {
            self.advance();
            let right = self.parse_binary(level + 1)?;
            left = AstNode::Binary {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// expression ('is' | 'as') typeSpecifier
    fn parse_type_expression(&mut self) -> Result<AstNode> {
        let mut operand = self.parse_operators(TYPE_LEVEL)?;
        loop {
            let operator = match self.current.token_type {
                TokenType::Is => TypeOperator::Is,
                TokenType::As => TypeOperator::As,
                _ => return Ok(operand),
            };
            self.advance();
            let type_name = self.parse_qualified_identifier()?;
            operand = AstNode::Type {
                operand: Box::new(operand),
                operator,
                type_name,
            };
        }
    }

    /// ('+' | '-') expression. A minus directly before a number folds into a
    /// negative literal so that `-2147483648` stays in range, unless an
    /// invocation or indexer follows: `-1.toString()` is `-(1.toString())`.
    fn parse_polarity(&mut self) -> Result<AstNode> {
        let operator = match self.current.token_type {
            TokenType::Plus => PolarityOperator::Plus,
            TokenType::Minus => PolarityOperator::Minus,
            _ => return self.parse_postfix(),
        };
        self.advance();

        if operator == PolarityOperator::Minus && self.is(TokenType::NumberLiteral) {
            let number = self.advance();
            let unit = self.read_unit();
            if !self.is(TokenType::Dot) && !self.is(TokenType::OpenBracket) {
                let literal = self.number_literal(&format!("-{}", number.value), unit, &number)?;
                return Ok(AstNode::Literal(literal));
            }
            let literal = self.number_literal(&number.value, unit, &number)?;
            let operand = self.parse_postfix_from(AstNode::Literal(literal))?;
            return Ok(AstNode::Polarity {
                operator,
                operand: Box::new(operand),
            });
        }

        self.enter()?;
        let operand = self.parse_polarity();
        self.leave();
        Ok(AstNode::Polarity {
            operator,
            operand: Box::new(operand?),
        })
    }

    fn parse_postfix(&mut self) -> Result<AstNode> {
        let term = self.parse_term()?;
        self.parse_postfix_from(term)
    }

    /// Trailing `.invocation` and `[index]` suffixes.
    fn parse_postfix_from(&mut self, mut expr: AstNode) -> Result<AstNode> {
        loop {
            if self.is(TokenType::Dot) {
                self.advance();
                let invocation = self.parse_invocation()?;
                expr = AstNode::Invocation {
                    target: Box::new(expr),
                    invocation: Box::new(invocation),
                };
            } else if self.is(TokenType::OpenBracket) {
                self.advance();
                let index = self.parse_expression()?;
                self.expect(TokenType::CloseBracket, "']'")?;
                expr = AstNode::Indexer {
                    collection: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_term(&mut self) -> Result<AstNode> {
        match self.current.token_type {
            TokenType::OpenParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenType::CloseParen, "')'")?;
                Ok(expr)
            }
            TokenType::ExternalConstant => Ok(AstNode::ExternalConstant(self.advance().value)),
            TokenType::OpenBrace => self.parse_collection(),
            TokenType::True => {
                self.advance();
                Ok(AstNode::Literal(Literal::Boolean(true)))
            }
            TokenType::False => {
                self.advance();
                Ok(AstNode::Literal(Literal::Boolean(false)))
            }
            TokenType::StringLiteral => Ok(AstNode::Literal(Literal::String(self.advance().value))),
            TokenType::NumberLiteral => {
                let token = self.advance();
                let unit = self.read_unit();
                Ok(AstNode::Literal(self.number_literal(&token.value, unit, &token)?))
            }
            TokenType::DateLiteral => {
                let token = self.advance();
                let date = PartialDateTime::parse_date(&token.value)
                    .map_err(|e| self.error_at(&token, &e.to_string()))?;
                Ok(AstNode::Literal(Literal::Date(date)))
            }
            TokenType::DateTimeLiteral => {
                let token = self.advance();
                let date_time = PartialDateTime::parse_date_time(&token.value)
                    .map_err(|e| self.error_at(&token, &e.to_string()))?;
                Ok(AstNode::Literal(Literal::DateTime(date_time.or_utc())))
            }
            TokenType::TimeLiteral => {
                let token = self.advance();
                let time = PartialTime::parse(&token.value)
                    .map_err(|e| self.error_at(&token, &e.to_string()))?;
                Ok(AstNode::Literal(Literal::Time(time)))
            }
            _ => self.parse_invocation(),
        }
    }

    /// `{}` or `{ expr (',' expr)* }`
    fn parse_collection(&mut self) -> Result<AstNode> {
        self.advance();
        if self.is(TokenType::CloseBrace) {
            self.advance();
            return Ok(AstNode::Literal(Literal::Empty));
        }

        let mut elements = vec![self.parse_expression()?];
        while self.is(TokenType::Comma) {
            self.advance();
            elements.push(self.parse_expression()?);
        }
        self.expect(TokenType::CloseBrace, "',' or '}' in collection literal")?;
        Ok(AstNode::Collection(elements))
    }

    /// Quantity unit after a number: a UCUM string or a calendar keyword.
    fn read_unit(&mut self) -> Option<(String, bool)> {
        match self.current.token_type {
            TokenType::StringLiteral => Some((self.advance().value, false)),
            TokenType::Identifier if CALENDAR_UNITS.contains(&self.current.value.as_str()) => {
                Some((self.advance().value, true))
            }
            _ => None,
        }
    }

    /// Integer, decimal or quantity literal from `text` (sign included).
    fn number_literal(
        &self,
        text: &str,
        unit: Option<(String, bool)>,
        token: &Token,
    ) -> Result<Literal> {
        if let Some((unit, calendar)) = unit {
            let value = Decimal::from_str(text)
                .map_err(|e| self.error_at(token, &format!("Invalid number {text}: {e}")))?;
            return Ok(Literal::Quantity {
                value,
                unit,
                calendar,
            });
        }

        if text.contains('.') {
            let value = Decimal::from_str(text)
                .map_err(|e| self.error_at(token, &format!("Invalid number {text}: {e}")))?;
            return Ok(Literal::Decimal(value));
        }

        let value = i32::from_str(text).map_err(|_| {
            self.error_at(token, &format!("Integer literal {text} is out of range"))
        })?;
        Ok(Literal::Integer(i64::from(value)))
    }

    /// identifier | function | '$this'
    fn parse_invocation(&mut self) -> Result<AstNode> {
        match self.current.token_type {
            TokenType::This => {
                self.advance();
                Ok(AstNode::This)
            }
            // Operator keywords double as function names: contains(), is(), as()
            TokenType::Identifier
            | TokenType::DelimitedIdentifier
            | TokenType::Contains
            | TokenType::In
            | TokenType::As
            | TokenType::Is => {
                let name = self.advance().value;
                if !self.is(TokenType::OpenParen) {
                    return Ok(AstNode::Member(name));
                }
                self.advance();

                let mut args = Vec::new();
                if !self.is(TokenType::CloseParen) {
                    args.push(self.parse_expression()?);
                    while self.is(TokenType::Comma) {
                        self.advance();
                        args.push(self.parse_expression()?);
                    }
                }
                self.expect(TokenType::CloseParen, "')' after function arguments")?;
                Ok(AstNode::Function { name, args })
            }
            _ => Err(self.unexpected()),
        }
    }

    /// identifier ('.' identifier)*
    fn parse_qualified_identifier(&mut self) -> Result<QualifiedIdentifier> {
        let mut parts = Vec::new();
        loop {
            if !self.is(TokenType::Identifier) && !self.is(TokenType::DelimitedIdentifier) {
                return Err(self.error_at(&self.current, "Expected type name"));
            }
            parts.push(self.advance().value);
            if !self.is(TokenType::Dot) {
                return Ok(QualifiedIdentifier { parts });
            }
            self.advance();
        }
    }
}
