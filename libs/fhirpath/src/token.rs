//! Tokens of the FHIRPath grammar
//!
//! Operator keywords (`and`, `div`, `contains`, ...) are looked up in
//! [`KEYWORDS`] after an identifier has been scanned; `contains`, `in`, `is`
//! and `as` may still be used as function names, which the parser handles.

use phf::phf_map;

#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum TokenType {
    // Literal values. `value` holds the text without `@` or quotes.
    StringLiteral,
    NumberLiteral,
    DateLiteral,
    DateTimeLiteral,
    TimeLiteral,
    True,
    False,

    // Names
    Identifier,
    /// `` `name` ``
    DelimitedIdentifier,
    /// `%name`, `%'name'` or ``%`name` ``; `value` is the bare name.
    ExternalConstant,
    /// `$this`
    This,

    // Type operators
    Is,
    As,

    // Arithmetic
    Multiply,
    Divide,
    Div,
    Mod,
    Plus,
    Minus,
    Ampersand,

    // Collections
    Pipe,
    In,
    Contains,

    // Comparison
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Equal,
    NotEqual,
    Equivalent,
    NotEquivalent,

    // Logic
    And,
    Or,
    Xor,
    Implies,

    // Punctuation
    Dot,
    Comma,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,

    Eof,
    /// Lexical error; `value` holds the message.
    Error,
}

/// Reserved words of the grammar.
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "true" => TokenType::True,
    "false" => TokenType::False,
    "is" => TokenType::Is,
    "as" => TokenType::As,
    "div" => TokenType::Div,
    "mod" => TokenType::Mod,
    "in" => TokenType::In,
    "contains" => TokenType::Contains,
    "and" => TokenType::And,
    "or" => TokenType::Or,
    "xor" => TokenType::Xor,
    "implies" => TokenType::Implies,
};

impl TokenType {
    /// Token type of a scanned identifier: a keyword or [`TokenType::Identifier`].
    pub fn for_identifier(ident: &str) -> TokenType {
        KEYWORDS.get(ident).copied().unwrap_or(TokenType::Identifier)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub value: String,
    /// Character offset into the expression text.
    pub position: usize,
    /// 1-based line and column of the first character.
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        value: String,
        position: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            value,
            position,
            line,
            column,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self::new(TokenType::Eof, String::new(), position, line, column)
    }

    pub fn error(message: String, position: usize, line: usize, column: usize) -> Self {
        Self::new(TokenType::Error, message, position, line, column)
    }
}
