//! FHIRPath lexer - tokenizes expression text
//!
//! Produces the token stream consumed by the parser. Lexical failures are
//! reported in-band as [`TokenType::Error`] tokens so the parser can attach
//! the surrounding fragment to its error message.

use crate::error::{Error, Result};
use crate::token::{Token, TokenType};

/// The FHIRPath lexer
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            chars,
            position: 0,
            line: 1,
            column: 1,
            current_char,
        }
    }

    /// Text starting at `position`, cut to a short fragment for diagnostics.
    pub fn fragment(&self, position: usize) -> String {
        const MAX_FRAGMENT: usize = 24;
        let start = position.min(self.chars.len());
        let end = (start + MAX_FRAGMENT).min(self.chars.len());
        let mut text: String = self.chars[start..end].iter().collect();
        if end < self.chars.len() {
            text.push_str("...");
        }
        text
    }

    fn advance(&mut self) {
        if let Some(c) = self.current_char {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.position += 1;
        self.current_char = self.chars.get(self.position).copied();
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn current_is(&self, pred: impl Fn(char) -> bool) -> bool {
        self.current_char.map(pred).unwrap_or(false)
    }

    fn skip_whitespace(&mut self) {
        while self.current_is(char::is_whitespace) {
            self.advance();
        }
    }

    /// Skip `//` and `/* */` comments. The cursor must sit on the leading `/`.
    fn skip_comment(&mut self) -> Result<()> {
        let block = self.peek() == Some('*');
        self.advance();
        self.advance();

        if !block {
            while let Some(c) = self.current_char {
                self.advance();
                if c == '\n' {
                    break;
                }
            }
            return Ok(());
        }

        while let Some(c) = self.current_char {
            if c == '*' && self.peek() == Some('/') {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(Error::Parse("Unterminated block comment".into()))
    }

    fn read_identifier(&mut self) -> String {
        let start = self.position;
        while self.current_is(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        self.chars[start..self.position].iter().collect()
    }

    /// Read a run of at most `max` characters matching `pred`.
    fn read_while(&mut self, max: usize, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while out.len() < max && self.current_is(&pred) {
            if let Some(c) = self.current_char {
                out.push(c);
            }
            self.advance();
        }
        out
    }

    /// Read exactly `count` ASCII digits, naming `what` on failure.
    fn read_digits(&mut self, count: usize, what: &str) -> Result<String> {
        let digits = self.read_while(count, |c| c.is_ascii_digit());
        if digits.len() == count {
            Ok(digits)
        } else {
            Err(Error::Parse(format!("expected {count}-digit {what}")))
        }
    }

    /// Decode one escape sequence. The cursor sits on the character after `\`.
    ///
    /// Besides the FHIRPath escapes this accepts the C-style `\xHH..` (any
    /// number of hex digits) and `\ooo` (up to three octal digits) forms.
    fn read_escape(&mut self) -> Result<char> {
        let Some(escaped) = self.current_char else {
            return Err(Error::Parse("Incomplete escape sequence".into()));
        };

        let simple = match escaped {
            'f' => Some('\x0C'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            't' => Some('\t'),
            'u' | 'x' | '0'..='7' => None,
            other => Some(other),
        };
        if let Some(c) = simple {
            self.advance();
            return Ok(c);
        }

        let (digits, radix) = match escaped {
            'u' => {
                self.advance();
                let hex = self.read_while(4, |c| c.is_ascii_hexdigit());
                if hex.len() != 4 {
                    return Err(Error::Parse("Invalid unicode escape sequence".into()));
                }
                (hex, 16)
            }
            'x' => {
                self.advance();
                let hex = self.read_while(usize::MAX, |c| c.is_ascii_hexdigit());
                if hex.is_empty() {
                    return Err(Error::Parse("\\x used with no following hex digits".into()));
                }
                (hex.trim_start_matches('0').to_string(), 16)
            }
            _ => (self.read_while(3, |c| ('0'..='7').contains(&c)), 8),
        };

        let code = if digits.is_empty() {
            0
        } else {
            u32::from_str_radix(&digits, radix)
                .map_err(|_| Error::Parse(format!("Escape sequence out of range: {digits}")))?
        };
        char::from_u32(code)
            .ok_or_else(|| Error::Parse(format!("Invalid character code in escape: {code:#x}")))
    }

    /// Read text up to the closing `delimiter`, decoding escapes.
    fn read_quoted(&mut self, delimiter: char, what: &str) -> Result<String> {
        self.advance();
        let mut value = String::new();

        while let Some(c) = self.current_char {
            if c == delimiter {
                self.advance();
                return Ok(value);
            }
            if c == '\\' {
                self.advance();
                value.push(self.read_escape()?);
            } else {
                value.push(c);
                self.advance();
            }
        }

        Err(Error::Parse(format!("Unterminated {what}")))
    }

    /// Integer or decimal text. A `.` is only consumed when digits follow it.
    fn read_number(&mut self) -> String {
        let start = self.position;
        while self.current_is(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.current_is(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        self.chars[start..self.position].iter().collect()
    }

    /// `@DATE`, `@DATE T [TIME [TZ]]` or `@T TIME`, returned without the `@`.
    fn read_date_time(&mut self) -> Result<(String, TokenType)> {
        self.advance();

        if self.current_char == Some('T') {
            self.advance();
            let time = self.read_time_format()?;
            return Ok((format!("T{time}"), TokenType::TimeLiteral));
        }

        let date = self.read_date_format()?;
        if self.current_char != Some('T') {
            return Ok((date, TokenType::DateLiteral));
        }
        self.advance();

        if !self.current_is(|c| c.is_ascii_digit()) {
            return Ok((format!("{date}T"), TokenType::DateTimeLiteral));
        }
        let time = self.read_time_format()?;
        let zone = if self.current_is(|c| matches!(c, 'Z' | '+' | '-')) {
            self.read_timezone_offset()?
        } else {
            String::new()
        };
        Ok((format!("{date}T{time}{zone}"), TokenType::DateTimeLiteral))
    }

    /// YYYY(-MM(-DD)?)?
    fn read_date_format(&mut self) -> Result<String> {
        let mut value = self.read_digits(4, "year")?;
        for what in ["month", "day"] {
            if self.current_char != Some('-') {
                break;
            }
            self.advance();
            value.push('-');
            value.push_str(&self.read_digits(2, what)?);
        }
        Ok(value)
    }

    /// HH(:MM(:SS(.fff)?)?)?
    fn read_time_format(&mut self) -> Result<String> {
        let mut value = self.read_digits(2, "hour")?;
        for what in ["minute", "second"] {
            if self.current_char != Some(':') {
                return Ok(value);
            }
            self.advance();
            value.push(':');
            value.push_str(&self.read_digits(2, what)?);
        }

        // `@T14:34:28.is()` leaves the dot for the invocation
        if self.current_char == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            value.push('.');
            value.push_str(&self.read_while(usize::MAX, |c| c.is_ascii_digit()));
        }
        Ok(value)
    }

    /// Z or +/-HH:MM
    fn read_timezone_offset(&mut self) -> Result<String> {
        match self.current_char {
            Some('Z') => {
                self.advance();
                Ok("Z".into())
            }
            Some(sign @ ('+' | '-')) => {
                self.advance();
                let hours = self.read_digits(2, "timezone hour")?;
                if self.current_char != Some(':') {
                    return Err(Error::Parse(
                        "Invalid timezone format: expected ':' and 2-digit minute".into(),
                    ));
                }
                self.advance();
                let minutes = self.read_digits(2, "timezone minute")?;
                Ok(format!("{sign}{hours}:{minutes}"))
            }
            _ => Ok(String::new()),
        }
    }

    /// Skip whitespace and any number of comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            self.skip_whitespace();
            let comment =
                self.current_char == Some('/') && matches!(self.peek(), Some('/') | Some('*'));
            if !comment {
                return Ok(());
            }
            self.skip_comment()?;
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        if let Err(e) = self.skip_trivia() {
            return Token::error(e.to_string(), self.position, self.line, self.column);
        }

        let position = self.position;
        let line = self.line;
        let column = self.column;
        let token = |token_type: TokenType, value: &str| {
            Token::new(token_type, value.to_string(), position, line, column)
        };
        let from_result = |result: Result<String>, token_type: TokenType| match result {
            Ok(value) => Token::new(token_type, value, position, line, column),
            Err(e) => Token::error(e.to_string(), position, line, column),
        };

        let Some(c) = self.current_char else {
            return Token::eof(position, line, column);
        };

        // Two-character operators first
        let pair = match (c, self.peek()) {
            ('<', Some('=')) => Some((TokenType::LessThanOrEqual, "<=")),
            ('>', Some('=')) => Some((TokenType::GreaterThanOrEqual, ">=")),
            ('!', Some('=')) => Some((TokenType::NotEqual, "!=")),
            ('!', Some('~')) => Some((TokenType::NotEquivalent, "!~")),
            _ => None,
        };
        if let Some((token_type, text)) = pair {
            self.advance();
            self.advance();
            return token(token_type, text);
        }

        let single = match c {
            '.' => Some(TokenType::Dot),
            '[' => Some(TokenType::OpenBracket),
            ']' => Some(TokenType::CloseBracket),
            '(' => Some(TokenType::OpenParen),
            ')' => Some(TokenType::CloseParen),
            '{' => Some(TokenType::OpenBrace),
            '}' => Some(TokenType::CloseBrace),
            ',' => Some(TokenType::Comma),
            '+' => Some(TokenType::Plus),
            '-' => Some(TokenType::Minus),
            '*' => Some(TokenType::Multiply),
            '/' => Some(TokenType::Divide),
            '&' => Some(TokenType::Ampersand),
            '|' => Some(TokenType::Pipe),
            '=' => Some(TokenType::Equal),
            '~' => Some(TokenType::Equivalent),
            '<' => Some(TokenType::LessThan),
            '>' => Some(TokenType::GreaterThan),
            _ => None,
        };
        if let Some(token_type) = single {
            self.advance();
            return token(token_type, &c.to_string());
        }

        match c {
            '%' => {
                self.advance();
                match self.current_char {
                    Some('\'') => {
                        from_result(self.read_quoted('\'', "string"), TokenType::ExternalConstant)
                    }
                    Some('`') => from_result(
                        self.read_quoted('`', "delimited identifier"),
                        TokenType::ExternalConstant,
                    ),
                    _ => {
                        let ident = self.read_identifier();
                        if ident.is_empty() {
                            Token::error("Expected constant name after '%'".into(), position, line, column)
                        } else {
                            token(TokenType::ExternalConstant, &ident)
                        }
                    }
                }
            }
            '@' => match self.read_date_time() {
                Ok((value, token_type)) => Token::new(token_type, value, position, line, column),
                Err(e) => Token::error(format!("Date/time error: {e}"), position, line, column),
            },
            '\'' => from_result(self.read_quoted('\'', "string literal"), TokenType::StringLiteral),
            '`' => from_result(
                self.read_quoted('`', "delimited identifier"),
                TokenType::DelimitedIdentifier,
            ),
            '$' => {
                self.advance();
                let ident = self.read_identifier();
                if ident == "this" {
                    token(TokenType::This, "$this")
                } else {
                    Token::error(format!("Unknown variable: ${ident}"), position, line, column)
                }
            }
            c if c.is_ascii_digit() => {
                let number = self.read_number();
                token(TokenType::NumberLiteral, &number)
            }
            c if c.is_alphabetic() || c == '_' => {
                let ident = self.read_identifier();
                let token_type = TokenType::for_identifier(&ident);
                token(token_type, &ident)
            }
            other => {
                self.advance();
                Token::error(format!("Unexpected character: {other}"), position, line, column)
            }
        }
    }
}
