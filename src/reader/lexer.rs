use super::token::{SourceLoc, Token, TokenWithLoc};
use crate::error::{LError, LResult};
use crate::value::number::parse_unsigned;
use crate::value::Value;
use std::rc::Rc;

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    chunk: Rc<str>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, chunk: impl AsRef<str>) -> Self {
        let mut lexer = Lexer {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            line: 1,
            chunk: Rc::from(chunk.as_ref()),
        };
        // Shebang line
        if input.starts_with('#') {
            while let Some(c) = lexer.current() {
                if c == b'\n' {
                    break;
                }
                lexer.pos += 1;
            }
        }
        lexer
    }

    /// Lex the whole input. The last token is always `Eof`.
    pub fn tokenize(mut self) -> LResult<Vec<TokenWithLoc>> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == Token::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> LError {
        LError::syntax(message, SourceLoc::new(&self.chunk, self.line))
    }

    fn current(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.current()?;
        if c == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) -> LResult<()> {
        while let Some(c) = self.current() {
            if c.is_ascii_whitespace() {
                self.advance();
            } else if c == b'-' && self.peek(1) == Some(b'-') {
                self.pos += 2;
                if let Some(level) = self.long_bracket_level() {
                    self.read_long_bracket(level, "comment")?;
                } else {
                    while let Some(c) = self.current() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    pub fn next_token(&mut self) -> LResult<TokenWithLoc> {
        self.skip_whitespace()?;
        let line = self.line;
        let token = match self.current() {
            None => Token::Eof,
            Some(c) => self.read_token(c)?,
        };
        Ok(TokenWithLoc { token, line })
    }

    fn read_token(&mut self, c: u8) -> LResult<Token> {
        if c.is_ascii_alphabetic() || c == b'_' {
            return Ok(self.read_name());
        }
        if c.is_ascii_digit() || (c == b'.' && self.peek(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.read_number();
        }
        if c == b'"' || c == b'\'' {
            return self.read_string(c);
        }
        if c == b'[' {
            if let Some(level) = self.long_bracket_level() {
                let text = self.read_long_bracket(level, "string")?;
                return Ok(Token::String(Rc::from(text)));
            }
        }

        let token = match c {
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => Token::Star,
            b'/' => return Ok(self.either(b'/', Token::DoubleSlash, Token::Slash)),
            b'%' => Token::Percent,
            b'^' => Token::Caret,
            b'#' => Token::Hash,
            b'=' => return Ok(self.either(b'=', Token::Eq, Token::Assign)),
            b'<' => return Ok(self.either(b'=', Token::Le, Token::Lt)),
            b'>' => return Ok(self.either(b'=', Token::Ge, Token::Gt)),
            b'~' => {
                if self.peek(1) == Some(b'=') {
                    self.pos += 2;
                    return Ok(Token::Ne);
                }
                return Err(self.error("unexpected symbol near '~'"));
            }
            b'(' => Token::LeftParen,
            b')' => Token::RightParen,
            b'{' => Token::LeftBrace,
            b'}' => Token::RightBrace,
            b'[' => Token::LeftBracket,
            b']' => Token::RightBracket,
            b';' => Token::Semicolon,
            b':' => Token::Colon,
            b',' => Token::Comma,
            b'.' => {
                if self.peek(1) == Some(b'.') {
                    if self.peek(2) == Some(b'.') {
                        self.pos += 3;
                        return Ok(Token::Dots);
                    }
                    self.pos += 2;
                    return Ok(Token::Concat);
                }
                Token::Dot
            }
            _ => {
                let ch = self.input[self.pos..].chars().next().unwrap_or('?');
                return Err(self.error(format!("unexpected symbol near '{}'", ch)));
            }
        };
        self.pos += 1;
        Ok(token)
    }

    /// Two-character operator if the next byte is `next`, else one.
    fn either(&mut self, next: u8, double: Token, single: Token) -> Token {
        if self.peek(1) == Some(next) {
            self.pos += 2;
            double
        } else {
            self.pos += 1;
            single
        }
    }

    fn read_name(&mut self) -> Token {
        let start = self.pos;
        while self
            .current()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        let word = &self.input[start..self.pos];
        Token::keyword(word).unwrap_or_else(|| Token::Name(Rc::from(word)))
    }

    fn read_number(&mut self) -> LResult<Token> {
        let start = self.pos;
        let hex = self.current() == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X'));
        if hex {
            self.pos += 2;
        }
        while let Some(c) = self.current() {
            let exponent = if hex { b"pP" } else { b"eE" };
            if exponent.contains(&c) && matches!(self.peek(1), Some(b'+' | b'-')) {
                self.pos += 2;
            } else if c.is_ascii_alphanumeric() || c == b'.' || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.input[start..self.pos];
        match parse_unsigned(text) {
            Some(Value::Int(i)) => Ok(Token::Integer(i)),
            Some(Value::Float(f)) => Ok(Token::Float(f)),
            _ => Err(self.error(format!("malformed number near '{}'", text))),
        }
    }

    fn read_string(&mut self, quote: u8) -> LResult<Token> {
        self.pos += 1; // opening quote
        let mut s = String::new();
        loop {
            let c = match self.current() {
                None => return Err(self.error("unfinished string")),
                Some(b'\n') => return Err(self.error("unfinished string")),
                Some(c) => c,
            };
            if c == quote {
                self.pos += 1;
                return Ok(Token::String(Rc::from(s)));
            }
            if c != b'\\' {
                // Copy one full UTF-8 character
                let ch = self.input[self.pos..].chars().next().unwrap_or('\u{fffd}');
                s.push(ch);
                self.pos += ch.len_utf8();
                continue;
            }
            self.pos += 1;
            let esc = self
                .current()
                .ok_or_else(|| self.error("unfinished string"))?;
            match esc {
                b'n' => s.push('\n'),
                b't' => s.push('\t'),
                b'r' => s.push('\r'),
                b'a' => s.push('\u{07}'),
                b'b' => s.push('\u{08}'),
                b'f' => s.push('\u{0c}'),
                b'v' => s.push('\u{0b}'),
                b'\\' => s.push('\\'),
                b'"' => s.push('"'),
                b'\'' => s.push('\''),
                b'\n' => {
                    self.advance();
                    s.push('\n');
                    continue;
                }
                b'z' => {
                    self.pos += 1;
                    while self.current().is_some_and(|c| c.is_ascii_whitespace()) {
                        self.advance();
                    }
                    continue;
                }
                b'x' => {
                    let digits = self.input.get(self.pos + 1..self.pos + 3).unwrap_or("");
                    let code = u8::from_str_radix(digits, 16)
                        .map_err(|_| self.error("hexadecimal digit expected"))?;
                    s.push(code as char);
                    self.pos += 3;
                    continue;
                }
                b'u' => {
                    s.push(self.read_utf8_escape()?);
                    continue;
                }
                d if d.is_ascii_digit() => {
                    let mut code: u32 = 0;
                    let mut n = 0;
                    while n < 3 && self.current().is_some_and(|c| c.is_ascii_digit()) {
                        code = code * 10 + (self.bytes[self.pos] - b'0') as u32;
                        self.pos += 1;
                        n += 1;
                    }
                    if code > 255 {
                        return Err(self.error("decimal escape too large"));
                    }
                    s.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    continue;
                }
                _ => return Err(self.error("invalid escape sequence")),
            }
            self.pos += 1;
        }
    }

    fn read_utf8_escape(&mut self) -> LResult<char> {
        // positioned on 'u'
        if self.peek(1) != Some(b'{') {
            return Err(self.error("missing '{' in \\u{xxxx}"));
        }
        self.pos += 2;
        let start = self.pos;
        while self.current().is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let digits = &self.input[start..self.pos];
        if self.current() != Some(b'}') {
            return Err(self.error("missing '}' in \\u{xxxx}"));
        }
        self.pos += 1;
        u32::from_str_radix(digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("UTF-8 value too large"))
    }

    /// If positioned on `[` `=`* `[`, return the number of `=` signs.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.current() != Some(b'[') {
            return None;
        }
        let mut level = 0;
        while self.peek(1 + level) == Some(b'=') {
            level += 1;
        }
        (self.peek(1 + level) == Some(b'[')).then_some(level)
    }

    fn read_long_bracket(&mut self, level: usize, what: &str) -> LResult<String> {
        self.pos += level + 2;
        // A newline right after the opening bracket is skipped
        if self.current() == Some(b'\r') {
            self.pos += 1;
        }
        if self.current() == Some(b'\n') {
            self.advance();
        }
        let start = self.pos;
        loop {
            match self.current() {
                None => return Err(self.error(format!("unfinished long {}", what))),
                Some(b']') => {
                    let end = self.pos;
                    let mut eq = 0;
                    while self.peek(1 + eq) == Some(b'=') {
                        eq += 1;
                    }
                    if eq == level && self.peek(1 + eq) == Some(b']') {
                        self.pos += level + 2;
                        return Ok(self.input[start..end].to_string());
                    }
                    self.pos += 1;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }
}
