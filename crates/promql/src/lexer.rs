use crate::parser::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Duration(i64),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    At,
    Eq,
    EqEq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    EqRegex,
    NeqRegex,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

pub fn lex(input: &str) -> Result<Vec<(Token, Pos)>, ParseError> {
    Lexer::new(input).run()
}

struct Lexer {
    chars: Vec<char>,
    i: usize,
    line: usize,
    col: usize,
    brace_depth: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            i: 0,
            line: 1,
            col: 1,
            brace_depth: 0,
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            col: self.col,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).copied()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.chars.get(self.i + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.i).copied()?;
        self.i += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn error(&self, pos: Pos, msg: impl Into<String>) -> ParseError {
        ParseError {
            line: pos.line,
            col: pos.col,
            msg: msg.into(),
        }
    }

    fn unexpected_char(&self, pos: Pos, c: char) -> ParseError {
        if self.brace_depth > 0 {
            self.error(pos, format!("unexpected character inside braces: '{c}'"))
        } else {
            self.error(pos, format!("unexpected character: '{c}'"))
        }
    }

    fn run(mut self) -> Result<Vec<(Token, Pos)>, ParseError> {
        let mut out = Vec::new();
        while let Some(c) = self.peek() {
            let pos = self.pos();
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '(' => {
                    self.bump();
                    out.push((Token::LParen, pos));
                }
                ')' => {
                    self.bump();
                    out.push((Token::RParen, pos));
                }
                '{' => {
                    self.bump();
                    self.brace_depth += 1;
                    out.push((Token::LBrace, pos));
                }
                '}' => {
                    self.bump();
                    self.brace_depth = self.brace_depth.saturating_sub(1);
                    out.push((Token::RBrace, pos));
                }
                '[' => {
                    self.bump();
                    out.push((Token::LBracket, pos));
                }
                ']' => {
                    self.bump();
                    out.push((Token::RBracket, pos));
                }
                ',' => {
                    self.bump();
                    out.push((Token::Comma, pos));
                }
                ':' => {
                    self.bump();
                    out.push((Token::Colon, pos));
                }
                '@' => {
                    self.bump();
                    out.push((Token::At, pos));
                }
                '+' => {
                    self.bump();
                    out.push((Token::Add, pos));
                }
                '-' => {
                    self.bump();
                    out.push((Token::Sub, pos));
                }
                '*' => {
                    self.bump();
                    out.push((Token::Mul, pos));
                }
                '/' => {
                    self.bump();
                    out.push((Token::Div, pos));
                }
                '%' => {
                    self.bump();
                    out.push((Token::Mod, pos));
                }
                '^' => {
                    self.bump();
                    out.push((Token::Pow, pos));
                }
                '=' => {
                    self.bump();
                    match self.peek() {
                        Some('=') => {
                            self.bump();
                            out.push((Token::EqEq, pos));
                        }
                        Some('~') => {
                            self.bump();
                            out.push((Token::EqRegex, pos));
                        }
                        _ => out.push((Token::Eq, pos)),
                    }
                }
                '!' => {
                    self.bump();
                    match self.peek() {
                        Some('=') => {
                            self.bump();
                            out.push((Token::Neq, pos));
                        }
                        Some('~') => {
                            self.bump();
                            out.push((Token::NeqRegex, pos));
                        }
                        other => {
                            return Err(match other {
                                Some(c) => self
                                    .error(pos, format!("unexpected character after '!': '{c}'")),
                                None => self.error(pos, "unexpected end of input after '!'"),
                            });
                        }
                    }
                }
                '<' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        out.push((Token::Lte, pos));
                    } else {
                        out.push((Token::Lt, pos));
                    }
                }
                '>' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        out.push((Token::Gte, pos));
                    } else {
                        out.push((Token::Gt, pos));
                    }
                }
                '"' | '\'' => {
                    let tok = self.scan_string(c)?;
                    out.push((tok, pos));
                }
                '`' => {
                    let tok = self.scan_raw_string()?;
                    out.push((tok, pos));
                }
                c if c.is_ascii_digit() => {
                    let tok = self.scan_number_or_duration()?;
                    out.push((tok, pos));
                }
                '.' if self.peek_ahead(1).map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                    let tok = self.scan_number_or_duration()?;
                    out.push((tok, pos));
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let tok = self.scan_ident();
                    out.push((tok, pos));
                }
                other => return Err(self.unexpected_char(pos, other)),
            }
        }
        Ok(out)
    }

    fn scan_ident(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match ident.to_ascii_lowercase().as_str() {
            "inf" => Token::Number(f64::INFINITY),
            "nan" => Token::Number(f64::NAN),
            _ => Token::Ident(ident),
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<Token, ParseError> {
        let start = self.pos();
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\\') => {
                    let esc_pos = self.pos();
                    match self.bump() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('r') => s.push('\r'),
                        Some('\\') => s.push('\\'),
                        Some('"') => s.push('"'),
                        Some('\'') => s.push('\''),
                        Some(c) => {
                            return Err(
                                self.error(esc_pos, format!("unknown escape sequence '\\{c}'"))
                            )
                        }
                        None => return Err(self.error(start, "unterminated string literal")),
                    }
                }
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn scan_raw_string(&mut self) -> Result<Token, ParseError> {
        let start = self.pos();
        self.bump();
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated raw string literal")),
                Some('`') => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::Str(s))
    }

    fn scan_number_or_duration(&mut self) -> Result<Token, ParseError> {
        let start = self.pos();
        let begin = self.i;

        if self.peek() == Some('0')
            && matches!(self.peek_ahead(1), Some('x') | Some('X'))
            && self
                .peek_ahead(2)
                .map(|c| c.is_ascii_hexdigit())
                .unwrap_or(false)
        {
            self.bump();
            self.bump();
            while self.peek().map(|c| c.is_ascii_hexdigit()).unwrap_or(false) {
                self.bump();
            }
            let text: String = self.chars[begin..self.i].iter().collect();
            let value = i64::from_str_radix(&text[2..], 16)
                .map_err(|_| self.error(start, format!("bad number literal \"{text}\"")))?;
            return Ok(Token::Number(value as f64));
        }

        let mut integral = String::new();
        while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            integral.push(self.peek().unwrap());
            self.bump();
        }

        // an integer directly followed by a unit letter is a duration
        if !integral.is_empty() && self.peek().map(is_duration_unit_start).unwrap_or(false) {
            return self.scan_duration(start, integral);
        }

        let mut text = integral;
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                text.push(self.peek().unwrap());
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            text.push('e');
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                text.push(self.peek().unwrap());
                self.bump();
            }
            if !self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                return Err(self.error(start, format!("bad number literal \"{text}\"")));
            }
            while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                text.push(self.peek().unwrap());
                self.bump();
            }
        }

        let value: f64 = text
            .parse()
            .map_err(|_| self.error(start, format!("bad number literal \"{text}\"")))?;
        Ok(Token::Number(value))
    }

    fn scan_duration(&mut self, start: Pos, first_count: String) -> Result<Token, ParseError> {
        let mut total_ms: i64 = 0;
        let mut count = first_count;
        loop {
            let unit_ms = self.scan_duration_unit(start)?;
            let n: i64 = count
                .parse()
                .map_err(|_| self.error(start, "bad duration syntax"))?;
            total_ms += n * unit_ms;

            match self.peek() {
                Some(c) if c.is_ascii_digit() => {
                    count = String::new();
                    while self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                        count.push(self.peek().unwrap());
                        self.bump();
                    }
                    if !self.peek().map(is_duration_unit_start).unwrap_or(false) {
                        return Err(self.error(start, "bad duration syntax"));
                    }
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {
                    return Err(self.error(start, "bad duration syntax"));
                }
                _ => break,
            }
        }
        Ok(Token::Duration(total_ms))
    }

    fn scan_duration_unit(&mut self, start: Pos) -> Result<i64, ParseError> {
        match self.peek() {
            Some('m') => {
                self.bump();
                if self.peek() == Some('s') {
                    self.bump();
                    Ok(1)
                } else {
                    Ok(60 * 1000)
                }
            }
            Some('s') => {
                self.bump();
                Ok(1000)
            }
            Some('h') => {
                self.bump();
                Ok(60 * 60 * 1000)
            }
            Some('d') => {
                self.bump();
                Ok(24 * 60 * 60 * 1000)
            }
            Some('w') => {
                self.bump();
                Ok(7 * 24 * 60 * 60 * 1000)
            }
            Some('y') => {
                self.bump();
                Ok(365 * 24 * 60 * 60 * 1000)
            }
            _ => Err(self.error(start, "bad duration syntax")),
        }
    }
}

fn is_duration_unit_start(c: char) -> bool {
    matches!(c, 'm' | 's' | 'h' | 'd' | 'w' | 'y')
}

pub fn format_duration(ms: i64) -> String {
    if ms == 0 {
        return "0s".into();
    }
    let (sign, mut rest) = if ms < 0 { ("-", -ms) } else { ("", ms) };
    let units: [(i64, &str); 7] = [
        (365 * 24 * 60 * 60 * 1000, "y"),
        (7 * 24 * 60 * 60 * 1000, "w"),
        (24 * 60 * 60 * 1000, "d"),
        (60 * 60 * 1000, "h"),
        (60 * 1000, "m"),
        (1000, "s"),
        (1, "ms"),
    ];
    let mut out = String::from(sign);
    for (unit, suffix) in units {
        let v = rest / unit;
        if v > 0 {
            out.push_str(&format!("{v}{suffix}"));
            rest %= unit;
        }
    }
    out
}
