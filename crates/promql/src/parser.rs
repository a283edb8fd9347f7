use crate::ast::{
    AggGrouping, AggOp, AtModifier, BinModifier, BinOp, Expr, Grouping, MatchOp, Matcher,
    VectorMatching, VectorSelector,
};
use crate::lexer::{lex, Pos, Token};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub msg: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: parse error: {}", self.line, self.col, self.msg)
    }
}

impl std::error::Error for ParseError {}

pub fn parse(input: &str) -> Result<Expr, ParseError> {
    let tokens = lex(input)?;
    let mut parser = Parser { tokens, i: 0 };
    if parser.at_end() {
        return Err(ParseError {
            line: 1,
            col: 1,
            msg: "no expression found in input".into(),
        });
    }
    let expr = parser.parse_binary(1)?;
    if !parser.at_end() {
        return Err(parser.error_here("could not parse remaining input"));
    }
    Ok(expr)
}

const UNARY_PRECEDENCE: u8 = 6;

struct Parser {
    tokens: Vec<(Token, Pos)>,
    i: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.i >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.i).map(|(t, _)| t)
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Ident(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.i).map(|(t, _)| t.clone());
        if tok.is_some() {
            self.i += 1;
        }
        tok
    }

    fn here(&self) -> Pos {
        self.tokens
            .get(self.i)
            .or_else(|| self.tokens.last())
            .map(|(_, p)| *p)
            .unwrap_or(Pos { line: 1, col: 1 })
    }

    fn error_here(&self, msg: impl Into<String>) -> ParseError {
        let pos = self.here();
        ParseError {
            line: pos.line,
            col: pos.col,
            msg: msg.into(),
        }
    }

    fn expect(&mut self, tok: Token, msg: &str) -> Result<(), ParseError> {
        if self.peek() == Some(&tok) {
            self.bump();
            Ok(())
        } else {
            Err(self.error_here(msg))
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.peek_binop() {
            let precedence = binop_precedence(op);
            if precedence < min_precedence {
                break;
            }
            self.bump();
            let modifier = self.parse_bin_modifier(op)?;
            // ^ is right-associative
            let next_min = if op == BinOp::Pow {
                precedence
            } else {
                precedence + 1
            };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                modifier,
            };
        }
        Ok(lhs)
    }

    fn peek_binop(&self) -> Option<BinOp> {
        Some(match self.peek()? {
            Token::Add => BinOp::Add,
            Token::Sub => BinOp::Sub,
            Token::Mul => BinOp::Mul,
            Token::Div => BinOp::Div,
            Token::Mod => BinOp::Mod,
            Token::Pow => BinOp::Pow,
            Token::EqEq => BinOp::Eql,
            Token::Neq => BinOp::Neq,
            Token::Lt => BinOp::Lt,
            Token::Gt => BinOp::Gt,
            Token::Lte => BinOp::Lte,
            Token::Gte => BinOp::Gte,
            Token::Ident(s) => match s.as_str() {
                "and" => BinOp::And,
                "or" => BinOp::Or,
                "unless" => BinOp::Unless,
                "atan2" => BinOp::Atan2,
                _ => return None,
            },
            _ => return None,
        })
    }

    fn parse_bin_modifier(&mut self, op: BinOp) -> Result<BinModifier, ParseError> {
        let mut modifier = BinModifier::default();
        loop {
            match self.peek_ident() {
                Some("bool") => {
                    if !op.is_comparison() {
                        return Err(self
                            .error_here("bool modifier can only be used on comparison operators"));
                    }
                    self.bump();
                    modifier.return_bool = true;
                }
                Some(kw @ ("on" | "ignoring")) => {
                    if modifier.matching.is_some() {
                        return Err(self.error_here("vector matching specified twice"));
                    }
                    let on = kw == "on";
                    self.bump();
                    let labels = self.parse_label_list()?;
                    modifier.matching = Some(VectorMatching {
                        on,
                        labels,
                        group: None,
                    });
                }
                Some(kw @ ("group_left" | "group_right")) => {
                    let left = kw == "group_left";
                    self.bump();
                    let labels = if self.peek() == Some(&Token::LParen) {
                        self.parse_label_list()?
                    } else {
                        Vec::new()
                    };
                    match &mut modifier.matching {
                        Some(matching) => matching.group = Some(Grouping { left, labels }),
                        None => {
                            return Err(self.error_here(
                                "grouping modifier must follow on or ignoring",
                            ))
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(modifier)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Sub) => {
                self.bump();
                let expr = self.parse_binary(UNARY_PRECEDENCE)?;
                Ok(Expr::Unary {
                    negative: true,
                    expr: Box::new(expr),
                })
            }
            Some(Token::Add) => {
                self.bump();
                let expr = self.parse_binary(UNARY_PRECEDENCE)?;
                Ok(Expr::Unary {
                    negative: false,
                    expr: Box::new(expr),
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Some(Token::LBracket) => {
                    self.bump();
                    let range = self.parse_duration()?;
                    if self.peek() == Some(&Token::Colon) {
                        self.bump();
                        let step = match self.peek() {
                            Some(Token::Duration(_)) => Some(self.parse_duration()?),
                            _ => None,
                        };
                        self.expect(Token::RBracket, "expected \"]\" in subquery selector")?;
                        expr = Expr::Subquery {
                            expr: Box::new(expr),
                            range,
                            step,
                            offset: None,
                            at: None,
                        };
                    } else {
                        self.expect(Token::RBracket, "expected \"]\" in range selector")?;
                        expr = match expr {
                            Expr::Selector(selector) => Expr::Matrix { selector, range },
                            _ => {
                                return Err(self.error_here(
                                    "range specifier can only follow a vector selector",
                                ))
                            }
                        };
                    }
                }
                Some(Token::Ident(kw)) if kw == "offset" => {
                    self.bump();
                    let negative = match self.peek() {
                        Some(Token::Sub) => {
                            self.bump();
                            true
                        }
                        Some(Token::Add) => {
                            self.bump();
                            false
                        }
                        _ => false,
                    };
                    let mut duration = self.parse_duration()?;
                    if negative {
                        duration = -duration;
                    }
                    self.set_offset(&mut expr, duration)?;
                }
                Some(Token::At) => {
                    self.bump();
                    let at = self.parse_at_modifier()?;
                    self.set_at(&mut expr, at)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn set_offset(&mut self, expr: &mut Expr, duration: i64) -> Result<(), ParseError> {
        let slot = match expr {
            Expr::Selector(vs) => &mut vs.offset,
            Expr::Matrix { selector, .. } => &mut selector.offset,
            Expr::Subquery { offset, .. } => offset,
            _ => {
                return Err(self.error_here(
                    "offset modifier must be preceded by a selector or subquery",
                ))
            }
        };
        if slot.is_some() {
            return Err(self.error_here("offset may not be set multiple times"));
        }
        *slot = Some(duration);
        Ok(())
    }

    fn set_at(&mut self, expr: &mut Expr, at: AtModifier) -> Result<(), ParseError> {
        let slot = match expr {
            Expr::Selector(vs) => &mut vs.at,
            Expr::Matrix { selector, .. } => &mut selector.at,
            Expr::Subquery { at, .. } => at,
            _ => {
                return Err(
                    self.error_here("@ modifier must be preceded by a selector or subquery")
                )
            }
        };
        if slot.is_some() {
            return Err(self.error_here("@ may not be set multiple times"));
        }
        *slot = Some(at);
        Ok(())
    }

    fn parse_at_modifier(&mut self) -> Result<AtModifier, ParseError> {
        match self.peek().cloned() {
            Some(Token::Number(ts)) => {
                self.bump();
                Ok(AtModifier::Timestamp(ts))
            }
            Some(Token::Sub) => {
                self.bump();
                match self.peek().cloned() {
                    Some(Token::Number(ts)) => {
                        self.bump();
                        Ok(AtModifier::Timestamp(-ts))
                    }
                    _ => Err(self.error_here("invalid timestamp in @ modifier")),
                }
            }
            Some(Token::Ident(kw)) if kw == "start" || kw == "end" => {
                self.bump();
                self.expect(Token::LParen, "expected \"(\" after @ modifier preprocessor")?;
                self.expect(Token::RParen, "expected \")\" after @ modifier preprocessor")?;
                Ok(if kw == "start" {
                    AtModifier::Start
                } else {
                    AtModifier::End
                })
            }
            _ => Err(self.error_here("invalid expression in @ modifier")),
        }
    }

    fn parse_duration(&mut self) -> Result<i64, ParseError> {
        match self.peek() {
            Some(Token::Duration(ms)) => {
                let ms = *ms;
                self.bump();
                Ok(ms)
            }
            _ => Err(self.error_here("expected duration")),
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        match self.peek().cloned() {
            None => Err(self.error_here("unexpected end of input")),
            Some(Token::Number(n)) => {
                self.bump();
                Ok(Expr::Number(n))
            }
            Some(Token::Str(s)) => {
                self.bump();
                Ok(Expr::Str(s))
            }
            Some(Token::LParen) => {
                self.bump();
                let inner = self.parse_binary(1)?;
                self.expect(Token::RParen, "missing closing parenthesis")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            Some(Token::LBrace) => {
                let matchers = self.parse_matchers()?;
                if matchers.is_empty() {
                    return Err(self
                        .error_here("vector selector must contain at least one non-empty matcher"));
                }
                Ok(Expr::Selector(VectorSelector {
                    name: None,
                    matchers,
                    offset: None,
                    at: None,
                }))
            }
            Some(Token::Ident(name)) => self.parse_ident_expr(name),
            Some(Token::Duration(_)) => Err(self.error_here("unexpected duration")),
            Some(_) => Err(self.error_here("unexpected token")),
        }
    }

    fn parse_ident_expr(&mut self, name: String) -> Result<Expr, ParseError> {
        if is_reserved_keyword(&name) {
            return Err(self.error_here(format!("unexpected keyword \"{name}\"")));
        }
        self.bump();

        if let Some(op) = AggOp::from_name(&name) {
            let next_is_grouping = matches!(self.peek_ident(), Some("by") | Some("without"));
            if self.peek() == Some(&Token::LParen) || next_is_grouping {
                return self.parse_aggregate(op);
            }
        }

        if self.peek() == Some(&Token::LParen) {
            self.bump();
            let mut args = Vec::new();
            if self.peek() != Some(&Token::RParen) {
                loop {
                    args.push(self.parse_binary(1)?);
                    if self.peek() == Some(&Token::Comma) {
                        self.bump();
                        continue;
                    }
                    break;
                }
            }
            self.expect(Token::RParen, "expected \")\" in function call")?;
            return Ok(Expr::Call { func: name, args });
        }

        let mut selector = VectorSelector::named(name);
        if self.peek() == Some(&Token::LBrace) {
            selector.matchers = self.parse_matchers()?;
        }
        Ok(Expr::Selector(selector))
    }

    fn parse_aggregate(&mut self, op: AggOp) -> Result<Expr, ParseError> {
        let mut grouping = self.parse_agg_grouping()?;

        self.expect(Token::LParen, "expected \"(\" in aggregation")?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            loop {
                args.push(self.parse_binary(1)?);
                if self.peek() == Some(&Token::Comma) {
                    self.bump();
                    continue;
                }
                break;
            }
        }
        self.expect(Token::RParen, "expected \")\" in aggregation")?;

        if grouping.is_none() {
            grouping = self.parse_agg_grouping()?;
        }

        let (param, expr) = if op.takes_param() {
            if args.len() != 2 {
                return Err(self.error_here(format!(
                    "wrong number of arguments for aggregate expression provided, expected 2, got {}",
                    args.len()
                )));
            }
            let expr = args.pop().unwrap();
            let param = args.pop().unwrap();
            (Some(Box::new(param)), expr)
        } else {
            if args.len() != 1 {
                return Err(self.error_here(format!(
                    "wrong number of arguments for aggregate expression provided, expected 1, got {}",
                    args.len()
                )));
            }
            (None, args.pop().unwrap())
        };

        Ok(Expr::Aggregate {
            op,
            grouping,
            param,
            expr: Box::new(expr),
        })
    }

    fn parse_agg_grouping(&mut self) -> Result<Option<AggGrouping>, ParseError> {
        match self.peek_ident() {
            Some(kw @ ("by" | "without")) => {
                let without = kw == "without";
                self.bump();
                let labels = self.parse_label_list()?;
                Ok(Some(AggGrouping { without, labels }))
            }
            _ => Ok(None),
        }
    }

    fn parse_label_list(&mut self) -> Result<Vec<String>, ParseError> {
        self.expect(Token::LParen, "expected \"(\" in grouping opts")?;
        let mut labels = Vec::new();
        loop {
            match self.peek().cloned() {
                Some(Token::RParen) => {
                    self.bump();
                    break;
                }
                Some(Token::Ident(label)) => {
                    self.bump();
                    labels.push(label);
                    match self.peek() {
                        Some(Token::Comma) => {
                            self.bump();
                        }
                        Some(Token::RParen) => {}
                        _ => return Err(self.error_here("expected \",\" or \")\" in grouping opts")),
                    }
                }
                _ => return Err(self.error_here("expected label name in grouping opts")),
            }
        }
        Ok(labels)
    }

    fn parse_matchers(&mut self) -> Result<Vec<Matcher>, ParseError> {
        self.expect(Token::LBrace, "expected \"{\" in label matching")?;
        let mut matchers = Vec::new();
        loop {
            if self.peek() == Some(&Token::RBrace) {
                self.bump();
                break;
            }
            let name = match self.peek().cloned() {
                Some(Token::Ident(name)) => {
                    self.bump();
                    name
                }
                _ => return Err(self.error_here("expected label name in label matching")),
            };
            let op = match self.peek() {
                Some(Token::Eq) => MatchOp::Eq,
                Some(Token::Neq) => MatchOp::Neq,
                Some(Token::EqRegex) => MatchOp::Regex,
                Some(Token::NeqRegex) => MatchOp::NotRegex,
                _ => return Err(self.error_here("expected label matching operator")),
            };
            self.bump();
            let value = match self.peek().cloned() {
                Some(Token::Str(value)) => {
                    self.bump();
                    value
                }
                _ => return Err(self.error_here("expected string in label matching")),
            };
            matchers.push(Matcher { name, op, value });
            match self.peek() {
                Some(Token::Comma) => {
                    self.bump();
                }
                Some(Token::RBrace) => {}
                _ => return Err(self.error_here("expected \",\" or \"}\" in label matching")),
            }
        }
        Ok(matchers)
    }
}

fn binop_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Or => 1,
        BinOp::And | BinOp::Unless => 2,
        BinOp::Eql | BinOp::Neq | BinOp::Lt | BinOp::Gt | BinOp::Lte | BinOp::Gte => 3,
        BinOp::Add | BinOp::Sub => 4,
        BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Atan2 => 5,
        BinOp::Pow => 6,
    }
}

fn is_reserved_keyword(name: &str) -> bool {
    matches!(
        name,
        "and"
            | "or"
            | "unless"
            | "by"
            | "without"
            | "on"
            | "ignoring"
            | "group_left"
            | "group_right"
            | "bool"
            | "offset"
    )
}
