use std::fmt;

use crate::lexer::format_duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    Eq,
    Neq,
    Regex,
    NotRegex,
}

impl fmt::Display for MatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Regex => "=~",
            Self::NotRegex => "!~",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matcher {
    pub name: String,
    pub op: MatchOp,
    pub value: String,
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}\"{}\"", self.name, self.op, escape(&self.value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AtModifier {
    Timestamp(f64),
    Start,
    End,
}

impl fmt::Display for AtModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timestamp(ts) => write!(f, "@ {ts}"),
            Self::Start => f.write_str("@ start()"),
            Self::End => f.write_str("@ end()"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorSelector {
    pub name: Option<String>,
    pub matchers: Vec<Matcher>,
    pub offset: Option<i64>,
    pub at: Option<AtModifier>,
}

impl VectorSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn has_matcher(&self, label: &str) -> bool {
        self.matchers.iter().any(|m| m.name == label)
    }

    fn fmt_base(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            f.write_str(name)?;
        }
        if !self.matchers.is_empty() {
            write!(f, "{{")?;
            for (i, m) in self.matchers.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{m}")?;
            }
            write!(f, "}}")?;
        }
        Ok(())
    }

    fn fmt_modifiers(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(off) = self.offset {
            write!(f, " offset {}", format_duration(off))?;
        }
        if let Some(at) = self.at {
            write!(f, " {at}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VectorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_base(f)?;
        self.fmt_modifiers(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Unless,
    Eql,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Atan2,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eql | Self::Neq | Self::Lt | Self::Gt | Self::Lte | Self::Gte
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Unless => "unless",
            Self::Eql => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "^",
            Self::Atan2 => "atan2",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinModifier {
    pub return_bool: bool,
    pub matching: Option<VectorMatching>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatching {
    pub on: bool,
    pub labels: Vec<String>,
    pub group: Option<Grouping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub left: bool,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    CountValues,
    Stddev,
    Stdvar,
    Topk,
    Bottomk,
    Quantile,
    Group,
}

impl AggOp {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => Self::Sum,
            "avg" => Self::Avg,
            "min" => Self::Min,
            "max" => Self::Max,
            "count" => Self::Count,
            "count_values" => Self::CountValues,
            "stddev" => Self::Stddev,
            "stdvar" => Self::Stdvar,
            "topk" => Self::Topk,
            "bottomk" => Self::Bottomk,
            "quantile" => Self::Quantile,
            "group" => Self::Group,
            _ => return None,
        })
    }

    pub fn takes_param(&self) -> bool {
        matches!(
            self,
            Self::CountValues | Self::Topk | Self::Bottomk | Self::Quantile
        )
    }
}

impl fmt::Display for AggOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::CountValues => "count_values",
            Self::Stddev => "stddev",
            Self::Stdvar => "stdvar",
            Self::Topk => "topk",
            Self::Bottomk => "bottomk",
            Self::Quantile => "quantile",
            Self::Group => "group",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggGrouping {
    pub without: bool,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Selector(VectorSelector),
    Matrix {
        selector: VectorSelector,
        range: i64,
    },
    Subquery {
        expr: Box<Expr>,
        range: i64,
        step: Option<i64>,
        offset: Option<i64>,
        at: Option<AtModifier>,
    },
    Unary {
        negative: bool,
        expr: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        modifier: BinModifier,
    },
    Paren(Box<Expr>),
    Call {
        func: String,
        args: Vec<Expr>,
    },
    Aggregate {
        op: AggOp,
        grouping: Option<AggGrouping>,
        param: Option<Box<Expr>>,
        expr: Box<Expr>,
    },
}

impl Expr {
    pub fn walk_selectors<F>(&mut self, f: &mut F)
    where
        F: FnMut(&mut VectorSelector),
    {
        match self {
            Self::Number(_) | Self::Str(_) => {}
            Self::Selector(vs) => f(vs),
            Self::Matrix { selector, .. } => f(selector),
            Self::Subquery { expr, .. } => expr.walk_selectors(f),
            Self::Unary { expr, .. } => expr.walk_selectors(f),
            Self::Binary { lhs, rhs, .. } => {
                lhs.walk_selectors(f);
                rhs.walk_selectors(f);
            }
            Self::Paren(expr) => expr.walk_selectors(f),
            Self::Call { args, .. } => {
                for arg in args {
                    arg.walk_selectors(f);
                }
            }
            Self::Aggregate { param, expr, .. } => {
                if let Some(param) = param {
                    param.walk_selectors(f);
                }
                expr.walk_selectors(f);
            }
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn fmt_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Inf" } else { "-Inf" })
    } else {
        write!(f, "{n}")
    }
}

fn fmt_label_list(f: &mut fmt::Formatter<'_>, labels: &[String]) -> fmt::Result {
    f.write_str("(")?;
    for (i, l) in labels.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        f.write_str(l)?;
    }
    f.write_str(")")
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt_number(f, *n),
            Self::Str(s) => write!(f, "\"{}\"", escape(s)),
            Self::Selector(vs) => write!(f, "{vs}"),
            Self::Matrix { selector, range } => {
                selector.fmt_base(f)?;
                write!(f, "[{}]", format_duration(*range))?;
                selector.fmt_modifiers(f)
            }
            Self::Subquery {
                expr,
                range,
                step,
                offset,
                at,
            } => {
                write!(f, "{expr}[{}:", format_duration(*range))?;
                if let Some(step) = step {
                    f.write_str(&format_duration(*step))?;
                }
                f.write_str("]")?;
                if let Some(off) = offset {
                    write!(f, " offset {}", format_duration(*off))?;
                }
                if let Some(at) = at {
                    write!(f, " {at}")?;
                }
                Ok(())
            }
            Self::Unary { negative, expr } => {
                write!(f, "{}{expr}", if *negative { "-" } else { "+" })
            }
            Self::Binary {
                op,
                lhs,
                rhs,
                modifier,
            } => {
                write!(f, "{lhs} {op}")?;
                if modifier.return_bool {
                    f.write_str(" bool")?;
                }
                if let Some(matching) = &modifier.matching {
                    f.write_str(if matching.on { " on " } else { " ignoring " })?;
                    fmt_label_list(f, &matching.labels)?;
                    if let Some(group) = &matching.group {
                        f.write_str(if group.left {
                            " group_left "
                        } else {
                            " group_right "
                        })?;
                        fmt_label_list(f, &group.labels)?;
                    }
                }
                write!(f, " {rhs}")
            }
            Self::Paren(expr) => write!(f, "({expr})"),
            Self::Call { func, args } => {
                write!(f, "{func}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Aggregate {
                op,
                grouping,
                param,
                expr,
            } => {
                write!(f, "{op}")?;
                if let Some(grouping) = grouping {
                    f.write_str(if grouping.without { " without " } else { " by " })?;
                    fmt_label_list(f, &grouping.labels)?;
                    f.write_str(" ")?;
                }
                f.write_str("(")?;
                if let Some(param) = param {
                    write!(f, "{param}, ")?;
                }
                write!(f, "{expr})")
            }
        }
    }
}
