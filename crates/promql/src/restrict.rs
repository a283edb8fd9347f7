use crate::ast::{MatchOp, Matcher};
use crate::parser::{parse, ParseError};

#[derive(Debug, Clone, Default)]
pub struct QueryRestrictor {
    matchers: Vec<Matcher>,
}

impl QueryRestrictor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_matcher(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.matchers.push(Matcher {
            name: name.into(),
            op: MatchOp::Eq,
            value: value.into(),
        });
        self
    }

    // appends each required matcher to every selector that does not
    // already constrain that label, whatever the operator or value
    pub fn restrict(&self, query: &str) -> Result<String, ParseError> {
        let mut expr = parse(query)?;
        expr.walk_selectors(&mut |selector| {
            for required in &self.matchers {
                if !selector.has_matcher(&required.name) {
                    selector.matchers.push(required.clone());
                }
            }
        });
        Ok(expr.to_string())
    }
}
