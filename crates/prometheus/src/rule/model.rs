use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use promcfg_common::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromDuration(i64);

impl PromDuration {
    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        if s.is_empty() || s == "0" {
            return Ok(Self(0));
        }
        let bad = || Error::Parse(format!("not a valid duration string: \"{s}\""));
        let mut total: i64 = 0;
        let mut chars = s.chars().peekable();
        while chars.peek().is_some() {
            let mut count = String::new();
            while chars.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) {
                count.push(chars.next().unwrap());
            }
            if count.is_empty() {
                return Err(bad());
            }
            let unit_ms: i64 = match chars.next() {
                Some('m') => {
                    if chars.peek() == Some(&'s') {
                        chars.next();
                        1
                    } else {
                        60 * 1000
                    }
                }
                Some('s') => 1000,
                Some('h') => 60 * 60 * 1000,
                Some('d') => 24 * 60 * 60 * 1000,
                Some('w') => 7 * 24 * 60 * 60 * 1000,
                Some('y') => 365 * 24 * 60 * 60 * 1000,
                _ => return Err(bad()),
            };
            let n: i64 = count.parse().map_err(|_| bad())?;
            total += n * unit_ms;
        }
        Ok(Self(total))
    }
}

impl fmt::Display for PromDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0s");
        }
        let mut rest = self.0;
        let units: [(i64, &str); 7] = [
            (365 * 24 * 60 * 60 * 1000, "y"),
            (7 * 24 * 60 * 60 * 1000, "w"),
            (24 * 60 * 60 * 1000, "d"),
            (60 * 60 * 1000, "h"),
            (60 * 1000, "m"),
            (1000, "s"),
            (1, "ms"),
        ];
        for (unit, suffix) in units {
            let v = rest / unit;
            if v > 0 {
                write!(f, "{v}{suffix}")?;
                rest %= unit;
            }
        }
        Ok(())
    }
}

impl Serialize for PromDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PromDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(|e| D::Error::custom(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub record: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alert: String,
    #[serde(default)]
    pub expr: String,
    #[serde(
        default,
        rename = "for",
        skip_serializing_if = "PromDuration::is_zero"
    )]
    pub for_duration: PromDuration,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Rule {
    pub fn name(&self) -> &str {
        if !self.alert.is_empty() {
            &self.alert
        } else {
            &self.record
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub groups: Vec<RuleGroup>,
}

impl RuleFile {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            groups: vec![RuleGroup {
                name: group_name.into(),
                rules: Vec::new(),
            }],
        }
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.groups
            .iter()
            .flat_map(|g| g.rules.iter().cloned())
            .collect()
    }

    pub fn get_rule(&self, name: &str) -> Option<&Rule> {
        if name.is_empty() {
            return None;
        }
        self.groups
            .iter()
            .flat_map(|g| g.rules.iter())
            .find(|r| r.name() == name)
    }

    pub fn add_rule(&mut self, rule: Rule) {
        if self.groups.is_empty() {
            self.groups.push(RuleGroup::default());
        }
        self.groups[0].rules.push(rule);
    }

    pub fn replace_rule(&mut self, rule: Rule) -> Result<(), Error> {
        let name = rule.name().to_string();
        for group in &mut self.groups {
            if let Some(slot) = group.rules.iter_mut().find(|r| r.name() == name) {
                *slot = rule;
                return Ok(());
            }
        }
        Err(Error::NotFound(format!("rule {name} does not exist")))
    }

    pub fn delete_rule(&mut self, name: &str) -> Result<(), Error> {
        for group in &mut self.groups {
            if let Some(idx) = group.rules.iter().position(|r| r.name() == name) {
                group.rules.remove(idx);
                return Ok(());
            }
        }
        Err(Error::NotFound(format!("rule {name} does not exist")))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleJsonWrapper {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub record: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alert: String,
    #[serde(default)]
    pub expr: String,
    #[serde(default, rename = "for")]
    pub for_duration: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

impl RuleJsonWrapper {
    pub fn into_rule(self) -> Result<Rule, Error> {
        Ok(Rule {
            record: self.record,
            alert: self.alert,
            expr: self.expr,
            for_duration: PromDuration::parse(&self.for_duration)?,
            labels: self.labels,
            annotations: self.annotations,
        })
    }
}

impl From<Rule> for RuleJsonWrapper {
    fn from(rule: Rule) -> Self {
        Self {
            record: rule.record,
            alert: rule.alert,
            expr: rule.expr,
            for_duration: rule.for_duration.to_string(),
            labels: rule.labels,
            annotations: rule.annotations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BulkUpdateResults {
    pub errors: BTreeMap<String, String>,
    pub statuses: BTreeMap<String, String>,
}

impl fmt::Display for BulkUpdateResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.errors.is_empty() {
            f.write_str("Errors: \n")?;
            for (name, err) in &self.errors {
                writeln!(f, "\t{name}: {err}")?;
            }
        }
        if !self.statuses.is_empty() {
            f.write_str("Statuses: \n")?;
            for (name, status) in &self.statuses {
                writeln!(f, "\t{name}: {status}")?;
            }
        }
        Ok(())
    }
}
