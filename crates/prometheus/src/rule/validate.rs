use promcfg_common::Error;

use super::model::Rule;

const METRIC_NAME_LABEL: &str = "__name__";

pub fn validate_rule(rule: &Rule) -> Result<(), Error> {
    let mut causes: Vec<String> = Vec::new();

    if !rule.record.is_empty() && !rule.alert.is_empty() {
        causes.push("only one of 'record' and 'alert' must be set".into());
    }
    if rule.record.is_empty() && rule.alert.is_empty() {
        causes.push("one of 'record' or 'alert' must be set".into());
    }

    if rule.expr.is_empty() {
        causes.push("field 'expr' must be set in rule".into());
    } else if let Err(e) = promcfg_promql::parse(&rule.expr) {
        causes.push(format!("could not parse expression: {e}"));
    }

    if !rule.record.is_empty() {
        if !rule.annotations.is_empty() {
            causes.push("invalid field 'annotations' in recording rule".into());
        }
        if !rule.for_duration.is_zero() {
            causes.push("invalid field 'for' in recording rule".into());
        }
        if !is_valid_metric_name(&rule.record) {
            causes.push(format!("invalid recording rule name: {}", rule.record));
        }
    }

    for name in rule.labels.keys() {
        if !is_valid_label_name(name) || name == METRIC_NAME_LABEL {
            causes.push(format!("invalid label name: {name}"));
        }
    }

    for name in rule.annotations.keys() {
        if !is_valid_label_name(name) {
            causes.push(format!("invalid annotation name: {name}"));
        }
    }

    if causes.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Rule Validation Error; {}",
            causes.join("; ")
        )))
    }
}

pub fn is_valid_label_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()))
}

pub fn is_valid_metric_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().enumerate().all(|(i, c)| {
            c == '_' || c == ':' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::super::model::PromDuration;
    use super::*;

    fn check(rule: Rule, expected: &str) {
        let result = validate_rule(&rule);
        if expected.is_empty() {
            assert!(result.is_ok(), "expected valid rule, got {result:?}");
        } else {
            assert_eq!(result.unwrap_err().to_string(), expected);
        }
    }

    #[test]
    fn valid_rule_passes() {
        check(
            Rule {
                alert: "test".into(),
                expr: "up".into(),
                labels: BTreeMap::from([("label1".to_string(), "value".to_string())]),
                annotations: BTreeMap::from([("annotation1".to_string(), "value".to_string())]),
                ..Rule::default()
            },
            "",
        );
    }

    #[test]
    fn record_and_alert_together_rejected() {
        check(
            Rule {
                alert: "alert".into(),
                record: "record".into(),
                ..Rule::default()
            },
            "Rule Validation Error; only one of 'record' and 'alert' must be set; field 'expr' must be set in rule",
        );
    }

    #[test]
    fn neither_record_nor_alert_rejected() {
        check(
            Rule::default(),
            "Rule Validation Error; one of 'record' or 'alert' must be set; field 'expr' must be set in rule",
        );
    }

    #[test]
    fn missing_expression_rejected() {
        check(
            Rule {
                alert: "test".into(),
                ..Rule::default()
            },
            "Rule Validation Error; field 'expr' must be set in rule",
        );
    }

    #[test]
    fn invalid_expression_rejected() {
        check(
            Rule {
                alert: "test".into(),
                expr: "!up".into(),
                ..Rule::default()
            },
            "Rule Validation Error; could not parse expression: 1:1: parse error: unexpected character after '!': 'u'",
        );
    }

    #[test]
    fn annotations_in_recording_rule_rejected() {
        check(
            Rule {
                record: "test".into(),
                expr: "up".into(),
                annotations: BTreeMap::from([("a".to_string(), "b".to_string())]),
                ..Rule::default()
            },
            "Rule Validation Error; invalid field 'annotations' in recording rule",
        );
    }

    #[test]
    fn for_in_recording_rule_rejected() {
        check(
            Rule {
                record: "test".into(),
                expr: "up".into(),
                for_duration: PromDuration::from_millis(5000),
                ..Rule::default()
            },
            "Rule Validation Error; invalid field 'for' in recording rule",
        );
    }

    #[test]
    fn invalid_recording_rule_name_rejected() {
        check(
            Rule {
                record: "1test".into(),
                expr: "up".into(),
                ..Rule::default()
            },
            "Rule Validation Error; invalid recording rule name: 1test",
        );
    }

    #[test]
    fn invalid_label_name_rejected() {
        check(
            Rule {
                alert: "test".into(),
                expr: "up".into(),
                labels: BTreeMap::from([("1label".to_string(), "val".to_string())]),
                ..Rule::default()
            },
            "Rule Validation Error; invalid label name: 1label",
        );
    }

    #[test]
    fn reserved_metric_name_label_rejected() {
        check(
            Rule {
                alert: "test".into(),
                expr: "up".into(),
                labels: BTreeMap::from([("__name__".to_string(), "val".to_string())]),
                ..Rule::default()
            },
            "Rule Validation Error; invalid label name: __name__",
        );
    }

    #[test]
    fn invalid_annotation_name_rejected() {
        check(
            Rule {
                alert: "test".into(),
                expr: "up".into(),
                annotations: BTreeMap::from([("1label".to_string(), "val".to_string())]),
                ..Rule::default()
            },
            "Rule Validation Error; invalid annotation name: 1label",
        );
    }

    #[test]
    fn identifier_grammars() {
        assert!(is_valid_label_name("severity"));
        assert!(is_valid_label_name("_internal"));
        assert!(!is_valid_label_name("1label"));
        assert!(!is_valid_label_name("with-dash"));
        assert!(!is_valid_label_name(""));
        assert!(is_valid_metric_name("job:up:rate5m"));
        assert!(!is_valid_metric_name("1test"));
    }
}
