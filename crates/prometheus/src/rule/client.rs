use std::sync::Arc;

use promcfg_common::{Error, FileLocker, FsClient, TenancyConfig};

use super::model::{BulkUpdateResults, Rule, RuleFile};
use super::secure::secure_rule;
use super::validate::validate_rule;

const RULES_FILE_POSTFIX: &str = "_rules.yml";

fn make_filename(tenant_id: &str) -> String {
    format!("{tenant_id}{RULES_FILE_POSTFIX}")
}

pub struct AlertClient {
    locks: Arc<FileLocker>,
    fs: Arc<dyn FsClient>,
    tenancy: TenancyConfig,
}

impl AlertClient {
    pub fn new(locks: Arc<FileLocker>, fs: Arc<dyn FsClient>, tenancy: TenancyConfig) -> Self {
        Self { locks, fs, tenancy }
    }

    pub fn tenancy(&self) -> &TenancyConfig {
        &self.tenancy
    }

    pub fn rule_exists(&self, tenant_id: &str, rule_name: &str) -> bool {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.read();

        if !self.rule_file_exists(&filename) {
            return false;
        }
        match self.read_rule_file(&filename) {
            Ok(file) => file.get_rule(rule_name).is_some(),
            Err(_) => false,
        }
    }

    pub fn write_rule(&self, tenant_id: &str, mut rule: Rule) -> Result<(), Error> {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.write();

        let mut file = self.read_or_initialize(tenant_id, &filename)?;
        self.secure(tenant_id, &mut rule)?;
        file.add_rule(rule);
        self.write_rule_file(&file, &filename)
    }

    pub fn update_rule(&self, tenant_id: &str, mut rule: Rule) -> Result<(), Error> {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.write();

        let mut file = self.read_rule_file(&filename).map_err(|e| {
            Error::NotFound(format!("rule file {filename} does not exist: {e}"))
        })?;

        let expr = rule.expr.clone();
        self.secure(tenant_id, &mut rule)
            .map_err(|e| Error::Parse(format!("cannot parse expression: \"{expr}\", {e}")))?;

        file.replace_rule(rule)?;
        self.write_rule_file(&file, &filename)
    }

    pub fn read_rules(&self, tenant_id: &str, rule_name: &str) -> Result<Vec<Rule>, Error> {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.read();

        if !self.rule_file_exists(&filename) {
            return Ok(Vec::new());
        }
        let file = self.read_rule_file(&filename)?;
        if rule_name.is_empty() {
            return Ok(file.rules());
        }
        match file.get_rule(rule_name) {
            Some(rule) => Ok(vec![rule.clone()]),
            None => Err(Error::NotFound(format!("rule {rule_name} not found"))),
        }
    }

    pub fn delete_rule(&self, tenant_id: &str, rule_name: &str) -> Result<(), Error> {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.write();

        let mut file = self.read_rule_file(&filename)?;
        file.delete_rule(rule_name)?;
        self.write_rule_file(&file, &filename)
    }

    // per-rule securing/validation failures are collected, not fatal;
    // the file is written exactly once at the end
    pub fn bulk_update(
        &self,
        tenant_id: &str,
        rules: Vec<Rule>,
    ) -> (BulkUpdateResults, Option<Error>) {
        let filename = make_filename(tenant_id);
        let lock = self.locks.for_file(&filename);
        let _guard = lock.write();

        let mut file = match self.read_or_initialize(tenant_id, &filename) {
            Ok(file) => file,
            Err(e) => return (BulkUpdateResults::default(), Some(e)),
        };

        let mut results = BulkUpdateResults::default();
        for mut rule in rules {
            let name = rule.name().to_string();

            if let Err(e) = self.secure(tenant_id, &mut rule) {
                results.errors.insert(name, e.to_string());
                continue;
            }
            if let Err(e) = validate_rule(&rule) {
                results.errors.insert(name, e.to_string());
                continue;
            }

            if file.get_rule(&name).is_some() {
                match file.replace_rule(rule) {
                    Ok(()) => {
                        results.statuses.insert(name, "updated".into());
                    }
                    Err(e) => {
                        results.errors.insert(name, e.to_string());
                    }
                }
            } else {
                file.add_rule(rule);
                results.statuses.insert(name, "created".into());
            }
        }

        match self.write_rule_file(&file, &filename) {
            Ok(()) => (results, None),
            Err(e) => (results, Some(e)),
        }
    }

    fn secure(&self, tenant_id: &str, rule: &mut Rule) -> Result<(), Error> {
        secure_rule(
            self.tenancy.restrict_queries,
            &self.tenancy.restrictor_label,
            tenant_id,
            rule,
        )
    }

    fn rule_file_exists(&self, filename: &str) -> bool {
        self.fs.stat(filename).is_ok()
    }

    fn read_or_initialize(&self, tenant_id: &str, filename: &str) -> Result<RuleFile, Error> {
        if self.rule_file_exists(filename) {
            self.read_rule_file(filename)
        } else {
            Ok(RuleFile::new(tenant_id))
        }
    }

    fn read_rule_file(&self, filename: &str) -> Result<RuleFile, Error> {
        let bytes = self
            .fs
            .read_file(filename)
            .map_err(|e| Error::Io(format!("error reading rules file: {e}")))?;
        serde_yaml::from_slice(&bytes)
            .map_err(|e| Error::Io(format!("error parsing rules file: {e}")))
    }

    fn write_rule_file(&self, file: &RuleFile, filename: &str) -> Result<(), Error> {
        let yaml = serde_yaml::to_string(file)
            .map_err(|e| Error::Io(format!("error writing rules file: {e}")))?;
        self.fs
            .write_file(filename, yaml.as_bytes(), 0o666)
            .map_err(|e| Error::Io(format!("error writing rules file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use promcfg_common::DiskClient;

    use super::*;

    const TEST_RULE_FILE: &str = "groups:
- name: test
  rules:
  - alert: test_rule_1
    expr: up == 0
    for: 5s
    labels:
      severity: major
      tenantID: test
  - alert: test_rule_2
    expr: up == 1
    for: 5s
    labels:
      severity: critical
      tenantID: test
    annotations:
      summary: A test rule
";

    fn new_client(dir: &tempfile::TempDir) -> AlertClient {
        let root = format!("{}/", dir.path().display());
        std::fs::write(dir.path().join("test_rules.yml"), TEST_RULE_FILE).unwrap();
        AlertClient::new(
            Arc::new(FileLocker::new()),
            Arc::new(DiskClient::new(root)),
            TenancyConfig {
                restrictor_label: "tenantID".into(),
                restrict_queries: true,
            },
        )
    }

    fn sample_rule() -> Rule {
        Rule {
            alert: "testAlert".into(),
            expr: "up == 0".into(),
            labels: BTreeMap::from([("name".to_string(), "value".to_string())]),
            ..Rule::default()
        }
    }

    fn bad_rule() -> Rule {
        Rule {
            alert: "bad_rule".into(),
            expr: "malformed{.".into(),
            ..Rule::default()
        }
    }

    #[test]
    fn rule_exists_checks_names_per_tenant() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        assert!(client.rule_exists("test", "test_rule_1"));
        assert!(client.rule_exists("test", "test_rule_2"));
        assert!(!client.rule_exists("test", "no_rule"));
        assert!(!client.rule_exists("not_a_file", "no_rule"));
    }

    #[test]
    fn write_rule_appends_secured_rule() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        client.write_rule("test", sample_rule()).unwrap();

        let rules = client.read_rules("test", "testAlert").unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].expr, r#"up{tenantID="test"} == 0"#);
        assert_eq!(rules[0].labels["tenantID"], "test");
    }

    #[test]
    fn write_rule_initializes_missing_file_with_tenant_group() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        client.write_rule("newPrefix", sample_rule()).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("newPrefix_rules.yml")).unwrap();
        let file: RuleFile = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(file.groups[0].name, "newPrefix");
        assert_eq!(file.groups[0].rules.len(), 1);
    }

    #[test]
    fn write_rule_rejects_unparseable_expression() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let err = client.write_rule("test", bad_rule()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "error parsing query: 1:11: parse error: unexpected character inside braces: '.'"
        );
    }

    #[test]
    fn update_rule_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let rule = Rule {
            alert: "test_rule_1".into(),
            expr: "up == 2".into(),
            ..Rule::default()
        };
        client.update_rule("test", rule).unwrap();
        let rules = client.read_rules("test", "test_rule_1").unwrap();
        assert_eq!(rules[0].expr, r#"up{tenantID="test"} == 2"#);
    }

    #[test]
    fn update_rule_requires_existing_rule_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        assert!(client.update_rule("test", sample_rule()).is_err());

        let err = client.update_rule("missing", sample_rule()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("rule file missing_rules.yml does not exist:"));
    }

    #[test]
    fn update_rule_wraps_parse_failures() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let err = client.update_rule("test", bad_rule()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot parse expression: \"malformed{.\", error parsing query: 1:11: parse error: unexpected character inside braces: '.'"
        );
    }

    #[test]
    fn read_rules_returns_all_in_document_order() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let rules = client.read_rules("test", "").unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].alert, "test_rule_1");
        assert_eq!(rules[1].alert, "test_rule_2");
    }

    #[test]
    fn read_rules_missing_file_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let rules = client.read_rules("not_a_file", "").unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn read_rules_unknown_name_errors() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let err = client.read_rules("test", "no_rule").unwrap_err();
        assert_eq!(err.to_string(), "rule no_rule not found");
    }

    #[test]
    fn delete_rule_removes_first_match() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        client.delete_rule("test", "test_rule_1").unwrap();
        assert!(!client.rule_exists("test", "test_rule_1"));
        assert!(client.delete_rule("test", "test_rule_1").is_err());
    }

    #[test]
    fn bulk_update_mixes_created_updated_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let existing = Rule {
            alert: "test_rule_1".into(),
            expr: "up == 0".into(),
            ..Rule::default()
        };
        let (results, err) =
            client.bulk_update("test", vec![bad_rule(), sample_rule(), existing]);
        assert!(err.is_none());
        assert_eq!(results.statuses.len(), 2);
        assert_eq!(results.errors.len(), 1);
        assert_eq!(results.statuses["testAlert"], "created");
        assert_eq!(results.statuses["test_rule_1"], "updated");
        assert_eq!(
            results.to_string(),
            "Errors: \n\tbad_rule: error parsing query: 1:11: parse error: unexpected character inside braces: '.'\nStatuses: \n\ttestAlert: created\n\ttest_rule_1: updated\n"
        );
    }

    #[test]
    fn bulk_update_counts_cover_every_input() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_client(&dir);
        let rules = vec![bad_rule(), sample_rule()];
        let total = rules.len();
        let (results, err) = client.bulk_update("test", rules);
        assert!(err.is_none());
        assert_eq!(results.statuses.len() + results.errors.len(), total);
        assert!(results
            .statuses
            .values()
            .all(|s| s == "created" || s == "updated"));
    }
}
