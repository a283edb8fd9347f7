use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TENANT_BASE_ROUTE_POSTFIX: &str = "tenant_base_route";

// trailing URL path segment substituted with the tenant id on the way in
const URL_TENANT_PLACEHOLDER: &str = "<tenant>";

pub fn make_base_route_name(tenant_id: &str) -> String {
    format!("{tenant_id}_{TENANT_BASE_ROUTE_POSTFIX}")
}

pub fn secure_receiver_name(name: &str, tenant_id: &str) -> String {
    format!("{tenant_id}_{name}")
}

pub fn unsecure_receiver_name(name: &str, tenant_id: &str) -> String {
    name.strip_prefix(&format!("{tenant_id}_"))
        .unwrap_or(name)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub slack_configs: Vec<SlackConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub webhook_configs: Vec<WebhookConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email_configs: Vec<EmailConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pagerduty_configs: Vec<PagerdutyConfig>,
}

impl Receiver {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn secure(&mut self, tenant_id: &str) {
        self.name = secure_receiver_name(&self.name, tenant_id);
        for slack in &mut self.slack_configs {
            secure_url(&mut slack.api_url, tenant_id);
        }
        for webhook in &mut self.webhook_configs {
            secure_url(&mut webhook.url, tenant_id);
        }
        for pagerduty in &mut self.pagerduty_configs {
            secure_url(&mut pagerduty.url, tenant_id);
        }
    }

    pub fn unsecure(&mut self, tenant_id: &str) {
        self.name = unsecure_receiver_name(&self.name, tenant_id);
        for slack in &mut self.slack_configs {
            unsecure_url(&mut slack.api_url, tenant_id);
        }
        for webhook in &mut self.webhook_configs {
            unsecure_url(&mut webhook.url, tenant_id);
        }
        for pagerduty in &mut self.pagerduty_configs {
            unsecure_url(&mut pagerduty.url, tenant_id);
        }
    }
}

fn secure_url(url: &mut String, tenant_id: &str) {
    if let Some(base) = url.strip_suffix(&format!("/{URL_TENANT_PLACEHOLDER}")) {
        *url = format!("{base}/{tenant_id}");
    }
}

fn unsecure_url(url: &mut String, tenant_id: &str) {
    if let Some(base) = url.strip_suffix(&format!("/{tenant_id}")) {
        *url = format!("{base}/{URL_TENANT_PLACEHOLDER}");
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub color: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pretext: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_emoji: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_names: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SlackField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SlackAction>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlackField {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlackAction {
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_alerts: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smarthost: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub auth_identity: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hello: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PagerdutyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_resolved: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub routing_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub severity: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_helpers_prefix_and_strip() {
        assert_eq!(make_base_route_name("acme"), "acme_tenant_base_route");
        assert_eq!(secure_receiver_name("pager", "acme"), "acme_pager");
        assert_eq!(unsecure_receiver_name("acme_pager", "acme"), "pager");
        assert_eq!(unsecure_receiver_name("other_pager", "acme"), "other_pager");
    }

    #[test]
    fn secure_prefixes_name_and_fills_url_placeholder() {
        let mut rec = Receiver {
            name: "slack".into(),
            slack_configs: vec![SlackConfig {
                api_url: "https://hooks.slack.com/services/<tenant>".into(),
                channel: "#alerts".into(),
                ..SlackConfig::default()
            }],
            ..Receiver::default()
        };
        rec.secure("acme");
        assert_eq!(rec.name, "acme_slack");
        assert_eq!(
            rec.slack_configs[0].api_url,
            "https://hooks.slack.com/services/acme"
        );
    }

    #[test]
    fn unsecure_reverses_secure() {
        let mut rec = Receiver {
            name: "webhook".into(),
            webhook_configs: vec![WebhookConfig {
                url: "http://webhook.example.com/<tenant>".into(),
                ..WebhookConfig::default()
            }],
            ..Receiver::default()
        };
        let original = rec.clone();
        rec.secure("acme");
        rec.unsecure("acme");
        assert_eq!(rec, original);
    }

    #[test]
    fn urls_without_placeholder_pass_through() {
        let mut rec = Receiver {
            name: "slack".into(),
            slack_configs: vec![SlackConfig {
                api_url: "http://slack.com/12345".into(),
                ..SlackConfig::default()
            }],
            ..Receiver::default()
        };
        rec.secure("test");
        assert_eq!(rec.slack_configs[0].api_url, "http://slack.com/12345");
        rec.unsecure("test");
        assert_eq!(rec.slack_configs[0].api_url, "http://slack.com/12345");
    }

    #[test]
    fn receiver_yaml_round_trips() {
        let yaml = "name: test_email
email_configs:
- to: test@mail.com
  from: testUser
  smarthost: http://mail-server.com
  headers:
    foo: bar
    name: value
";
        let rec: Receiver = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rec.email_configs[0].headers["foo"], "bar");
        let out = serde_yaml::to_string(&rec).unwrap();
        let reparsed: Receiver = serde_yaml::from_str(&out).unwrap();
        assert_eq!(rec, reparsed);
    }
}
