use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub resolve_timeout: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_config: Option<HttpConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_from: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_hello: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_smarthost: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_auth_username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_auth_password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_auth_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub smtp_auth_identity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_require_tls: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slack_api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pagerduty_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hipchat_api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hipchat_auth_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub opsgenie_api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub opsgenie_api_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wechat_api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wechat_api_secret: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub wechat_api_corp_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub victorops_api_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub victorops_api_key: String,
}

impl GlobalConfig {
    pub fn default_config() -> Self {
        Self {
            resolve_timeout: "5m".into(),
            http_config: Some(HttpConfig::default()),
            smtp_hello: "localhost".into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth: Option<BasicAuth>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bearer_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bearer_token_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub proxy_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_config: Option<TlsConfig>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BasicAuth {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,
}
