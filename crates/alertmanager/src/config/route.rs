use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::receiver::{secure_receiver_name, unsecure_receiver_name, TENANT_BASE_ROUTE_POSTFIX};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub receiver: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_wait: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_interval: Option<String>,
    #[serde(default, rename = "match", skip_serializing_if = "BTreeMap::is_empty")]
    pub match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub match_re: BTreeMap<String, String>,
    #[serde(default, rename = "continue", skip_serializing_if = "is_false")]
    pub continue_matching: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<Route>,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Route {
    pub fn for_receiver(receiver: impl Into<String>) -> Self {
        Self {
            receiver: receiver.into(),
            ..Self::default()
        }
    }

    pub fn secure(&mut self, tenant_id: &str) {
        self.receiver = secure_receiver_name(&self.receiver, tenant_id);
        for child in &mut self.routes {
            child.secure(tenant_id);
        }
    }

    // base-route names keep their suffix so the sentinel stays recognizable
    pub fn unsecure(&mut self, tenant_id: &str) {
        if !self.receiver.ends_with(TENANT_BASE_ROUTE_POSTFIX) {
            self.receiver = unsecure_receiver_name(&self.receiver, tenant_id);
        }
        for child in &mut self.routes {
            child.unsecure(tenant_id);
        }
    }
}
