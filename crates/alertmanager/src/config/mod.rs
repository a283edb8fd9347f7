mod global;
mod receiver;
mod route;

use std::collections::BTreeMap;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use promcfg_common::Error;

pub use global::{BasicAuth, GlobalConfig, HttpConfig, TlsConfig};
pub use receiver::{
    make_base_route_name, secure_receiver_name, unsecure_receiver_name, EmailConfig,
    PagerdutyConfig, Receiver, SlackAction, SlackConfig, SlackField, WebhookConfig,
    TENANT_BASE_ROUTE_POSTFIX,
};
pub use route::Route;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InhibitRule {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_match: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub source_match_re: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub target_match: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub target_match_re: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equal: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inhibit_rules: Vec<InhibitRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<Receiver>,
    #[serde(default)]
    pub templates: Vec<String>,
}

impl Config {
    pub fn get_receiver(&self, name: &str) -> Option<&Receiver> {
        self.receivers.iter().find(|r| r.name == name)
    }

    pub fn get_route_idx(&self, name: &str) -> Option<usize> {
        self.route
            .as_ref()?
            .routes
            .iter()
            .position(|r| r.receiver == name)
    }

    pub fn search_routes_for_receiver(&self, receiver: &str) -> bool {
        match &self.route {
            Some(root) => {
                root.receiver == receiver
                    || root.routes.iter().any(|r| search_route(receiver, r))
            }
            None => false,
        }
    }

    pub fn remove_receiver_from_route(&mut self, receiver: &str) {
        if let Some(root) = &mut self.route {
            let children = std::mem::take(&mut root.routes);
            root.routes = children
                .into_iter()
                .filter_map(|r| prune_route(receiver, r))
                .collect();
        }
    }

    pub fn initialize_tenant_base_route(
        &mut self,
        mut route: Route,
        matcher_label: &str,
        tenant_id: &str,
    ) -> Result<(), Error> {
        let base_route_name = make_base_route_name(tenant_id);
        if self.get_receiver(&base_route_name).is_some() {
            return Err(Error::Conflict(format!(
                "Base route for tenant {tenant_id} already exists"
            )));
        }

        self.receivers.push(Receiver::new(base_route_name.clone()));
        route.receiver = base_route_name;
        if !matcher_label.is_empty() {
            route.match_labels =
                BTreeMap::from([(matcher_label.to_string(), tenant_id.to_string())]);
        }

        match &mut self.route {
            Some(root) => root.routes.push(route),
            None => {
                return Err(Error::Validation(
                    "no route provided in config".to_string(),
                ))
            }
        }
        self.validate()
    }

    // serialize and re-parse, then check what the dispatcher itself would
    // refuse to load
    pub fn validate(&self) -> Result<(), Error> {
        let raw = serde_yaml::to_string(self)
            .map_err(|e| Error::Validation(format!("error marshaling config: {e}")))?;
        let parsed: Config = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Validation(format!("invalid config: {e}")))?;
        parsed.check()
    }

    fn check(&self) -> Result<(), Error> {
        let root = match &self.route {
            Some(root) => root,
            None => return Err(Error::Validation("no route provided in config".into())),
        };
        if root.receiver.is_empty() {
            return Err(Error::Validation(
                "root route must specify a default receiver".into(),
            ));
        }
        if !root.match_labels.is_empty() || !root.match_re.is_empty() {
            return Err(Error::Validation(
                "root route must not have any matchers".into(),
            ));
        }

        let mut names: HashSet<&str> = HashSet::new();
        for rec in &self.receivers {
            if rec.name.is_empty() {
                return Err(Error::Validation("missing name in receiver".into()));
            }
            if !names.insert(&rec.name) {
                return Err(Error::Validation(format!(
                    "notification config name \"{}\" is not unique",
                    rec.name
                )));
            }
            for webhook in &rec.webhook_configs {
                if webhook.url.is_empty() {
                    return Err(Error::Validation(format!(
                        "missing url in webhook config for receiver \"{}\"",
                        rec.name
                    )));
                }
            }
            for email in &rec.email_configs {
                if email.to.is_empty() {
                    return Err(Error::Validation(format!(
                        "missing to address in email config for receiver \"{}\"",
                        rec.name
                    )));
                }
            }
        }

        check_route_receivers(root, &names)
    }
}

fn check_route_receivers(route: &Route, names: &HashSet<&str>) -> Result<(), Error> {
    if !route.receiver.is_empty() && !names.contains(route.receiver.as_str()) {
        return Err(Error::Validation(format!(
            "undefined receiver \"{}\" used in route",
            route.receiver
        )));
    }
    for child in &route.routes {
        check_route_receivers(child, names)?;
    }
    Ok(())
}

fn search_route(receiver: &str, route: &Route) -> bool {
    route.receiver == receiver || route.routes.iter().any(|r| search_route(receiver, r))
}

// post-order prune: children first, then the node itself
fn prune_route(receiver: &str, mut route: Route) -> Option<Route> {
    if route.receiver == receiver {
        return None;
    }
    let children = std::mem::take(&mut route.routes);
    route.routes = children
        .into_iter()
        .filter_map(|r| prune_route(receiver, r))
        .collect();
    Some(route)
}
