use std::sync::Arc;

use parking_lot::RwLock;

use promcfg_common::{Error, FsClient, TenancyConfig};

use crate::config::{
    make_base_route_name, secure_receiver_name, Config, GlobalConfig, Receiver, Route,
};

pub struct AmClient {
    config_path: String,
    fs: Arc<dyn FsClient>,
    tenancy: TenancyConfig,
    delete_routes: bool,
    lock: RwLock<()>,
}

impl AmClient {
    pub fn new(
        config_path: impl Into<String>,
        fs: Arc<dyn FsClient>,
        tenancy: TenancyConfig,
        delete_routes: bool,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            fs,
            tenancy,
            delete_routes,
            lock: RwLock::new(()),
        }
    }

    pub fn tenancy(&self) -> &TenancyConfig {
        &self.tenancy
    }

    pub fn create_receiver(&self, tenant_id: &str, mut rec: Receiver) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;

        rec.secure(tenant_id);
        conf.receivers.push(rec);
        conf.validate()?;
        self.write_config(&conf)
    }

    // an unreadable config yields an empty listing rather than an error
    pub fn get_receivers(&self, tenant_id: &str) -> Result<Vec<Receiver>, Error> {
        let _guard = self.lock.read();
        let conf = match self.read_config() {
            Ok(conf) => conf,
            Err(_) => return Ok(Vec::new()),
        };

        let prefix = format!("{tenant_id}_");
        let base_route_name = make_base_route_name(tenant_id);
        let mut recs = Vec::new();
        for rec in conf.receivers {
            if rec.name.starts_with(&prefix) && rec.name != base_route_name {
                let mut rec = rec;
                rec.unsecure(tenant_id);
                recs.push(rec);
            }
        }
        Ok(recs)
    }

    pub fn update_receiver(
        &self,
        tenant_id: &str,
        receiver_name: &str,
        mut new_rec: Receiver,
    ) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;

        new_rec.secure(tenant_id);

        let target = secure_receiver_name(receiver_name, tenant_id);
        let idx = conf
            .receivers
            .iter()
            .position(|r| r.name == target)
            .ok_or_else(|| Error::NotFound(format!("receiver '{receiver_name}' not found")))?;

        conf.receivers[idx] = new_rec;
        conf.validate()
            .map_err(|e| Error::Validation(format!("error updating receiver: {e}")))?;
        self.write_config(&conf)
    }

    pub fn delete_receiver(&self, tenant_id: &str, receiver_name: &str) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;

        let target = secure_receiver_name(receiver_name, tenant_id);
        let idx = conf
            .receivers
            .iter()
            .position(|r| r.name == target)
            .ok_or_else(|| {
                Error::NotFound(format!("receiver '{receiver_name}' does not exist"))
            })?;
        conf.receivers.remove(idx);

        if self.delete_routes {
            conf.remove_receiver_from_route(&target);
        } else if conf.search_routes_for_receiver(&target) {
            return Err(Error::Conflict(format!(
                "receiver '{receiver_name}' referenced in route. Update routing tree and remove references before deleting this receiver"
            )));
        }

        self.write_config(&conf)
    }

    pub fn modify_tenant_route(&self, tenant_id: &str, mut route: Route) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;

        let base_route_name = make_base_route_name(tenant_id);
        if route.receiver != base_route_name {
            return Err(Error::BadRequest(format!(
                "route base receiver is incorrect (should be \"{base_route_name}\"). The base node should match nothing, then add routes as children of the base node"
            )));
        }

        if !self.tenancy.restrictor_label.is_empty() {
            route.match_labels.insert(
                self.tenancy.restrictor_label.clone(),
                tenant_id.to_string(),
            );
        }

        for child in &mut route.routes {
            child.secure(tenant_id);
        }

        match conf.get_route_idx(&base_route_name) {
            Some(idx) => {
                if let Some(root) = &mut conf.route {
                    root.routes[idx] = route;
                }
            }
            None => {
                conf.initialize_tenant_base_route(
                    route,
                    &self.tenancy.restrictor_label,
                    tenant_id,
                )?;
            }
        }

        conf.validate()?;
        self.write_config(&conf)
    }

    pub fn get_route(&self, tenant_id: &str) -> Result<Route, Error> {
        let _guard = self.lock.read();
        let conf = self.read_config()?;

        let base_route_name = make_base_route_name(tenant_id);
        let idx = conf.get_route_idx(&base_route_name).ok_or_else(|| {
            Error::NotFound(format!("Route for tenant {tenant_id} does not exist"))
        })?;

        let mut route = conf
            .route
            .as_ref()
            .map(|root| root.routes[idx].clone())
            .unwrap_or_default();
        route.unsecure(tenant_id);
        Ok(route)
    }

    pub fn get_tenants(&self) -> Result<Vec<String>, Error> {
        let _guard = self.lock.read();
        let conf = self.read_config()?;

        let mut tenants = Vec::new();
        for rec in &conf.receivers {
            if let Some(idx) = rec.name.find(crate::config::TENANT_BASE_ROUTE_POSTFIX) {
                if idx >= 1 {
                    tenants.push(rec.name[..idx - 1].to_string());
                }
            }
        }
        tenants.sort();
        Ok(tenants)
    }

    pub fn get_template_file_list(&self) -> Result<Vec<String>, Error> {
        let _guard = self.lock.read();
        let conf = self.read_config()?;
        Ok(conf.templates)
    }

    pub fn add_template_path(&self, path: &str) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;
        conf.templates.push(path.to_string());
        self.write_config(&conf)
    }

    pub fn remove_template_path(&self, path: &str) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;

        let idx = conf
            .templates
            .iter()
            .position(|p| p == path)
            .ok_or_else(|| Error::NotFound(format!("path not found: {path}")))?;
        conf.templates.remove(idx);
        self.write_config(&conf)
    }

    pub fn get_global_config(&self) -> Result<Option<GlobalConfig>, Error> {
        let _guard = self.lock.read();
        let conf = self.read_config()?;
        Ok(conf.global)
    }

    pub fn set_global_config(&self, global: GlobalConfig) -> Result<(), Error> {
        let _guard = self.lock.write();
        let mut conf = self.read_config()?;
        conf.global = Some(global);
        conf.validate()?;
        self.write_config(&conf)
    }

    fn read_config(&self) -> Result<Config, Error> {
        let bytes = self
            .fs
            .read_file(&self.config_path)
            .map_err(|e| Error::Io(format!("error reading config file: {e}")))?;
        serde_yaml::from_slice(&bytes)
            .map_err(|e| Error::Io(format!("error parsing config file: {e}")))
    }

    fn write_config(&self, conf: &Config) -> Result<(), Error> {
        let yaml = serde_yaml::to_string(conf)
            .map_err(|e| Error::Io(format!("error marshaling config file: {e}")))?;
        self.fs
            .write_file(&self.config_path, yaml.as_bytes(), 0o660)
            .map_err(|e| Error::Io(format!("error writing config file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use promcfg_common::DiskClient;

    use super::*;

    const TEST_ALERTMANAGER_FILE: &str = "global:
  resolve_timeout: 5m
  http_config: {}
  smtp_hello: localhost
  smtp_require_tls: true
  pagerduty_url: https://events.pagerduty.com/v2/enqueue
route:
  receiver: null_receiver
  group_by:
  - alertname
  group_wait: 10s
  group_interval: 10s
  repeat_interval: 1h
  routes:
  - receiver: other_tenant_base_route
    match:
      tenantID: other
receivers:
- name: null_receiver
- name: test_receiver
- name: receiver
- name: other_tenant_base_route
- name: sample_tenant_base_route
- name: test_slack
  slack_configs:
  - api_url: http://slack.com/12345
    channel: string
    username: string
- name: other_receiver
  slack_configs:
  - api_url: http://slack.com/54321
    channel: string
    username: string
- name: test_webhook
  webhook_configs:
  - url: http://webhook.com/12345
    send_resolved: true
- name: test_email
  email_configs:
  - to: test@mail.com
    from: testUser
    smarthost: http://mail-server.com
    headers:
      foo: bar
      name: value
templates:
- path/to/file1
- path/to/file2
- path/to/file3
";

    fn new_test_client(dir: &tempfile::TempDir, delete_routes: bool) -> AmClient {
        let root = format!("{}/", dir.path().display());
        std::fs::write(dir.path().join("alertmanager.yml"), TEST_ALERTMANAGER_FILE).unwrap();
        AmClient::new(
            "alertmanager.yml",
            Arc::new(DiskClient::new(root)),
            TenancyConfig {
                restrictor_label: "tenantID".into(),
                restrict_queries: false,
            },
            delete_routes,
        )
    }

    fn read_back(dir: &tempfile::TempDir) -> Config {
        let raw = std::fs::read_to_string(dir.path().join("alertmanager.yml")).unwrap();
        serde_yaml::from_str(&raw).unwrap()
    }

    #[test]
    fn create_receiver_stores_prefixed_name() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        client
            .create_receiver("test", Receiver::new("pager"))
            .unwrap();

        let conf = read_back(&dir);
        assert!(conf.get_receiver("test_pager").is_some());
    }

    #[test]
    fn create_duplicate_receiver_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        let err = client
            .create_receiver("test", Receiver::new("receiver"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "notification config name \"test_receiver\" is not unique"
        );
    }

    #[test]
    fn get_receivers_unprefixes_and_skips_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);

        let recs = client.get_receivers("test").unwrap();
        let names: Vec<&str> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["receiver", "slack", "webhook", "email"]);

        assert_eq!(client.get_receivers("other").unwrap().len(), 1);
        assert!(client.get_receivers("bad_nid").unwrap().is_empty());
    }

    #[test]
    fn update_receiver_replaces_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        client
            .update_receiver("test", "slack", Receiver::new("slack"))
            .unwrap();
        let conf = read_back(&dir);
        assert!(conf.get_receiver("test_slack").unwrap().slack_configs.is_empty());

        let err = client
            .update_receiver("test", "nonexistent", Receiver::new("nonexistent"))
            .unwrap_err();
        assert_eq!(err.to_string(), "receiver 'nonexistent' not found");
    }

    #[test]
    fn delete_receiver_unreferenced_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        client.delete_receiver("test", "slack").unwrap();
        assert!(read_back(&dir).get_receiver("test_slack").is_none());

        let err = client.delete_receiver("test", "nonexistent").unwrap_err();
        assert_eq!(err.to_string(), "receiver 'nonexistent' does not exist");
    }

    #[test]
    fn modify_tenant_route_wires_base_and_children() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        client
            .modify_tenant_route(
                "test",
                Route {
                    receiver: "test_tenant_base_route".into(),
                    routes: vec![Route::for_receiver("slack")],
                    ..Route::default()
                },
            )
            .unwrap();

        let conf = read_back(&dir);
        assert!(conf.get_receiver("test_tenant_base_route").is_some());
        let idx = conf.get_route_idx("test_tenant_base_route").unwrap();
        let base = &conf.route.as_ref().unwrap().routes[idx];
        assert_eq!(base.match_labels["tenantID"], "test");
        assert_eq!(base.routes[0].receiver, "test_slack");
    }

    #[test]
    fn modify_tenant_route_rejects_wrong_base_receiver() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        let err = client
            .modify_tenant_route(
                "test",
                Route {
                    receiver: "invalid_base_route".into(),
                    routes: vec![Route::for_receiver("slack")],
                    ..Route::default()
                },
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "route base receiver is incorrect (should be \"test_tenant_base_route\"). The base node should match nothing, then add routes as children of the base node"
        );
    }

    #[test]
    fn modify_tenant_route_rejects_unknown_child_receiver() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        let err = client
            .modify_tenant_route(
                "test",
                Route {
                    receiver: "test_tenant_base_route".into(),
                    routes: vec![Route::for_receiver("nonexistent")],
                    ..Route::default()
                },
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "undefined receiver \"test_nonexistent\" used in route"
        );
    }

    #[test]
    fn modify_tenant_route_replaces_existing_slot() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        client
            .modify_tenant_route(
                "other",
                Route {
                    receiver: "other_tenant_base_route".into(),
                    routes: vec![Route::for_receiver("receiver")],
                    ..Route::default()
                },
            )
            .unwrap();

        let conf = read_back(&dir);
        let root = conf.route.as_ref().unwrap();
        let slots: Vec<&str> = root
            .routes
            .iter()
            .map(|r| r.receiver.as_str())
            .filter(|n| n.contains("other"))
            .collect();
        assert_eq!(slots, vec!["other_tenant_base_route"]);
    }

    #[test]
    fn get_route_round_trips_unprefixed() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        let route = client.get_route("other").unwrap();
        assert_eq!(route.receiver, "other_tenant_base_route");
        assert_eq!(route.match_labels["tenantID"], "other");

        assert!(client.get_route("no-tenant").is_err());
    }

    #[test]
    fn get_tenants_lists_sorted_ids() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);
        assert_eq!(client.get_tenants().unwrap(), vec!["other", "sample"]);
    }

    #[test]
    fn template_path_list_ops() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);

        assert_eq!(
            client.get_template_file_list().unwrap(),
            vec!["path/to/file1", "path/to/file2", "path/to/file3"]
        );

        client.add_template_path("path/to/newFile").unwrap();
        let templates = client.get_template_file_list().unwrap();
        assert_eq!(templates.len(), 4);
        assert_eq!(templates[3], "path/to/newFile");

        client.remove_template_path("path/to/file1").unwrap();
        assert_eq!(client.get_template_file_list().unwrap().len(), 3);

        let err = client.remove_template_path("path/to/noFile").unwrap_err();
        assert_eq!(err.to_string(), "path not found: path/to/noFile");
    }

    #[test]
    fn global_config_get_and_set() {
        let dir = tempfile::tempdir().unwrap();
        let client = new_test_client(&dir, false);

        let global = client.get_global_config().unwrap().unwrap();
        assert_eq!(global.resolve_timeout, "5m");

        let mut updated = global;
        updated.smtp_from = "alerts@example.com".into();
        client.set_global_config(updated).unwrap();
        assert_eq!(
            client.get_global_config().unwrap().unwrap().smtp_from,
            "alerts@example.com"
        );
    }
}
