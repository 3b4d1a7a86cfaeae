//! Get-or-create provisioning of the group → host → template → application → item
//! chain a trapper item needs before the server accepts values for it.

use super::api::{ApiError, ZabbixApi};
use super::entities::{
    Application, DataType, Host, HostGroup, HostInterface, Item, RemoteObject, Template, ValueType,
};
use crate::domain::{ErrorSink, ReporterError};
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// Host group every reporter host and template is filed under.
pub const METRICS_HOST_GROUP: &str = "Metrics.NET";

/// Remote objects confirmed to exist, kept for the synchronizer's lifetime.
///
/// Only objects carrying an id are ever stored.
#[derive(Debug, Default)]
pub struct ResourceCache {
    host_group: Option<HostGroup>,
    host: Option<Host>,
    template: Option<Template>,
    application: Option<Application>,
    items: HashMap<String, Item>,
}

impl ResourceCache {
    pub fn host_group(&self) -> Option<&HostGroup> {
        self.host_group.as_ref()
    }

    pub fn host(&self) -> Option<&Host> {
        self.host.as_ref()
    }

    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    pub fn application(&self) -> Option<&Application> {
        self.application.as_ref()
    }

    pub fn item(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn id_of<T: RemoteObject>(object: Option<&T>) -> Option<String> {
        object.and_then(|o| o.id()).map(str::to_string)
    }
}

/// Makes sure the objects behind every reported item exist on one server.
///
/// Each `ensure_*` call answers `true` once the object is confirmed, and
/// `false` after reporting any failure to the error sink.
pub struct ResourceSynchronizer<A: ZabbixApi> {
    api: A,
    target: String,
    cache: ResourceCache,
    errors: ErrorSink,
}

impl<A: ZabbixApi> ResourceSynchronizer<A> {
    /// `target` names the server in error messages, usually the API URL.
    pub fn new(api: A, target: impl Into<String>, errors: ErrorSink) -> Self {
        Self {
            api,
            target: target.into(),
            cache: ResourceCache::default(),
            errors,
        }
    }

    /// Creates a synchronizer and provisions the host for `local_host`.
    ///
    /// Fails when the host can be neither found nor created; without it no
    /// template can be linked and no item provisioned.
    pub async fn connect(
        api: A,
        target: impl Into<String>,
        local_host: &str,
        errors: ErrorSink,
    ) -> Result<Self, ReporterError> {
        let mut synchronizer = Self::new(api, target, errors);
        if synchronizer.ensure_host(local_host).await {
            Ok(synchronizer)
        } else {
            Err(ReporterError::Configuration(format!(
                "Zabbix server {} has no host named \"{}\" and it could not be created",
                synchronizer.target, local_host
            )))
        }
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Number of trapper items confirmed so far.
    pub fn cached_items(&self) -> usize {
        self.cache.item_count()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn ensure_host_group(&mut self, name: &str) -> bool {
        if self.cache.host_group.as_ref().is_some_and(|g| g.name == name) {
            return true;
        }
        let result = self.provision_host_group(name).await;
        self.settle(result, "Error on configuring zabbix host group")
    }

    pub async fn ensure_host(&mut self, name: &str) -> bool {
        if name.trim().is_empty() {
            self.errors.report(
                &ReporterError::Configuration("host name must not be blank".to_string()),
                "Error on create zabbix host",
            );
            return false;
        }
        if !self.ensure_host_group(METRICS_HOST_GROUP).await {
            return false;
        }
        if self.cache.host.as_ref().is_some_and(|h| h.host == name) {
            return true;
        }
        let result = self.provision_host(name).await;
        self.settle(result, "Error on create zabbix host")
    }

    pub async fn ensure_template(&mut self, name: &str) -> bool {
        if !self.ensure_host_group(METRICS_HOST_GROUP).await {
            return false;
        }
        if self.cache.host.is_none() {
            debug!("No host provisioned, template '{}' cannot be linked", name);
            return false;
        }
        if let Some(templateid) = self
            .cache
            .template
            .as_ref()
            .filter(|t| t.name == name)
            .and_then(|t| t.templateid.clone())
        {
            if self.cache.application.is_none() {
                self.ensure_application(name, &templateid).await;
            }
            return true;
        }
        let result = self.provision_template(name).await;
        self.settle(result, "Error on configuring zabbix template")
    }

    pub async fn ensure_application(&mut self, name: &str, templateid: &str) -> bool {
        let result = self.provision_application(name, templateid).await;
        self.settle(result, "Error on configuring zabbix application")
    }

    /// Hot path: called for every item key on every cycle, answered from the
    /// cache once the item is known.
    pub async fn ensure_trapper_item(
        &mut self,
        key: &str,
        units: &str,
        value_type: ValueType,
        data_type: DataType,
    ) -> bool {
        if self.cache.items.contains_key(key) {
            return true;
        }
        let result = self
            .provision_trapper_item(key, units, value_type, data_type)
            .await;
        self.settle(result, "Error on configuring zabbix trapper item")
    }

    fn settle(&self, result: Result<bool, ApiError>, context: &str) -> bool {
        match result {
            Ok(confirmed) => confirmed,
            Err(e) => {
                self.errors.report(
                    &ReporterError::RemoteObject(e),
                    &format!("{}, zabbix api {}", context, self.target),
                );
                false
            }
        }
    }

    async fn provision_host_group(&mut self, name: &str) -> Result<bool, ApiError> {
        let group = match self.api.get_host_group(name).await? {
            Some(group) => group,
            None => {
                let mut group = HostGroup::new(name);
                group.groupid = self.api.create_host_group(&group).await?;
                info!("Created host group '{}' ({:?})", name, group.groupid);
                group
            }
        };

        if !group.exists() {
            return Ok(false);
        }
        self.cache.host_group = Some(group);
        Ok(true)
    }

    async fn provision_host(&mut self, name: &str) -> Result<bool, ApiError> {
        let host = match self.api.get_host(name).await? {
            Some(host) => host,
            None => {
                // An address is never guessed from a resolvable name.
                let Ok(ip) = name.parse::<IpAddr>() else {
                    warn!(
                        "Host '{}' does not exist on {} and is not an IP address, not creating it",
                        name, self.target
                    );
                    return Ok(false);
                };
                let Some(group) = self.cache.host_group.as_ref().and_then(HostGroup::to_ref) else {
                    return Ok(false);
                };

                let mut host = Host::new(name);
                host.interfaces.push(HostInterface::agent(ip.to_string()));
                host.groups.push(group);
                host.hostid = self.api.create_host(&host).await?;
                info!("Created host '{}' ({:?})", name, host.hostid);
                host
            }
        };

        if !host.exists() {
            return Ok(false);
        }
        self.cache.host = Some(host);
        Ok(true)
    }

    async fn provision_template(&mut self, name: &str) -> Result<bool, ApiError> {
        let (Some(group), Some(host)) = (
            self.cache.host_group.as_ref().and_then(HostGroup::to_ref),
            self.cache.host.as_ref().and_then(Host::to_ref),
        ) else {
            return Ok(false);
        };

        let template = match self.api.get_template(name).await? {
            None => {
                let mut template = Template::new(name);
                template.groups.push(group);
                template.hosts.push(host);
                template.templateid = self.api.create_template(&template).await?;
                info!("Created template '{}' ({:?})", name, template.templateid);
                template
            }
            Some(mut template) => {
                if !template.is_linked_to(&host.hostid) {
                    template.hosts.push(host);
                    if self.api.update_template(&template).await?.is_none() {
                        warn!("Linking template '{}' to host failed", name);
                        return Ok(false);
                    }
                    info!("Linked template '{}' to host", name);
                }
                template
            }
        };

        let Some(templateid) = template.templateid.clone() else {
            return Ok(false);
        };
        self.ensure_application(name, &templateid).await;
        self.cache.template = Some(template);
        Ok(true)
    }

    async fn provision_application(&mut self, name: &str, templateid: &str) -> Result<bool, ApiError> {
        let application = match self.api.get_application(name, templateid).await? {
            Some(application) => application,
            None => {
                let mut application = Application::new(name, templateid);
                application.applicationid = self.api.create_application(&application).await?;
                info!("Created application '{}' ({:?})", name, application.applicationid);
                application
            }
        };

        if !application.exists() {
            return Ok(false);
        }
        self.cache.application = Some(application);
        Ok(true)
    }

    async fn provision_trapper_item(
        &mut self,
        key: &str,
        units: &str,
        value_type: ValueType,
        data_type: DataType,
    ) -> Result<bool, ApiError> {
        let (Some(templateid), Some(applicationid)) = (
            ResourceCache::id_of(self.cache.template.as_ref()),
            ResourceCache::id_of(self.cache.application.as_ref()),
        ) else {
            return Ok(false);
        };

        let item = match self.api.get_item(key, &templateid).await? {
            Some(item) => item,
            None => {
                let mut item = Item::trapper(key, units, value_type, data_type, templateid);
                item.applications.push(applicationid);
                item.itemid = self.api.create_item(&item).await?;
                debug!("Created trapper item '{}' ({:?})", key, item.itemid);
                item
            }
        };

        if !item.exists() {
            return Ok(false);
        }
        self.cache.items.insert(key.to_string(), item);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// In-memory server counting every call by method name.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<HashMap<&'static str, usize>>,
        groups: Mutex<Vec<HostGroup>>,
        hosts: Mutex<Vec<Host>>,
        templates: Mutex<Vec<Template>>,
        applications: Mutex<Vec<Application>>,
        items: Mutex<Vec<Item>>,
        fail_group_create: bool,
        fail_template_update: bool,
        next_id: Mutex<u64>,
    }

    impl FakeApi {
        fn count(&self, method: &'static str) -> usize {
            self.calls.lock().get(method).copied().unwrap_or(0)
        }

        fn total_calls(&self) -> usize {
            self.calls.lock().values().sum()
        }

        fn hit(&self, method: &'static str) {
            *self.calls.lock().entry(method).or_default() += 1;
        }

        fn new_id(&self) -> String {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("{}", 100 + *next)
        }
    }

    impl ZabbixApi for FakeApi {
        async fn get_host_group(&self, name: &str) -> Result<Option<HostGroup>, ApiError> {
            self.hit("hostgroup.get");
            Ok(self.groups.lock().iter().find(|g| g.name == name).cloned())
        }

        async fn create_host_group(&self, group: &HostGroup) -> Result<Option<String>, ApiError> {
            self.hit("hostgroup.create");
            if self.fail_group_create {
                return Err(ApiError::Rpc {
                    code: -32500,
                    message: "Application error.".to_string(),
                    data: "No permissions".to_string(),
                });
            }
            let mut group = group.clone();
            group.groupid = Some(self.new_id());
            self.groups.lock().push(group.clone());
            Ok(group.groupid)
        }

        async fn get_host(&self, name: &str) -> Result<Option<Host>, ApiError> {
            self.hit("host.get");
            Ok(self.hosts.lock().iter().find(|h| h.host == name).cloned())
        }

        async fn create_host(&self, host: &Host) -> Result<Option<String>, ApiError> {
            self.hit("host.create");
            let mut host = host.clone();
            host.hostid = Some(self.new_id());
            self.hosts.lock().push(host.clone());
            Ok(host.hostid)
        }

        async fn get_template(&self, name: &str) -> Result<Option<Template>, ApiError> {
            self.hit("template.get");
            Ok(self.templates.lock().iter().find(|t| t.name == name).cloned())
        }

        async fn create_template(&self, template: &Template) -> Result<Option<String>, ApiError> {
            self.hit("template.create");
            let mut template = template.clone();
            template.templateid = Some(self.new_id());
            self.templates.lock().push(template.clone());
            Ok(template.templateid)
        }

        async fn update_template(&self, template: &Template) -> Result<Option<String>, ApiError> {
            self.hit("template.update");
            if self.fail_template_update {
                return Ok(None);
            }
            let mut templates = self.templates.lock();
            let existing = templates
                .iter_mut()
                .find(|t| t.templateid == template.templateid);
            Ok(existing.map(|t| {
                t.hosts = template.hosts.clone();
                t.templateid.clone().unwrap_or_default()
            }))
        }

        async fn get_application(&self, name: &str, hostid: &str) -> Result<Option<Application>, ApiError> {
            self.hit("application.get");
            Ok(self
                .applications
                .lock()
                .iter()
                .find(|a| a.name == name && a.hostid == hostid)
                .cloned())
        }

        async fn create_application(&self, application: &Application) -> Result<Option<String>, ApiError> {
            self.hit("application.create");
            let mut application = application.clone();
            application.applicationid = Some(self.new_id());
            self.applications.lock().push(application.clone());
            Ok(application.applicationid)
        }

        async fn get_item(&self, key: &str, hostid: &str) -> Result<Option<Item>, ApiError> {
            self.hit("item.get");
            Ok(self
                .items
                .lock()
                .iter()
                .find(|i| i.key == key && i.hostid == hostid)
                .cloned())
        }

        async fn create_item(&self, item: &Item) -> Result<Option<String>, ApiError> {
            self.hit("item.create");
            let mut item = item.clone();
            item.itemid = Some(self.new_id());
            self.items.lock().push(item.clone());
            Ok(item.itemid)
        }
    }

    fn collecting_sink() -> (ErrorSink, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = ErrorSink::new(move |error, context| {
            captured.lock().push(format!("{context}: {error}"));
        });
        (sink, seen)
    }

    async fn provisioned(api: FakeApi) -> ResourceSynchronizer<FakeApi> {
        let (sink, _) = collecting_sink();
        let mut sync = ResourceSynchronizer::connect(api, "fake", "10.0.0.5", sink)
            .await
            .expect("host provisioned");
        assert!(sync.ensure_template("MetricsDemo").await);
        sync
    }

    #[tokio::test]
    async fn test_connect_creates_group_and_ip_host() {
        let (sink, errors) = collecting_sink();
        let sync = ResourceSynchronizer::connect(FakeApi::default(), "fake", "10.0.0.5", sink)
            .await
            .unwrap();

        assert_eq!(sync.api().count("hostgroup.create"), 1);
        assert_eq!(sync.api().count("host.create"), 1);
        let host = sync.api().hosts.lock()[0].clone();
        assert_eq!(host.interfaces, vec![HostInterface::agent("10.0.0.5")]);
        assert_eq!(host.groups.len(), 1);
        assert_eq!(sync.cache().host().and_then(|h| h.id()), host.hostid.as_deref());
        assert!(errors.lock().is_empty());
    }

    #[tokio::test]
    async fn test_non_ip_host_is_not_created() {
        let (sink, _) = collecting_sink();
        let mut sync = ResourceSynchronizer::new(FakeApi::default(), "fake", sink);

        assert!(!sync.ensure_host("not-an-ip").await);
        assert_eq!(sync.api().count("host.get"), 1);
        assert_eq!(sync.api().count("host.create"), 0);
        assert!(sync.cache().host().is_none());
    }

    #[tokio::test]
    async fn test_existing_named_host_is_reused() {
        let api = FakeApi::default();
        api.hosts.lock().push(Host {
            hostid: Some("42".to_string()),
            ..Host::new("web01.example.com")
        });
        let (sink, _) = collecting_sink();
        let mut sync = ResourceSynchronizer::new(api, "fake", sink);

        assert!(sync.ensure_host("web01.example.com").await);
        assert_eq!(sync.api().count("host.create"), 0);
        assert_eq!(sync.cache().host().and_then(|h| h.id()), Some("42"));
    }

    #[tokio::test]
    async fn test_template_and_application_created_and_linked() {
        let sync = provisioned(FakeApi::default()).await;

        let template = sync.cache().template().unwrap();
        let hostid = sync.cache().host().unwrap().hostid.clone().unwrap();
        assert!(template.is_linked_to(&hostid));
        assert_eq!(template.groups.len(), 1);

        let application = sync.cache().application().unwrap();
        assert_eq!(application.name, "MetricsDemo");
        assert_eq!(Some(application.hostid.as_str()), template.id());
    }

    #[tokio::test]
    async fn test_existing_template_gets_linked_to_host() {
        let api = FakeApi::default();
        api.templates.lock().push(Template {
            templateid: Some("900".to_string()),
            ..Template::new("MetricsDemo")
        });
        let sync = provisioned(api).await;

        assert_eq!(sync.api().count("template.create"), 0);
        assert_eq!(sync.api().count("template.update"), 1);
        let stored = sync.api().templates.lock()[0].clone();
        assert_eq!(stored.hosts.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_template_link_is_a_failure() {
        let api = FakeApi {
            fail_template_update: true,
            ..Default::default()
        };
        api.templates.lock().push(Template {
            templateid: Some("900".to_string()),
            ..Template::new("MetricsDemo")
        });
        let (sink, _) = collecting_sink();
        let mut sync = ResourceSynchronizer::connect(api, "fake", "10.0.0.5", sink)
            .await
            .unwrap();

        assert!(!sync.ensure_template("MetricsDemo").await);
        assert!(sync.cache().template().is_none());
        assert_eq!(sync.api().count("application.get"), 0);
    }

    #[tokio::test]
    async fn test_trapper_item_is_provisioned_once() {
        let mut sync = provisioned(FakeApi::default()).await;
        let before = sync.api().total_calls();

        assert!(
            sync.ensure_trapper_item("svc-requests", "", ValueType::Unsigned, DataType::Decimal)
                .await
        );
        assert_eq!(sync.api().count("item.get"), 1);
        assert_eq!(sync.api().count("item.create"), 1);

        let after_first = sync.api().total_calls();
        assert_eq!(after_first - before, 2);

        assert!(
            sync.ensure_trapper_item("svc-requests", "", ValueType::Unsigned, DataType::Decimal)
                .await
        );
        assert_eq!(sync.api().total_calls(), after_first);
        assert_eq!(sync.cached_items(), 1);

        let created = sync.api().items.lock()[0].clone();
        assert_eq!(created.item_type, super::super::entities::ItemType::Trapper);
        assert_eq!(created.applications.len(), 1);
        assert_eq!(Some(created.hostid.as_str()), sync.cache().template().unwrap().id());
    }

    #[tokio::test]
    async fn test_existing_item_is_cached_without_create() {
        let mut sync = provisioned(FakeApi::default()).await;
        let templateid = sync.cache().template().unwrap().templateid.clone().unwrap();
        sync.api().items.lock().push(Item {
            itemid: Some("5000".to_string()),
            ..Item::trapper("svc-up", "", ValueType::Unsigned, DataType::Boolean, templateid)
        });

        assert!(
            sync.ensure_trapper_item("svc-up", "", ValueType::Unsigned, DataType::Boolean)
                .await
        );
        assert_eq!(sync.api().count("item.create"), 0);
        assert_eq!(sync.cache().item("svc-up").and_then(|i| i.id()), Some("5000"));
    }

    #[tokio::test]
    async fn test_group_failure_short_circuits_chain() {
        let (sink, errors) = collecting_sink();
        let api = FakeApi {
            fail_group_create: true,
            ..Default::default()
        };
        let mut sync = ResourceSynchronizer::new(api, "http://zbx/api_jsonrpc.php", sink);

        assert!(!sync.ensure_host_group(METRICS_HOST_GROUP).await);
        assert_eq!(errors.lock().len(), 1);
        assert!(errors.lock()[0].contains("host group, zabbix api http://zbx/api_jsonrpc.php"));

        assert!(!sync.ensure_host("10.0.0.5").await);
        assert!(!sync.ensure_template("MetricsDemo").await);
        assert!(
            !sync
                .ensure_trapper_item("svc-requests", "", ValueType::Unsigned, DataType::Decimal)
                .await
        );

        assert_eq!(sync.api().count("host.get"), 0);
        assert_eq!(sync.api().count("host.create"), 0);
        assert_eq!(sync.api().count("template.get"), 0);
        assert_eq!(sync.api().count("item.get"), 0);
        assert_eq!(sync.api().count("item.create"), 0);
    }

    #[tokio::test]
    async fn test_connect_fails_for_unknown_hostname() {
        let (sink, _) = collecting_sink();
        let result =
            ResourceSynchronizer::connect(FakeApi::default(), "fake", "build-agent", sink).await;
        assert!(matches!(result, Err(ReporterError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_item_without_template_makes_no_call() {
        let (sink, _) = collecting_sink();
        let mut sync = ResourceSynchronizer::connect(FakeApi::default(), "fake", "10.0.0.5", sink)
            .await
            .unwrap();
        let before = sync.api().total_calls();

        assert!(
            !sync
                .ensure_trapper_item("svc-requests", "", ValueType::Unsigned, DataType::Decimal)
                .await
        );
        assert_eq!(sync.api().total_calls(), before);
    }
}
