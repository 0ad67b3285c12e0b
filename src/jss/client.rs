//! Server binding

use super::snapshot::Snapshot;
use crate::cache::CachePolicy;
use crate::catalog::{Registry, ResourceDescriptor};
use crate::config::ClientConfig;
use crate::decode::Document;
use crate::distribution::DistributionPoints;
use crate::error::{Error, Result};
use crate::http::{ApiRequest, ApiResponse, HttpClient, HttpClientConfig, Transport};
use crate::query::{build_path, QueryOptions, SearchArg};
use crate::resource::{Resource, Seed};
use crate::summary::{QueryResult, SummarySet};
use crate::types::{Format, JsonObject, JsonValue, Method};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default number of records resolved at once by `SummarySet::resolve_all`
pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 3;

struct JssInner {
    transport: Arc<dyn Transport>,
    registry: Registry,
    cache_policy: CachePolicy,
    resolve_concurrency: usize,
    base_url: Option<String>,
    distribution_points: DistributionPoints,
}

/// Binding to one server.
///
/// Cheap to clone; every `Resource` and `SummarySet` keeps a clone so it can
/// fetch and save on its own.
#[derive(Clone)]
pub struct Jss {
    inner: Arc<JssInner>,
}

impl Jss {
    /// Start building a binding
    pub fn builder() -> JssBuilder {
        JssBuilder::default()
    }

    /// Build a binding with an HTTP transport from a client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut http_config = HttpClientConfig::builder()
            .base_url(&config.url)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .verify_tls(config.verify_tls);
        if let Some(agent) = &config.user_agent {
            http_config = http_config.user_agent(agent);
        }

        let client = HttpClient::with_auth(http_config.build(), config.auth_config())?;
        let points = DistributionPoints::from_configs(&config.repos)?;

        Self::builder()
            .transport(Arc::new(client))
            .base_url(&config.url)
            .cache_policy(CachePolicy::new(config.max_age_seconds))
            .resolve_concurrency(config.resolve_concurrency)
            .distribution_points(points)
            .build()
    }

    /// Known resource types
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Expiry policy applied to every proxy of this binding
    pub fn cache_policy(&self) -> CachePolicy {
        self.inner.cache_policy
    }

    /// How many records `resolve_all` fetches at once
    pub fn resolve_concurrency(&self) -> usize {
        self.inner.resolve_concurrency
    }

    /// Configured file distribution points
    pub fn distribution_points(&self) -> &DistributionPoints {
        &self.inner.distribution_points
    }

    /// Descriptor of a resource type
    pub fn descriptor(&self, kind: &str) -> Result<Arc<ResourceDescriptor>> {
        self.inner.registry.get(kind)
    }

    /// Absolute URL of a request path, when the server URL is known
    pub fn url_for(&self, path: &str) -> String {
        match &self.inner.base_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/')),
            None => path.to_string(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Query a resource type.
    ///
    /// A response holding one full record becomes a `Resource`; a listing
    /// becomes a `SummarySet` whose members fetch on demand.
    pub async fn query(
        &self,
        kind: &str,
        search: impl Into<SearchArg>,
        options: QueryOptions,
    ) -> Result<QueryResult> {
        let descriptor = self.descriptor(kind)?;
        let search = search.into();

        if !descriptor.can(Method::GET) {
            return Err(Error::not_permitted(&descriptor.name, Method::GET));
        }

        let path = build_path(&descriptor, &search, &options)?;
        debug!("Querying {} for {search}", descriptor.name);
        let document = self.fetch(&descriptor, &path).await?;

        if is_listing(&descriptor, &document) {
            let set = SummarySet::from_document(self.clone(), descriptor, &document);
            debug!("Listing returned {} records", set.len());
            return Ok(QueryResult::Records(set));
        }

        let resource = Resource::new(self.clone(), descriptor, Seed::Payload(document), options)?;
        Ok(QueryResult::Record(Box::new(resource)))
    }

    /// Skeleton for a new record of `kind` named `name`
    pub fn new_resource(&self, kind: &str, name: &str) -> Result<Resource> {
        self.new_resource_with(kind, name, JsonObject::new())
    }

    /// Skeleton for a new record with template fields overridden
    pub fn new_resource_with(&self, kind: &str, name: &str, fields: JsonObject) -> Result<Resource> {
        let descriptor = self.descriptor(kind)?;
        Resource::new(
            self.clone(),
            descriptor,
            Seed::Name {
                name: name.to_string(),
                fields,
            },
            QueryOptions::new(),
        )
    }

    /// Proxy over a serialized record, e.g. one read back from disk
    pub fn resource_from_str(&self, kind: &str, body: &str) -> Result<Resource> {
        let descriptor = self.descriptor(kind)?;
        let document = Document::parse(descriptor.format(), &descriptor.root_tag, body)?;
        Resource::new(self.clone(), descriptor, Seed::Payload(document), QueryOptions::new())
    }

    /// Proxy over an already parsed record
    pub fn resource_from_document(&self, kind: &str, document: Document) -> Result<Resource> {
        let descriptor = self.descriptor(kind)?;
        Resource::new(self.clone(), descriptor, Seed::Payload(document), QueryOptions::new())
    }

    /// Fetch every record of the given types (all listable types when empty).
    ///
    /// A type that fails is recorded in `Snapshot::failures`; the rest of the
    /// batch carries on.
    pub async fn snapshot(&self, kinds: &[String]) -> Snapshot {
        let kinds: Vec<String> = if kinds.is_empty() {
            self.registry()
                .iter()
                .filter(|d| d.listable && d.can(Method::GET))
                .map(|d| d.name.clone())
                .collect()
        } else {
            kinds.to_vec()
        };

        let mut snapshot = Snapshot::default();
        for kind in kinds {
            match self.snapshot_kind(&kind).await {
                Ok(records) => {
                    info!("Snapshot of {kind}: {} records", records.len());
                    snapshot.records.insert(kind, records);
                }
                Err(e) => {
                    warn!("Snapshot of {kind} failed: {e}");
                    snapshot.failures.insert(kind, e.to_string());
                }
            }
        }
        snapshot
    }

    async fn snapshot_kind(&self, kind: &str) -> Result<Vec<JsonValue>> {
        match self.query(kind, SearchArg::All, QueryOptions::new()).await? {
            QueryResult::Record(resource) => Ok(vec![resource.data().root().clone()]),
            QueryResult::Records(set) => {
                let resources = set.resolve_all(QueryOptions::new()).await?;
                Ok(resources
                    .into_iter()
                    .map(|r| r.into_document().into_value())
                    .collect())
            }
        }
    }

    // ========================================================================
    // Raw Requests
    // ========================================================================

    /// Send a request, turning error statuses into errors
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self.inner.transport.execute(&request).await?;
        if !response.is_success() {
            debug!(
                status = response.status,
                "{} {} failed", request.method, request.path
            );
            return Err(Error::from_status(response.status, &response.body, &request.path));
        }
        Ok(response)
    }

    /// GET a path and parse the body in the descriptor's format
    pub async fn fetch(&self, descriptor: &ResourceDescriptor, path: &str) -> Result<Document> {
        let format = descriptor.format();
        let response = self.send(ApiRequest::get(path, format)).await?;

        if let Some(declared) = response.format() {
            if declared != format {
                return Err(Error::malformed(format!(
                    "{path} answered with {} instead of {}",
                    response.content_type.as_deref().unwrap_or_default(),
                    format.content_type()
                )));
            }
        }

        Document::parse(format, &descriptor.root_tag, &response.body)
    }
}

impl std::fmt::Debug for Jss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jss")
            .field("base_url", &self.inner.base_url)
            .field("resource_types", &self.inner.registry.len())
            .field("cache_policy", &self.inner.cache_policy)
            .finish_non_exhaustive()
    }
}

/// Whether a response is a listing rather than one full record
fn is_listing(descriptor: &ResourceDescriptor, document: &Document) -> bool {
    match document.format() {
        Format::Xml => {
            document.root_tag() != descriptor.root_tag
                && (document.contains("size")
                    || descriptor
                        .container_tag
                        .as_deref()
                        .is_some_and(|tag| document.contains(tag)))
        }
        Format::Json => {
            document.root().is_array()
                || document.get("results").is_some_and(JsonValue::is_array)
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for `Jss`
#[derive(Default)]
pub struct JssBuilder {
    transport: Option<Arc<dyn Transport>>,
    registry: Option<Registry>,
    cache_policy: CachePolicy,
    resolve_concurrency: Option<usize>,
    base_url: Option<String>,
    distribution_points: DistributionPoints,
}

impl JssBuilder {
    /// Transport used for every request
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Resource types (defaults to the built-in catalog)
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Expiry policy for fetched data
    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Bound on concurrent fetches in `resolve_all`
    pub fn resolve_concurrency(mut self, concurrency: usize) -> Self {
        self.resolve_concurrency = Some(concurrency);
        self
    }

    /// Server URL, used for `Resource::url`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// File distribution points
    pub fn distribution_points(mut self, points: DistributionPoints) -> Self {
        self.distribution_points = points;
        self
    }

    /// Build the binding
    pub fn build(self) -> Result<Jss> {
        let transport = self
            .transport
            .ok_or_else(|| Error::config("a transport is required"))?;
        let registry = match self.registry {
            Some(registry) => registry,
            None => Registry::builtin()?,
        };

        Ok(Jss {
            inner: Arc::new(JssInner {
                transport,
                registry,
                cache_policy: self.cache_policy,
                resolve_concurrency: self
                    .resolve_concurrency
                    .unwrap_or(DEFAULT_RESOLVE_CONCURRENCY)
                    .max(1),
                base_url: self.base_url,
                distribution_points: self.distribution_points,
            }),
        })
    }
}

// ============================================================================
// Per-type Queries
// ============================================================================

macro_rules! query_methods {
    ($($method:ident => $kind:literal),* $(,)?) => {
        impl Jss {
            $(
                #[doc = concat!("Query `", $kind, "` records")]
                pub async fn $method(
                    &self,
                    search: impl Into<SearchArg>,
                    options: QueryOptions,
                ) -> Result<QueryResult> {
                    self.query($kind, search, options).await
                }
            )*
        }
    };
}

query_methods! {
    accounts => "Account",
    account_groups => "AccountGroup",
    activation_code => "ActivationCode",
    advanced_computer_searches => "AdvancedComputerSearch",
    advanced_mobile_device_searches => "AdvancedMobileDeviceSearch",
    advanced_user_searches => "AdvancedUserSearch",
    buildings => "Building",
    byo_profiles => "BYOProfile",
    categories => "Category",
    classes => "Class",
    computers => "Computer",
    computer_application_usage => "ComputerApplicationUsage",
    computer_check_in => "ComputerCheckIn",
    computer_commands => "ComputerCommand",
    computer_configurations => "ComputerConfiguration",
    computer_extension_attributes => "ComputerExtensionAttribute",
    computer_groups => "ComputerGroup",
    computer_history => "ComputerHistory",
    computer_inventory_collection => "ComputerInventoryCollection",
    computer_invitations => "ComputerInvitation",
    computer_reports => "ComputerReport",
    departments => "Department",
    directory_bindings => "DirectoryBinding",
    disk_encryption_configurations => "DiskEncryptionConfiguration",
    distribution_point_records => "DistributionPoint",
    dock_items => "DockItem",
    ebooks => "EBook",
    gsx_connection => "GSXConnection",
    ibeacons => "IBeacon",
    jss_user => "JSSUser",
    ldap_servers => "LDAPServer",
    licensed_software => "LicensedSoftware",
    mac_applications => "MacApplication",
    managed_preference_profiles => "ManagedPreferenceProfile",
    mobile_devices => "MobileDevice",
    mobile_device_applications => "MobileDeviceApplication",
    mobile_device_commands => "MobileDeviceCommand",
    mobile_device_configuration_profiles => "MobileDeviceConfigurationProfile",
    mobile_device_enrollment_profiles => "MobileDeviceEnrollmentProfile",
    mobile_device_extension_attributes => "MobileDeviceExtensionAttribute",
    mobile_device_groups => "MobileDeviceGroup",
    mobile_device_invitations => "MobileDeviceInvitation",
    mobile_device_provisioning_profiles => "MobileDeviceProvisioningProfile",
    netboot_servers => "NetbootServer",
    network_segments => "NetworkSegment",
    osx_configuration_profiles => "OSXConfigurationProfile",
    packages => "Package",
    peripherals => "Peripheral",
    peripheral_types => "PeripheralType",
    policies => "Policy",
    printers => "Printer",
    removable_mac_addresses => "RemovableMACAddress",
    restricted_software => "RestrictedSoftware",
    saved_searches => "SavedSearch",
    scripts => "Script",
    sites => "Site",
    smtp_server => "SMTPServer",
    software_update_servers => "SoftwareUpdateServer",
    users => "User",
    user_extension_attributes => "UserExtensionAttribute",
    user_groups => "UserGroup",
    vpp_accounts => "VPPAccount",
    api_buildings => "ApiBuilding",
    api_categories => "ApiCategory",
    api_departments => "ApiDepartment",
    api_scripts => "ApiScript",
    inventory_preloads => "InventoryPreload",
    jamf_pro_server_url => "JamfProServerUrl",
}
