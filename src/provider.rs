//! Provider root: metadata, provider schema, configure and the type registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::config::{ProviderConfig, GRAPH_ENDPOINT, LOGIN_ENDPOINT};
use crate::credentials::{ClientSecretCredential, TokenCredential};
use crate::data_sources::{
    DataSource, DataSourceHandler, TrustframeworkKeySetCertificateDataSource,
    TrustframeworkKeySetDataSource, TrustframeworkKeySetKeyDataSource, TypedDataSource,
};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ProviderError, ProviderResult};
use crate::graph::{GraphApi, HttpGraphClient};
use crate::model::PatchTemplates;
use crate::resources::{
    ApplicationPatchResource, OrganizationalBrandingLocalizationResource, Resource,
    ResourceHandler, SamlApplicationPatchResource, TrustframeworkApplicationPatchResource,
    TrustframeworkKeySetCertificateResource, TrustframeworkKeySetKeyResource,
    TrustframeworkKeySetResource, TypedResource,
};
use crate::schema::{Attribute, Schema};

pub const PROVIDER_TYPE_NAME: &str = "azureadb2c";
pub const PROVIDER_ADDRESS: &str = "registry.terraform.io/schumann-it/azureadb2c";

/// Full type name for a resource or data source suffix.
pub fn type_name(suffix: &str) -> String {
    format!("{PROVIDER_TYPE_NAME}_{suffix}")
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderMetadata {
    pub type_name: &'static str,
    pub version: &'static str,
    pub address: &'static str,
}

pub fn metadata() -> ProviderMetadata {
    ProviderMetadata {
        type_name: PROVIDER_TYPE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        address: PROVIDER_ADDRESS,
    }
}

pub fn provider_schema() -> Schema {
    Schema::new(vec![
        Attribute::string("tenant_id")
            .describe("Tenant id. Falls back to B2C_ARM_TENANT_ID.")
            .optional(),
        Attribute::string("client_id")
            .describe("Application (client) id. Falls back to B2C_ARM_CLIENT_ID.")
            .optional(),
        Attribute::string("client_secret")
            .describe("Client secret. Falls back to B2C_ARM_CLIENT_SECRET.")
            .optional()
            .sensitive(),
    ])
    .describe("Manage Azure AD B2C trust framework keys, applications and branding.")
}

/// Every schema the provider serves, available before configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchemas {
    pub provider: Schema,
    pub resource_schemas: BTreeMap<String, Schema>,
    pub data_source_schemas: BTreeMap<String, Schema>,
}

impl ProviderSchemas {
    pub fn collect() -> Self {
        fn resource<R: Resource>(schemas: &mut BTreeMap<String, Schema>) {
            schemas.insert(type_name(R::TYPE_SUFFIX), R::schema());
        }
        fn data_source<D: DataSource>(schemas: &mut BTreeMap<String, Schema>) {
            schemas.insert(type_name(D::TYPE_SUFFIX), D::schema());
        }

        let mut resource_schemas = BTreeMap::new();
        resource::<TrustframeworkKeySetResource>(&mut resource_schemas);
        resource::<TrustframeworkKeySetKeyResource>(&mut resource_schemas);
        resource::<TrustframeworkKeySetCertificateResource>(&mut resource_schemas);
        resource::<ApplicationPatchResource>(&mut resource_schemas);
        resource::<TrustframeworkApplicationPatchResource>(&mut resource_schemas);
        resource::<SamlApplicationPatchResource>(&mut resource_schemas);
        resource::<OrganizationalBrandingLocalizationResource>(&mut resource_schemas);

        let mut data_source_schemas = BTreeMap::new();
        data_source::<TrustframeworkKeySetDataSource>(&mut data_source_schemas);
        data_source::<TrustframeworkKeySetKeyDataSource>(&mut data_source_schemas);
        data_source::<TrustframeworkKeySetCertificateDataSource>(&mut data_source_schemas);

        Self {
            provider: provider_schema(),
            resource_schemas,
            data_source_schemas,
        }
    }

    /// Validation only needs the schema, so it works before configure.
    pub fn resource(&self, type_name: &str) -> ProviderResult<&Schema> {
        self.resource_schemas
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> ProviderResult<&Schema> {
        self.data_source_schemas
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }
}

/// Resource and data source handlers sharing one Graph client.
pub struct ProviderRegistry {
    resources: BTreeMap<String, Box<dyn ResourceHandler>>,
    data_sources: BTreeMap<String, Box<dyn DataSourceHandler>>,
}

impl ProviderRegistry {
    pub fn new(graph: Arc<dyn GraphApi>, templates: Arc<PatchTemplates>) -> Self {
        let resources: Vec<Box<dyn ResourceHandler>> = vec![
            Box::new(TypedResource::new(TrustframeworkKeySetResource::new(
                graph.clone(),
            ))),
            Box::new(TypedResource::new(TrustframeworkKeySetKeyResource::new(
                graph.clone(),
            ))),
            Box::new(TypedResource::new(
                TrustframeworkKeySetCertificateResource::new(graph.clone()),
            )),
            Box::new(TypedResource::new(ApplicationPatchResource::new(
                graph.clone(),
            ))),
            Box::new(TypedResource::new(
                TrustframeworkApplicationPatchResource::new(graph.clone(), templates.clone()),
            )),
            Box::new(TypedResource::new(SamlApplicationPatchResource::new(
                graph.clone(),
                templates,
            ))),
            Box::new(TypedResource::new(
                OrganizationalBrandingLocalizationResource::new(graph.clone()),
            )),
        ];
        let data_sources: Vec<Box<dyn DataSourceHandler>> = vec![
            Box::new(TypedDataSource::new(TrustframeworkKeySetDataSource::new(
                graph.clone(),
            ))),
            Box::new(TypedDataSource::new(
                TrustframeworkKeySetKeyDataSource::new(graph.clone()),
            )),
            Box::new(TypedDataSource::new(
                TrustframeworkKeySetCertificateDataSource::new(graph),
            )),
        ];

        Self {
            resources: resources
                .into_iter()
                .map(|handler| (handler.type_name(), handler))
                .collect(),
            data_sources: data_sources
                .into_iter()
                .map(|handler| (handler.type_name(), handler))
                .collect(),
        }
    }

    pub fn resource(&self, type_name: &str) -> ProviderResult<&dyn ResourceHandler> {
        self.resources
            .get(type_name)
            .map(|handler| &**handler)
            .ok_or_else(|| ProviderError::UnknownResource(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> ProviderResult<&dyn DataSourceHandler> {
        self.data_sources
            .get(type_name)
            .map(|handler| &**handler)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &str> {
        self.data_sources.keys().map(String::as_str)
    }
}

/// Resolves credentials and builds the Graph client every handler shares.
pub fn configure(
    config: &ProviderConfig,
    templates: Arc<PatchTemplates>,
) -> Result<ProviderRegistry, Diagnostics> {
    let credentials = config.resolve()?;

    let credential = ClientSecretCredential::new(
        &credentials,
        LOGIN_ENDPOINT.as_str(),
        GRAPH_ENDPOINT.as_str(),
    )
    .map_err(|err| {
        Diagnostic::error("invalid azure ad b2c client credentials", err.to_string())
    })?;
    let credential: Arc<dyn TokenCredential> = Arc::new(credential);

    let client = HttpGraphClient::new(
        GRAPH_ENDPOINT.as_str(),
        credentials.tenant_id.clone(),
        credential,
    )
    .map_err(|err| Diagnostic::error("failed to create graph client", err.to_string()))?;

    tracing::info!(
        tenant_id = %credentials.tenant_id,
        client_id = %credentials.client_id,
        "provider configured"
    );
    Ok(ProviderRegistry::new(Arc::new(client), templates))
}

/// Process-wide provider state behind the host surface. The registry is set
/// exactly once, by the first successful configure.
pub struct ProviderServer {
    templates: Arc<PatchTemplates>,
    schemas: ProviderSchemas,
    registry: OnceCell<ProviderRegistry>,
}

impl ProviderServer {
    pub fn new(templates: Arc<PatchTemplates>) -> Self {
        Self {
            templates,
            schemas: ProviderSchemas::collect(),
            registry: OnceCell::new(),
        }
    }

    /// Server that starts out configured with the given registry.
    pub fn with_registry(templates: Arc<PatchTemplates>, registry: ProviderRegistry) -> Self {
        Self {
            templates,
            schemas: ProviderSchemas::collect(),
            registry: OnceCell::from(registry),
        }
    }

    pub fn schemas(&self) -> &ProviderSchemas {
        &self.schemas
    }

    pub fn configure(&self, config: &ProviderConfig) -> ProviderResult<&ProviderRegistry> {
        if self.registry.initialized() {
            return Err(ProviderError::AlreadyConfigured);
        }
        let registry =
            configure(config, self.templates.clone()).map_err(ProviderError::Configuration)?;
        self.registry
            .set(registry)
            .map_err(|_| ProviderError::AlreadyConfigured)?;
        self.registry()
    }

    pub fn registry(&self) -> ProviderResult<&ProviderRegistry> {
        self.registry.get().ok_or(ProviderError::NotConfigured)
    }
}
