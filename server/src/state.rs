use std::sync::Arc;

use thiserror::Error;

use crate::auth::{AdminList, IdentityProvider, StaticIdentityProvider};
use crate::catalog::Catalog;
use crate::config::{Config, ConfigError};
use crate::integrations::{
    FirebaseIdentity, GenkitSlugClient, ImageHost, ImageKitClient, Mailer, ResendMailer,
    Unconfigured,
};
use crate::slug::SlugGenerator;
use crate::store::{DocumentStore, MemoryStore, PgStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to run migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Outbound services the handlers talk to.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageHost>,
    pub slugs: SlugGenerator,
    pub admins: AdminList,
}

impl Services {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let identity: Arc<dyn IdentityProvider> =
            match (&config.firebase_api_key, &config.static_tokens) {
                (Some(api_key), _) => Arc::new(FirebaseIdentity::new(api_key.clone())),
                (None, Some(tokens)) => {
                    tracing::warn!("Auth: using static development tokens");
                    Arc::new(StaticIdentityProvider::parse(tokens)?)
                }
                (None, None) => {
                    tracing::warn!("Auth: no identity provider configured, all requests are anonymous");
                    Arc::new(Unconfigured("Identity provider"))
                }
            };

        let mailer: Arc<dyn Mailer> = match &config.resend {
            Some(resend) => Arc::new(ResendMailer::new(resend.api_key.clone(), resend.from.clone())),
            None => {
                tracing::warn!("Email: Resend not configured, tickets will not be emailed");
                Arc::new(Unconfigured("Email delivery"))
            }
        };

        let images: Arc<dyn ImageHost> = match &config.imagekit {
            Some(imagekit) => Arc::new(ImageKitClient::new(
                imagekit.private_key.clone(),
                imagekit.upload_url.clone(),
            )),
            None => Arc::new(Unconfigured("Image hosting")),
        };

        let slugs = match &config.genkit {
            Some(genkit) => SlugGenerator::new(Arc::new(GenkitSlugClient::new(
                genkit.flow_url.clone(),
                genkit.api_key.clone(),
            ))),
            None => {
                tracing::info!("Slugs: Genkit flow not configured, using local slugs");
                SlugGenerator::local_only()
            }
        };

        Ok(Self {
            identity,
            mailer,
            images,
            slugs,
            admins: AdminList::new(&config.admin_emails),
        })
    }
}

/// Shared handle passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub images: Arc<dyn ImageHost>,
    pub admins: Arc<AdminList>,
}

impl AppState {
    pub async fn new(store: Arc<dyn DocumentStore>, services: Services) -> Result<Self, StoreError> {
        let catalog = Catalog::load(store.clone(), services.slugs).await?;

        Ok(Self {
            catalog: Arc::new(catalog),
            store,
            identity: services.identity,
            mailer: services.mailer,
            images: services.images,
            admins: Arc::new(services.admins),
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store: Arc<dyn DocumentStore> = match &config.database_url {
            Some(url) => {
                let store = PgStore::connect(url, config.database_max_connections).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let services = Services::from_config(config)?;
        Ok(Self::new(store, services).await?)
    }
}
