mod config;
mod repos;
mod services;
mod system;

pub use config::Config;
pub use repos::*;
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, MockSys, RealSys};

#[derive(Clone)]
pub struct SubtrackContext {
    pub repos: Repos,
    pub services: Services,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

impl SubtrackContext {
    pub fn create_inmemory() -> Self {
        Self {
            repos: Repos::create_inmemory(),
            services: InMemoryServices::new().services(),
            config: Config::new(),
            sys: Arc::new(RealSys {}),
        }
    }
}

/// Will setup the infrastructure context given the environment
pub async fn setup_context() -> anyhow::Result<SubtrackContext> {
    let config = Config::new();
    let repos = Repos::create_file(&config.state_dir).await?;
    let services = Services::create_tracing(config.notification_permission);

    Ok(SubtrackContext {
        repos,
        services,
        config,
        sys: Arc::new(RealSys {}),
    })
}
