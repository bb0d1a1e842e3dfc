use chrono::prelude::*;
use std::{sync::Arc, time::Duration};
use subtrack_domain::{NotificationPermission, NotificationSettings};
use subtrack_engine::{Application, Visibility};
use subtrack_infra::{InMemoryServices, MockSys, Repos, SubtrackContext};
use tokio::sync::mpsc;

pub fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

pub struct TestApp {
    pub ctx: SubtrackContext,
    pub services: InMemoryServices,
    pub sys: Arc<MockSys>,
    pub visibility: mpsc::Sender<Visibility>,
    pub app: Application,
}

impl TestApp {
    /// Lets the engine react to everything that happened so far
    pub async fn settle(&self) {
        tokio::time::sleep(self.ctx.config.sync_debounce + Duration::from_millis(50)).await;
    }

    pub async fn become_visible(&self) {
        self.visibility.send(Visibility::Visible).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}

/// Context at `now` on top of the given stores with reminders enabled and permitted
pub async fn create_context(
    repos: Repos,
    now: &str,
) -> (SubtrackContext, InMemoryServices, Arc<MockSys>) {
    let services = InMemoryServices::new();
    let sys = Arc::new(MockSys::new(ts(now)));
    let mut ctx = SubtrackContext::create_inmemory();
    ctx.repos = repos;
    ctx.services = services.services();
    ctx.sys = sys.clone();

    let mut settings = ctx.repos.settings.get().await;
    if !settings.enabled {
        settings = NotificationSettings {
            enabled: true,
            permission: NotificationPermission::Granted,
            ..settings
        };
        ctx.repos.settings.save(&settings).await.unwrap();
    }

    (ctx, services, sys)
}

// Mounts the engine on an in-memory context
pub async fn spawn_app(now: &str) -> TestApp {
    let (ctx, services, sys) = create_context(Repos::create_inmemory(), now).await;
    let (visibility, visibility_rx) = mpsc::channel(8);
    let app = Application::mount(ctx.clone(), visibility_rx);

    // Let the mount time sync and dispatch cycle run
    tokio::time::sleep(Duration::from_millis(1)).await;

    TestApp {
        ctx,
        services,
        sys,
        visibility,
        app,
    }
}
