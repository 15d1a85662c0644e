use std::sync::Arc;

use cf_infra::AccountPool;
use cf_infra::booter::ShellBooter;
use cf_infra::reclaim::Reclaimer;
use cf_infra::types::WorkshopConfig;
use cf_store::ProjectRegistry;

use crate::chat::ChatTransport;
use crate::readiness::{ReadinessPolicy, ServiceProbe};
use crate::ssh::RemoteExecutor;

/// Everything a command handler may touch. Cheap to clone into spawned tasks.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<dyn ChatTransport>,
    pub registry: Arc<ProjectRegistry>,
    pub pool: AccountPool,
    pub workshop: Arc<WorkshopConfig>,
    pub booter: Arc<ShellBooter>,
    pub reclaimer: Arc<Reclaimer>,
    pub executor: Arc<dyn RemoteExecutor>,
    pub probe: Arc<dyn ServiceProbe>,
    pub readiness: ReadinessPolicy,
}

impl AppState {
    pub fn new(
        chat: Arc<dyn ChatTransport>,
        registry: Arc<ProjectRegistry>,
        pool: AccountPool,
        workshop: Arc<WorkshopConfig>,
        executor: Arc<dyn RemoteExecutor>,
        probe: Arc<dyn ServiceProbe>,
    ) -> Self {
        Self {
            booter: Arc::new(ShellBooter::new(workshop.clone())),
            reclaimer: Arc::new(Reclaimer::new(pool.clone(), registry.clone(), workshop.clone())),
            chat,
            registry,
            pool,
            workshop,
            executor,
            probe,
            readiness: ReadinessPolicy::default(),
        }
    }
}
