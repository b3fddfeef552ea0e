use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use talent_directory::config::ImportConfig;
use talent_directory::directory::DirectoryService;
use talent_directory::imports::{ImportKind, ImportService};
use talent_directory::store::TalentStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Both services share one store so imports are visible to the directory.
pub(crate) struct Services<S> {
    pub(crate) directory: Arc<DirectoryService<S>>,
    pub(crate) imports: Arc<ImportService<S>>,
}

impl<S> Services<S>
where
    S: TalentStore + 'static,
{
    pub(crate) fn new(store: Arc<S>, limits: ImportConfig) -> Self {
        Self {
            directory: Arc::new(DirectoryService::new(Arc::clone(&store))),
            imports: Arc::new(ImportService::with_limits(store, limits)),
        }
    }
}

/// clap value parser; accepts `exam-results` as well as `exam_results`.
pub(crate) fn parse_kind(raw: &str) -> Result<ImportKind, String> {
    raw.parse::<ImportKind>().map_err(|err| err.to_string())
}
