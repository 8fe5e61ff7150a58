use std::sync::Arc;

use docqa_config::Config;
use docqa_service::DocQaService;
use docqa_storage::VectorStore;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DocQaService>,
}
impl AppState {
	/// Opens the persisted index named by `storage.index_path`, if any.
	pub fn new(config: Config) -> color_eyre::Result<Self> {
		let store = VectorStore::open(config.storage.index_path.as_deref())?;

		tracing::info!(
			index_path = ?store.path(),
			upload_dir = %config.storage.upload_dir.display(),
			"Vector store ready."
		);

		Ok(Self::from_service(DocQaService::new(config, store)))
	}

	pub fn from_service(service: DocQaService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub fn max_upload_bytes(&self) -> usize {
		usize::try_from(self.service.cfg.security.max_upload_bytes).unwrap_or(usize::MAX)
	}
}
