pub mod catalog;
pub mod enrichment;
pub mod identity;
pub mod lookup;
pub mod preferences;
pub mod session;

pub use enrichment::EnrichmentPipeline;
pub use identity::IdentityService;
pub use preferences::{PreferenceWriter, PreferenceWriterHandle};
pub use session::SessionRecorder;
