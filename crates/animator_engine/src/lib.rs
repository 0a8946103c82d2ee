//! Animator engine: provider IO, asset storage and the async job monitor.
mod auth;
mod filename;
mod monitor;
mod persist;
mod provider;
mod types;

pub use auth::{AuthorizationProvider, SharedCredential};
pub use filename::{deterministic_filename, VIDEO_NAME_HINT};
pub use monitor::{JobMonitor, MonitorHandle, MonitorSettings};
pub use persist::{ensure_output_dir, AssetStore, AtomicFileWriter, FileAssetStore, PersistError};
pub use provider::{GeminiProvider, GeminiSettings, GenerationProvider};
pub use types::{ProviderError, ProviderErrorKind};
