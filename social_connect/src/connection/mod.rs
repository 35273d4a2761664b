mod mask;
mod registry;
mod types;

pub use mask::mask_token;
pub use registry::{ConnectionRegistry, DEFAULT_STALE_AFTER_SECS};
pub use types::{Connection, ConnectionSummary, PlatformPost};
