mod handle;
mod session;

pub use handle::ApiClientHandle;
pub use session::AuthSession;
pub use session::DEFAULT_REFRESH_MARGIN;
pub use session::SessionState;
