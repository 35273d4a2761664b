mod callback;
mod config;
mod connections;
mod error;
mod router;
mod session;

pub use callback::{CallbackOutcome, CallbackStatus};
pub use config::{
    PageConfig, SOCIAL_CALLBACK_ERROR_DELAY_MS, SOCIAL_CALLBACK_SUCCESS_DELAY_MS,
    SOCIAL_MANAGE_URL,
};
pub use error::ErrorResponse;
pub use router::{social_connect_router, social_connect_router_no_trace};
pub use session::{CurrentUser, SessionResolver, SocialState};

// Re-export the route prefix and initialization function from social_connect crate
pub use social_connect::{SOCIAL_ROUTE_PREFIX, init};
