mod auth;
mod extract;
mod handlers;
mod router;
mod state;

#[cfg(test)]
mod tests;

pub use auth::{Admin, Caller, USER_ID_HEADER};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use router::create_router;
pub use state::AppState;
