pub mod auth;
pub mod request_id;

pub use auth::{AdminAuth, AdminIdentity};
pub use request_id::{RequestId, RequestIdMiddleware};
