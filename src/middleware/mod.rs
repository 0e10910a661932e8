pub mod auth;
pub mod extract;
pub mod response;
pub mod validate_user;

pub use auth::{session_auth_middleware, AccessToken};
pub use extract::{JsonBody, PathParam, QueryParams};
pub use response::{ApiResponse, ApiResult};
pub use validate_user::validate_user_middleware;
