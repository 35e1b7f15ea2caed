pub mod errors;
pub mod requests;
pub mod responses;

pub use errors::{backoffice_error, ApiResult};
pub use responses::ErrorResponse;
