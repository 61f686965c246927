pub mod api_error;
pub mod startup_error;

pub use api_error::ApiError;
pub use startup_error::StartupError;
