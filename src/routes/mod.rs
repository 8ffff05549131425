use axum::extract::FromRequest;

use crate::error::AppError;

// Export all route modules
pub mod accounts;
pub mod feedback;
pub mod loans;
pub mod verification;

// Re-export all route handlers for easy importing
pub use accounts::*;
pub use feedback::*;
pub use loans::*;
pub use verification::*;

/// JSON body extractor whose rejections go through `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
