mod action_response;
mod app_error;

pub use action_response::{ActionResponse, ErrorBody};
pub use app_error::{AppError, FieldErrors};
