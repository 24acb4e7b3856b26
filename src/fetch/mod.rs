//! Request and response values exchanged between handlers.

mod request;
mod response;

pub use request::Request;
pub use response::Response;
