pub mod backend;
pub mod errors;
pub mod factory;
pub mod remote;

pub use backend::{ListQuery, MemeBackend, SearchRequest};
pub use errors::AppError;
pub use factory::AppFactory;
