pub mod handler;
pub mod handlers;
pub mod scheduler;

pub use handler::*;
pub use handlers::*;
pub use scheduler::*;
