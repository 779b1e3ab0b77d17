pub mod monitoring_handlers;
pub mod saved_search_handlers;
pub mod search_handlers;
pub mod system_handlers;

pub use monitoring_handlers::*;
pub use saved_search_handlers::*;
pub use search_handlers::*;
pub use system_handlers::*;
