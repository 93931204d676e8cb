pub mod batch_handlers;
pub mod lookup_handlers;
pub mod system_handlers;

pub use batch_handlers::*;
pub use lookup_handlers::*;
pub use system_handlers::*;
