pub mod coordinator;
pub mod types;

pub use coordinator::{QueryCoordinator, WindowEvent, WindowSink};
pub use types::*;
