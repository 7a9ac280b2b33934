pub mod pipeline;
pub mod supervisor;

pub use pipeline::Pipeline;
pub use supervisor::{Supervisor, SupervisorError, SupervisorState};
