pub mod auto_reset;

pub use auto_reset::{AutoResetService, start_auto_reset};
