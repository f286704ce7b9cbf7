//! Request handlers.

pub mod downloads;
pub mod generate;
pub mod health;
pub mod jobs;
pub mod uploads;

pub use downloads::*;
pub use generate::*;
pub use health::*;
pub use jobs::*;
pub use uploads::*;
