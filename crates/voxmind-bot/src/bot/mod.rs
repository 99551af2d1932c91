pub mod context;
pub mod store;
pub mod tasks;

pub use context::BotContext;
pub use store::TranscriptStore;
pub use tasks::{TaskFailure, TaskRunner};
