pub mod history;

pub use history::{HistoryManager, HistoryState, PendingToken};
