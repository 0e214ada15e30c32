pub mod entry;
pub mod notification;

pub use entry::{FeedEntry, FeedImage};
pub use notification::Notification;
