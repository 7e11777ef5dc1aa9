pub mod fanout;

pub use fanout::{broadcast, FanoutConfig, FanoutReport, NotificationDraft, Recipients};
