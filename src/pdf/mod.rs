pub mod replicate;

pub use replicate::{repeat_page, replicate_page, ReplicateOptions};
