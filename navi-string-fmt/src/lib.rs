pub mod markdown;

pub use markdown::{Markdown, numbered_list};
