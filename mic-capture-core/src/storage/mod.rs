pub mod metadata;

pub use metadata::{read_metadata, write_metadata};
