pub mod check;
pub mod common;
pub mod posts;
pub mod sync;
