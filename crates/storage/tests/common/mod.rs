pub mod fixtures;
pub mod storage;

#[allow(unused_imports)]
pub use storage::TestStorage;
