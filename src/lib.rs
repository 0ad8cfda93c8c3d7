pub mod cli;
pub mod dataset;
pub mod error;
pub mod server;
pub mod storage;
pub mod tree;
pub mod upload;
