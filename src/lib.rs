pub mod classification;
pub mod models;
pub mod storage;
pub mod utils;
