pub mod audit;
pub mod info;
pub mod sse;
pub mod types;
