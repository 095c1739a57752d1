pub mod compare;
pub mod metrics;
pub mod processors;
