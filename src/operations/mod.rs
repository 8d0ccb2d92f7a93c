pub mod browse;
pub mod check;
pub mod import;
pub mod register;
pub mod stats;
