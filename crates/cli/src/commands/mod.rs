pub mod models;
pub mod serve;
pub mod tools;
