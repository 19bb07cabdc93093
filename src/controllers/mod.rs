pub mod generator;
pub mod health;
