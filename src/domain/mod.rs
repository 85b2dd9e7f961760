//! Domain types for scholarship payments and their approval stages.

pub mod chain;
pub mod payment;
pub mod people;
pub mod period;
pub mod ports;
pub mod stage;
