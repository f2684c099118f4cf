//! Test doubles for code that drives a [`GenerationGateway`].

mod gateway;

pub use gateway::{MockGate, MockGateway, MockResult};
