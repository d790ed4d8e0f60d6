#![allow(dead_code)]

pub mod store;

pub use store::{FakeStore, at};
