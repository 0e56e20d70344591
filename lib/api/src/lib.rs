//! HTTP surface of the epicsum media lookup service.

pub mod rest;

pub use rest::{configure, RestApi};
