extern crate self as eduform;

pub mod api;
pub mod auth;
pub mod form;
pub mod pages;
pub mod prelude;
pub mod quiz;
pub mod session;
pub mod upload;
pub mod validation;

pub use form::{FormController, FormError, FormOptions, FormResult, SubmitOutcome};

#[cfg(test)]
mod test_public_api;
