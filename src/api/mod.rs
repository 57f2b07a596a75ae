//! Remote authentication API.
//!
//! `AuthApiClient` is the production implementation of `AccountVerifier`;
//! `ApiError` classifies transport and service failures.

pub mod client;
pub mod error;

pub use client::AuthApiClient;
pub use error::ApiError;
