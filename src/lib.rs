//! Availability and booking core for a small homestay.
//!
//! The heart of the crate is the [`engine::Engine`]: it owns the booking
//! lifecycle (pending, accepted, completed) and keeps the shared per-date
//! availability collection consistent with it. The guest booking form, the
//! admin calendar editor, and the admin booking manager are controllers that
//! drive the engine and hold their own point-in-time
//! [`model::AvailabilitySnapshot`].
//!
//! The external document store is injected behind [`store::DocumentStore`];
//! nothing in the core polls for an SDK or reaches through globals.

pub mod admin;
pub mod auth;
pub mod availability;
pub mod calendar;
pub mod dates;
pub mod engine;
pub mod form;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;
