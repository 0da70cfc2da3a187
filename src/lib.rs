//! MediTrack — clinic appointment booking backend.
//!
//! Patients book appointments against a preferred doctor; any doctor
//! can claim a pending booking (first acceptance wins), walk it through
//! `Confirmed → In Progress → Completed`, and file a prescription.
//! Patients review completed visits, which feeds each doctor's
//! aggregate rating.

pub mod api;
pub mod auth;
pub mod booking;
pub mod config;
pub mod db;
pub mod feedback;
pub mod models;
pub mod state;
