//! Campaign registration and capacity management for a volunteer-coordination backend.
//!
//! Organizations publish campaigns with a fixed number of volunteer seats, volunteers
//! register and cancel before the campaign starts, and points are awarded when a
//! volunteer attends or a campaign is completed.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod web;
