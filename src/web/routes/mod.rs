pub mod admin;
pub mod campaigns;
pub mod health;
pub mod points;
pub mod registrations;
