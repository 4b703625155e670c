pub mod allocations;
pub mod appointments;
pub mod categories;
pub mod clients;
pub mod notifications;
pub mod operators;
pub mod resources;
pub mod service_requirements;
pub mod services;

pub mod client_logins;
pub mod operator_logins;
