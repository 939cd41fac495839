pub mod control_model;
pub mod controller;
pub mod layout;
