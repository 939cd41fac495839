pub mod dom_model;
pub mod environment;
pub mod memory;
pub mod selector;
