pub mod fixture;
pub mod simulation;
