pub mod eligibility;
pub mod scanner;
