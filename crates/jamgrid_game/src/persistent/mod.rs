pub mod options;
pub mod ron;
