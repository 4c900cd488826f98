pub mod moves;
pub mod rules;
pub mod state;
