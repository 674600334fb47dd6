pub mod builder;
pub mod dashboard;
pub mod fields;
pub mod fill;
pub mod health;
pub mod labels;
pub mod maintenance;
pub mod steps;
pub mod submissions;
