pub mod beta;
pub mod ui;
