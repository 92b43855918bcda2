pub mod cloudwatch;
pub mod deploy;
pub mod invoke;
