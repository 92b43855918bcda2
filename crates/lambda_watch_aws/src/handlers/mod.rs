pub mod deploy;
pub mod test_run;
