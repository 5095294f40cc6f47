pub mod grade;
pub mod init;
pub mod review;
pub mod truth_table;
pub mod validate;
