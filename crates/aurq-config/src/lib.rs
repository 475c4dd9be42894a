pub mod annotations;
pub mod backend;
pub mod config;
pub mod error;

#[cfg(test)]
pub mod test_utils;
