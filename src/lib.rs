pub mod clock;
pub mod config;
pub mod db;
pub mod domain;
pub mod paths;
pub mod services;
pub mod srs;
pub mod validation;

#[cfg(test)]
pub mod testing;
