//! Headlines library exports for testing

pub mod core;
pub mod news;

#[cfg(test)]
pub mod test_support;
