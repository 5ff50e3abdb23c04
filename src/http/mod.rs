pub mod client;
pub mod error;
pub mod retry;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
