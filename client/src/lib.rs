mod client;

pub use crate::client::{Client, ClientBuilder, ClientError, RefundOutcome, Result};
