mod timeout;

pub use timeout::{FutureTimeoutExt, optional_timeout};
