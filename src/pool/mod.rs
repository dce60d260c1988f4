pub mod manager;
pub mod session;

pub use manager::{Batch, DismissOutcome, GetBatchRequest, PoolManager};
pub use session::{PoolState, SessionKey};
