mod connectivity;
mod pool;

pub use connectivity::{ConnectivityError, LikelyCause};
pub use pool::Database;
