//! Wire protocol of the persistent chat connection.

pub mod frames;
