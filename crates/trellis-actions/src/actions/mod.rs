//! Create and edit actions for each entity kind.

mod account;
mod cluster;
mod operator;
mod server;
mod user;

pub use account::{AddAccount, EditAccount};
pub use cluster::AddCluster;
pub use operator::{AddOperator, EditOperator};
pub use server::AddServer;
pub use user::AddUser;
