// REST API surface
//
// `RestClient` owns transport mechanics; each sibling module adds the
// endpoints of one resource family as inherent methods.

mod access;
mod applications;
pub mod client;
mod groups;
mod implementations;
pub mod keymaster;
pub mod models;
pub mod query;
mod realms;
mod roles;
mod schemas;
mod users;

pub use client::RestClient;
pub use query::ListQuery;
