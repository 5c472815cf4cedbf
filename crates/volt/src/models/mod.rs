//! Domain models for procedure calls and their results

mod endpoint;
mod param;
mod response;

pub use endpoint::{ConnectionKey, Credentials, Endpoint, HttpMethod, Secret, hash_password};
pub use param::Param;
pub use response::{Column, ColumnType, Origin, Response, ResultTable, Status};
