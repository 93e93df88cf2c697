pub mod config;
pub mod error;
pub mod gateway;
pub mod hub;
pub mod registry;
pub mod replay;
pub mod routes;
pub mod snowflake;
pub mod state;
pub mod validator;
