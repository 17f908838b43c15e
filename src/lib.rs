pub mod command_tree;
pub mod extras;
pub mod http;
pub mod naming;
pub mod openapi;
pub mod ordered;
pub mod request;
pub mod schema;
pub mod source;
