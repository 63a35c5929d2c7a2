pub mod builders;
pub mod dispatcher;
pub mod endpoint;
pub mod formatter;
pub mod parser;
pub mod results;
pub mod services;
