pub mod concretize;
pub mod errors;
pub mod parser;
pub mod record;
pub mod scopes;
pub mod types;
