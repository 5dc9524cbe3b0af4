pub mod authorizer;
pub mod token;
