// Application layer: stateless services over the repository ports
pub mod services;
pub mod validators;
