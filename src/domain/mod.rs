// Domain layer: value objects and the ports the facade talks through.

pub mod model;
pub mod ports;
