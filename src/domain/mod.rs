// Domain layer: record model, destination schema and ports (interfaces).

pub mod model;
pub mod ports;
pub mod schema;
