// Domain layer: environment layout, invocations and the ports the core drives.

pub mod model;
pub mod ports;
