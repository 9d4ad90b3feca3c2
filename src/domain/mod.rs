// Domain layer: documents, blocks, outcomes and the ports the pipeline runs through.

pub mod model;
pub mod ports;
