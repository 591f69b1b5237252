use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("nearest neighbour query on an empty tree")]
    EmptyTree,

    #[error("vertex {0} is not the root and has no parent edge")]
    DisconnectedVertex(usize),

    #[error("vertex index {0} is out of range")]
    IndexOutOfRange(isize),

    #[error("cannot add an edge from vertex {parent} to vertex {child}")]
    InvalidEdge { parent: usize, child: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("invalid sampling spread {0}")]
    InvalidSpread(f32),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Sampler(#[from] SamplerError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{field}` must be {requirement}, but was {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },

    #[error("`stuck_interval` must be positive")]
    ZeroStuckInterval,
}
