mod surreal;

pub use surreal::*;
