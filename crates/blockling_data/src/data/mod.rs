pub mod block;
pub mod formation;
pub mod particle;
