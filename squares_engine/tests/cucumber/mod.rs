mod setups;
mod squares_world;
mod steps;

pub use squares_world::SquaresWorld;
