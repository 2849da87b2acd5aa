mod moving_average;

pub use moving_average::simple_moving_average;
