pub mod detector;
pub mod ray;
