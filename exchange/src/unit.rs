pub mod price;

pub use price::Price;
