pub mod movie;
pub mod table;

pub use movie::*;
pub use table::*;
