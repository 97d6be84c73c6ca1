pub mod db;
pub mod extract;
pub mod lookup;
pub mod migrate;
pub mod status;
