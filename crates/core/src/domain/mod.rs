pub mod building_type;
pub mod filter;
pub mod record;
