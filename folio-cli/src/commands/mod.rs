pub mod add;
pub mod search;
