pub mod component;
pub mod regulation;
