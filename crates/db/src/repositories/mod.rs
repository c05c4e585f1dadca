pub mod component_repo;
pub mod regulation_repo;

pub use component_repo::ComponentRepo;
pub use regulation_repo::RegulationRepo;
