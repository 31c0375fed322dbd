pub mod extraction;
pub mod labs;
pub mod metabolic;
