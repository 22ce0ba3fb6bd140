//! Wire types shared by the Folio API and its clients, plus the descriptors
//! that tell the generic resource handlers how each collection behaves.

pub mod api;
pub mod models;
pub mod resource;
