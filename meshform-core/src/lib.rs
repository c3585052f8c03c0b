//! Meshform Core
//!
//! Property model, attribute schemas and the platform interfaces (scopes,
//! names, grants, emitters) that resource engines render against

pub mod case_convert;
pub mod emitter;
pub mod iam;
pub mod resource;
pub mod schema;
pub mod scope;
pub mod token;
