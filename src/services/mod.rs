pub mod issuer_service;
pub mod validation_service;
