mod operator_service;

pub use operator_service::*;
