pub mod model_access;
