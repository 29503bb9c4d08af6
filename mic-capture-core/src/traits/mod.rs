pub mod input_provider;
