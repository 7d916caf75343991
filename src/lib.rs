pub mod clustering;
pub mod dataset;
pub mod embedding;
pub mod labeling;
pub mod models;
pub mod pipeline;
pub mod text;
pub mod utils;
