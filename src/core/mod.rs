pub mod assembler;
pub mod association;
pub mod batch;
pub mod collector;
pub mod etl;
pub mod mapper;
pub mod pipeline;
pub mod transform;
pub mod validator;

pub use crate::domain::ports::{CsvSink, Pipeline, RecordFetcher, Storage};
pub use crate::utils::error::Result;
