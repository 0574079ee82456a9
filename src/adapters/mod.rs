// 外部系統的具體實作：HubSpot API 與 CSV 輸出
pub mod csv_sink;
pub mod hubspot;

pub use csv_sink::{CsvFileSink, OutputFileNames};
pub use hubspot::{HubSpotFetcher, HubSpotOptions};
