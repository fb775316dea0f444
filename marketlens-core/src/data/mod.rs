//! Market data acquisition: provider trait, Yahoo Finance client, bulk download
//! and date alignment.

pub mod align;
pub mod download;
pub mod provider;
pub mod yahoo;

pub use align::{align_symbols, AlignedData};
pub use download::{download_data, RawDownload};
pub use provider::{
    DataError, DataProvider, DownloadProgress, FetchResult, RawBar, SilentProgress,
    StdoutProgress,
};
pub use yahoo::YahooProvider;
