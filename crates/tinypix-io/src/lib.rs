//! tinypix-io: browser I/O for the tinypix front-end core.
//!
//! Hosts the two remote orchestrators (image compression and
//! images-to-PDF conversion), the per-operation progress/error state
//! with its simulated ramp, the retrying artifact download, file and
//! Blob utilities, and the main-thread client for the processing
//! worker.

pub mod compress;
pub mod config;
pub mod download;
pub mod files;
pub mod http;
pub mod pdf;
pub mod state;
pub mod worker_client;

pub use compress::{CompressError, ProcessedImage, compress_image};
pub use pdf::{ConvertError, PdfConversion, PdfOptions, convert_images_to_pdf};
pub use state::{ProcessState, ProgressTicker};
pub use worker_client::{LocalWorker, WorkerError};
