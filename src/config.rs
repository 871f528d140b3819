// Resolved settings for each command, with their documented defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Directory the uploader reads bundles from.
pub const DEFAULT_BUNDLES_DIR: &str = "./bundles/";
/// FHIR endpoint every bundle is POSTed to.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/fhir";
/// Clinical data export read by `convert`.
pub const DEFAULT_DATA_PATH: &str = "data/paad_tcga_pan_can_atlas_2018_clinical_data.tsv";
/// Directory `convert` writes bundle files to.
pub const DEFAULT_OUT_DIR: &str = "bundles";

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub bundles_dir: PathBuf,
    pub endpoint: String,
    /// `None` lets a request block until the server answers.
    pub timeout: Option<Duration>,
    pub show_progress: bool,
}

#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
    pub research_study_id: Option<String>,
}
