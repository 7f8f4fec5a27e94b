//! Loading export files into a persistence backend.
//!
//! [`DataLoader`] walks the input files in order, parses each into a
//! [`ChatDataset`] and hands it to a [`DatasetPersister`]. File-level failures
//! are skipped unless strict mode is on; persistence failures always abort.

mod memory;
mod vector;

pub use memory::InMemoryPersister;
pub use vector::VectorStorePersister;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

use crate::error::{LoadError, PersistError};
use crate::models::{AppLanguage, ChatDataset};

/// Backend-specific persistence of one parsed export.
#[async_trait]
pub trait DatasetPersister: Send {
    async fn persist(&mut self, dataset: ChatDataset) -> Result<(), PersistError>;
}

/// A file skipped in non-strict mode.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one [`DataLoader::load_data`] run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub files_total: u64,
    pub files_loaded: u64,
    pub skipped: Vec<SkippedFile>,
    pub messages: u64,
    pub clean_messages: u64,
    pub duration_ms: u64,
}

impl LoadReport {
    pub fn files_skipped(&self) -> u64 {
        self.skipped.len() as u64
    }
}

/// Drives parsing and persistence over a list of export files.
#[derive(Debug, Clone)]
pub struct DataLoader {
    files: Vec<PathBuf>,
    language: AppLanguage,
    raise_errors: bool,
}

impl DataLoader {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            language: AppLanguage::default(),
            raise_errors: false,
        }
    }

    /// Language of the exporting app, which selects the placeholder set.
    pub fn with_language(mut self, language: AppLanguage) -> Self {
        self.language = language;
        self
    }

    /// Abort on the first file-level failure instead of skipping the file.
    pub fn with_raise_errors(mut self, raise_errors: bool) -> Self {
        self.raise_errors = raise_errors;
        self
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Load every file, in order, into `persister`.
    ///
    /// With `progress` a bar ticks once per processed file.
    pub async fn load_data<P>(
        &self,
        persister: &mut P,
        progress: bool,
    ) -> Result<LoadReport, LoadError>
    where
        P: DatasetPersister + ?Sized,
    {
        let pb = if progress {
            let pb = ProgressBar::new(self.files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})",
            ) {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };
        self.load_data_with(persister, &pb).await
    }

    /// [`Self::load_data`] reporting on a caller-owned bar.
    ///
    /// The bar advances once per file, whether it loads or is skipped, and
    /// is abandoned on the file that aborts the run.
    pub async fn load_data_with<P>(
        &self,
        persister: &mut P,
        pb: &ProgressBar,
    ) -> Result<LoadReport, LoadError>
    where
        P: DatasetPersister + ?Sized,
    {
        let start_time = Instant::now();
        let mut report = LoadReport {
            files_total: self.files.len() as u64,
            ..Default::default()
        };

        for path in &self.files {
            pb.inc(1);
            match self.load_file(path, persister).await {
                Ok((messages, clean)) => {
                    report.files_loaded += 1;
                    report.messages += messages;
                    report.clean_messages += clean;
                }
                Err(e) if e.is_file_level() && !self.raise_errors => {
                    pb.suspend(|| {
                        tracing::warn!(path = %path.display(), error = %e, "skipping file");
                    });
                    report.skipped.push(SkippedFile {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    pb.abandon();
                    return Err(e);
                }
            }
        }

        pb.finish_and_clear();
        report.duration_ms = start_time.elapsed().as_millis() as u64;
        Ok(report)
    }

    async fn load_file<P>(
        &self,
        path: &std::path::Path,
        persister: &mut P,
    ) -> Result<(u64, u64), LoadError>
    where
        P: DatasetPersister + ?Sized,
    {
        let dataset = ChatDataset::from_txt_file(path, self.language)?;
        let counts = (
            dataset.total_messages() as u64,
            dataset.total_clean_messages() as u64,
        );
        persister.persist(dataset).await?;
        Ok(counts)
    }
}
