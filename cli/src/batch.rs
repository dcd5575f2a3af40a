use regions::Pipeline;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::{
    artifacts::{process_image, ImageReport},
    channel::ChannelConfig,
    is_image_path, list_images, CliError,
};

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<ImageReport>,
    pub failed: Vec<PathBuf>,
}

/// A single supported image, or every supported image directly inside a directory
pub fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, CliError> {
    if input.is_dir() {
        list_images(input)
    } else if is_image_path(input) {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(CliError::UnsupportedInput(input.to_path_buf()))
    }
}

/// Process images on blocking workers, at most `jobs` at a time.
///
/// Images that cannot be read or processed are logged and listed in
/// [`BatchSummary::failed`]; the rest of the batch carries on.
pub async fn process_batch(
    images: Vec<PathBuf>,
    output: &Path,
    pipeline: Arc<Pipeline>,
    channel: Arc<ChannelConfig>,
    jobs: usize,
) -> BatchSummary {
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut tasks = JoinSet::new();

    for path in images {
        let semaphore = Arc::clone(&semaphore);
        let pipeline = Arc::clone(&pipeline);
        let channel = Arc::clone(&channel);
        let output = output.to_path_buf();

        tasks.spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(err) => return (path, Err(CliError::Worker(err.to_string()))),
            };
            let source = path.clone();
            let result = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                process_image(&pipeline, &channel, &path, &output)
            })
            .await
            .unwrap_or_else(|join_error| Err(CliError::Worker(join_error.to_string())));
            (source, result)
        });
    }

    let mut summary = BatchSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(report))) => {
                info!(
                    "Processed {:?} (method = {}): {} significant regions",
                    report.source, report.method, report.regions
                );
                summary.processed.push(report);
            }
            Ok((source, Err(err))) => {
                warn!("Skipping {:?}: {}", source, err);
                summary.failed.push(source);
            }
            Err(join_error) => {
                error!("Task failed: {}", join_error);
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSource;
    use image::{Rgb, RgbImage};
    use std::fs;

    fn blob_image() -> RgbImage {
        RgbImage::from_fn(60, 40, |x, y| {
            let inside = (15..40).contains(&x) && (10..30).contains(&y);
            if inside { Rgb([230, 230, 230]) } else { Rgb([20, 20, 20]) }
        })
    }

    #[test]
    fn inputs_are_files_or_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let image = dir.path().join("one.png");
        blob_image().save(&image).expect("save");
        fs::write(dir.path().join("notes.txt"), b"text").expect("write");

        assert_eq!(collect_inputs(&image).expect("file"), vec![image.clone()]);
        assert_eq!(collect_inputs(dir.path()).expect("dir"), vec![image]);
        assert!(matches!(
            collect_inputs(&dir.path().join("notes.txt")),
            Err(CliError::UnsupportedInput(_))
        ));
    }

    #[tokio::test]
    async fn broken_images_are_skipped() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("input");
        fs::create_dir(&input).expect("create input dir");
        blob_image().save(input.join("good.png")).expect("save");
        fs::write(input.join("broken.jpg"), b"not an image").expect("write");
        fs::write(input.join("readme.md"), b"ignored").expect("write");

        let images = collect_inputs(&input).expect("collect");
        assert_eq!(images.len(), 2);

        let output = dir.path().join("out");
        fs::create_dir(&output).expect("create output dir");
        let pipeline = Arc::new(Pipeline::builder().build().expect("pipeline"));
        let channel = Arc::new(ChannelConfig {
            source: ChannelSource::Luma,
            ..ChannelConfig::default()
        });

        let summary = process_batch(images, &output, pipeline, channel, 2).await;

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.processed[0].source, input.join("good.png"));
        assert_eq!(summary.processed[0].regions, 1);
        assert_eq!(summary.failed, vec![input.join("broken.jpg")]);
        assert!(output.join("good").join("regions.json").is_file());
        assert!(!output.join("broken").exists());
    }

    #[tokio::test]
    async fn single_job_processes_everything() {
        let dir = tempfile::tempdir().expect("temp dir");
        let images: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("blob_{i}.png"));
                blob_image().save(&path).expect("save");
                path
            })
            .collect();

        let pipeline = Arc::new(Pipeline::builder().build().expect("pipeline"));
        let channel = Arc::new(ChannelConfig::default());
        let summary = process_batch(images, dir.path(), pipeline, channel, 1).await;

        assert_eq!(summary.processed.len(), 3);
        assert!(summary.failed.is_empty());
    }
}
