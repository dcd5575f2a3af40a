use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};
use regions::{Diagnostics, IntensityGrid, MethodTag, Pipeline, RegionDescriptor, RegionOutline};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{channel::ChannelConfig, CliError};

const CONTOUR_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const RECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// One line of the batch summary
#[derive(Debug, Clone)]
pub struct ImageReport {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub method: MethodTag,
    pub regions: usize,
}

/// Contents of `regions.json`
#[derive(Debug, Serialize)]
pub struct RegionsDocument<'a> {
    pub source: &'a Path,
    pub width: u32,
    pub height: u32,
    pub method: MethodTag,
    pub diagnostics: Diagnostics,
    pub regions: &'a [RegionDescriptor],
}

/// Run one image through channel preparation and the pipeline, writing every
/// intermediate image plus `regions.json` to `<output_root>/<stem>/`.
pub fn process_image(
    pipeline: &Pipeline,
    channel: &ChannelConfig,
    path: &Path,
    output_root: &Path,
) -> Result<ImageReport, CliError> {
    let stem = path
        .file_stem()
        .ok_or_else(|| CliError::MissingFileName(path.to_path_buf()))?;
    let original = image::open(path)?.to_rgb8();

    let output_dir = output_root.join(stem);
    fs::create_dir_all(&output_dir)?;
    original.save(output_dir.join("original.png"))?;

    let prepared = channel.prepare(&original);
    prepared.channel.save(output_dir.join("channel.png"))?;
    prepared.smoothed.save(output_dir.join("smoothed.png"))?;

    let grid = IntensityGrid::new(prepared.smoothed)?;
    let output = pipeline.process(&grid)?;

    output.normalized.as_image().save(output_dir.join("normalized.png"))?;
    output
        .mask
        .as_image()
        .save(output_dir.join(format!("bin_{}.png", output.method)))?;
    output.refined_mask.as_image().save(output_dir.join("refined.png"))?;
    draw_contours(output.normalized.as_image(), &output.outlines).save(output_dir.join("contours.png"))?;
    draw_analysis(output.normalized.as_image(), &output.outlines).save(output_dir.join("analysis.png"))?;

    let document = RegionsDocument {
        source: path,
        width: grid.width(),
        height: grid.height(),
        method: output.method,
        diagnostics: output.diagnostics,
        regions: &output.regions,
    };
    fs::write(
        output_dir.join("regions.json"),
        serde_json::to_string_pretty(&document)?,
    )?;

    debug!(dir = %output_dir.display(), "artifacts written");

    Ok(ImageReport {
        source: path.to_path_buf(),
        output_dir,
        method: output.method,
        regions: output.regions.len(),
    })
}

/// Surviving contours over the normalized grid
pub fn draw_contours(base: &GrayImage, outlines: &[RegionOutline]) -> RgbImage {
    let mut canvas = to_rgb(base);
    for outline in outlines {
        let points: Vec<(f32, f32)> = outline
            .points
            .iter()
            .map(|&[x, y]| (x as f32, y as f32))
            .collect();
        draw_closed(&mut canvas, &points, CONTOUR_COLOR);
    }
    canvas
}

/// Rotated rectangles with a cross at each centre
pub fn draw_analysis(base: &GrayImage, outlines: &[RegionOutline]) -> RgbImage {
    let mut canvas = to_rgb(base);
    for outline in outlines {
        let corners = outline
            .rect
            .corners
            .map(|[x, y]| (x.round() as f32, y.round() as f32));
        draw_closed(&mut canvas, &corners, RECT_COLOR);
        let [cx, cy] = outline.rect.center;
        draw_cross_mut(&mut canvas, CENTER_COLOR, cx.round() as i32, cy.round() as i32);
    }
    canvas
}

fn to_rgb(base: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(base.clone()).to_rgb8()
}

fn draw_closed(canvas: &mut RgbImage, points: &[(f32, f32)], color: Rgb<u8>) {
    for (i, &start) in points.iter().enumerate() {
        let end = points[(i + 1) % points.len()];
        draw_line_segment_mut(canvas, start, end, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelSource;
    use image::Luma;
    use regions::RotatedRect;

    fn two_blobs() -> RgbImage {
        RgbImage::from_fn(80, 60, |x, y| {
            let left = (10..30).contains(&x) && (15..45).contains(&y);
            let right = (45..70).contains(&x) && (20..35).contains(&y);
            if left || right { Rgb([235, 235, 235]) } else { Rgb([25, 25, 25]) }
        })
    }

    #[test]
    fn every_artifact_is_written() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("blobs.png");
        two_blobs().save(&input).expect("save input");

        let pipeline = Pipeline::builder().build().expect("pipeline");
        let channel = ChannelConfig {
            source: ChannelSource::Luma,
            blur_size: 0,
            ..ChannelConfig::default()
        };
        let out = dir.path().join("out");
        let report = process_image(&pipeline, &channel, &input, &out).expect("process");

        assert_eq!(report.output_dir, out.join("blobs"));
        assert_eq!(report.method, MethodTag::Global);
        assert_eq!(report.regions, 2);

        for name in [
            "original.png",
            "channel.png",
            "smoothed.png",
            "normalized.png",
            "bin_global.png",
            "refined.png",
            "contours.png",
            "analysis.png",
            "regions.json",
        ] {
            assert!(report.output_dir.join(name).is_file(), "missing {name}");
        }

        let json: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(report.output_dir.join("regions.json")).expect("read json"),
        )
        .expect("parse json");
        assert_eq!(json["method"], "global");
        assert_eq!(json["width"], 80);
        assert_eq!(json["regions"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn unreadable_image_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("broken.png");
        fs::write(&input, b"not an image").expect("write");

        let pipeline = Pipeline::builder().build().expect("pipeline");
        let result = process_image(&pipeline, &ChannelConfig::default(), &input, dir.path());
        assert!(matches!(result, Err(CliError::ImageError(_))));
    }

    #[test]
    fn contours_are_drawn_in_colour() {
        let base = GrayImage::from_pixel(20, 20, Luma([50]));
        let outline = RegionOutline {
            id: 0,
            points: vec![[2, 2], [12, 2], [12, 12], [2, 12]],
            rect: RotatedRect {
                center: [7.0, 7.0],
                width: 10.0,
                height: 10.0,
                angle_degrees: 90.0,
                corners: [[2.0, 2.0], [12.0, 2.0], [12.0, 12.0], [2.0, 12.0]],
            },
        };

        let contours = draw_contours(&base, std::slice::from_ref(&outline));
        assert_eq!(*contours.get_pixel(7, 2), CONTOUR_COLOR);
        assert_eq!(*contours.get_pixel(7, 7), Rgb([50, 50, 50]));

        let analysis = draw_analysis(&base, &[outline]);
        assert_eq!(*analysis.get_pixel(7, 7), CENTER_COLOR);
        assert_eq!(*analysis.get_pixel(12, 5), RECT_COLOR);
    }
}
