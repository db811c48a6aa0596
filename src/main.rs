use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use opencv::core::Vector;
use opencv::imgcodecs;
use opencv::prelude::*;
use tracing::info;

use aerial_map_core::config::Settings;
use aerial_map_core::map::{GridMap, Rect2d};
use aerial_map_core::ortho::{MapWarper, UtmZone};

const USAGE: &str =
    "usage: aerial-map-core <settings.yaml> <image> <origin_x> <origin_y> <resolution> <utm_zone> <output>";

struct Args {
    settings: PathBuf,
    image: PathBuf,
    origin_x: f64,
    origin_y: f64,
    resolution: f64,
    zone: UtmZone,
    output: PathBuf,
}

fn parse_zone(s: &str) -> Result<UtmZone> {
    let (digits, north) = match s.chars().last() {
        Some('N' | 'n') => (&s[..s.len() - 1], true),
        Some('S' | 's') => (&s[..s.len() - 1], false),
        _ => (s, true),
    };
    let number: u8 = digits
        .parse()
        .with_context(|| format!("invalid UTM zone '{s}'"))?;
    Ok(UtmZone::new(number, north))
}

fn parse_args() -> Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() != 7 {
        bail!(USAGE);
    }
    let number = |i: usize, name: &str| -> Result<f64> {
        args[i]
            .parse()
            .with_context(|| format!("invalid {name} '{}'", args[i]))
    };

    Ok(Args {
        settings: PathBuf::from(&args[0]),
        image: PathBuf::from(&args[1]),
        origin_x: number(2, "origin_x")?,
        origin_y: number(3, "origin_y")?,
        resolution: number(4, "resolution")?,
        zone: parse_zone(&args[5])?,
        output: PathBuf::from(&args[6]),
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = parse_args()?;
    let settings = Settings::load(&args.settings)
        .with_context(|| format!("loading settings from {}", args.settings.display()))?;

    let image_path = args.image.to_string_lossy();
    let image = imgcodecs::imread(&image_path, imgcodecs::IMREAD_UNCHANGED)
        .with_context(|| format!("reading {image_path}"))?;
    if image.empty() {
        bail!("could not read image {image_path}");
    }

    let roi = Rect2d::new(
        args.origin_x,
        args.origin_y,
        f64::from(image.cols() - 1) * args.resolution,
        f64::from(image.rows() - 1) * args.resolution,
    );
    let mut map = GridMap::new(roi, args.resolution);
    map.add("color_rgb", image);

    let warper = MapWarper::new(settings.warper);
    let warped = warper
        .warp_map(&map, args.zone)
        .with_context(|| format!("warping {image_path}"))?;

    let Some(data) = warped.layer("data") else {
        bail!("warped map has no data layer");
    };
    let output = args.output.to_string_lossy();
    if !imgcodecs::imwrite(&output, data, &Vector::new())? {
        bail!("could not write {output}");
    }

    let out_roi = warped.roi();
    info!(
        "Wrote {} ({}x{}): origin ({}, {}), size {} x {}, resolution {}",
        output,
        data.cols(),
        data.rows(),
        out_roi.x,
        out_roi.y,
        out_roi.width,
        out_roi.height,
        warped.resolution()
    );
    Ok(())
}
