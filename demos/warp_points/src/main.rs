use argh::FromArgs;
use std::{fs::File, io::BufReader, path::PathBuf};

use landwarp::{
    landmarks::{
        io::csv::{parse_landmarks_csv, write_landmarks_csv},
        Landmark,
    },
    tps::WarpConfiguration,
    TpsWarperFactory, ValidationState,
};

#[derive(FromArgs)]
/// Fit a thin-plate spline between two landmark files and warp a point file
struct Args {
    /// path to the source landmarks csv (name?,x,y,z)
    #[argh(option, short = 's')]
    source: PathBuf,

    /// path to the destination landmarks csv (name?,x,y,z)
    #[argh(option, short = 'd')]
    destination: PathBuf,

    /// path to the points to warp (name?,x,y,z)
    #[argh(option, short = 'p')]
    points: PathBuf,

    /// path to write the warped points to, printed to stdout if missing
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// blend between the input (0.0) and the warped points (1.0)
    #[argh(option, short = 'b', default = "1.0")]
    blend_factor: f32,

    /// do not apply the translation part of the affine term
    #[argh(switch)]
    no_translation: bool,

    /// do not apply the rotation part of the affine term
    #[argh(switch)]
    no_rotation: bool,

    /// do not apply the scale part of the affine term
    #[argh(switch)]
    no_scale: bool,

    /// do not apply the non-affine terms
    #[argh(switch)]
    no_non_affine: bool,

    /// uniform scale applied to the source landmarks and the points
    #[argh(option, default = "1.0")]
    source_prescale: f32,

    /// uniform scale applied to the destination landmarks
    #[argh(option, default = "1.0")]
    destination_prescale: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Args = argh::from_env();

    let config = WarpConfiguration::default()
        .with_blend_factor(args.blend_factor)
        .with_translation(!args.no_translation)
        .with_rotation(!args.no_rotation)
        .with_scale(!args.no_scale)
        .with_non_affine_warp(!args.no_non_affine)
        .with_prescale(args.source_prescale, args.destination_prescale);

    let factory = TpsWarperFactory::from_csv_files(&args.source, &args.destination, config)?;

    for (label, value) in factory.warp_details() {
        log::info!("{label}: {value}");
    }

    for check in factory.validate() {
        match check.state {
            ValidationState::Ok => log::debug!("ok: {}", check.description),
            ValidationState::Warning => log::warn!("{}", check.description),
            ValidationState::Error => log::error!("{}", check.description),
        }
    }

    let warper = factory.try_create_warper()?;

    // read the points to warp
    let landmarks = parse_landmarks_csv(BufReader::new(File::open(&args.points)?))?;
    let mut points = landmarks.iter().map(|lm| lm.position).collect::<Vec<_>>();

    let now = std::time::Instant::now();
    warper(&mut points);
    log::info!("warped {} points in {:?}", points.len(), now.elapsed());

    let warped = landmarks
        .into_iter()
        .zip(points)
        .map(|(lm, p)| Landmark::new(lm.name, p))
        .collect::<Vec<_>>();

    match args.output {
        Some(path) => write_landmarks_csv(File::create(path)?, &warped)?,
        None => write_landmarks_csv(std::io::stdout().lock(), &warped)?,
    }

    Ok(())
}
