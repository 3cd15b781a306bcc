use clap::{Parser, Subcommand};
use idphoto::standards::{self, PassportStandard};
use idphoto::vision::{FlatBackgroundSegmenter, NoopFaceDetector};
use idphoto::{encode, pipeline, sheet};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "idphoto")]
#[command(about = "Generate standards-compliant passport and visa photos")]
#[command(long_about = "\
Generate standards-compliant passport and visa photos

Takes portrait photos and produces compliant output: cropped to the
standard's aspect ratio (face-centered with --auto-crop), background
replaced with solid white, resized to the exact pixel target, and saved
as JPEG with the standard's DPI. With --sheet, each photo is also tiled
onto a printable 4x6 inch sheet.

Run 'idphoto standards' to list the supported standards.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process one or more portrait photos
    Photo(PhotoArgs),
    /// List the registered passport standards
    Standards {
        /// Emit the registry as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct PhotoArgs {
    /// Input image file(s)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for processed images
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Passport standard code (see 'idphoto standards')
    #[arg(short, long)]
    standard: Option<String>,

    /// Center the crop on the detected face
    #[arg(long)]
    auto_crop: bool,

    /// Also create a printable sheet with multiple copies of each photo
    #[arg(long)]
    sheet: bool,

    /// Copies per sheet (defaults to the standard's sheet configuration)
    #[arg(long)]
    copies: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Photo(args) => run_photo(args),
        Command::Standards { json } => {
            print_standards(json)?;
            Ok(())
        }
    }
}

fn run_photo(args: PhotoArgs) -> Result<(), Box<dyn std::error::Error>> {
    let standard = standards::get_standard(args.standard.as_deref())?;
    std::fs::create_dir_all(&args.output_dir)?;

    println!(
        "==> Processing {} photo(s) against {} ({})",
        args.inputs.len(),
        standard.display_name,
        standard.formatted_dimensions()
    );

    let failures: Vec<String> = args
        .inputs
        .par_iter()
        .filter_map(|input| {
            match process_single(input, &args, standard) {
                Ok(outputs) => {
                    for path in outputs {
                        println!("Saved {}", path.display());
                    }
                    None
                }
                Err(e) => {
                    eprintln!("Failed to process {}: {e}", input.display());
                    Some(input.display().to_string())
                }
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(format!("{} of {} input(s) failed", failures.len(), args.inputs.len()).into())
    }
}

/// Process one input end to end. Returns the paths written.
fn process_single(
    input: &Path,
    args: &PhotoArgs,
    standard: &PassportStandard,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let image = encode::load_image(input)?;

    let photo = pipeline::prepare_passport_photo(
        &image,
        None,
        args.auto_crop,
        standard,
        &NoopFaceDetector,
        &FlatBackgroundSegmenter::default(),
    )?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("photo");

    let photo_path = args.output_dir.join(format!("{stem}_passport.jpg"));
    encode::save_jpeg(&photo, &photo_path)?;
    let mut written = vec![photo_path];

    if args.sheet {
        let sheet = sheet::create_passport_sheet(&photo.image, args.copies, standard)?;
        let sheet_path = args.output_dir.join(format!("{stem}_4x6.jpg"));
        encode::save_jpeg(&sheet, &sheet_path)?;
        written.push(sheet_path);
    }

    Ok(written)
}

fn print_standards(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        let all: Vec<&PassportStandard> = standards::all_standards().collect();
        println!("{}", serde_json::to_string_pretty(&all)?);
        return Ok(());
    }

    for standard in standards::all_standards() {
        let default_marker = if standard.code == standards::DEFAULT_STANDARD_CODE {
            " (default)"
        } else {
            ""
        };
        println!("{}{}", standard.code, default_marker);
        println!("  {}", standard.display_name);
        println!("  {} @ {} dpi", standard.formatted_dimensions(), standard.dpi);
        println!("  {}", standard.description);
        println!(
            "  sheet: {} ({} copies)",
            standard.sheet.label, standard.sheet.default_copies
        );
    }
    Ok(())
}
