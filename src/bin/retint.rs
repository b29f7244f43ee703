use std::path::PathBuf;

use clap::Parser;

/// Re-tint an animated GIF into the brand red: key out the white
/// background, recolor by luminance, halve the frame count and shrink
/// to 60% size.
#[derive(Parser, Debug)]
#[command(name = "retint", version)]
struct Cli {
    /// Input GIF path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.in_path.exists() {
        eprintln!("error: {} not found", cli.in_path.display());
        std::process::exit(1);
    }

    let stats = retint::process_gif(&cli.in_path, &cli.out)?;

    eprintln!(
        "wrote {} ({} of {} frames @ {}x{}, {:.2}s per cycle)",
        cli.out.display(),
        stats.kept_frames,
        stats.source_frames,
        stats.output_size.0,
        stats.output_size.1,
        stats.cycle_ms as f64 / 1000.0
    );
    Ok(())
}
