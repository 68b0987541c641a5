//! Command-line front end: make a flat PDF fillable.
//!
//! # Usage
//!
//! ```bash
//! commonforms input.pdf output.pdf --model FFDNet-L --fast --use-signature-fields
//! commonforms fillable.pdf multiline.pdf --upgrade-multiline
//! ```
//!
//! Exit codes: 0 on success, 2 when the input is password-protected, 1 for
//! any other failure.

use clap::Parser;
use commonforms::pipeline::config::Device;
use commonforms::{enable_multiline_fields, Error, FormConfig, FormPipeline};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command line arguments.
#[derive(Parser)]
#[command(name = "commonforms")]
#[command(about = "Detect form fields in a PDF and write a fillable copy")]
#[command(version)]
struct Args {
    /// Input PDF
    input: PathBuf,

    /// Output PDF
    output: PathBuf,

    /// Model name (FFDetr, FFDNet-S, FFDNet-L) or path to local weights [default: FFDetr].
    /// Only ONNX weights run: registered models need --fast (FFDNet-S, FFDNet-L);
    /// otherwise pass a local .onnx export
    #[arg(short, long)]
    model: Option<String>,

    /// Inference device ('cpu', 'cuda', 'cuda:0')
    #[arg(short, long)]
    device: Option<Device>,

    /// Minimum detection confidence
    #[arg(long)]
    confidence: Option<f32>,

    /// Model input size in pixels
    #[arg(long)]
    image_size: Option<u32>,

    /// Pages per detection batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Page rendering resolution [default: 144]
    #[arg(long)]
    dpi: Option<f32>,

    /// Use the CPU-oriented ONNX export (FFDNet only)
    #[arg(long)]
    fast: bool,

    /// Keep fields already in the input
    #[arg(long)]
    keep_existing_fields: bool,

    /// Write signature fields for detected signature blocks
    #[arg(long)]
    use_signature_fields: bool,

    /// Make text fields multiline
    #[arg(long)]
    multiline: bool,

    /// JSON configuration file; command-line options take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write the detected widgets as JSON
    #[arg(long, value_name = "FILE")]
    widgets_json: Option<PathBuf>,

    /// Only set the multiline flag on the input's existing text fields
    #[arg(long)]
    upgrade_multiline: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn form_config(&self) -> commonforms::Result<FormConfig> {
        let mut config = match self.config {
            Some(ref path) => FormConfig::from_json_file(path)?,
            None => FormConfig::default(),
        };
        if let Some(ref model) = self.model {
            config = config.with_model(model.clone());
        }
        if let Some(device) = self.device {
            config = config.with_device(device);
        }
        if let Some(confidence) = self.confidence {
            config = config.with_confidence(confidence);
        }
        if let Some(image_size) = self.image_size {
            config = config.with_image_size(image_size);
        }
        if let Some(batch_size) = self.batch_size {
            config = config.with_batch_size(batch_size);
        }
        if let Some(dpi) = self.dpi {
            let render = config.render.clone().with_dpi(dpi);
            config = config.with_render(render);
        }
        if self.fast {
            config = config.with_fast(true);
        }
        if self.keep_existing_fields {
            config = config.with_keep_existing_fields(true);
        }
        if self.use_signature_fields {
            config = config.with_signature_fields(true);
        }
        if self.multiline {
            config = config.with_multiline(true);
        }
        config.validate()?;
        Ok(config)
    }
}

fn run(args: &Args) -> commonforms::Result<()> {
    if args.upgrade_multiline {
        let updated = enable_multiline_fields(&args.input, &args.output)?;
        println!(
            "Enabled multiline on {} fields: {}",
            updated,
            args.output.display()
        );
        return Ok(());
    }

    let config = args.form_config()?;
    let mut pipeline = FormPipeline::with_defaults(&config)?;
    if let Some(ref path) = args.widgets_json {
        pipeline = pipeline.with_widgets_json(path);
    }

    let report = pipeline.prepare_form(&args.input, &args.output, &config)?;
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.name, skipped.reason);
    }
    println!(
        "Wrote {} fields to {}",
        report.field_count(),
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ Error::EncryptedDocument { .. }) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
