//! pdfdeck CLI - PDF to PowerPoint slide converter

mod serve;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfdeck::{
    convert_with_progress, document_info, ConvertEvent, ConvertOptions, ImageEncoding,
    PackageSummary, PictureFit, RenderOptions, SlideOptions, SlideSizing,
};

/// EMUs per inch, for display.
const EMU_PER_INCH: f64 = pdfdeck::pptx::EMU_PER_INCH as f64;

#[derive(Parser)]
#[command(name = "pdfdeck")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Convert PDF pages into PowerPoint slides", long_about = None)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE", required = true)]
    input: Option<PathBuf>,

    /// Output presentation (defaults to the input with a .pptx extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(flatten)]
    flags: ConvertFlags,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF into a presentation, one slide per page
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output presentation
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        flags: ConvertFlags,
    },

    /// Show page count and page sizes of a PDF
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Document password
        #[arg(long)]
        password: Option<String>,

        /// PDFium library file or directory
        #[arg(long, value_name = "PATH")]
        pdfium: Option<PathBuf>,

        /// Resolution used for the pixel sizes shown
        #[arg(long, default_value = "300")]
        dpi: f32,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize a generated presentation
    Inspect {
        /// Presentation file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve an upload form that converts PDFs in the browser
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,

        /// Largest accepted upload in megabytes
        #[arg(long, default_value = "100")]
        max_upload_mb: usize,

        #[command(flatten)]
        flags: ConvertFlags,
    },

    /// Show version information
    Version,
}

#[derive(Args, Clone)]
struct ConvertFlags {
    /// Rendering resolution in dots per inch
    #[arg(long, default_value = "300")]
    dpi: f32,

    /// Picture encoding
    #[arg(long, value_enum, default_value = "png")]
    format: PictureFormat,

    /// JPEG quality (1-100)
    #[arg(long, default_value = "90")]
    quality: u8,

    /// Slide size
    #[arg(long, value_enum, default_value = "first-page")]
    size: SlideSize,

    /// Picture placement
    #[arg(long, value_enum, default_value = "stretch")]
    fit: Fit,

    /// Skip annotation appearances
    #[arg(long)]
    no_annotations: bool,

    /// Document password
    #[arg(long)]
    password: Option<String>,

    /// PDFium library file or directory
    #[arg(long, value_name = "PATH")]
    pdfium: Option<PathBuf>,

    /// Presentation title (defaults to the input file name)
    #[arg(long)]
    title: Option<String>,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl ConvertFlags {
    fn to_options(&self) -> ConvertOptions {
        let encoding = match self.format {
            PictureFormat::Png => ImageEncoding::Png,
            PictureFormat::Jpeg => ImageEncoding::Jpeg {
                quality: self.quality,
            },
        };

        let slides = SlideOptions::new()
            .with_sizing(self.size.into())
            .with_fit(self.fit.into())
            .with_encoding(encoding);
        let render = RenderOptions::new()
            .with_dpi(self.dpi)
            .with_annotations(!self.no_annotations);

        let mut options = ConvertOptions::new()
            .with_render_options(render)
            .with_slide_options(slides);
        if let Some(ref password) = self.password {
            options = options.with_password(password);
        }
        if let Some(ref pdfium) = self.pdfium {
            options = options.with_pdfium_library(pdfium);
        }
        if let Some(ref title) = self.title {
            options = options.with_title(title);
        }
        options
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PictureFormat {
    /// Lossless PNG (default)
    Png,
    /// JPEG, smaller files
    Jpeg,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SlideSize {
    /// 13.33in wide, shaped like the first page
    FirstPage,
    /// 16:9
    Widescreen,
    /// 4:3
    Standard,
}

impl From<SlideSize> for SlideSizing {
    fn from(size: SlideSize) -> Self {
        match size {
            SlideSize::FirstPage => SlideSizing::first_page(),
            SlideSize::Widescreen => SlideSizing::widescreen(),
            SlideSize::Standard => SlideSizing::standard(),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Fit {
    /// Fill the slide
    Stretch,
    /// Keep aspect ratio, centered
    Contain,
}

impl From<Fit> for PictureFit {
    fn from(fit: Fit) -> Self {
        match fit {
            Fit::Stretch => PictureFit::Stretch,
            Fit::Contain => PictureFit::Contain,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            flags,
        }) => cmd_convert(&input, output.as_deref(), &flags),
        Some(Commands::Info {
            input,
            password,
            pdfium,
            dpi,
            json,
        }) => cmd_info(&input, &info_options(password, pdfium, dpi), json),
        Some(Commands::Inspect { input, json }) => cmd_inspect(&input, json),
        Some(Commands::Serve {
            bind,
            max_upload_mb,
            flags,
        }) => cmd_serve(&bind, max_upload_mb, &flags),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        // Default behavior: convert the input; clap rejects a missing one
        None => match cli.input {
            Some(input) => cmd_convert(&input, cli.output.as_deref(), &cli.flags),
            None => Err("missing input file".into()),
        },
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    flags: &ConvertFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = flags.to_options();

    let pb = if flags.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("Opening PDF...");

    let result = convert_with_progress(input, output, &options, |event| match event {
        ConvertEvent::Started { pages } => {
            pb.set_length(pages as u64);
            pb.set_message("Rendering pages...");
        }
        ConvertEvent::PageRendered { page, .. } => {
            pb.set_position(page as u64);
        }
        ConvertEvent::Writing => pb.set_message("Writing presentation..."),
        ConvertEvent::Finished => pb.finish_with_message("Done!"),
    });

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            pb.abandon();
            return Err(e.into());
        }
    };

    if !flags.quiet {
        println!(
            "\n{} {} ({} slides, {:.2} x {:.2} in, {} bytes)",
            "Saved to".green().bold(),
            report.output.display(),
            report.pages,
            report.slide_width as f64 / EMU_PER_INCH,
            report.slide_height as f64 / EMU_PER_INCH,
            report.bytes
        );
    }

    Ok(())
}

fn info_options(password: Option<String>, pdfium: Option<PathBuf>, dpi: f32) -> ConvertOptions {
    let mut options =
        ConvertOptions::new().with_render_options(RenderOptions::new().with_dpi(dpi));
    options.password = password;
    options.pdfium_library = pdfium;
    options
}

fn cmd_info(
    input: &Path,
    options: &ConvertOptions,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = document_info(input, options)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), info.pdf_version);
    println!("{}: {}", "Pages".bold(), info.page_count);

    println!();
    println!("{}", "Page Sizes".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let pixels = info.pixel_sizes(options);
    for (i, (page, (w, h))) in info.pages.iter().zip(pixels).enumerate() {
        println!(
            "{:>4}: {:.1} x {:.1} pt  {}",
            i + 1,
            page.width,
            page.height,
            format!("({} x {} px at {:.0} DPI)", w, h, options.render.dpi()).dimmed()
        );
    }

    Ok(())
}

fn cmd_inspect(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let summary = PackageSummary::read(input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Presentation".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Slides".bold(), summary.slide_count());
    println!(
        "{}: {:.2} x {:.2} in",
        "Slide size".bold(),
        summary.slide_width as f64 / EMU_PER_INCH,
        summary.slide_height as f64 / EMU_PER_INCH
    );

    println!();
    for slide in &summary.slides {
        let pixels = slide
            .pixel_size
            .map(|(w, h)| format!("{} x {} px", w, h))
            .unwrap_or_else(|| "no picture".to_string());
        let format = slide
            .format
            .map(|f| f.extension().to_uppercase())
            .unwrap_or_default();
        println!("{:>4}: {} {}", slide.number, pixels, format.dimmed());
    }

    Ok(())
}

fn cmd_serve(
    bind: &str,
    max_upload_mb: usize,
    flags: &ConvertFlags,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = flags.to_options();
    options.validate()?;
    let state = serve::ServeState::new(options);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind).await?;
        println!(
            "{} http://{}",
            "Serving on".green().bold(),
            listener.local_addr()?
        );
        serve::serve(listener, state, max_upload_mb * 1024 * 1024).await
    })?;

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfdeck".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF to PowerPoint slide converter");
    println!();
    println!("Rendering: {}", "PDFium (pdfium-render)".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_input_required_without_subcommand() {
        let err = Cli::try_parse_from(["pdfdeck"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_subcommands_need_no_default_input() {
        let cli = Cli::try_parse_from(["pdfdeck", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Version)));
        assert!(cli.input.is_none());
    }

    #[test]
    fn test_default_command_takes_input_and_output() {
        let cli = Cli::try_parse_from(["pdfdeck", "talk.pdf", "talk.pptx", "--dpi", "150"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.input, Some(PathBuf::from("talk.pdf")));
        assert_eq!(cli.output, Some(PathBuf::from("talk.pptx")));
        assert!((cli.flags.to_options().render.dpi() - 150.0).abs() < 0.01);
    }

    #[test]
    fn test_info_accepts_dpi() {
        let cli = Cli::try_parse_from(["pdfdeck", "info", "talk.pdf", "--dpi", "96"]).unwrap();
        let Some(Commands::Info {
            password,
            pdfium,
            dpi,
            ..
        }) = cli.command
        else {
            panic!("expected info");
        };
        let options = info_options(password, pdfium, dpi);
        assert!((options.render.dpi() - 96.0).abs() < 0.01);
        assert_eq!(options.render.pixel_size(72.0, 36.0), (96, 48));
    }

    #[test]
    fn test_info_dpi_defaults_to_convert_default() {
        let cli = Cli::try_parse_from(["pdfdeck", "info", "talk.pdf"]).unwrap();
        let Some(Commands::Info { dpi, .. }) = cli.command else {
            panic!("expected info");
        };
        assert!((dpi - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["pdfdeck", "serve", "--size", "widescreen"]).unwrap();
        let Some(Commands::Serve {
            bind,
            max_upload_mb,
            flags,
        }) = cli.command
        else {
            panic!("expected serve");
        };
        assert_eq!(bind, "127.0.0.1:5000");
        assert_eq!(max_upload_mb, 100);
        assert_eq!(flags.to_options().slides.sizing, SlideSizing::widescreen());
    }
}
