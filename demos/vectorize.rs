//! Trace PNG image into a vector drawable or SVG document
#![deny(warnings)]

use std::{
    env,
    fs::File,
    io::{BufReader, Write},
};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use vectrace::*;

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    output_file: String,
    format: Option<Format>,
    config: TracerConfig,
    size: Option<Size>,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            output_file: String::new(),
            format: None,
            config: TracerConfig::default(),
            size: None,
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "vectorize".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-c" => {
                    let count = args.next().ok_or("-c requires argument")?;
                    result.config = result.config.with_color_count(count.parse()?);
                }
                "-t" => {
                    let tolerance = args.next().ok_or("-t requires argument")?;
                    result.config = result.config.with_tolerance(tolerance.parse()?);
                }
                "-m" => {
                    let min_area = args.next().ok_or("-m requires argument")?;
                    result.config = result.config.with_min_area(min_area.parse()?);
                }
                "-s" => {
                    let size = args.next().ok_or("-s requires <width>x<height> argument")?;
                    let (width, height) = size
                        .split_once('x')
                        .ok_or("size must be in <width>x<height> format")?;
                    result.size = Some(Size::new(width.parse()?, height.parse()?));
                }
                "-f" => {
                    result.format = Some(args.next().ok_or("-f requires argument")?.parse()?);
                }
                _ => {
                    positional += 1;
                    match positional {
                        1 => result.input_file = arg,
                        2 => result.output_file = arg,
                        _ => return Err("unexpected positional argument".into()),
                    }
                }
            }
        }
        if positional < 2 {
            eprintln!("Trace PNG image into a vector document");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-c <colors>] [-t <tolerance>] [-m <min_area>] [-s <size>] [-f <format>] <image.png> <output>",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -c <colors>        number of palette colors 2..16 (default: 8)");
            eprintln!("    -t <tolerance>     simplification tolerance in pixels (default: 1)");
            eprintln!("    -m <min_area>      minimal region area in pixels (default: 4)");
            eprintln!("    -s <width>x<height> output size of the document");
            eprintln!("    -f <format>        svg or vector-drawable (default: from extension)");
            eprintln!("    <image.png>        source image");
            eprintln!("    <output>           output document ('-' means stdout)");
            std::process::exit(1);
        }
        Ok(result)
    }

    fn output_format(&self) -> Format {
        self.format.unwrap_or({
            if self.output_file.ends_with(".svg") {
                Format::Svg
            } else {
                Format::VectorDrawable
            }
        })
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let image = tracing::debug_span!("[load]")
        .in_scope(|| PixelBuffer::read_png(BufReader::new(File::open(&args.input_file)?)))?;
    tracing::debug!(width = image.width(), height = image.height(), "image");

    let doc = match args.size {
        Some(size) => trace_image_with_size(&image, size, &args.config)?,
        None => trace_image(&image, &args.config)?,
    };
    let data = args.output_format().export_data(&doc);
    if args.output_file != "-" {
        File::create(&args.output_file)?.write_all(&data)?;
    } else {
        std::io::stdout().write_all(&data)?;
    }
    Ok(())
}
