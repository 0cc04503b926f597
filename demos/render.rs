//! Render vector drawable or SVG document into PNG image
#![deny(warnings)]

use std::{env, fs::File, io::BufWriter};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};
use vectrace::*;

type Error = Box<dyn std::error::Error>;

#[derive(Debug)]
struct Args {
    input_file: String,
    output_file: String,
    options: RenderOptions,
}

impl Args {
    fn parse() -> Result<Args, Error> {
        let mut result = Args {
            input_file: String::new(),
            output_file: String::new(),
            options: RenderOptions::default(),
        };
        let mut positional = 0;
        let mut args = env::args();
        let cmd = args.next().unwrap_or_else(|| "render".to_owned());
        while let Some(arg) = args.next() {
            match arg.as_ref() {
                "-h" => {
                    positional = 0;
                    break;
                }
                "-w" => {
                    let size = args.next().ok_or("-w requires <width>x<height> argument")?;
                    let (width, height) = size
                        .split_once('x')
                        .ok_or("size must be in <width>x<height> format")?;
                    result.options.size = Some(Size::new(width.parse()?, height.parse()?));
                }
                "-s" => {
                    let scale = args.next().ok_or("-s requires argument")?;
                    result.options.scale = scale.parse()?;
                }
                "-f" => {
                    let flatness: Scalar = args.next().ok_or("-f requires argument")?.parse()?;
                    if flatness < EPSILON {
                        return Err("flatness is too small".into());
                    }
                    result.options.flatness = flatness;
                }
                "-bg" => {
                    let bg: RGBA = args
                        .next()
                        .ok_or("-bg requires color #rrggbb(aa) argument")?
                        .parse()?;
                    result.options.background = Some(bg);
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
            eprintln!("Render vector drawable or SVG document into PNG image");
            eprintln!("\nUSAGE:");
            eprintln!(
                "    {} [-w <size>] [-s <scale>] [-f <flatness>] [-bg <color>] <document> <out.png>",
                cmd
            );
            eprintln!("\nARGS:");
            eprintln!("    -w <width>x<height> size of the output image (default: document size)");
            eprintln!("    -s <scale>         device scale factor (default: 1)");
            eprintln!(
                "    -f <flatness>      flatness used by rasterizer (default: {})",
                DEFAULT_FLATNESS
            );
            eprintln!("    -bg <color>        background color");
            eprintln!("    <document>         vector drawable or SVG file");
            eprintln!("    <out.png>          rendered image ('-' means stdout)");
            std::process::exit(1);
        }
        Ok(result)
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse()?;
    let (format, doc) = Format::parse_at(&args.input_file)?;
    tracing::debug!(%format, paths = doc.all_paths().len(), "document");

    let image = render(&doc, &args.options)?;
    let save = tracing::debug_span!("[save]");
    let _guard = save.enter();
    if args.output_file != "-" {
        image.write_png(BufWriter::new(File::create(&args.output_file)?))?;
    } else {
        image.write_png(std::io::stdout().lock())?;
    }
    Ok(())
}
