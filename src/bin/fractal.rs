use clap::{App, Arg, ArgMatches};
use image::{ImageBuffer, Rgba};
use log::info;
use num::Complex;
use std::str::FromStr;

use escapebrot::{Fractal, Grid, Palette, Renderer, Viewport};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const ORIGIN: &str = "origin";
const EXTENT: &str = "extent";
const MODE: &str = "mode";
const CONSTANT: &str = "constant";
const ITERATIONS: &str = "iterations";
const PALETTE_SIZE: &str = "palette-size";
const THREADS: &str = "threads";

const MANDELBROT: &str = "mandelbrot";
const JULIA: &str = "julia";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("fractal")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Escape-time Mandelbrot and Julia renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output PNG file"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("800x800")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(ORIGIN)
                .long(ORIGIN)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.5,-2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse viewport origin"))
                .help("Left lower corner of the viewport"),
        )
        .arg(
            Arg::with_name(EXTENT)
                .long(EXTENT)
                .short("e")
                .takes_value(true)
                .default_value("4,4")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse viewport extent"))
                .help("Width and height of the viewport"),
        )
        .arg(
            Arg::with_name(MODE)
                .long(MODE)
                .short("m")
                .takes_value(true)
                .possible_values(&[MANDELBROT, JULIA])
                .default_value(MANDELBROT)
                .help("Which fractal to draw"),
        )
        .arg(
            Arg::with_name(CONSTANT)
                .long(CONSTANT)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.34,0.6175")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse julia constant"))
                .help("Constant added on every iteration in julia mode"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("512")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Iteration cap per pixel"),
        )
        .arg(
            Arg::with_name(PALETTE_SIZE)
                .long(PALETTE_SIZE)
                .short("p")
                .takes_value(true)
                .default_value("512")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        65_536,
                        "Could not parse palette size",
                        "Palette size must be between 1 and 65536",
                    )
                })
                .help("Number of colors in the palette"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in renderer"),
        )
        .get_matches()
}

fn write_image(outfile: &str, pixels: &[u32], bounds: (u32, u32)) -> Result<(), String> {
    let bytes: Vec<u8> = pixels.iter().flat_map(|p| p.to_le_bytes().to_vec()).collect();
    let image: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(bounds.0, bounds.1, bytes)
            .ok_or_else(|| "Pixel buffer does not match image size".to_string())?;
    image.save(outfile).map_err(|e| e.to_string())
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let matches = args();
    let image_size: (u32, u32) =
        parse_pair(matches.value_of(SIZE).unwrap(), 'x').expect("Error parsing image dimensions");
    let origin = parse_complex(matches.value_of(ORIGIN).unwrap())
        .expect("Error parsing viewport origin");
    let extent = parse_complex(matches.value_of(EXTENT).unwrap())
        .expect("Error parsing viewport extent");
    let fractal = match matches.value_of(MODE) {
        Some(JULIA) => Fractal::Julia(
            parse_complex(matches.value_of(CONSTANT).unwrap())
                .expect("Error parsing julia constant"),
        ),
        _ => Fractal::Mandelbrot,
    };
    let iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap())
        .expect("Could not parse iteration count.");
    let palette_size = usize::from_str(matches.value_of(PALETTE_SIZE).unwrap())
        .expect("Could not parse palette size.");
    let threads =
        usize::from_str(matches.value_of(THREADS).unwrap()).expect("Could not parse thread count.");

    let viewport = Viewport::new(origin.re, origin.im, extent.re, extent.im);
    let grid = Grid(image_size.0 as usize, image_size.1 as usize);
    let rendered = Palette::spectral(palette_size).and_then(|palette| {
        let renderer = Renderer::new(fractal, grid, viewport, iterations)?;
        let mut pixels = vec![0u32; renderer.plane().len()];
        renderer.render_threaded(palette.as_slice(), &mut pixels, threads)?;
        Ok(pixels)
    });

    match rendered {
        Err(e) => fail(format!("Render failure: {}", e)),
        Ok(pixels) => {
            info!("rendered {}x{} pixels", image_size.0, image_size.1);
            if let Err(e) = write_image(matches.value_of(OUTPUT).unwrap(), &pixels, image_size) {
                fail(format!("Could not write image: {}", e));
            }
        }
    }
}
