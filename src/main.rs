use clap::{value_t_or_exit, App, Arg, ArgMatches};

use std::path::{Path, PathBuf};
use std::process;

use glitchsort::io::{self, ConfidenceMapFile};
use glitchsort::mask::{self, Mask, MaskOptions};
use glitchsort::{Error, PerlinOptions, PixelSorter, Result, SortKey, TraversalPattern, WhatToSort};

enum MaskSource {
    Unmasked,
    /// A user supplied mask, shared by every input.
    Image(Mask),
    /// Confidence maps written by an external detector, a file or a directory
    /// holding one map per input under the same file name.
    Detection(PathBuf),
}

struct Job {
    sorter: PixelSorter,
    mask_source: MaskSource,
    mask_options: MaskOptions,
    what: WhatToSort,
    /// Write the mask's inclusion weights instead of sorting.
    save_mask: bool,
    output_dir: PathBuf,
}

impl Job {
    fn detection_map(maps: &Path, input: &Path) -> ConfidenceMapFile {
        match input.file_name() {
            Some(name) if maps.is_dir() => ConfidenceMapFile::new(maps.join(name)),
            _ => ConfidenceMapFile::new(maps),
        }
    }

    fn process(&self, input: &Path) -> Result<PathBuf> {
        let image = io::load(input)?;
        let mask = match &self.mask_source {
            MaskSource::Unmasked => None,
            MaskSource::Image(mask) => Some(mask.clone()),
            MaskSource::Detection(maps) => Some(mask::produce_mask(
                &Job::detection_map(maps, input),
                &image,
                &self.mask_options,
            )?),
        };

        if self.save_mask {
            let output = io::mask_output_path(input, &self.output_dir);
            if let Some(mask) = &mask {
                io::save_mask(&mask.weights(self.what), &output)?;
            }
            return Ok(output);
        }

        let sorted = self.sorter.sort(&image, mask.as_ref())?;
        let output = io::output_path(input, &self.output_dir);
        io::save(&sorted, &output)?;
        Ok(output)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = app().get_matches();

    match run(&matches) {
        Ok(true) => (),
        Ok(false) => process::exit(1),
        Err(err) => {
            log::error!("{}", err);
            process::exit(2);
        }
    }
}

fn app() -> App<'static, 'static> {
    App::new("glitchsort")
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .arg(
            Arg::with_name("input")
                .help("The input image, or a directory of images, to sort.")
                .required(true)
                .takes_value(true),
        )
        .args(&[
            arg_output(),
            arg_mask(),
            arg_detection_map(),
            arg_conf(),
            arg_blur_include(),
            arg_blur_extend(),
            arg_threshold(),
            arg_what_to_sort(),
            arg_sort_by(),
            arg_direction(),
            arg_perlin(),
            arg_seed(),
            arg_blend(),
            arg_invert_mask(),
            arg_save_mask(),
        ])
}

/// Returns whether every input was processed successfully.
fn run(matches: &ArgMatches<'_>) -> Result<bool> {
    let job = job_from_args(matches)?;
    let input = matches.value_of_os("input").map(Path::new).unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(&job.output_dir).map_err(|source| Error::FileSystem {
        path: job.output_dir.clone(),
        source,
    })?;
    let inputs = io::collect_inputs(input)?;
    if inputs.is_empty() {
        log::warn!("no images found in `{}`", input.display());
        return Ok(true);
    }

    #[cfg(feature = "rayon")]
    let results: Vec<_> = {
        use rayon::prelude::*;
        inputs.par_iter().map(|path| (path, job.process(path))).collect()
    };
    #[cfg(not(feature = "rayon"))]
    let results: Vec<_> = inputs.iter().map(|path| (path, job.process(path))).collect();

    let mut failures = 0;
    for (input, result) in results {
        match result {
            Ok(output) => log::info!("saved `{}` to `{}`", input.display(), output.display()),
            Err(err) => {
                failures += 1;
                log::error!("skipping `{}`: {}", input.display(), err);
            }
        }
    }
    if failures > 0 {
        log::error!("{} of {} images failed", failures, inputs.len());
    }
    Ok(failures == 0)
}

fn job_from_args(matches: &ArgMatches<'_>) -> Result<Job> {
    let save_mask = matches.is_present("save_mask");
    let detection_map = matches.value_of_os("detection_map").map(PathBuf::from);
    if save_mask && detection_map.is_none() {
        return Err(Error::InvalidCombination(String::from(
            "--save-mask needs --detection-map to produce a mask",
        )));
    }
    if save_mask && matches.is_present("mask") {
        return Err(Error::InvalidCombination(String::from(
            "--save-mask cannot be combined with --mask",
        )));
    }

    let mask_options = MaskOptions {
        confidence: value_t_or_exit!(matches, "conf", f32),
        blur_include: value_t_or_exit!(matches, "blur_include", f32),
        blur_extend: value_t_or_exit!(matches, "blur_extend", f32),
        invert: matches.is_present("invert_mask"),
    };
    mask_options.validate()?;

    let mask_source = if let Some(path) = matches.value_of_os("mask") {
        let mut mask = io::load_mask(path)?;
        if mask_options.invert {
            mask.invert();
        }
        MaskSource::Image(mask)
    } else if let Some(maps) = detection_map {
        MaskSource::Detection(maps)
    } else {
        MaskSource::Unmasked
    };

    let what = value_t_or_exit!(matches, "what_to_sort", WhatToSort);
    let mut sorter = PixelSorter::new(value_t_or_exit!(matches, "sort_by", SortKey))
        .pattern(value_t_or_exit!(matches, "direction", TraversalPattern))
        .what_to_sort(what)
        .threshold_from_blur_include(mask_options.blur_include)
        .blend(matches.is_present("blend"));
    if matches.is_present("threshold") {
        sorter = sorter.threshold(value_t_or_exit!(matches, "threshold", f32));
    }
    if matches.is_present("perlin") {
        sorter = sorter.perlin(Some(PerlinOptions::with_seed(value_t_or_exit!(
            matches, "seed", u64
        ))));
    }

    Ok(Job {
        sorter,
        mask_source,
        mask_options,
        what,
        save_mask,
        output_dir: matches
            .value_of_os("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("out")),
    })
}

fn arg_output() -> Arg<'static, 'static> {
    Arg::with_name("output")
        .short("o")
        .long("output")
        .help("The directory to write sorted images to.")
        .long_help(
            "The directory to write sorted images to.\n\
             \n\
             Created if missing. Outputs keep the input's name with `_sorted` appended to the stem.",
        )
        .default_value("out")
        .takes_value(true)
}

fn arg_mask() -> Arg<'static, 'static> {
    Arg::with_name("mask")
        .short("m")
        .long("mask")
        .help("A file path to a gray image to mask parts of the input image.")
        .long_help(
            "A file path to a gray image to mask parts of the input image.\n\
             White marks the foreground, black the background, grays are partial.\n\
             Takes precedence over --detection-map.",
        )
        .takes_value(true)
}

fn arg_detection_map() -> Arg<'static, 'static> {
    Arg::with_name("detection_map")
        .short("d")
        .long("detection-map")
        .help("Object confidence map written by a detector, enables detection based masking.")
        .long_help(
            "Object confidence map written by a detector, enables detection based masking.\n\
             \n\
             Either a gray image used for every input, or a directory holding one map per input under the same file name.\n\
             The map is thresholded by --conf, then eroded and blurred according to --blur-include and --blur-extend.",
        )
        .takes_value(true)
}

fn arg_conf() -> Arg<'static, 'static> {
    Arg::with_name("conf")
        .short("c")
        .long("conf")
        .help("Detection confidence threshold in [0, 1].")
        .default_value("0.35")
        .takes_value(true)
}

fn arg_blur_include() -> Arg<'static, 'static> {
    Arg::with_name("blur_include")
        .long("blur-include")
        .help("How much of a detected object is kept before blurring, in [0, 1].")
        .long_help(
            "How much of a detected object is kept before blurring, in [0, 1].\n\
             \n\
             Lower values erode the detection inward. Also sets the inclusion threshold to 1 - value unless --threshold is given.",
        )
        .default_value("0.5")
        .takes_value(true)
}

fn arg_blur_extend() -> Arg<'static, 'static> {
    Arg::with_name("blur_extend")
        .long("blur-extend")
        .help("How far the mask is blurred outwards, in [0, 1].")
        .default_value("0.7")
        .takes_value(true)
}

fn arg_threshold() -> Arg<'static, 'static> {
    Arg::with_name("threshold")
        .short("t")
        .long("threshold")
        .help("Inclusion weight a pixel has to exceed to be sorted, in [0, 1].")
        .takes_value(true)
}

fn arg_what_to_sort() -> Arg<'static, 'static> {
    Arg::with_name("what_to_sort")
        .short("w")
        .long("what-to-sort")
        .help("Which part of the mask to sort.")
        .possible_values(&["background", "foreground", "all"])
        .default_value("background")
        .takes_value(true)
}

fn arg_sort_by() -> Arg<'static, 'static> {
    Arg::with_name("sort_by")
        .short("s")
        .long("sort-by")
        .help("The key to sort pixels by.")
        .long_help(
            "The key to sort pixels by.\n\
             \n\
             `alpha` is only available for images with an alpha channel.",
        )
        .possible_values(&[
            "hue",
            "saturation",
            "brightness",
            "lightness",
            "luminance",
            "color",
            "red",
            "green",
            "blue",
            "alpha",
            "warmth",
            "distance-center",
            "distance-edges",
        ])
        .default_value("hue")
        .takes_value(true)
}

fn arg_direction() -> Arg<'static, 'static> {
    Arg::with_name("direction")
        .long("direction")
        .help("The path along which pixels are sorted.")
        .possible_values(&[
            "row-ltr",
            "row-rtl",
            "column-ttb",
            "column-btt",
            "spiral-inward",
            "spiral-outward",
        ])
        .default_value("row-ltr")
        .takes_value(true)
}

fn arg_perlin() -> Arg<'static, 'static> {
    Arg::with_name("perlin")
        .short("p")
        .long("perlin")
        .help("Ripple the mask boundaries with Perlin noise.")
}

fn arg_seed() -> Arg<'static, 'static> {
    Arg::with_name("seed")
        .long("seed")
        .help("Seed of the Perlin noise.")
        .default_value("0")
        .takes_value(true)
}

fn arg_blend() -> Arg<'static, 'static> {
    Arg::with_name("blend")
        .long("blend")
        .help("Blend sorted pixels with the originals by their mask weight.")
}

fn arg_invert_mask() -> Arg<'static, 'static> {
    Arg::with_name("invert_mask")
        .long("invert-mask")
        .help("Swap foreground and background of the mask.")
}

fn arg_save_mask() -> Arg<'static, 'static> {
    Arg::with_name("save_mask")
        .long("save-mask")
        .help("Only write the prepared detection mask instead of sorting.")
        .long_help(
            "Only write the prepared detection mask instead of sorting.\n\
             \n\
             The mask is saved as `<stem>_mask.png`, white where --what-to-sort would sort.",
        )
}
