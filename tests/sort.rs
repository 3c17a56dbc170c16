mod common;

use common::synthetic_image::{disc_mask, gray_row, noise_image, row_values, sorted_pixels};
use glitchsort::{
    sort_pixels, Coordinate, Error, Mask, PerlinOptions, PixelBuffer, PixelSorter, SortKey,
    TraversalPattern, WhatToSort,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn one_by_five_row_sorted_by_brightness() {
    init_logger();
    let image = gray_row(&[40, 10, 40, 30, 10]);
    let sorted = sort_pixels(
        &image,
        SortKey::Brightness,
        TraversalPattern::RowLtr,
        None,
        false,
        WhatToSort::Background,
    )
    .unwrap();
    assert_eq!(row_values(&sorted), vec![10, 10, 30, 40, 40]);
}

#[test]
fn foreground_runs_are_sorted_independently() {
    init_logger();
    let image = gray_row(&[90, 10, 70, 20, 60, 5]);
    let mask = Mask::from_values(6, 1, vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0]).unwrap();
    let sorted = PixelSorter::new(SortKey::Luminance)
        .what_to_sort(WhatToSort::Foreground)
        .threshold(0.5)
        .sort(&image, Some(&mask))
        .unwrap();
    assert_eq!(row_values(&sorted), vec![10, 90, 70, 20, 5, 60]);
}

#[test]
fn spiral_sorts_along_the_ring() {
    init_logger();
    // ring order of a 3x3 image: (0,0) (1,0) (2,0) (2,1) (2,2) (1,2) (0,2) (0,1), center last
    let values = [80, 70, 60, 10, 99, 50, 20, 30, 40];
    let data = values.iter().flat_map(|&v| vec![v, v, v]).collect();
    let image = PixelBuffer::from_raw(3, 3, 3, data).unwrap();
    let sorted = PixelSorter::new(SortKey::Red)
        .pattern(TraversalPattern::SpiralInward)
        .sort(&image, None)
        .unwrap();

    let ring = [(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (1, 2), (0, 2), (0, 1)];
    let along: Vec<u8> = ring
        .iter()
        .map(|&(x, y)| sorted.pixel(Coordinate::new(x, y))[0])
        .collect();
    assert_eq!(along, vec![10, 20, 30, 40, 50, 60, 70, 80]);
    assert_eq!(sorted.pixel(Coordinate::new(1, 1))[0], 99);
}

#[test]
fn sorting_permutes_pixels() {
    init_logger();
    let image = noise_image(37, 23, 4, 5);
    let mask = disc_mask(37, 23, 12.0);
    for pattern in TraversalPattern::ALL.iter() {
        for key in [SortKey::Hue, SortKey::Warmth, SortKey::DistanceEdges, SortKey::Alpha].iter() {
            let sorted = PixelSorter::new(*key)
                .pattern(*pattern)
                .what_to_sort(WhatToSort::Background)
                .perlin(Some(PerlinOptions::with_seed(9)))
                .sort(&image, Some(&mask))
                .unwrap();
            assert_eq!(sorted_pixels(&sorted), sorted_pixels(&image), "{} {}", pattern, key);
        }
    }
}

#[test]
fn sorting_twice_changes_nothing() {
    init_logger();
    let image = noise_image(64, 16, 3, 1);
    for pattern in TraversalPattern::ALL.iter() {
        let sorter = PixelSorter::new(SortKey::Lightness).pattern(*pattern);
        let once = sorter.sort(&image, None).unwrap();
        let twice = sorter.sort(&once, None).unwrap();
        assert_eq!(once, twice, "{}", pattern);
    }
}

#[test]
fn excluded_pixels_are_untouched() {
    init_logger();
    let image = noise_image(48, 48, 3, 2);
    let mask = disc_mask(48, 48, 20.0);
    for &what in [WhatToSort::Foreground, WhatToSort::Background].iter() {
        let sorter = PixelSorter::new(SortKey::Saturation)
            .pattern(TraversalPattern::ColumnBtt)
            .what_to_sort(what)
            .threshold(0.3)
            .blend(true);
        let sorted = sorter.sort(&image, Some(&mask)).unwrap();
        for y in 0..48 {
            for x in 0..48 {
                let at = Coordinate::new(x, y);
                if what.weight(mask.get(at)) <= 0.3 {
                    assert_eq!(sorted.pixel(at), image.pixel(at), "{:?}", at);
                }
            }
        }
    }
}

#[test]
fn identical_inputs_give_identical_outputs() {
    init_logger();
    let image = noise_image(120, 80, 3, 3);
    let mask = disc_mask(120, 80, 45.0);
    let sorter = PixelSorter::new(SortKey::Color)
        .pattern(TraversalPattern::SpiralOutward)
        .what_to_sort(WhatToSort::Foreground)
        .perlin(Some(PerlinOptions::with_seed(1234)));
    let first = sorter.sort(&image, Some(&mask)).unwrap();
    for _ in 0..3 {
        assert_eq!(sorter.sort(&image, Some(&mask)).unwrap().as_raw(), first.as_raw());
    }

    let reseeded = sorter.clone().perlin(Some(PerlinOptions::with_seed(4321)));
    assert_ne!(reseeded.sort(&image, Some(&mask)).unwrap().as_raw(), first.as_raw());
}

#[test]
fn all_ignores_the_mask() {
    init_logger();
    let image = noise_image(20, 5, 3, 4);
    let empty = Mask::filled(20, 5, 0.0);
    let masked = PixelSorter::new(SortKey::Blue)
        .what_to_sort(WhatToSort::All)
        .sort(&image, Some(&empty))
        .unwrap();
    let unmasked = PixelSorter::new(SortKey::Blue).sort(&image, None).unwrap();
    assert_eq!(masked, unmasked);
}

#[test]
fn failed_preconditions_report_the_parameter() {
    init_logger();
    let image = noise_image(4, 4, 3, 6);
    let err = PixelSorter::new(SortKey::Alpha).sort(&image, None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedChannelForKey { channels: 3, .. }));
    assert!(err.to_string().contains("alpha"));

    let small = Mask::filled(4, 3, 1.0);
    let err = PixelSorter::new(SortKey::Hue).sort(&image, Some(&small)).unwrap_err();
    assert_eq!(err.to_string(), "mask is 4x3 but the image is 4x4");

    let noisy = PixelSorter::new(SortKey::Hue).perlin(Some(PerlinOptions {
        amplitude: 2.0,
        ..PerlinOptions::default()
    }));
    assert!(matches!(
        noisy.sort(&image, None),
        Err(Error::InvalidParameterRange { name: "amplitude", .. })
    ));
}

#[test]
fn images_survive_a_save_and_load() {
    init_logger();
    let image = noise_image(9, 7, 4, 8);
    let path = std::env::temp_dir().join(format!("glitchsort-{}.png", std::process::id()));
    glitchsort::io::save(&image, &path).unwrap();
    let loaded = glitchsort::io::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, image);
}
