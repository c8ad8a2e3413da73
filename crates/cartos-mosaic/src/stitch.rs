//! Push-frame stitching
//!
//! A push-frame observation arrives as one single-band cube per framelet
//! and filter. [`stitch`] stacks the framelets of each filter top to
//! bottom in `FrameletNumber` order, one band per filter, and records
//! where every framelet went in a `Stitch` object:
//!
//! ```text
//! Object = Stitch
//!   OriginalFilters = (RED, BLUE)
//!   GeometricFlip = False
//!   TimeFlip = False
//!   Group = Framelet
//!     FileName = red_1.cub
//!     Band = 1
//!     StartLine = 1
//!     Lines = 16
//!     Samples = 128
//!     PixelType = Real
//!     Group = OriginalLabel
//!       ...
//!     End_Group
//!   End_Group
//! End_Object
//! ```
//!
//! [`unstitch`] reads that object back and restores each framelet cube
//! with its original label.

use crate::error::{MosaicError, MosaicResult};
use crate::options::StitchOptions;
use cartos_core::{Cube, Group, Keyword, Label, PixelType, RasterView, Value};
use tracing::{debug, info};

const STITCH: &str = "Stitch";
const FRAMELET: &str = "Framelet";
const ORIGINAL_LABEL: &str = "OriginalLabel";

struct FrameletInfo<'a> {
    cube: &'a dyn RasterView,
    observation: (String, String),
    number: i64,
    filter: String,
}

fn instrument_text(cube: &dyn RasterView, name: &str) -> MosaicResult<String> {
    cube.label()
        .find_group("Instrument")
        .and_then(|g| g.find_keyword(name))
        .map(|k| k.text())
        .ok_or_else(|| {
            MosaicError::Stitch(format!(
                "The framelet [{}] has no Instrument keyword [{name}]",
                cube.file_name()
            ))
        })
}

fn framelet_info(cube: &dyn RasterView) -> MosaicResult<FrameletInfo<'_>> {
    if cube.bands() != 1 {
        return Err(MosaicError::Stitch(format!(
            "The framelet [{}] has {} bands, framelets must have one",
            cube.file_name(),
            cube.bands()
        )));
    }
    let number = instrument_text(cube, "FrameletNumber")?
        .trim()
        .parse::<i64>()
        .map_err(|_| {
            MosaicError::Stitch(format!(
                "The framelet [{}] has an invalid FrameletNumber",
                cube.file_name()
            ))
        })?;
    let filter = cube
        .label()
        .find_group("BandBin")
        .and_then(|g| g.find_keyword("FilterName"))
        .map(|k| k.text())
        .map_or_else(|| instrument_text(cube, "FilterName"), Ok)?;
    Ok(FrameletInfo {
        cube,
        observation: (
            instrument_text(cube, "ObservationId")?,
            instrument_text(cube, "StartTime")?,
        ),
        number,
        filter,
    })
}

/// The root of a label as a group named `OriginalLabel`.
fn original_label(label: &Label) -> Group {
    let mut group = Group::new(ORIGINAL_LABEL);
    for keyword in label.root().keywords() {
        group.set(keyword.clone());
    }
    for sub in label.root().groups() {
        group.add_group(sub.clone());
    }
    group
}

fn restore_label(group: &Group) -> Label {
    let mut label = Label::new();
    for keyword in group.keywords() {
        label.root_mut().set(keyword.clone());
    }
    for sub in group.groups() {
        label.add_group(sub.clone());
    }
    label
}

fn flag(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Stitch framelets into one cube per observation, in order of each
/// observation's first framelet.
///
/// Framelets are grouped by `Instrument` `ObservationId` and `StartTime`.
/// Filters (from `BandBin` or `Instrument` `FilterName`) become bands in
/// order of first appearance. Bands with fewer framelet lines are padded
/// with Null at the bottom.
///
/// # Errors
///
/// Returns [`MosaicError::Stitch`] for framelets with more than one band,
/// missing instrument keywords, or differing widths within an observation.
pub fn stitch(framelets: &[&dyn RasterView], options: StitchOptions) -> MosaicResult<Vec<Cube>> {
    let mut observations: Vec<((String, String), Vec<FrameletInfo<'_>>)> = Vec::new();
    for &cube in framelets {
        let info = framelet_info(cube)?;
        match observations.iter_mut().find(|(key, _)| *key == info.observation) {
            Some((_, members)) => members.push(info),
            None => observations.push((info.observation.clone(), vec![info])),
        }
    }
    observations
        .into_iter()
        .map(|((id, _), members)| stitch_observation(&id, members, options))
        .collect()
}

fn stitch_observation(
    observation_id: &str,
    members: Vec<FrameletInfo<'_>>,
    options: StitchOptions,
) -> MosaicResult<Cube> {
    let samples = members[0].cube.samples();
    if let Some(odd) = members.iter().find(|f| f.cube.samples() != samples) {
        return Err(MosaicError::Stitch(format!(
            "The framelet [{}] has {} samples, expected {samples}",
            odd.cube.file_name(),
            odd.cube.samples()
        )));
    }

    let mut filters: Vec<String> = Vec::new();
    for f in &members {
        if !filters.contains(&f.filter) {
            filters.push(f.filter.clone());
        }
    }
    let mut bands: Vec<Vec<&FrameletInfo<'_>>> = filters
        .iter()
        .map(|name| members.iter().filter(|f| &f.filter == name).collect())
        .collect();
    for band in &mut bands {
        band.sort_by_key(|f| f.number);
        if options.time_flip {
            band.reverse();
        }
    }
    let lines = bands
        .iter()
        .map(|b| b.iter().map(|f| f.cube.lines()).sum::<usize>())
        .max()
        .unwrap_or(0);

    let pixel_type = members[0].cube.pixel_type();
    let mut out = Cube::new(samples, lines.max(1), filters.len())?
        .with_name(format!("{observation_id}.cub"))
        .with_pixel_type(pixel_type);

    let mut record = Group::object(STITCH);
    record.set(Keyword::with_values(
        "OriginalFilters",
        filters.iter().map(|f| Value::from(f.as_str())).collect(),
    ));
    record.set(Keyword::new("GeometricFlip", flag(options.geometric_flip)));
    record.set(Keyword::new("TimeFlip", flag(options.time_flip)));

    for (b, band) in bands.iter().enumerate() {
        let mut start = 1;
        for f in band {
            let n = f.cube.lines();
            for l in 1..=n {
                let source = if options.geometric_flip { n + 1 - l } else { l };
                for s in 1..=samples {
                    let v = f.cube.read(s as i64, source as i64, 1);
                    out.write(s, start + l - 1, b + 1, v)?;
                }
            }
            let mut entry = Group::new(FRAMELET);
            entry.set(Keyword::new("FileName", f.cube.file_name()));
            entry.set(Keyword::new("Band", b + 1));
            entry.set(Keyword::new("StartLine", start));
            entry.set(Keyword::new("Lines", n));
            entry.set(Keyword::new("Samples", samples));
            entry.set(Keyword::new("PixelType", f.cube.pixel_type().to_string()));
            entry.add_group(original_label(f.cube.label()));
            record.add_group(entry);
            debug!(file = f.cube.file_name(), band = b + 1, start, lines = n, "stitched framelet");
            start += n;
        }
    }

    let label = out.label_mut();
    if let Some(instrument) = members[0].cube.label().find_group("Instrument") {
        let mut instrument = instrument.clone();
        instrument.remove_keyword("FrameletNumber");
        label.add_group(instrument);
    }
    let mut band_bin = Group::new("BandBin");
    band_bin.set(Keyword::with_values(
        "FilterName",
        filters.iter().map(|f| Value::from(f.as_str())).collect(),
    ));
    label.add_group(band_bin);
    label.add_group(record);

    info!(
        observation = observation_id,
        framelets = members.len(),
        filters = filters.len(),
        lines,
        "stitched push-frame observation"
    );
    Ok(out)
}

/// Split a stitched cube back into its framelets, in the order they were
/// stitched.
///
/// # Errors
///
/// Returns [`MosaicError::Stitch`] when the cube has no `Stitch` object or
/// a framelet entry lies outside the cube.
pub fn unstitch(stitched: &dyn RasterView) -> MosaicResult<Vec<Cube>> {
    let record = stitched.label().find_group(STITCH).ok_or_else(|| {
        MosaicError::Stitch(format!(
            "The cube [{}] was not stitched from framelets",
            stitched.file_name()
        ))
    })?;
    let flipped = record
        .find_keyword("GeometricFlip")
        .is_some_and(|k| k.text().eq_ignore_ascii_case("true"));

    let mut framelets = Vec::new();
    for entry in record.groups().iter().filter(|g| g.is_named(FRAMELET)) {
        let count = |name: &str| -> MosaicResult<usize> {
            usize::try_from(entry.i64(name)?)
                .map_err(|_| MosaicError::Stitch(format!("Invalid framelet [{name}]")))
        };
        let (band, start, lines, samples) = (
            count("Band")?,
            count("StartLine")?,
            count("Lines")?,
            count("Samples")?,
        );
        if band == 0
            || band > stitched.bands()
            || start == 0
            || start + lines - 1 > stitched.lines()
            || samples > stitched.samples()
        {
            return Err(MosaicError::Stitch(format!(
                "The framelet [{}] lies outside the stitched cube",
                entry.text("FileName")?
            )));
        }
        let pixel_type: PixelType = entry.text("PixelType")?.parse()?;

        let mut data = Vec::with_capacity(samples * lines);
        for l in 1..=lines {
            let source = if flipped { start + lines - l } else { start + l - 1 };
            for s in 1..=samples {
                data.push(stitched.read(s as i64, source as i64, band));
            }
        }
        let label = entry
            .group(ORIGINAL_LABEL)
            .map(restore_label)
            .unwrap_or_default();
        framelets.push(
            Cube::from_data(samples, lines, 1, data)?
                .with_name(entry.text("FileName")?)
                .with_label(label)
                .with_pixel_type(pixel_type),
        );
    }
    debug!(file = stitched.file_name(), framelets = framelets.len(), "unstitched cube");
    Ok(framelets)
}
