//! Mosaic placement
//!
//! [`Mosaic::place`] writes an input raster into a mosaic raster at a
//! sample/line/band offset, resolving every output pixel with the
//! configured [`Priority`].
//!
//! # Mosaic band layout
//!
//! ```text
//! bands 1..=n          values
//! bands n+1..=2n       counts        (AverageImageWithMosaic only)
//! last band            origin        (tracking only)
//! ```
//!
//! A mosaic tracks origins when its label carries a `Table` object named
//! `InputImages`. Each placed image gets a row in that table; its origin
//! value is the row index plus the tracking offset of the mosaic's pixel
//! type, so an origin DN can be turned back into a file name with
//! [`Mosaic::origin_of`].

use crate::error::{MosaicError, MosaicResult};
use crate::options::{BandCriteria, BandSelector, MosaicOptions, Priority};
use crate::serial;
use cartos_core::pixel::{is_high, is_low, is_null, is_special, is_valid};
use cartos_core::{Cube, Group, GroupKind, Keyword, Label, PixelType, RasterView, Value};
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "InputImages";
const NOT_AVAILABLE: &str = "NA";
const TRACKING: &str = "TRACKING";

/// Overlay engine for one set of [`MosaicOptions`].
#[derive(Debug, Clone, Default)]
pub struct Mosaic {
    options: MosaicOptions,
}

/// Region of the input that was placed and where it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub input_sample: usize,
    pub input_line: usize,
    pub input_band: usize,
    pub output_sample: usize,
    pub output_line: usize,
    pub output_band: usize,
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
    /// Origin value written to the tracking band
    pub origin: Option<i64>,
}

/// One row of a mosaic's `InputImages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputImage {
    pub file_name: String,
    pub serial_number: String,
    pub start_sample: i64,
    pub start_line: i64,
    pub samples: usize,
    pub lines: usize,
    pub bands: usize,
}

impl InputImage {
    fn to_group(&self) -> Group {
        let mut g = Group::new("Record");
        g.set(Keyword::new("FileName", self.file_name.as_str()));
        g.set(Keyword::new("SerialNumber", self.serial_number.as_str()));
        g.set(Keyword::new("StartSample", self.start_sample));
        g.set(Keyword::new("StartLine", self.start_line));
        g.set(Keyword::new("Samples", self.samples));
        g.set(Keyword::new("Lines", self.lines));
        g.set(Keyword::new("Bands", self.bands));
        g
    }

    fn from_group(g: &Group) -> MosaicResult<Self> {
        let count = |name: &str| -> MosaicResult<usize> {
            usize::try_from(g.i64(name)?).map_err(|_| {
                MosaicError::Tracking(format!("Invalid [{name}] in the {TABLE_NAME} table"))
            })
        };
        Ok(Self {
            file_name: g.text("FileName")?,
            serial_number: g.text("SerialNumber")?,
            start_sample: g.i64("StartSample")?,
            start_line: g.i64("StartLine")?,
            samples: count("Samples")?,
            lines: count("Lines")?,
            bands: count("Bands")?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    in_sample: usize,
    in_line: usize,
    in_band: usize,
    out_sample: usize,
    out_line: usize,
    out_band: usize,
    samples: usize,
    lines: usize,
    bands: usize,
}

/// Clip one axis. Returns `(input start, output start, length)`.
fn clip_axis(offset: i64, input_len: usize, output_len: usize) -> Option<(usize, usize, usize)> {
    let mut in_start = 1i64;
    let mut len = input_len as i64;
    let mut out_start = offset;
    if out_start < 1 {
        in_start += 1 - out_start;
        len -= 1 - out_start;
        out_start = 1;
    }
    if out_start + len - 1 > output_len as i64 {
        len = output_len as i64 - out_start + 1;
    }
    (len >= 1).then_some((in_start as usize, out_start as usize, len as usize))
}

fn input_table(label: &Label) -> Option<&Group> {
    label.root().groups().iter().find(|g| is_input_table(g))
}

fn input_table_mut(label: &mut Label) -> Option<&mut Group> {
    label.root_mut().groups_mut().iter_mut().find(|g| is_input_table(g))
}

fn is_input_table(g: &Group) -> bool {
    g.kind() == GroupKind::Object
        && g.is_named("Table")
        && g.find_keyword("Name").is_some_and(|k| k.text() == TABLE_NAME)
}

fn new_input_table() -> Group {
    let mut table = Group::object("Table");
    table.set(Keyword::new("Name", TABLE_NAME));
    table
}

/// Value of a `BandBin` keyword for one band of a raster with `bands`
/// bands. Keywords with one value per band are indexed; others apply to
/// every band.
fn band_value(keyword: &Keyword, band: usize, bands: usize) -> String {
    if keyword.len() == bands {
        keyword.text_at(band - 1)
    } else {
        keyword.text()
    }
}

fn rebuild(keyword: &Keyword, values: Vec<String>) -> Keyword {
    let k = Keyword::with_values(keyword.name(), values.into_iter().map(Value::from).collect());
    match keyword.unit() {
        Some(unit) => k.with_unit(unit),
        None => k,
    }
}

/// Band of a raster picked by `selector`, 1-based.
fn select_band(label: &Label, bands: usize, selector: &BandSelector) -> Option<usize> {
    let band_bin = label.find_group("BandBin");
    let band = match selector {
        BandSelector::Number(n) => match band_bin.and_then(|g| g.find_keyword("OriginalBand")) {
            Some(k) => k
                .values()
                .iter()
                .position(|v| v.as_i64() == Some(*n as i64))
                .map(|i| i + 1),
            None => Some(*n),
        },
        BandSelector::Keyword { name, value } => band_bin?
            .find_keyword(name)?
            .values()
            .iter()
            .position(|v| v.to_string().trim().eq_ignore_ascii_case(value.trim()))
            .map(|i| i + 1),
    };
    band.filter(|&b| b >= 1 && b <= bands)
}

impl Mosaic {
    pub fn new(options: MosaicOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MosaicOptions {
        &self.options
    }

    /// Create an all-Null mosaic with `bands` value bands, laid out for the
    /// configured priority and tracking.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Core`] for a zero dimension.
    pub fn create(
        &self,
        samples: usize,
        lines: usize,
        bands: usize,
        pixel_type: PixelType,
    ) -> MosaicResult<Cube> {
        let mut total = bands;
        if self.options.priority == Priority::AverageImageWithMosaic {
            total *= 2;
        }
        if self.options.track {
            total += 1;
        }
        let mut cube = Cube::new(samples, lines, total)?.with_pixel_type(pixel_type);
        if self.options.track {
            cube.label_mut().add_group(new_input_table());
        }
        debug!(samples, lines, bands = total, %pixel_type, "created mosaic");
        Ok(cube)
    }

    /// True when the mosaic carries an origin band.
    pub fn is_tracking(mosaic: &dyn RasterView) -> bool {
        input_table(mosaic.label()).is_some()
    }

    /// Rows of the mosaic's `InputImages` table, in origin order.
    pub fn input_images(mosaic: &dyn RasterView) -> MosaicResult<Vec<InputImage>> {
        match input_table(mosaic.label()) {
            Some(table) => table.groups().iter().map(InputImage::from_group).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// The input image an origin-band value refers to.
    pub fn origin_of(mosaic: &dyn RasterView, origin: f64) -> MosaicResult<Option<InputImage>> {
        if !is_valid(origin) {
            return Ok(None);
        }
        let index = origin as i64 - mosaic.pixel_type().tracking_offset();
        let images = Self::input_images(mosaic)?;
        Ok(usize::try_from(index).ok().and_then(|i| images.get(i).cloned()))
    }

    fn value_bands(&self, mosaic: &dyn RasterView, tracking: bool) -> usize {
        let bands = mosaic.bands() - usize::from(tracking);
        if self.options.priority == Priority::AverageImageWithMosaic {
            bands / 2
        } else {
            bands
        }
    }

    /// Whether an input pixel may replace a mosaic pixel.
    fn placeable(&self, value: f64) -> bool {
        is_valid(value)
            || (self.options.null && is_null(value))
            || (self.options.high_saturation && is_high(value))
            || (self.options.low_saturation && is_low(value))
    }

    fn tracking_allowed(&self, bands: usize) -> bool {
        match self.options.priority {
            Priority::UseBandPlacementCriteria => true,
            Priority::PlaceImagesOnTop | Priority::PlaceImagesBeneath if bands == 1 => true,
            Priority::PlaceImagesOnTop => {
                self.options.high_saturation && self.options.low_saturation && self.options.null
            }
            _ => false,
        }
    }

    /// Place `input` into `mosaic` with its first pixel at `(sample, line,
    /// band)` of the mosaic. Offsets below 1 crop the input.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::NoOverlap`] when nothing of the input lands inside
    ///   the mosaic
    /// - [`MosaicError::Tracking`] for band priority without an origin band,
    ///   or when the origin band cannot hold another image
    /// - [`MosaicError::BandBin`] when `BandBin` groups must match and do not
    /// - [`MosaicError::BandSelection`] when the priority band does not exist
    pub fn place(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        sample: i64,
        line: i64,
        band: i64,
    ) -> MosaicResult<Placement> {
        let has_origin_band = Self::is_tracking(mosaic);
        let value_bands = self.value_bands(mosaic, has_origin_band);

        let (Some(s), Some(l), Some(b)) = (
            clip_axis(sample, input.samples(), mosaic.samples()),
            clip_axis(line, input.lines(), mosaic.lines()),
            clip_axis(band, input.bands(), value_bands),
        ) else {
            return Err(MosaicError::NoOverlap);
        };
        let window = Window {
            in_sample: s.0,
            out_sample: s.1,
            samples: s.2,
            in_line: l.0,
            out_line: l.1,
            lines: l.2,
            in_band: b.0,
            out_band: b.1,
            bands: b.2,
        };
        debug!(?window, "clipped input to mosaic");

        if self.options.priority == Priority::UseBandPlacementCriteria && !has_origin_band {
            return Err(MosaicError::Tracking(
                "Band cannot be a priority if Track Origin is not set".to_string(),
            ));
        }

        self.reconcile_band_bin(input, mosaic, &window, value_bands, has_origin_band)?;

        let track = has_origin_band && self.tracking_allowed(window.bands);
        if has_origin_band && !track {
            warn!(
                priority = %self.options.priority,
                bands = window.bands,
                "origin tracking is not supported for this placement, origin band left unchanged"
            );
        }
        let origin = if track {
            Some(self.register(input, mosaic, &window)?)
        } else {
            None
        };
        let origin_band = mosaic.bands();

        match self.options.priority {
            Priority::PlaceImagesOnTop | Priority::PlaceImagesBeneath => {
                self.overlay(input, mosaic, &window, origin.map(|o| (origin_band, o)))?;
            }
            Priority::UseBandPlacementCriteria => {
                let origin = origin.ok_or_else(|| {
                    MosaicError::Programmer("band priority placement without an origin".to_string())
                })?;
                self.band_placement(input, mosaic, &window, origin_band, origin)?;
            }
            Priority::AverageImageWithMosaic => {
                self.average(input, mosaic, &window, value_bands)?;
            }
        }

        info!(
            file = input.file_name(),
            priority = %self.options.priority,
            sample = window.out_sample,
            line = window.out_line,
            band = window.out_band,
            samples = window.samples,
            lines = window.lines,
            bands = window.bands,
            "placed image into mosaic"
        );
        Ok(Placement {
            input_sample: window.in_sample,
            input_line: window.in_line,
            input_band: window.in_band,
            output_sample: window.out_sample,
            output_line: window.out_line,
            output_band: window.out_band,
            samples: window.samples,
            lines: window.lines,
            bands: window.bands,
            origin,
        })
    }

    /// Record the input in the `InputImages` table and return its origin
    /// value. An image placed again keeps its first row.
    fn register(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        window: &Window,
    ) -> MosaicResult<i64> {
        let pixel_type = mosaic.pixel_type();
        let file_name = input.file_name().to_string();
        let record = InputImage {
            serial_number: serial::compose(input.label(), &file_name),
            file_name,
            start_sample: window.out_sample as i64 - window.in_sample as i64 + 1,
            start_line: window.out_line as i64 - window.in_line as i64 + 1,
            samples: input.samples(),
            lines: input.lines(),
            bands: input.bands(),
        };
        let table = input_table_mut(mosaic.label_mut())
            .ok_or_else(|| MosaicError::Programmer(format!("missing {TABLE_NAME} table")))?;
        let rows = table.groups_mut();
        let existing = rows.iter().position(|r| {
            r.find_keyword("FileName")
                .is_some_and(|k| k.text() == record.file_name)
        });
        let index = match existing {
            Some(i) => i,
            None => {
                if rows.len() as i64 > pixel_type.tracking_capacity() {
                    return Err(MosaicError::Tracking(
                        "The number of images in the Mosaic exceeds the pixel size".to_string(),
                    ));
                }
                rows.push(record.to_group());
                rows.len() - 1
            }
        };
        Ok(pixel_type.tracking_offset() + index as i64)
    }

    fn overlay(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        w: &Window,
        origin: Option<(usize, i64)>,
    ) -> MosaicResult<()> {
        let on_top = self.options.priority == Priority::PlaceImagesOnTop;
        for j in 0..w.lines {
            let (il, ol) = ((w.in_line + j) as i64, w.out_line + j);
            for i in 0..w.samples {
                let (is, os) = ((w.in_sample + i) as i64, w.out_sample + i);
                let mut written = false;
                for k in 0..w.bands {
                    let value = input.read(is, il, w.in_band + k);
                    let ob = w.out_band + k;
                    let current = mosaic.read(os as i64, ol as i64, ob);
                    let write = if on_top {
                        self.placeable(value) || (is_null(current) && !is_null(value))
                    } else {
                        is_null(current) && !is_null(value)
                    };
                    if write {
                        mosaic.write(os, ol, ob, value)?;
                        written = true;
                    }
                }
                if let (true, Some((band, dn))) = (written, origin) {
                    mosaic.write(os, ol, band, dn as f64)?;
                }
            }
        }
        Ok(())
    }

    fn band_placement(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        w: &Window,
        origin_band: usize,
        origin: i64,
    ) -> MosaicResult<()> {
        let selector = &self.options.band;
        let input_band = select_band(input.label(), input.bands(), selector)
            .ok_or_else(|| MosaicError::BandSelection(selector.to_string()))?;
        let mosaic_band = select_band(mosaic.label(), origin_band - 1, selector)
            .or_else(|| {
                (input_band >= w.in_band && input_band < w.in_band + w.bands)
                    .then(|| input_band - w.in_band + w.out_band)
            })
            .ok_or_else(|| MosaicError::BandSelection(selector.to_string()))?;
        let origin_dn = origin as f64;

        for j in 0..w.lines {
            let (il, ol) = ((w.in_line + j) as i64, w.out_line + j);
            for i in 0..w.samples {
                let (is, os) = ((w.in_sample + i) as i64, w.out_sample + i);
                let value = input.read(is, il, input_band);
                let current = mosaic.read(os as i64, ol as i64, mosaic_band);
                let owner = mosaic.read(os as i64, ol as i64, origin_band);
                let claim = self.placeable(value)
                    && (is_null(owner)
                        || is_special(current)
                        || is_special(value)
                        || match self.options.criteria {
                            BandCriteria::Greater => value > current,
                            BandCriteria::Lesser => value < current,
                        });
                if !claim && owner != origin_dn {
                    continue;
                }
                mosaic.write(os, ol, origin_band, origin_dn)?;
                for k in 0..w.bands {
                    let v = input.read(is, il, w.in_band + k);
                    mosaic.write(os, ol, w.out_band + k, v)?;
                }
            }
        }
        Ok(())
    }

    fn average(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        w: &Window,
        value_bands: usize,
    ) -> MosaicResult<()> {
        for k in 0..w.bands {
            let (ib, ob) = (w.in_band + k, w.out_band + k);
            let count_band = value_bands + ob;
            for j in 0..w.lines {
                let (il, ol) = ((w.in_line + j) as i64, w.out_line + j);
                for i in 0..w.samples {
                    let (is, os) = ((w.in_sample + i) as i64, w.out_sample + i);
                    let value = input.read(is, il, ib);
                    if !is_valid(value) {
                        continue;
                    }
                    let current = mosaic.read(os as i64, ol as i64, ob);
                    if is_valid(current) {
                        let count = mosaic.read(os as i64, ol as i64, count_band);
                        let n = if is_valid(count) && count > 0.0 { count } else { 1.0 };
                        mosaic.write(os, ol, ob, (current * n + value) / (n + 1.0))?;
                        mosaic.write(os, ol, count_band, n + 1.0)?;
                    } else {
                        mosaic.write(os, ol, ob, value)?;
                        mosaic.write(os, ol, count_band, 1.0)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // BandBin
    // ------------------------------------------------------------------------

    fn reconcile_band_bin(
        &self,
        input: &dyn RasterView,
        mosaic: &mut dyn RasterView,
        w: &Window,
        value_bands: usize,
        tracking: bool,
    ) -> MosaicResult<()> {
        let input_bin = input.label().find_group("BandBin").cloned();
        let mosaic_has_bin = mosaic.label().find_group("BandBin").is_some();
        match (input_bin, mosaic_has_bin) {
            (None, _) if self.options.match_band_bin => Err(MosaicError::BandBin(
                "Match BandBin cannot be True when the image does not have the BandBin group"
                    .to_string(),
            )),
            (Some(bin), true) if self.options.match_band_bin => {
                self.match_band_bin(&bin, input.bands(), mosaic.label_mut(), w, value_bands)
            }
            (Some(bin), false) => {
                let group = band_bin_for_mosaic(&bin, input.bands(), w, value_bands, tracking);
                mosaic.label_mut().set_group(group);
                Ok(())
            }
            (None, false) if tracking => {
                let mut values = vec![NOT_AVAILABLE.to_string(); value_bands];
                values.push(TRACKING.to_string());
                let mut group = Group::new("BandBin");
                group.set(Keyword::with_values(
                    "FilterName",
                    values.into_iter().map(Value::from).collect(),
                ));
                mosaic.label_mut().set_group(group);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Fill `NA` entries of the mosaic's `BandBin` from the input and fail on
    /// any entry that disagrees.
    fn match_band_bin(
        &self,
        input_bin: &Group,
        input_bands: usize,
        mosaic_label: &mut Label,
        w: &Window,
        value_bands: usize,
    ) -> MosaicResult<()> {
        let mosaic_bin = mosaic_label.group_mut("BandBin")?;
        let mut updated = Vec::new();
        for keyword in input_bin.keywords() {
            let existing = mosaic_bin.find_keyword(keyword.name());
            if keyword.len() != input_bands {
                if let Some(m) = existing {
                    if m.len() == 1 && !m.text().eq_ignore_ascii_case(&keyword.text()) {
                        return Err(band_bin_mismatch(keyword.name(), &keyword.text(), &m.text()));
                    }
                }
                continue;
            }
            let mut values: Vec<String> = match existing {
                Some(m) => (0..m.len()).map(|i| m.text_at(i)).collect(),
                None => Vec::new(),
            };
            if values.len() < value_bands {
                values.resize(value_bands, NOT_AVAILABLE.to_string());
            }
            for k in 0..w.bands {
                let incoming = band_value(keyword, w.in_band + k, input_bands);
                let slot = &mut values[w.out_band + k - 1];
                if slot.is_empty() || slot.as_str() == NOT_AVAILABLE {
                    *slot = incoming;
                } else if !slot.eq_ignore_ascii_case(&incoming) {
                    return Err(band_bin_mismatch(keyword.name(), &incoming, slot));
                }
            }
            updated.push(rebuild(keyword, values));
        }
        for keyword in updated {
            mosaic_bin.set(keyword);
        }
        Ok(())
    }
}

fn band_bin_mismatch(name: &str, input: &str, mosaic: &str) -> MosaicError {
    MosaicError::BandBin(format!(
        "BandBin keyword [{name}] of the input [{input}] does not match the mosaic [{mosaic}]"
    ))
}

/// `BandBin` for a mosaic that has none: per-band keywords are spread over
/// the mosaic's bands with `NA` where no input lands, plus a `TRACKING`
/// entry for the origin band.
fn band_bin_for_mosaic(
    input_bin: &Group,
    input_bands: usize,
    w: &Window,
    value_bands: usize,
    tracking: bool,
) -> Group {
    let mut group = Group::new("BandBin");
    for keyword in input_bin.keywords() {
        if keyword.len() != input_bands {
            group.set(keyword.clone());
            continue;
        }
        let mut values = vec![NOT_AVAILABLE.to_string(); value_bands];
        for k in 0..w.bands {
            values[w.out_band + k - 1] = band_value(keyword, w.in_band + k, input_bands);
        }
        if tracking {
            values.push(TRACKING.to_string());
        }
        group.set(rebuild(keyword, values));
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::pixel::{HRS, LIS, NULL};

    fn cube(samples: usize, lines: usize, bands: usize, value: f64, name: &str) -> Cube {
        Cube::new_with_value(samples, lines, bands, value)
            .unwrap()
            .with_name(name)
    }

    fn with_filters(mut c: Cube, filters: &[&str]) -> Cube {
        let mut bin = Group::new("BandBin");
        bin.set(Keyword::with_values(
            "FilterName",
            filters.iter().map(|f| Value::from(*f)).collect(),
        ));
        c.put_group(bin);
        c
    }

    #[test]
    fn test_clip_axis() {
        assert_eq!(clip_axis(1, 5, 10), Some((1, 1, 5)));
        assert_eq!(clip_axis(-1, 5, 10), Some((3, 1, 3)));
        assert_eq!(clip_axis(8, 5, 10), Some((1, 8, 3)));
        assert_eq!(clip_axis(11, 5, 10), None);
        assert_eq!(clip_axis(-4, 5, 10), None);
    }

    #[test]
    fn test_create_layout() {
        let options = MosaicOptions {
            priority: Priority::AverageImageWithMosaic,
            ..MosaicOptions::default()
        };
        let m = Mosaic::new(options).create(4, 3, 2, PixelType::Real).unwrap();
        assert_eq!(m.bands(), 4);
        assert!(!Mosaic::is_tracking(&m));
        assert!(m.data().iter().all(|v| is_null(*v)));

        let options = MosaicOptions {
            track: true,
            ..MosaicOptions::default()
        };
        let m = Mosaic::new(options).create(4, 3, 2, PixelType::UnsignedByte).unwrap();
        assert_eq!(m.bands(), 3);
        assert!(Mosaic::is_tracking(&m));
        assert_eq!(m.pixel_type(), PixelType::UnsignedByte);
    }

    #[test]
    fn test_offset_and_crop() {
        let engine = Mosaic::default();
        let mut mosaic = engine.create(5, 5, 1, PixelType::Real).unwrap();
        let input = cube(3, 3, 1, 7.0, "a.cub");
        let p = engine.place(&input, &mut mosaic, -1, 4, 1).unwrap();
        assert_eq!((p.input_sample, p.output_sample, p.samples), (3, 1, 1));
        assert_eq!((p.input_line, p.output_line, p.lines), (1, 4, 2));
        assert_eq!(mosaic.read(1, 4, 1), 7.0);
        assert_eq!(mosaic.read(1, 5, 1), 7.0);
        assert!(is_null(mosaic.read(2, 4, 1)));
        assert!(is_null(mosaic.read(1, 3, 1)));

        let err = engine.place(&input, &mut mosaic, 6, 1, 1).unwrap_err();
        assert!(matches!(err, MosaicError::NoOverlap));
    }

    #[test]
    fn test_on_top_special_pixels() {
        let engine = Mosaic::default();
        let mut mosaic = cube(2, 1, 1, 5.0, "m.cub");
        let input = Cube::from_data(2, 1, 1, vec![LIS, NULL]).unwrap();
        engine.place(&input, &mut mosaic, 1, 1, 1).unwrap();
        assert_eq!(mosaic.data(), &[5.0, 5.0]);

        let engine = Mosaic::new(MosaicOptions {
            low_saturation: true,
            ..MosaicOptions::default()
        });
        engine.place(&input, &mut mosaic, 1, 1, 1).unwrap();
        assert!(is_low(mosaic.read(1, 1, 1)));
        assert_eq!(mosaic.read(2, 1, 1), 5.0);
    }

    #[test]
    fn test_beneath_fills_only_null() {
        let engine = Mosaic::new(MosaicOptions {
            priority: Priority::PlaceImagesBeneath,
            ..MosaicOptions::default()
        });
        let mut mosaic = Cube::from_data(3, 1, 1, vec![NULL, 2.0, HRS]).unwrap();
        let input = cube(3, 1, 1, 9.0, "a.cub");
        engine.place(&input, &mut mosaic, 1, 1, 1).unwrap();
        assert_eq!(mosaic.read(1, 1, 1), 9.0);
        assert_eq!(mosaic.read(2, 1, 1), 2.0);
        assert!(is_high(mosaic.read(3, 1, 1)));
    }

    #[test]
    fn test_tracking_table() {
        let engine = Mosaic::new(MosaicOptions {
            track: true,
            ..MosaicOptions::default()
        });
        let mut mosaic = engine.create(4, 1, 1, PixelType::Real).unwrap();
        let a = cube(2, 1, 1, 1.0, "a.cub");
        let b = cube(2, 1, 1, 2.0, "b.cub");
        let pa = engine.place(&a, &mut mosaic, 1, 1, 1).unwrap();
        let pb = engine.place(&b, &mut mosaic, 2, 1, 1).unwrap();
        assert_eq!(pa.origin, Some(-16_777_215));
        assert_eq!(pb.origin, Some(-16_777_214));
        assert_eq!(engine.place(&a, &mut mosaic, 4, 1, 1).unwrap().origin, pa.origin);

        let owner = Mosaic::origin_of(&mosaic, mosaic.read(2, 1, 2)).unwrap().unwrap();
        assert_eq!(owner.file_name, "b.cub");
        assert_eq!(owner.start_sample, 2);
        assert_eq!(Mosaic::input_images(&mosaic).unwrap().len(), 2);
        assert!(Mosaic::origin_of(&mosaic, NULL).unwrap().is_none());
        let filters = mosaic.label().group("BandBin").unwrap().keyword("FilterName").unwrap();
        assert_eq!(filters.text_at(1), TRACKING);
    }

    #[test]
    fn test_tracking_capacity() {
        let engine = Mosaic::new(MosaicOptions {
            track: true,
            ..MosaicOptions::default()
        });
        let mut mosaic = engine.create(1, 1, 1, PixelType::UnsignedByte).unwrap();
        for i in 0..=254 {
            let input = cube(1, 1, 1, 1.0, &format!("{i}.cub"));
            engine.place(&input, &mut mosaic, 1, 1, 1).unwrap();
        }
        let input = cube(1, 1, 1, 1.0, "overflow.cub");
        let err = engine.place(&input, &mut mosaic, 1, 1, 1).unwrap_err();
        assert!(err.to_string().contains("exceeds the pixel size"));
    }

    #[test]
    fn test_band_priority_requires_tracking() {
        let engine = Mosaic::new(MosaicOptions {
            priority: Priority::UseBandPlacementCriteria,
            ..MosaicOptions::default()
        });
        let mut mosaic = Cube::new(2, 2, 1).unwrap();
        let input = cube(2, 2, 1, 1.0, "a.cub");
        let err = engine.place(&input, &mut mosaic, 1, 1, 1).unwrap_err();
        assert!(err.to_string().contains("Track Origin"));
    }

    #[test]
    fn test_band_selection() {
        let c = with_filters(cube(1, 1, 3, 0.0, "a.cub"), &["RED", "GREEN", "BLUE"]);
        let by_name = BandSelector::Keyword {
            name: "FilterName".to_string(),
            value: "green".to_string(),
        };
        assert_eq!(select_band(c.label(), 3, &by_name), Some(2));
        assert_eq!(select_band(c.label(), 3, &BandSelector::Number(3)), Some(3));
        assert_eq!(select_band(c.label(), 3, &BandSelector::Number(4)), None);

        let mut bin = Group::new("BandBin");
        bin.set(Keyword::with_values("OriginalBand", vec![4.into(), 7.into()]));
        let label = Label::from(bin);
        assert_eq!(select_band(&label, 2, &BandSelector::Number(7)), Some(2));
        assert_eq!(select_band(&label, 2, &BandSelector::Number(1)), None);
    }

    #[test]
    fn test_band_bin_matching() {
        let engine = Mosaic::new(MosaicOptions {
            match_band_bin: true,
            ..MosaicOptions::default()
        });
        let mut mosaic = engine.create(2, 2, 2, PixelType::Real).unwrap();
        let red = with_filters(cube(2, 2, 1, 1.0, "red.cub"), &["RED"]);
        engine.place(&red, &mut mosaic, 1, 1, 1).unwrap();
        let filters = mosaic.label().group("BandBin").unwrap().keyword("FilterName").unwrap();
        assert_eq!((filters.text_at(0), filters.text_at(1)), ("RED".to_string(), "NA".to_string()));

        let blue = with_filters(cube(2, 2, 1, 2.0, "blue.cub"), &["BLUE"]);
        engine.place(&blue, &mut mosaic, 1, 1, 2).unwrap();
        let filters = mosaic.label().group("BandBin").unwrap().keyword("FilterName").unwrap();
        assert_eq!(filters.text_at(1), "BLUE");

        let err = engine.place(&blue, &mut mosaic, 1, 1, 1).unwrap_err();
        assert!(matches!(err, MosaicError::BandBin(_)));
        let bare = cube(2, 2, 1, 1.0, "bare.cub");
        assert!(engine.place(&bare, &mut mosaic, 1, 1, 1).is_err());
    }

    #[test]
    fn test_average_counts() {
        let engine = Mosaic::new(MosaicOptions {
            priority: Priority::AverageImageWithMosaic,
            ..MosaicOptions::default()
        });
        let mut mosaic = engine.create(2, 1, 1, PixelType::Real).unwrap();
        engine.place(&cube(2, 1, 1, 2.0, "a.cub"), &mut mosaic, 1, 1, 1).unwrap();
        engine.place(&cube(1, 1, 1, 4.0, "b.cub"), &mut mosaic, 1, 1, 1).unwrap();
        engine.place(&cube(1, 1, 1, 9.0, "c.cub"), &mut mosaic, 1, 1, 1).unwrap();
        engine.place(&Cube::new(2, 1, 1).unwrap(), &mut mosaic, 1, 1, 1).unwrap();
        assert_eq!(mosaic.read(1, 1, 1), 5.0);
        assert_eq!(mosaic.read(1, 1, 2), 3.0);
        assert_eq!(mosaic.read(2, 1, 1), 2.0);
        assert_eq!(mosaic.read(2, 1, 2), 1.0);
    }
}
