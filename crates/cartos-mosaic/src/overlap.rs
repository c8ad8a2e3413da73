//! Image overlap enumeration
//!
//! An [`OverlapSet`] partitions the ground covered by a set of footprints
//! into [`ImageOverlap`]s: pieces of ground together with the serial
//! numbers of every image that covers them. Each footprint starts as its
//! own overlap; whenever two overlaps intersect, the intersection becomes
//! a new overlap carrying both sets of serial numbers and is cut out of
//! the originals.
//!
//! # Overlap list format
//!
//! ```text
//! 2
//! MRO/CTX/0001
//! MRO/CTX/0002
//! MULTIPOLYGON (((5 5, 10 5, 10 10, 5 10, 5 5)))
//!
//! 1
//! MRO/CTX/0001
//! MULTIPOLYGON (((0 0, 10 0, 10 5, 5 5, 5 10, 0 10, 0 0)))
//! ```

use crate::error::{MosaicError, MosaicResult};
use crate::options::OverlapOptions;
use cartos_core::{Group, Keyword, RasterView};
use cartos_geom::footprint::read_footprint;
use cartos_geom::{
    GeometryError, area, despike, difference, equal, from_wkt, intersect, is_valid,
    make_multi_polygon, to_wkt,
};
use geo::{Geometry, MultiPolygon};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Overlaps and intersections at or below this area are ignored.
const MIN_OVERLAP_AREA: f64 = 1.0e-14;

/// Polygons produced by a split below this area are treated as empty.
const MIN_SPLIT_AREA: f64 = 1.0e-10;

/// A piece of ground and the images that cover it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOverlap {
    serial_numbers: Vec<String>,
    polygon: MultiPolygon<f64>,
}

impl ImageOverlap {
    pub fn new(serial_number: impl Into<String>, polygon: MultiPolygon<f64>) -> Self {
        Self {
            serial_numbers: vec![serial_number.into()],
            polygon,
        }
    }

    fn empty() -> Self {
        Self {
            serial_numbers: Vec::new(),
            polygon: MultiPolygon::new(vec![]),
        }
    }

    /// Ground polygon in `(lon, lat)`.
    pub fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    pub fn serial_numbers(&self) -> &[String] {
        &self.serial_numbers
    }

    /// Number of images covering this piece.
    pub fn len(&self) -> usize {
        self.serial_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serial_numbers.is_empty()
    }

    pub fn area(&self) -> f64 {
        area(&self.polygon)
    }

    /// Add a serial number unless it is already present.
    pub fn add(&mut self, serial_number: impl Into<String>) {
        let sn = serial_number.into();
        if !self.has_serial_number(&sn) {
            self.serial_numbers.push(sn);
        }
    }

    pub fn has_serial_number(&self, serial_number: &str) -> bool {
        self.serial_numbers.iter().any(|s| s == serial_number)
    }

    /// True when the two overlaps share at least one image.
    pub fn has_any_same_serial_number(&self, other: &ImageOverlap) -> bool {
        self.serial_numbers
            .iter()
            .any(|s| other.has_serial_number(s))
    }

    fn write(&self, out: &mut String) {
        out.push_str(&format!("{}\n", self.serial_numbers.len()));
        for sn in &self.serial_numbers {
            out.push_str(sn);
            out.push('\n');
        }
        out.push_str(&to_wkt(&self.polygon));
        out.push('\n');
    }
}

/// A pair comparison that failed during enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapError {
    /// Serial numbers of each overlap involved
    pub serial_numbers: Vec<Vec<String>>,
    /// WKT of each overlap involved
    pub polygons: Vec<String>,
    /// What was being attempted and what was done about it
    pub description: String,
    /// The underlying error
    pub message: String,
}

impl OverlapError {
    /// The record as an `ImageOverlapError` group.
    pub fn to_group(&self) -> Group {
        let mut group = Group::new("ImageOverlapError");
        for (sns, polygon) in self.serial_numbers.iter().zip(&self.polygons) {
            let mut sub = Group::new("Overlap");
            sub.set(Keyword::with_values(
                "PolySerialNumbers",
                sns.iter().map(|s| s.as_str().into()).collect(),
            ));
            sub.set(Keyword::new("Polygon", polygon.as_str()));
            group.add_group(sub);
        }
        if !self.message.is_empty() {
            group.set(Keyword::new("Error", self.message.as_str()));
        }
        if !self.description.is_empty() {
            group.set(Keyword::new("Description", self.description.as_str()));
        }
        group
    }
}

/// Overlaps of a set of footprints.
#[derive(Debug, Clone, Default)]
pub struct OverlapSet {
    options: OverlapOptions,
    overlaps: Vec<ImageOverlap>,
    errors: Vec<OverlapError>,
}

impl OverlapSet {
    pub fn new(options: OverlapOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.overlaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageOverlap> {
        self.overlaps.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageOverlap> {
        self.overlaps.iter()
    }

    /// Pair comparisons that failed and were skipped.
    pub fn errors(&self) -> &[OverlapError] {
        &self.errors
    }

    /// Every overlap the image contributes to.
    pub fn overlaps_for(&self, serial_number: &str) -> Vec<&ImageOverlap> {
        self.overlaps
            .iter()
            .filter(|o| o.has_serial_number(serial_number))
            .collect()
    }

    /// Enumerate the overlaps of `(serial number, footprint)` pairs.
    ///
    /// Footprints are despiked first; one that cannot be despiked is used
    /// as is.
    ///
    /// # Errors
    ///
    /// Fails when the set already holds overlaps, or when a pair fails and
    /// [`OverlapOptions::continue_after_error`] is off.
    pub fn find_overlaps<S: Into<String>>(
        &mut self,
        footprints: impl IntoIterator<Item = (S, MultiPolygon<f64>)>,
    ) -> MosaicResult<()> {
        if !self.overlaps.is_empty() {
            return Err(MosaicError::Programmer(
                "Overlaps may not be found for a set which already contains overlaps".to_string(),
            ));
        }
        for (sn, polygon) in footprints {
            let polygon = despike(&polygon).unwrap_or(polygon);
            self.overlaps.push(ImageOverlap::new(sn, polygon));
        }
        self.find_all_overlaps()
    }

    /// Enumerate the overlaps of the footprint blobs of `(serial number,
    /// cube)` pairs.
    ///
    /// A cube whose footprint cannot be read is recorded in
    /// [`errors`](Self::errors) and skipped.
    ///
    /// # Errors
    ///
    /// Fails for a footprint that is not a valid multipolygon, or as
    /// [`find_overlaps`](Self::find_overlaps) does.
    pub fn find_image_overlaps(&mut self, cubes: &[(&str, &dyn RasterView)]) -> MosaicResult<()> {
        let mut footprints = Vec::with_capacity(cubes.len());
        for &(sn, cube) in cubes {
            let footprint = match read_footprint(cube) {
                Ok(f) => make_multi_polygon(&Geometry::MultiPolygon(f)),
                Err(e) => {
                    let description = format!(
                        "Unable to read footprint for serial number [{sn}] filename [{}]",
                        cube.file_name()
                    );
                    self.record(&[], description, &e.to_string())?;
                    continue;
                }
            };
            if !is_valid(&footprint) {
                return Err(MosaicError::Overlap {
                    description: format!("The image [{}] has an invalid footprint", cube.file_name()),
                    message: to_wkt(&footprint),
                });
            }
            footprints.push((sn.to_string(), footprint));
        }
        self.find_overlaps(footprints)
    }

    fn find_all_overlaps(&mut self) -> MosaicResult<()> {
        let mut steps = 0usize;
        let mut outside = 0;
        'outer: while outside + 1 < self.overlaps.len() {
            let mut inside = outside + 1;
            while inside < self.overlaps.len() && outside < self.overlaps.len() {
                if self.options.max_steps.is_some_and(|max| steps >= max) {
                    warn!(steps, "overlap comparison budget exhausted");
                    break 'outer;
                }
                steps += 1;
                inside = match self.compare(outside, inside) {
                    Ok(next) => next,
                    Err(MosaicError::Geometry(e)) => {
                        self.record(&[inside, outside], "Unable to find overlap.".to_string(), &e.to_string())?;
                        inside + 1
                    }
                    Err(e) => return Err(e),
                };
            }
            outside += 1;
        }

        self.overlaps.retain(|o| !o.polygon.0.is_empty());
        info!(
            overlaps = self.overlaps.len(),
            errors = self.errors.len(),
            steps,
            "found image overlaps"
        );
        Ok(())
    }

    /// Compare two overlaps, splitting them where they intersect. Returns
    /// the next `inside` index to compare against `outside`.
    fn compare(&mut self, outside: usize, inside: usize) -> MosaicResult<usize> {
        if self.overlaps[outside].has_any_same_serial_number(&self.overlaps[inside]) {
            return Ok(inside + 1);
        }
        let poly1 = self.overlaps[outside].polygon.clone();
        let poly2 = self.overlaps[inside].polygon.clone();

        if equal(&poly1, &poly2) {
            let merged = self.overlaps.remove(inside);
            for sn in merged.serial_numbers {
                self.overlaps[outside].add(sn);
            }
            return Ok(inside);
        }
        if poly2.0.is_empty() || area(&poly2) < MIN_OVERLAP_AREA {
            self.overlaps.remove(inside);
            return Ok(inside);
        }

        let intersected = match intersect(&poly1, &poly2) {
            Ok(i) => i,
            Err(e) => return self.drop_failed_pair(outside, inside, &e),
        };
        if intersected.0.is_empty() || area(&intersected) < MIN_OVERLAP_AREA {
            return Ok(inside + 1);
        }

        let overlap = match despike(&intersected) {
            Ok(d) => d,
            Err(_) if is_valid(&intersected) => intersected,
            Err(e) => {
                self.record(&[inside, outside], String::new(), &e.to_string())?;
                return Ok(inside + 1);
            }
        };
        if !is_valid(&overlap) {
            self.record(
                &[inside, outside],
                "Intersection produced invalid overlap area".to_string(),
                "",
            )?;
            return Ok(inside + 1);
        }
        if overlap.0.is_empty() || area(&overlap) < MIN_OVERLAP_AREA {
            return Ok(inside + 1);
        }

        if equal(&poly1, &overlap) {
            // outside lies within inside
            let rest = match difference(&poly2, &poly1) {
                Ok(r) => r,
                Err(e) => {
                    self.record(
                        &[inside, outside],
                        "Differencing overlap polygons failed. The first polygon will be removed."
                            .to_string(),
                        &e.to_string(),
                    )?;
                    self.overlaps.remove(outside);
                    return Ok(outside + 1);
                }
            };
            self.set_polygon(rest, inside, None, false);
            self.set_polygon(overlap, outside, Some(inside), false);
            Ok(inside + 1)
        } else if equal(&poly2, &overlap) {
            // inside lies within outside
            let rest = match difference(&poly1, &poly2) {
                Ok(r) => r,
                Err(e) => {
                    self.record(
                        &[inside, outside],
                        "Differencing overlap polygons failed. The second polygon will be removed."
                            .to_string(),
                        &e.to_string(),
                    )?;
                    self.overlaps.remove(inside);
                    return Ok(inside);
                }
            };
            self.set_polygon(rest, outside, None, false);
            self.set_polygon(overlap, inside, Some(outside), false);
            Ok(inside + 1)
        } else {
            let rest = match difference(&poly1, &overlap).or_else(|_| difference(&poly1, &poly2)) {
                Ok(r) => r,
                Err(e) => {
                    self.record(
                        &[inside, outside],
                        "Differencing overlap polygons failed".to_string(),
                        &e.to_string(),
                    )?;
                    return Ok(inside + 1);
                }
            };
            if !self.set_polygon(rest, outside, None, false) {
                self.set_polygon(MultiPolygon::new(vec![]), outside, None, false);
            }
            let before = self.overlaps.len();
            if self.set_polygon(overlap, inside + 1, Some(outside), true)
                && self.overlaps.len() != before
            {
                // The new piece carries only the outside's serial numbers;
                // the inside overlap picks it up when its turn comes
                return Ok(inside + 2);
            }
            Ok(inside + 1)
        }
    }

    /// A failed intersection removes the smaller polygon when the two
    /// differ a lot in size, otherwise both.
    fn drop_failed_pair(
        &mut self,
        outside: usize,
        inside: usize,
        error: &GeometryError,
    ) -> MosaicResult<usize> {
        let outside_area = self.overlaps[outside].area();
        let inside_area = self.overlaps[inside].area();
        let ratio = outside_area.min(inside_area) / outside_area.max(inside_area);
        let mut description = "Intersection of overlaps failed.".to_string();
        if ratio < 0.1 {
            if outside_area > inside_area {
                description.push_str(" The smaller (second) polygon will be removed.");
                self.record(&[inside, outside], description, &error.to_string())?;
                self.overlaps.remove(inside);
                Ok(inside)
            } else {
                description.push_str(" The smaller (first) polygon will be removed.");
                self.record(&[inside, outside], description, &error.to_string())?;
                self.overlaps.remove(outside);
                Ok(outside + 1)
            }
        } else {
            description.push_str(
                " Both polygons will be removed to prevent the possibility of double counted areas.",
            );
            self.record(&[inside, outside], description, &error.to_string())?;
            self.overlaps.remove(inside);
            self.overlaps.remove(outside);
            Ok(outside + 1)
        }
    }

    /// Store a split result at `position`, or insert it there as a new
    /// overlap. Returns false when the polygon is unusable.
    fn set_polygon(
        &mut self,
        polygon: MultiPolygon<f64>,
        position: usize,
        serial_numbers_from: Option<usize>,
        insert: bool,
    ) -> bool {
        let mut multi = make_multi_polygon(&Geometry::MultiPolygon(polygon));
        if !is_valid(&multi) || (!multi.0.is_empty() && area(&multi) < MIN_SPLIT_AREA) {
            multi = MultiPolygon::new(vec![]);
        }
        let position = position.min(self.overlaps.len());
        if !multi.0.is_empty() {
            if let Ok(d) = despike(&multi) {
                multi = d;
            }
        }
        if !is_valid(&multi) || !(multi.0.is_empty() || area(&multi) > MIN_OVERLAP_AREA) {
            return false;
        }

        let serial_numbers = serial_numbers_from
            .and_then(|i| self.overlaps.get(i))
            .map(|o| o.serial_numbers.clone())
            .unwrap_or_default();
        if !insert {
            let Some(target) = self.overlaps.get_mut(position) else {
                return false;
            };
            target.polygon = multi;
            for sn in serial_numbers {
                target.add(sn);
            }
        } else if !multi.0.is_empty() {
            let mut overlap = ImageOverlap::empty();
            overlap.polygon = multi;
            for sn in serial_numbers {
                overlap.add(sn);
            }
            self.overlaps.insert(position, overlap);
        }
        true
    }

    fn record(&mut self, involved: &[usize], description: String, message: &str) -> MosaicResult<()> {
        let mut error = OverlapError {
            serial_numbers: Vec::new(),
            polygons: Vec::new(),
            description,
            message: message.to_string(),
        };
        for overlap in involved.iter().filter_map(|&i| self.overlaps.get(i)) {
            error.serial_numbers.push(overlap.serial_numbers.clone());
            error.polygons.push(to_wkt(&overlap.polygon));
        }
        warn!(
            serial_numbers = ?error.serial_numbers,
            description = %error.description,
            message = %error.message,
            "skipping overlap pair"
        );
        if !self.options.continue_after_error {
            return Err(MosaicError::Overlap {
                description: error.description,
                message: error.message,
            });
        }
        self.errors.push(error);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Overlap list text
    // ------------------------------------------------------------------------

    /// The overlap list text. Empty overlaps are not written.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for overlap in self.overlaps.iter().filter(|o| !o.polygon.0.is_empty()) {
            if !out.is_empty() {
                out.push('\n');
            }
            overlap.write(&mut out);
        }
        out
    }

    pub fn write_to(&self, writer: &mut impl Write) -> MosaicResult<()> {
        writer.write_all(self.to_text().as_bytes())?;
        Ok(())
    }

    /// Write the overlap list to a file.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::Io`] when the file cannot be written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> MosaicResult<()> {
        let mut file = fs::File::create(path.as_ref())?;
        self.write_to(&mut file)?;
        debug!(path = %path.as_ref().display(), overlaps = self.len(), "wrote overlap list");
        Ok(())
    }

    /// Parse overlap list text.
    ///
    /// # Errors
    ///
    /// Returns [`MosaicError::OverlapList`] for malformed text.
    pub fn read_from_str(text: &str) -> MosaicResult<Self> {
        parse_list(text, "<text>")
    }

    pub fn read_from_file(path: impl AsRef<Path>) -> MosaicResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        parse_list(&text, &path.as_ref().display().to_string())
    }
}

impl<'a> IntoIterator for &'a OverlapSet {
    type Item = &'a ImageOverlap;
    type IntoIter = std::slice::Iter<'a, ImageOverlap>;

    fn into_iter(self) -> Self::IntoIter {
        self.overlaps.iter()
    }
}

fn parse_list(text: &str, file: &str) -> MosaicResult<OverlapSet> {
    let invalid = |reason: String| MosaicError::OverlapList {
        file: file.to_string(),
        reason,
    };
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());
    let mut set = OverlapSet::default();
    while let Some((n, count)) = lines.next() {
        let count: usize = count
            .parse()
            .map_err(|_| invalid(format!("line {n}: expected a serial number count")))?;
        let mut overlap = ImageOverlap::empty();
        for _ in 0..count {
            let (_, sn) = lines
                .next()
                .ok_or_else(|| invalid("missing serial number".to_string()))?;
            overlap.add(sn);
        }
        let (n, wkt) = lines
            .next()
            .ok_or_else(|| invalid("missing polygon".to_string()))?;
        overlap.polygon = from_wkt(wkt).map_err(|e| invalid(format!("line {n}: {e}")))?;
        set.overlaps.push(overlap);
    }
    Ok(set)
}
