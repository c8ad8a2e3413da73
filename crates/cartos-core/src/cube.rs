//! Banded rasters
//!
//! [`RasterView`] is the random-access read/write interface the warp and
//! mosaic engines work against. [`Cube`] is the in-memory implementation:
//! band-major `f64` samples, a [`Label`], and named binary attachments
//! ([`Blob`]s) such as footprints.
//!
//! Positions are 1-based. Pixel `(1, 1)` is the upper-left pixel; its
//! centre sits at `(1.0, 1.0)` and its edges at `0.5` and `1.5`.

use crate::error::{Error, Result};
use crate::label::{Group, Keyword, Label};
use crate::pixel::{NULL, PixelType};

/// Named binary attachment of a cube.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    /// Blob type, e.g. `Polygon`
    pub kind: String,
    /// Blob name, e.g. `Footprint`
    pub name: String,
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            data,
        }
    }
}

/// Random access to a banded raster.
pub trait RasterView {
    fn samples(&self) -> usize;
    fn lines(&self) -> usize;
    fn bands(&self) -> usize;
    fn pixel_type(&self) -> PixelType;
    fn label(&self) -> &Label;
    fn label_mut(&mut self) -> &mut Label;

    /// Name used in tracking tables and diagnostics.
    fn file_name(&self) -> &str;

    /// Read one sample. Positions outside the raster read as [`NULL`].
    fn read(&self, sample: i64, line: i64, band: usize) -> f64;

    /// Write one sample.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for positions outside the raster.
    fn write(&mut self, sample: usize, line: usize, band: usize, value: f64) -> Result<()>;

    /// Attachment lookup by type and name.
    fn blob(&self, _kind: &str, _name: &str) -> Option<&Blob> {
        None
    }

    /// Store an attachment, replacing one with the same type and name.
    fn put_blob(&mut self, blob: Blob) -> Result<()> {
        Err(Error::Programmer(format!(
            "Raster [{}] cannot store blob [{}]",
            self.file_name(),
            blob.name
        )))
    }

    /// True when `(sample, line, band)` addresses a pixel of this raster.
    fn contains(&self, sample: i64, line: i64, band: usize) -> bool {
        sample >= 1
            && line >= 1
            && band >= 1
            && sample as usize <= self.samples()
            && line as usize <= self.lines()
            && band <= self.bands()
    }

    /// Read a whole line of one band into `buf` (length `samples`).
    fn read_line(&self, line: i64, band: usize, buf: &mut [f64]) {
        for (i, v) in buf.iter_mut().enumerate() {
            *v = self.read(i as i64 + 1, line, band);
        }
    }
}

/// In-memory cube.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    name: String,
    samples: usize,
    lines: usize,
    bands: usize,
    pixel_type: PixelType,
    data: Vec<f64>,
    label: Label,
    blobs: Vec<Blob>,
}

impl Cube {
    /// Create a cube with every sample set to [`NULL`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if any dimension is zero.
    pub fn new(samples: usize, lines: usize, bands: usize) -> Result<Self> {
        Self::new_with_value(samples, lines, bands, NULL)
    }

    /// Create a cube with every sample set to `value`.
    pub fn new_with_value(samples: usize, lines: usize, bands: usize, value: f64) -> Result<Self> {
        if samples == 0 || lines == 0 || bands == 0 {
            return Err(Error::InvalidDimension {
                samples,
                lines,
                bands,
            });
        }
        let len = samples
            .checked_mul(lines)
            .and_then(|n| n.checked_mul(bands))
            .ok_or(Error::InvalidDimension {
                samples,
                lines,
                bands,
            })?;
        Ok(Self {
            name: String::new(),
            samples,
            lines,
            bands,
            pixel_type: PixelType::Real,
            data: vec![value; len],
            label: Label::new(),
            blobs: Vec::new(),
        })
    }

    /// Wrap band-major data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] when `data.len()` does not equal
    /// `samples * lines * bands`.
    pub fn from_data(samples: usize, lines: usize, bands: usize, data: Vec<f64>) -> Result<Self> {
        let mut cube = Self::new_with_value(samples, lines, bands, NULL)?;
        if data.len() != cube.data.len() {
            return Err(Error::InvalidDimension {
                samples,
                lines,
                bands,
            });
        }
        cube.data = data;
        Ok(cube)
    }

    /// Builder: set the file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set the label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = label;
        self
    }

    /// Builder: set the storage type.
    pub fn with_pixel_type(mut self, pixel_type: PixelType) -> Self {
        self.pixel_type = pixel_type;
        self
    }

    /// Band-major sample storage.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Samples of one band, line-major.
    pub fn band_data(&self, band: usize) -> Option<&[f64]> {
        if band == 0 || band > self.bands {
            return None;
        }
        let n = self.samples * self.lines;
        Some(&self.data[(band - 1) * n..band * n])
    }

    /// Set every sample of every band.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Add a group to the label, replacing a same-named one.
    pub fn put_group(&mut self, group: Group) {
        self.label.set_group(group);
    }

    fn index(&self, sample: usize, line: usize, band: usize) -> usize {
        ((band - 1) * self.lines + (line - 1)) * self.samples + (sample - 1)
    }
}

impl RasterView for Cube {
    fn samples(&self) -> usize {
        self.samples
    }

    fn lines(&self) -> usize {
        self.lines
    }

    fn bands(&self) -> usize {
        self.bands
    }

    fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    fn label(&self) -> &Label {
        &self.label
    }

    fn label_mut(&mut self) -> &mut Label {
        &mut self.label
    }

    fn file_name(&self) -> &str {
        &self.name
    }

    fn read(&self, sample: i64, line: i64, band: usize) -> f64 {
        if !self.contains(sample, line, band) {
            return NULL;
        }
        self.data[self.index(sample as usize, line as usize, band)]
    }

    fn write(&mut self, sample: usize, line: usize, band: usize, value: f64) -> Result<()> {
        if !self.contains(sample as i64, line as i64, band) {
            return Err(Error::OutOfBounds { sample, line, band });
        }
        let idx = self.index(sample, line, band);
        self.data[idx] = value;
        Ok(())
    }

    fn blob(&self, kind: &str, name: &str) -> Option<&Blob> {
        self.blobs
            .iter()
            .find(|b| b.kind.eq_ignore_ascii_case(kind) && b.name.eq_ignore_ascii_case(name))
    }

    fn put_blob(&mut self, blob: Blob) -> Result<()> {
        let mut entry = Group::object(blob.kind.clone());
        entry.set(Keyword::new("Name", blob.name.clone()));
        entry.set(Keyword::new("Bytes", blob.data.len()));

        let root = self.label.root_mut();
        let existing = root.groups().iter().position(|g| {
            g.is_named(&blob.kind)
                && g.find_keyword("Name")
                    .is_some_and(|k| k.text().eq_ignore_ascii_case(&blob.name))
        });
        match existing {
            Some(idx) => root.groups_mut()[idx] = entry,
            None => {
                root.add_group(entry);
            }
        }

        match self
            .blobs
            .iter_mut()
            .find(|b| b.kind.eq_ignore_ascii_case(&blob.kind) && b.name.eq_ignore_ascii_case(&blob.name))
        {
            Some(slot) => *slot = blob,
            None => self.blobs.push(blob),
        }
        Ok(())
    }
}
