//! Alpha cube: the mapping between a cropped or scaled cube ("beta") and
//! the original instrument image ("alpha")
//!
//! ```text
//! alpha = slope * (beta - 0.5) + alpha_start
//! slope = (alpha_end - alpha_start) / beta_count
//! ```
//!
//! A cube that was never cropped is its own alpha cube: start `0.5`,
//! end `count + 0.5`.

use crate::error::Result;
use crate::label::{Group, Keyword, Label};

/// Crop/scale bookkeeping recorded in an `AlphaCube` label group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaCube {
    alpha_samples: usize,
    alpha_lines: usize,
    alpha_start_sample: f64,
    alpha_start_line: f64,
    alpha_end_sample: f64,
    alpha_end_line: f64,
    beta_samples: usize,
    beta_lines: usize,
}

impl AlphaCube {
    /// Identity mapping for an uncropped cube.
    pub fn identity(samples: usize, lines: usize) -> Self {
        Self {
            alpha_samples: samples,
            alpha_lines: lines,
            alpha_start_sample: 0.5,
            alpha_start_line: 0.5,
            alpha_end_sample: samples as f64 + 0.5,
            alpha_end_line: lines as f64 + 0.5,
            beta_samples: samples,
            beta_lines: lines,
        }
    }

    /// Mapping for a sub-area of an alpha image.
    ///
    /// `start`/`end` are alpha edge coordinates of the first and last beta
    /// pixel (so a crop of samples 3..=5 uses `2.5` and `5.5`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alpha_samples: usize,
        alpha_lines: usize,
        beta_samples: usize,
        beta_lines: usize,
        alpha_start_sample: f64,
        alpha_start_line: f64,
        alpha_end_sample: f64,
        alpha_end_line: f64,
    ) -> Self {
        Self {
            alpha_samples,
            alpha_lines,
            alpha_start_sample,
            alpha_start_line,
            alpha_end_sample,
            alpha_end_line,
            beta_samples,
            beta_lines,
        }
    }

    /// Read the `AlphaCube` group from a label, or the identity mapping when
    /// the label has none.
    ///
    /// # Errors
    ///
    /// Fails when the group exists but a keyword is missing or not numeric.
    pub fn from_label(label: &Label, samples: usize, lines: usize) -> Result<Self> {
        let Some(g) = label.find_group("AlphaCube") else {
            return Ok(Self::identity(samples, lines));
        };
        Ok(Self {
            alpha_samples: g.i64("AlphaSamples")? as usize,
            alpha_lines: g.i64("AlphaLines")? as usize,
            alpha_start_sample: g.f64("AlphaStartingSample")?,
            alpha_start_line: g.f64("AlphaStartingLine")?,
            alpha_end_sample: g.f64("AlphaEndingSample")?,
            alpha_end_line: g.f64("AlphaEndingLine")?,
            beta_samples: g.i64("BetaSamples")? as usize,
            beta_lines: g.i64("BetaLines")? as usize,
        })
    }

    /// The label group describing this mapping.
    pub fn to_group(&self) -> Group {
        let mut g = Group::new("AlphaCube");
        g.set(Keyword::new("AlphaSamples", self.alpha_samples));
        g.set(Keyword::new("AlphaLines", self.alpha_lines));
        g.set(Keyword::new("AlphaStartingSample", self.alpha_start_sample));
        g.set(Keyword::new("AlphaStartingLine", self.alpha_start_line));
        g.set(Keyword::new("AlphaEndingSample", self.alpha_end_sample));
        g.set(Keyword::new("AlphaEndingLine", self.alpha_end_line));
        g.set(Keyword::new("BetaSamples", self.beta_samples));
        g.set(Keyword::new("BetaLines", self.beta_lines));
        g
    }

    pub fn alpha_samples(&self) -> usize {
        self.alpha_samples
    }

    pub fn alpha_lines(&self) -> usize {
        self.alpha_lines
    }

    pub fn beta_samples(&self) -> usize {
        self.beta_samples
    }

    pub fn beta_lines(&self) -> usize {
        self.beta_lines
    }

    fn sample_slope(&self) -> f64 {
        (self.alpha_end_sample - self.alpha_start_sample) / self.beta_samples as f64
    }

    fn line_slope(&self) -> f64 {
        (self.alpha_end_line - self.alpha_start_line) / self.beta_lines as f64
    }

    pub fn alpha_sample(&self, beta_sample: f64) -> f64 {
        self.sample_slope() * (beta_sample - 0.5) + self.alpha_start_sample
    }

    pub fn alpha_line(&self, beta_line: f64) -> f64 {
        self.line_slope() * (beta_line - 0.5) + self.alpha_start_line
    }

    pub fn beta_sample(&self, alpha_sample: f64) -> f64 {
        (alpha_sample - self.alpha_start_sample) / self.sample_slope() + 0.5
    }

    pub fn beta_line(&self, alpha_line: f64) -> f64 {
        (alpha_line - self.alpha_start_line) / self.line_slope() + 0.5
    }

    /// Compose with a further crop of this beta cube.
    ///
    /// `start`/`end` are edge coordinates in the current beta space; the
    /// result maps the new beta cube straight to the original alpha image.
    pub fn crop(
        &self,
        start_sample: f64,
        start_line: f64,
        end_sample: f64,
        end_line: f64,
        new_samples: usize,
        new_lines: usize,
    ) -> Self {
        Self {
            alpha_samples: self.alpha_samples,
            alpha_lines: self.alpha_lines,
            alpha_start_sample: self.alpha_sample(start_sample),
            alpha_start_line: self.alpha_line(start_line),
            alpha_end_sample: self.alpha_sample(end_sample),
            alpha_end_line: self.alpha_line(end_line),
            beta_samples: new_samples,
            beta_lines: new_lines,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let a = AlphaCube::identity(100, 50);
        assert_eq!(a.alpha_line(1.0), 1.0);
        assert_eq!(a.beta_sample(37.0), 37.0);
    }

    #[test]
    fn test_crop_offset() {
        // Lines 11..=30 of a 100-line image
        let a = AlphaCube::new(10, 100, 10, 20, 0.5, 10.5, 10.5, 30.5);
        assert!((a.alpha_line(1.0) - 11.0).abs() < 1e-12);
        assert!((a.beta_line(11.0) - 1.0).abs() < 1e-12);

        let again = a.crop(0.5, 5.5, 10.5, 10.5, 10, 5);
        assert!((again.alpha_line(1.0) - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_label_group() {
        let a = AlphaCube::new(10, 100, 5, 50, 0.5, 0.5, 10.5, 100.5);
        let label = Label::from(a.to_group());
        let back = AlphaCube::from_label(&label, 1, 1).unwrap();
        assert_eq!(a, back);
        let none = AlphaCube::from_label(&Label::new(), 7, 9).unwrap();
        assert_eq!(none, AlphaCube::identity(7, 9));
    }
}
