//! Regression test bookkeeping

use crate::error::{TestError, TestResult};
use crate::{golden_dir, regout_dir};
use cartos_core::{Cube, Label, RasterView};
use std::fs;
use std::path::Path;

/// What golden-file checks do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Overwrite golden files with this run's output
    Generate,
    /// Compare against golden files, creating missing ones
    #[default]
    Compare,
}

impl RegTestMode {
    /// `REGTEST_MODE=generate` selects [`RegTestMode::Generate`]; anything
    /// else compares.
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE") {
            Ok(v) if v.eq_ignore_ascii_case("generate") => Self::Generate,
            _ => Self::Compare,
        }
    }
}

/// State of one `*_reg` test: a running check counter and the failures
/// seen so far. Every comparison bumps the counter, so failure messages
/// and golden file names point at the check that produced them.
pub struct RegParams {
    pub test_name: String,
    pub mode: RegTestMode,
    index: usize,
    failures: Vec<String>,
}

impl RegParams {
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();
        eprintln!("==== {test_name}_reg ({mode:?}) ====");
        Self {
            test_name: test_name.to_string(),
            mode,
            index: 0,
            failures: Vec::new(),
        }
    }

    /// Number of checks run so far.
    pub fn index(&self) -> usize {
        self.index
    }

    fn next(&mut self) -> usize {
        self.index += 1;
        self.index
    }

    fn fail(&mut self, what: impl AsRef<str>) {
        let msg = format!("{}_reg check {}: {}", self.test_name, self.index, what.as_ref());
        eprintln!("{msg}");
        self.failures.push(msg);
    }

    /// Pass when `|expected - actual| <= delta`. NaN never passes.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.next();
        let diff = (expected - actual).abs();
        let ok = diff <= delta;
        if !ok {
            self.fail(format!("expected {expected}, got {actual} (diff {diff}, allowed {delta})"));
        }
        ok
    }

    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.next();
        if !condition {
            self.fail(what);
        }
        condition
    }

    pub fn compare_strings(&mut self, expected: &[u8], actual: &[u8]) -> bool {
        self.next();
        let ok = expected == actual;
        if !ok {
            self.fail(format!(
                "byte strings differ: \"{}\" vs \"{}\"",
                String::from_utf8_lossy(expected),
                String::from_utf8_lossy(actual)
            ));
        }
        ok
    }

    /// Same dimensions and the same bits in every sample, so special pixel
    /// markers only match themselves.
    pub fn compare_cubes(&mut self, expected: &Cube, actual: &Cube) -> bool {
        self.next();
        let shape = |c: &Cube| (c.samples(), c.lines(), c.bands());
        if shape(expected) != shape(actual) {
            self.fail(format!(
                "cube shapes differ: {:?} vs {:?}",
                shape(expected),
                shape(actual)
            ));
            return false;
        }
        let first_diff = expected
            .data()
            .iter()
            .zip(actual.data())
            .position(|(a, b)| a.to_bits() != b.to_bits());
        match first_diff {
            None => true,
            Some(i) => {
                let (s, l, _) = shape(expected);
                let (band, rest) = (i / (s * l) + 1, i % (s * l));
                let (line, sample) = (rest / s + 1, rest % s + 1);
                self.fail(format!(
                    "cubes differ at sample {sample}, line {line}, band {band}: {} vs {}",
                    expected.data()[i],
                    actual.data()[i]
                ));
                false
            }
        }
    }

    /// Compare two labels through their text form and report the first
    /// differing line.
    pub fn compare_labels(&mut self, expected: &Label, actual: &Label) -> bool {
        self.next();
        let (a, b) = (expected.write_to_string(), actual.write_to_string());
        if a == b {
            return true;
        }
        let line = a
            .lines()
            .zip(b.lines())
            .position(|(x, y)| x != y)
            .unwrap_or_else(|| a.lines().count().min(b.lines().count()));
        self.fail(format!(
            "labels differ at line {}: [{}] vs [{}]",
            line + 1,
            a.lines().nth(line).unwrap_or("").trim(),
            b.lines().nth(line).unwrap_or("").trim()
        ));
        false
    }

    /// Write `text` to the regression output directory and check it against
    /// the golden copy `<test>_golden.<index>.<ext>`.
    ///
    /// A missing golden file is created from this run. In
    /// [`RegTestMode::Generate`] the golden file is always replaced.
    pub fn write_text_and_check(&mut self, text: &str, ext: &str) -> TestResult<bool> {
        let index = self.next();
        let local = Path::new(&regout_dir()).join(format!("{}.{index:02}.{ext}", self.test_name));
        let golden =
            Path::new(&golden_dir()).join(format!("{}_golden.{index:02}.{ext}", self.test_name));
        write_file(&local, text)?;

        if self.mode == RegTestMode::Generate || !golden.exists() {
            write_file(&golden, text)?;
            eprintln!("wrote golden file {}", golden.display());
            return Ok(true);
        }
        let expected = fs::read_to_string(&golden)?;
        let ok = expected == text;
        if !ok {
            self.fail(format!("{} differs from {}", local.display(), golden.display()));
        }
        Ok(ok)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Print the summary. Returns true when every check passed.
    pub fn cleanup(self) -> bool {
        if self.failures.is_empty() {
            eprintln!("{}_reg: {} checks passed", self.test_name, self.index);
            return true;
        }
        eprintln!(
            "{}_reg: {} of {} checks failed",
            self.test_name,
            self.failures.len(),
            self.index
        );
        for failure in &self.failures {
            eprintln!("  {failure}");
        }
        false
    }
}

fn write_file(path: &Path, text: &str) -> TestResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| TestError::Write {
            path: dir.display().to_string(),
            source,
        })?;
    }
    fs::write(path, text).map_err(|source| TestError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartos_core::pixel::NULL;
    use cartos_core::{Group, Keyword};

    #[test]
    fn test_compare_values_within_delta() {
        let mut rp = RegParams::new("params_values");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.compare_values(1.0, f64::NAN, 10.0));
        assert_eq!(rp.failures().len(), 2);
        assert_eq!(rp.index(), 3);
    }

    #[test]
    fn test_compare_cubes_null_equal() {
        let mut rp = RegParams::new("params_cubes");
        let a = Cube::new_with_value(2, 2, 1, NULL).unwrap();
        assert!(rp.compare_cubes(&a, &a.clone()));
        let mut c = a.clone();
        c.write(2, 1, 1, 3.0).unwrap();
        assert!(!rp.compare_cubes(&a, &c));
        assert!(rp.failures()[0].contains("sample 2, line 1, band 1"));
    }

    #[test]
    fn test_compare_labels_reports_line() {
        let mut rp = RegParams::new("params_labels");
        let mut g = Group::new("Mapping");
        g.set(Keyword::new("CenterLongitude", 0.0));
        let a = Label::from(g.clone());
        g.set(Keyword::new("CenterLongitude", 90.0));
        let b = Label::from(g);
        assert!(rp.compare_labels(&a, &a.clone()));
        assert!(!rp.compare_labels(&a, &b));
        assert!(rp.failures()[0].contains("CenterLongitude"));
    }
}
