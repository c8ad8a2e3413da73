//! Well-known text for polygons
//!
//! Footprint blobs and overlap lists store multipolygons as WKT:
//!
//! ```text
//! MULTIPOLYGON (((0 0, 10 0, 10 10, 0 10, 0 0)), ((20 0, 30 0, 30 5, 20 0)))
//! MULTIPOLYGON EMPTY
//! ```
//!
//! `POLYGON` text is also read and comes back as a one-member
//! multipolygon. Keywords are case-insensitive.

use crate::error::{GeometryError, GeometryResult};
use geo::{Coord, LineString, MultiPolygon, Polygon};

/// Write a multipolygon as `MULTIPOLYGON` text.
///
/// Numbers use the shortest representation that reads back to the same
/// value.
pub fn to_wkt(multi: &MultiPolygon<f64>) -> String {
    if multi.0.is_empty() {
        return "MULTIPOLYGON EMPTY".to_string();
    }
    let mut out = String::from("MULTIPOLYGON (");
    for (i, poly) in multi.0.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        write_ring(&mut out, poly.exterior());
        for hole in poly.interiors() {
            out.push_str(", ");
            write_ring(&mut out, hole);
        }
        out.push(')');
    }
    out.push(')');
    out
}

fn write_ring(out: &mut String, ring: &LineString<f64>) {
    out.push('(');
    for (i, c) in ring.0.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{} {}", c.x, c.y));
    }
    out.push(')');
}

/// Read `MULTIPOLYGON` or `POLYGON` text.
///
/// # Errors
///
/// Returns [`GeometryError::Unsupported`] for other geometry types and
/// [`GeometryError::Wkt`] for malformed text.
pub fn from_wkt(text: &str) -> GeometryResult<MultiPolygon<f64>> {
    let mut parser = Parser { text, pos: 0 };
    let keyword = parser.word()?;
    let multi = match keyword.to_ascii_uppercase().as_str() {
        "MULTIPOLYGON" => {
            if parser.empty()? {
                MultiPolygon::new(vec![])
            } else {
                MultiPolygon::new(parser.list(Parser::polygon)?)
            }
        }
        "POLYGON" => {
            if parser.empty()? {
                MultiPolygon::new(vec![])
            } else {
                MultiPolygon::new(vec![parser.polygon()?])
            }
        }
        _ => return Err(GeometryError::Unsupported { geometry: keyword }),
    };
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing text"));
    }
    Ok(multi)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> GeometryError {
        GeometryError::Wkt {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn word(&mut self) -> GeometryResult<String> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.rest().len());
        if len == 0 {
            return Err(self.error("expected a geometry keyword"));
        }
        let word = self.rest()[..len].to_string();
        self.pos += len;
        Ok(word)
    }

    /// Consumes an `EMPTY` marker if one comes next.
    fn empty(&mut self) -> GeometryResult<bool> {
        self.skip_ws();
        if self.rest().starts_with('(') {
            return Ok(false);
        }
        let word = self.word()?;
        if word.eq_ignore_ascii_case("EMPTY") {
            Ok(true)
        } else {
            Err(self.error("expected '(' or EMPTY"))
        }
    }

    fn expect(&mut self, ch: char) -> GeometryResult<()> {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{ch}'")))
        }
    }

    /// Parses `( item, item, ... )`.
    fn list<T>(&mut self, mut item: impl FnMut(&mut Self) -> GeometryResult<T>) -> GeometryResult<Vec<T>> {
        self.expect('(')?;
        let mut items = vec![item(self)?];
        loop {
            self.skip_ws();
            if self.rest().starts_with(',') {
                self.pos += 1;
                items.push(item(self)?);
            } else {
                self.expect(')')?;
                return Ok(items);
            }
        }
    }

    fn polygon(&mut self) -> GeometryResult<Polygon<f64>> {
        let mut rings = self.list(Self::ring)?.into_iter();
        let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
        Ok(Polygon::new(exterior, rings.collect()))
    }

    fn ring(&mut self) -> GeometryResult<LineString<f64>> {
        Ok(LineString::new(self.list(Self::coord)?))
    }

    fn coord(&mut self) -> GeometryResult<Coord<f64>> {
        let x = self.number()?;
        let y = self.number()?;
        Ok(Coord { x, y })
    }

    fn number(&mut self) -> GeometryResult<f64> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let token = &self.rest()[..len];
        let value = token
            .parse::<f64>()
            .map_err(|_| self.error(&format!("invalid number '{token}'")))?;
        self.pos += len;
        Ok(value)
    }
}
