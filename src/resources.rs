//! Loading of shader source and geometry from external files.
//!
//! Geometry files are a simple line-oriented text format, split into
//! sections:
//!
//! ```text
//! [points]
//! # x     y     r   g   b
//! -0.5   -0.5   1.0 0.0 0.0
//!  0.5   -0.5   0.0 1.0 0.0
//!  0.0    0.5   0.0 0.0 1.0
//!
//! [indices]
//! 0 1 2
//! ```
//!
//! `#` starts a comment, blank lines are ignored. A failure to load either
//! resource is fatal to initialization; there is nothing sensible to render
//! without them.

use std::path::Path;

use anyhow::{Context as _, Result, bail, ensure};

use crate::scene::Vertex;

/// Host-side geometry: interleaved vertices plus optional 16-bit indices.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Geometry {
    /// Built-in fallback shape so the binary runs without any arguments:
    /// two coloured triangles forming a quad.
    pub fn demo_shape() -> Self {
        Self {
            vertices: vec![
                Vertex {
                    position: [-0.5, -0.5],
                    color: [1.0, 0.0, 0.0],
                },
                Vertex {
                    position: [0.5, -0.5],
                    color: [0.0, 1.0, 0.0],
                },
                Vertex {
                    position: [0.5, 0.5],
                    color: [0.0, 0.0, 1.0],
                },
                Vertex {
                    position: [-0.5, 0.5],
                    color: [1.0, 1.0, 0.0],
                },
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

/// Read WGSL shader source text from `path`.
pub fn load_shader(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read shader source {}", path.display()))
}

/// Load a geometry file from `path`.
pub fn load_geometry(path: impl AsRef<Path>) -> Result<Geometry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read geometry file {}", path.display()))?;
    parse_geometry(&text).with_context(|| format!("malformed geometry file {}", path.display()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Points,
    Indices,
}

/// Parse the `[points]` / `[indices]` text format described in the module
/// docs. Errors name the offending line.
pub fn parse_geometry(text: &str) -> Result<Geometry> {
    let mut geometry = Geometry::default();
    let mut section = Section::None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        // Strip comments and surrounding whitespace before looking at the line.
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "[points]" => section = Section::Points,
            "[indices]" => section = Section::Indices,
            _ if line.starts_with('[') => {
                bail!("unknown section {} on line {}", line, line_no)
            }
            _ => match section {
                Section::None => bail!("data before any section header on line {}", line_no),
                Section::Points => geometry.vertices.push(parse_point(line, line_no)?),
                Section::Indices => parse_index_row(line, line_no, &mut geometry.indices)?,
            },
        }
    }

    for (i, &index) in geometry.indices.iter().enumerate() {
        ensure!(
            (index as usize) < geometry.vertices.len(),
            "index {} (entry {}) is out of range for {} points",
            index,
            i,
            geometry.vertices.len()
        );
    }

    Ok(geometry)
}

fn parse_point(line: &str, line_no: usize) -> Result<Vertex> {
    let fields = line
        .split_whitespace()
        .map(|field| {
            field
                .parse::<f32>()
                .with_context(|| format!("bad number {:?} on line {}", field, line_no))
        })
        .collect::<Result<Vec<f32>>>()?;
    ensure!(
        fields.len() == 5,
        "expected `x y r g b` (5 numbers) on line {}, got {}",
        line_no,
        fields.len()
    );
    Ok(Vertex {
        position: [fields[0], fields[1]],
        color: [fields[2], fields[3], fields[4]],
    })
}

fn parse_index_row(line: &str, line_no: usize, indices: &mut Vec<u16>) -> Result<()> {
    let fields = line
        .split_whitespace()
        .map(|field| {
            field
                .parse::<u16>()
                .with_context(|| format!("bad index {:?} on line {}", field, line_no))
        })
        .collect::<Result<Vec<u16>>>()?;
    ensure!(
        fields.len() == 3,
        "expected 3 indices per line, got {} on line {}",
        fields.len(),
        line_no
    );
    indices.extend(fields);
    Ok(())
}
