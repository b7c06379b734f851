//! PCD (Point Cloud Data) I/O
//!
//! PCD is the native format for Point Cloud Library (PCL). Both `ascii` and
//! `binary` data sections are read; `binary_compressed` is rejected.

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use cv_core::PointCloud;
use nalgebra::{Point3, Vector3};
use std::io::{BufRead, Write};

/// Upper bound on points reserved up front; larger clouds grow on demand.
const MAX_PREALLOCATED_POINTS: usize = 1 << 20;
/// Upper bound on one binary record, far above any real field layout.
const MAX_RECORD_BYTES: usize = 1 << 16;

/// PCD data format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcdData {
    Ascii,
    Binary,
    BinaryCompressed,
}

/// One `FIELDS` entry with its `SIZE`, `TYPE` and `COUNT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcdField {
    pub name: String,
    pub size: usize,
    pub kind: char,
    pub count: usize,
}

/// Parsed PCD header.
#[derive(Debug, Clone, PartialEq)]
pub struct PcdHeader {
    pub version: String,
    pub fields: Vec<PcdField>,
    pub width: usize,
    pub height: usize,
    /// tx, ty, tz, qw, qx, qy, qz
    pub viewpoint: [f32; 7],
    pub points: usize,
    pub data: PcdData,
}

impl PcdHeader {
    fn field(&self, names: &[&str]) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| names.iter().any(|n| f.name == *n))
    }

    /// Byte offset of every field inside one binary record.
    fn byte_offsets(&self) -> Vec<usize> {
        self.fields
            .iter()
            .scan(0, |offset, f| {
                let current = *offset;
                *offset += f.size * f.count;
                Some(current)
            })
            .collect()
    }

    /// Token offset of every field inside one ASCII line.
    fn token_offsets(&self) -> Vec<usize> {
        self.fields
            .iter()
            .scan(0, |offset, f| {
                let current = *offset;
                *offset += f.count;
                Some(current)
            })
            .collect()
    }

    fn point_step(&self) -> usize {
        self.fields.iter().map(|f| f.size * f.count).sum()
    }
}

/// Field positions resolved once per file.
struct Layout {
    xyz: [usize; 3],
    normals: Option<[usize; 3]>,
    rgb: Option<usize>,
}

impl Layout {
    fn resolve(header: &PcdHeader) -> Result<Self> {
        let axis = |name: &str| {
            header
                .field(&[name])
                .ok_or_else(|| Error::Parse(format!("PCD header has no '{name}' field")))
        };
        let xyz = [axis("x")?, axis("y")?, axis("z")?];

        let normals = match (
            header.field(&["normal_x", "nx"]),
            header.field(&["normal_y", "ny"]),
            header.field(&["normal_z", "nz"]),
        ) {
            (Some(a), Some(b), Some(c)) => Some([a, b, c]),
            _ => None,
        };

        Ok(Self {
            xyz,
            normals,
            rgb: header.field(&["rgb", "rgba"]),
        })
    }
}

/// Read a PCD file
pub fn read_pcd<R: BufRead>(mut reader: R) -> Result<PointCloud> {
    let header = read_header(&mut reader)?;
    let layout = Layout::resolve(&header)?;

    match header.data {
        PcdData::Ascii => parse_pcd_ascii(reader, &header, &layout),
        PcdData::Binary => parse_pcd_binary(reader, &header, &layout),
        PcdData::BinaryCompressed => Err(Error::UnsupportedFormat(
            "binary_compressed PCD is not supported".to_string(),
        )),
    }
}

/// Parse everything up to and including the `DATA` line.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<PcdHeader> {
    let mut version = "0.7".to_string();
    let mut names: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut types: Vec<char> = Vec::new();
    let mut counts: Vec<usize> = Vec::new();
    let mut width = 0;
    let mut height = 1;
    let mut viewpoint = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
    let mut points = 0;

    let mut line = String::new();
    let data = loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(Error::Parse("Unexpected EOF in header".to_string()));
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let values = &parts[1..];
        match parts[0] {
            "VERSION" => {
                if let Some(v) = values.first() {
                    version = v.to_string();
                }
            }
            "FIELDS" | "COLUMNS" => names = values.iter().map(|s| s.to_string()).collect(),
            "SIZE" => sizes = parse_list(values, "SIZE")?,
            "TYPE" => types = values.iter().filter_map(|s| s.chars().next()).collect(),
            "COUNT" => counts = parse_list(values, "COUNT")?,
            "WIDTH" => width = parse_single(values, "WIDTH")?,
            "HEIGHT" => height = parse_single(values, "HEIGHT")?,
            "VIEWPOINT" => {
                for (slot, v) in viewpoint.iter_mut().zip(values) {
                    *slot = v
                        .parse()
                        .map_err(|_| Error::Parse(format!("invalid VIEWPOINT value '{v}'")))?;
                }
            }
            "POINTS" => points = parse_single(values, "POINTS")?,
            "DATA" => {
                break match values.first().copied() {
                    Some("ascii") => PcdData::Ascii,
                    Some("binary") => PcdData::Binary,
                    Some("binary_compressed") => PcdData::BinaryCompressed,
                    other => {
                        return Err(Error::Parse(format!("unknown DATA kind {other:?}")));
                    }
                };
            }
            _ => {}
        }
    };

    if counts.is_empty() {
        counts = vec![1; names.len()];
    }
    if sizes.len() != names.len() || types.len() != names.len() || counts.len() != names.len() {
        return Err(Error::Parse(format!(
            "FIELDS/SIZE/TYPE/COUNT disagree: {} / {} / {} / {}",
            names.len(),
            sizes.len(),
            types.len(),
            counts.len()
        )));
    }

    let fields: Vec<PcdField> = names
        .into_iter()
        .zip(sizes)
        .zip(types)
        .zip(counts)
        .map(|(((name, size), kind), count)| PcdField {
            name,
            size,
            kind,
            count,
        })
        .collect();

    for field in &fields {
        if !matches!(field.size, 1 | 2 | 4 | 8) {
            return Err(Error::Parse(format!(
                "PCD field '{}' has invalid SIZE {}",
                field.name, field.size
            )));
        }
    }
    let record_bytes = fields.iter().try_fold(0usize, |acc, f| {
        f.size.checked_mul(f.count).and_then(|n| acc.checked_add(n))
    });
    if !matches!(record_bytes, Some(n) if n <= MAX_RECORD_BYTES) {
        return Err(Error::Parse("PCD record layout is too large".to_string()));
    }

    if points == 0 {
        points = width.checked_mul(height).ok_or_else(|| {
            Error::Parse(format!("WIDTH {width} x HEIGHT {height} overflows"))
        })?;
    }

    Ok(PcdHeader {
        version,
        fields,
        width,
        height,
        viewpoint,
        points,
        data,
    })
}

fn parse_list(values: &[&str], key: &str) -> Result<Vec<usize>> {
    values
        .iter()
        .map(|s| {
            s.parse()
                .map_err(|_| Error::Parse(format!("invalid {key} entry '{s}'")))
        })
        .collect()
}

fn parse_single(values: &[&str], key: &str) -> Result<usize> {
    let raw = values
        .first()
        .ok_or_else(|| Error::Parse(format!("{key} has no value")))?;
    raw.parse()
        .map_err(|_| Error::Parse(format!("invalid {key} value '{raw}'")))
}

/// Accumulates decoded records into a cloud.
struct CloudBuilder {
    points: Vec<Point3<f32>>,
    normals: Option<Vec<Vector3<f32>>>,
    colors: Option<Vec<Point3<f32>>>,
}

impl CloudBuilder {
    fn new(layout: &Layout, declared_points: usize) -> Self {
        let capacity = declared_points.min(MAX_PREALLOCATED_POINTS);
        Self {
            points: Vec::with_capacity(capacity),
            normals: layout.normals.map(|_| Vec::with_capacity(capacity)),
            colors: layout.rgb.map(|_| Vec::with_capacity(capacity)),
        }
    }

    fn push<F>(&mut self, layout: &Layout, mut value: F) -> Result<()>
    where
        F: FnMut(usize) -> Result<f64>,
    {
        let [x, y, z] = layout.xyz;
        self.points.push(Point3::new(
            value(x)? as f32,
            value(y)? as f32,
            value(z)? as f32,
        ));

        if let (Some(normals), Some([nx, ny, nz])) = (self.normals.as_mut(), layout.normals) {
            normals.push(Vector3::new(
                value(nx)? as f32,
                value(ny)? as f32,
                value(nz)? as f32,
            ));
        }
        Ok(())
    }

    fn push_color(&mut self, packed: u32) {
        if let Some(colors) = self.colors.as_mut() {
            let r = ((packed >> 16) & 0xFF) as f32 / 255.0;
            let g = ((packed >> 8) & 0xFF) as f32 / 255.0;
            let b = (packed & 0xFF) as f32 / 255.0;
            colors.push(Point3::new(r, g, b));
        }
    }

    fn finish(self) -> PointCloud {
        let mut cloud = PointCloud::new(self.points);
        cloud.normals = self.normals;
        cloud.colors = self.colors;
        cloud
    }
}

fn parse_pcd_ascii<R: BufRead>(reader: R, header: &PcdHeader, layout: &Layout) -> Result<PointCloud> {
    let offsets = header.token_offsets();
    let mut cloud = CloudBuilder::new(layout, header.points);

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let value = |field: usize| -> Result<f64> {
            let token = tokens
                .get(offsets[field])
                .ok_or_else(|| Error::Parse(format!("short PCD line: '{line}'")))?;
            token
                .parse::<f64>()
                .map_err(|_| Error::Parse(format!("invalid PCD value '{token}'")))
        };
        cloud.push(layout, &value)?;

        if let Some(rgb) = layout.rgb {
            let raw = value(rgb)?;
            let packed = match header.fields[rgb].kind {
                'F' => (raw as f32).to_bits(),
                _ => raw as u32,
            };
            cloud.push_color(packed);
        }

        if cloud.points.len() >= header.points {
            break;
        }
    }

    if cloud.points.len() < header.points {
        tracing::warn!(
            "PCD declares {} points but only {} were read",
            header.points,
            cloud.points.len()
        );
    }

    Ok(cloud.finish())
}

fn parse_pcd_binary<R: BufRead>(
    mut reader: R,
    header: &PcdHeader,
    layout: &Layout,
) -> Result<PointCloud> {
    let offsets = header.byte_offsets();
    let step = header.point_step();
    let mut record = vec![0u8; step];
    let mut cloud = CloudBuilder::new(layout, header.points);

    for _ in 0..header.points {
        reader.read_exact(&mut record)?;
        let value = |field: usize| read_scalar(&record[offsets[field]..], &header.fields[field]);
        cloud.push(layout, &value)?;

        if let Some(rgb) = layout.rgb {
            let mut bytes = &record[offsets[rgb]..];
            cloud.push_color(bytes.read_u32::<LittleEndian>()?);
        }
    }

    Ok(cloud.finish())
}

fn read_scalar(mut bytes: &[u8], field: &PcdField) -> Result<f64> {
    let value = match (field.kind, field.size) {
        ('F', 4) => bytes.read_f32::<LittleEndian>()? as f64,
        ('F', 8) => bytes.read_f64::<LittleEndian>()?,
        ('I', 1) => bytes.read_i8()? as f64,
        ('I', 2) => bytes.read_i16::<LittleEndian>()? as f64,
        ('I', 4) => bytes.read_i32::<LittleEndian>()? as f64,
        ('I', 8) => bytes.read_i64::<LittleEndian>()? as f64,
        ('U', 1) => bytes.read_u8()? as f64,
        ('U', 2) => bytes.read_u16::<LittleEndian>()? as f64,
        ('U', 4) => bytes.read_u32::<LittleEndian>()? as f64,
        ('U', 8) => bytes.read_u64::<LittleEndian>()? as f64,
        (kind, size) => {
            return Err(Error::UnsupportedFormat(format!(
                "PCD field '{}' has unsupported type {kind}{size}",
                field.name
            )))
        }
    };
    Ok(value)
}

/// Write point cloud to PCD format (ASCII)
pub fn write_pcd<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<()> {
    let num_points = cloud.len();
    let has_normals = cloud.normals.is_some();
    let has_colors = cloud.colors.is_some();

    let mut fields = vec!["x y z"];
    let mut sizes = vec!["4 4 4"];
    let mut types = vec!["F F F"];
    let mut counts = vec!["1 1 1"];
    if has_normals {
        fields.push("normal_x normal_y normal_z");
        sizes.push("4 4 4");
        types.push("F F F");
        counts.push("1 1 1");
    }
    if has_colors {
        fields.push("rgb");
        sizes.push("4");
        types.push("U");
        counts.push("1");
    }

    writeln!(writer, "# .PCD v0.7 - Point Cloud Data file format")?;
    writeln!(writer, "VERSION 0.7")?;
    writeln!(writer, "FIELDS {}", fields.join(" "))?;
    writeln!(writer, "SIZE {}", sizes.join(" "))?;
    writeln!(writer, "TYPE {}", types.join(" "))?;
    writeln!(writer, "COUNT {}", counts.join(" "))?;
    writeln!(writer, "WIDTH {}", num_points)?;
    writeln!(writer, "HEIGHT 1")?;
    writeln!(writer, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(writer, "POINTS {}", num_points)?;
    writeln!(writer, "DATA ascii")?;

    for i in 0..num_points {
        let p = cloud.points[i];
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;

        if let Some(ref normals) = cloud.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }

        if let Some(ref colors) = cloud.colors {
            let c = colors[i];
            let r = (c.x.clamp(0.0, 1.0) * 255.0).round() as u32;
            let g = (c.y.clamp(0.0, 1.0) * 255.0).round() as u32;
            let b = (c.z.clamp(0.0, 1.0) * 255.0).round() as u32;
            write!(writer, " {}", (r << 16) | (g << 8) | b)?;
        }

        writeln!(writer)?;
    }

    Ok(())
}
