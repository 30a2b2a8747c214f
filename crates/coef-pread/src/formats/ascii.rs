use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use coef_core::errors::{CoefError, ErrorInfo};
use coef_core::Particle;

use crate::memory::MemorySnapshot;

const MIN_COLUMNS: usize = 7;

/// Reads one ASCII snapshot file.
///
/// ```text
/// # time 1.5
/// [dark halo]
/// # mass x y z vx vy vz [attrs...]
/// 0.01 1.0 0.0 0.0 0.0 1.0 0.0
/// ```
pub fn read_ascii(path: &Path) -> Result<MemorySnapshot, CoefError> {
    let file = File::open(path).map_err(|err| load_error(path, "ascii-open", err.to_string()))?;
    let reader = BufReader::new(file);
    parse_ascii(reader, path)
}

pub(crate) fn parse_ascii<R: BufRead>(reader: R, path: &Path) -> Result<MemorySnapshot, CoefError> {
    let mut time: Option<f64> = None;
    let mut snapshot: Option<MemorySnapshot> = None;
    let mut current: Option<String> = None;
    let mut pending: Vec<Particle> = Vec::new();

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| load_error(path, "ascii-read", err.to_string()))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(comment) = trimmed.strip_prefix('#') {
            if let Some(value) = header_time(comment) {
                if time.is_some() {
                    return Err(line_error(path, line_idx, "duplicate time header"));
                }
                let parsed: f64 = value
                    .parse()
                    .map_err(|_| line_error(path, line_idx, "time header is not a number"))?;
                if !parsed.is_finite() {
                    return Err(line_error(path, line_idx, "time header must be finite"));
                }
                time = Some(parsed);
                snapshot = Some(MemorySnapshot::new(parsed));
            }
            continue;
        }
        if let Some(name) = trimmed.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let snap = snapshot
                .as_mut()
                .ok_or_else(|| line_error(path, line_idx, "component before time header"))?;
            if let Some(prev) = current.take() {
                snap.extend_component(&prev, pending.drain(..));
            }
            let name = name.trim();
            if name.is_empty() {
                return Err(line_error(path, line_idx, "empty component name"));
            }
            snap.extend_component(name, Vec::new());
            current = Some(name.to_string());
            continue;
        }
        if current.is_none() {
            return Err(line_error(path, line_idx, "particle row outside a component"));
        }
        pending.push(parse_row(trimmed).ok_or_else(|| {
            line_error(path, line_idx, "expected at least 7 numeric columns")
        })?);
    }

    let mut snap = snapshot.ok_or_else(|| load_error(path, "ascii-no-time", "missing time header"))?;
    if let Some(prev) = current {
        snap.extend_component(&prev, pending);
    }
    Ok(snap)
}

fn header_time(comment: &str) -> Option<&str> {
    let rest = comment.trim().strip_prefix("time")?;
    if !rest.starts_with(|c: char| c.is_whitespace() || c == ':' || c == '=') {
        return None;
    }
    let rest = rest.trim_start();
    let rest = rest
        .strip_prefix(':')
        .or_else(|| rest.strip_prefix('='))
        .unwrap_or(rest);
    Some(rest.trim())
}

fn parse_row(line: &str) -> Option<Particle> {
    let values: Vec<f64> = line
        .split_whitespace()
        .map(|tok| tok.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if values.len() < MIN_COLUMNS {
        return None;
    }
    Some(Particle {
        mass: values[0],
        pos: [values[1], values[2], values[3]],
        vel: [values[4], values[5], values[6]],
        attrs: values[MIN_COLUMNS..].to_vec(),
    })
}

fn load_error(path: &Path, code: &str, message: impl Into<String>) -> CoefError {
    CoefError::GroupLoad(
        ErrorInfo::new(code, message).with_context("path", path.display().to_string()),
    )
}

fn line_error(path: &Path, line_idx: usize, message: &str) -> CoefError {
    CoefError::GroupLoad(
        ErrorInfo::new("ascii-parse", message)
            .with_context("path", path.display().to_string())
            .with_context("line", (line_idx + 1).to_string()),
    )
}
