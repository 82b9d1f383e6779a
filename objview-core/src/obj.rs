//! Two-pass Wavefront OBJ parser.
//!
//! Only `v` (vertex) and `f` (facet) directives are read; every other line
//! is skipped. The first pass counts directives so the vertex buffer can be
//! allocated once at its final size, the second pass fills it and expands
//! each facet into a triangle fan.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek};
use std::path::Path;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{all_consuming, opt, recognize},
    number::complete::double,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};
use tracing::{debug, info};

use crate::error::{ParseError, ParseResult};
use crate::geometry::{Mesh, MeshStatus, VertexBuffer};

const VERTEX: u8 = b'v';
const FACET: u8 = b'f';
const EXTENSION: &str = "obj";

/// A raw line classified by its one-byte keyword
#[derive(Debug, PartialEq)]
enum Directive<'a> {
    Vertex(&'a [u8]),
    Facet(&'a [u8]),
    Other,
}

/// Classify a line by its first byte.
///
/// Unlike a bare first-character test, the keyword must be followed by
/// whitespace or end of line, so `vn`, `vt` and `fo` lines are skipped
/// instead of being counted as vertices or facets.
fn classify(line: &[u8]) -> Directive<'_> {
    let Some((&keyword, rest)) = line.split_first() else {
        return Directive::Other;
    };
    if rest.first().is_some_and(|b| !b.is_ascii_whitespace()) {
        return Directive::Other;
    }
    match keyword {
        VERTEX => Directive::Vertex(rest),
        FACET => Directive::Facet(rest),
        _ => Directive::Other,
    }
}

/// Parse an `.obj` file from disk.
pub fn parse<P: AsRef<Path>>(path: P) -> ParseResult<Mesh> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ParseError::EmptyPath);
    }
    let is_obj = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));
    if !is_obj {
        return Err(ParseError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mesh = parse_reader(BufReader::new(file))?;

    info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Parse OBJ text from any rewindable reader.
///
/// The reader is consumed twice; it is rewound to the start between the
/// counting pass and the data pass.
pub fn parse_reader<R: BufRead + Seek>(mut reader: R) -> ParseResult<Mesh> {
    let status = scan_status(&mut reader)?;
    debug!(
        vertices = status.vertices,
        facets = status.facets,
        edges = status.edges,
        "Counting pass finished"
    );

    let mut vertices = allocate_vertices(status.vertices)?;
    reader.rewind()?;
    let indices = fill(&mut reader, &mut vertices, status.facets)?;
    debug!(triangles = indices.len() / 3, "Data pass finished");

    Ok(Mesh::new(vertices, indices, status))
}

/// Counting pass: tally vertex and facet lines.
pub fn scan_status<R: BufRead>(reader: R) -> ParseResult<MeshStatus> {
    let mut vertices = 0;
    let mut facets = 0;
    for_each_line(reader, |_, line| {
        match classify(line) {
            Directive::Vertex(_) => vertices += 1,
            Directive::Facet(_) => facets += 1,
            Directive::Other => {}
        }
        Ok(())
    })?;
    Ok(MeshStatus::new(vertices, facets))
}

/// Append the fan triangulation of `facet` to `out`.
///
/// Emits `(i0, it, it+1)` for `t` in `1..n-1`, so every triangle shares the
/// first index. No convexity check is made; concave facets come out
/// overlapping. Facets with fewer than three indices add nothing.
pub fn triangulate_fan(facet: &[u32], out: &mut Vec<u32>) -> ParseResult<()> {
    let Some((&first, rest)) = facet.split_first() else {
        return Ok(());
    };
    if rest.len() < 2 {
        return Ok(());
    }

    let elements = (rest.len() - 1) * 3;
    out.try_reserve(elements)
        .map_err(|_| ParseError::AllocationFailure {
            what: "triangle indices",
            elements,
        })?;
    for edge in rest.windows(2) {
        out.extend_from_slice(&[first, edge[0], edge[1]]);
    }
    Ok(())
}

fn allocate_vertices(count: usize) -> ParseResult<VertexBuffer> {
    let elements = count
        .checked_mul(3)
        .ok_or(ParseError::AllocationFailure {
            what: "vertex buffer",
            elements: count,
        })?;
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(elements)
        .map_err(|_| ParseError::AllocationFailure {
            what: "vertex buffer",
            elements: count,
        })?;
    storage.resize(elements, 0.0);
    Ok(VertexBuffer::from_vec(storage))
}

/// Data pass: write vertices into `vertices` and collect triangle indices.
fn fill<R: BufRead>(
    reader: R,
    vertices: &mut VertexBuffer,
    facet_hint: usize,
) -> ParseResult<Vec<u32>> {
    let mut indices = Vec::new();
    // At least one triangle per well-formed facet
    let hint = facet_hint.saturating_mul(3);
    indices
        .try_reserve(hint)
        .map_err(|_| ParseError::AllocationFailure {
            what: "triangle indices",
            elements: hint,
        })?;

    let mut cursor = 0;
    let mut facet = Vec::new();
    for_each_line(reader, |number, line| {
        match classify(line) {
            Directive::Vertex(rest) => {
                let malformed = || ParseError::MalformedVertex {
                    line: number,
                    text: String::from_utf8_lossy(line).into_owned(),
                };
                if cursor >= vertices.nrows() {
                    return Err(ParseError::BufferOverrun {
                        line: number,
                        index: cursor,
                        capacity: vertices.nrows(),
                    });
                }
                let rest = std::str::from_utf8(rest).map_err(|_| malformed())?;
                let [x, y, z] = parse_coords(rest).ok_or_else(malformed)?;
                let mut row = vertices.row_mut(cursor);
                row[0] = x;
                row[1] = y;
                row[2] = z;
                cursor += 1;
            }
            Directive::Facet(rest) => {
                facet.clear();
                let rest = std::str::from_utf8(rest).map_err(|_| ParseError::MalformedFacet {
                    line: number,
                    token: String::from_utf8_lossy(rest).trim().to_string(),
                })?;
                for token in rest.split_whitespace() {
                    let index = parse_index(token).ok_or_else(|| ParseError::MalformedFacet {
                        line: number,
                        token: token.to_string(),
                    })?;
                    facet.push(index);
                }
                if facet.len() < 3 {
                    debug!(line = number, indices = facet.len(), "Skipping degenerate facet");
                }
                triangulate_fan(&facet, &mut indices)?;
            }
            Directive::Other => {}
        }
        Ok(())
    })?;

    Ok(indices)
}

/// Feed each raw line (without its terminator) and its 1-based number to
/// `f`. Lines are not required to be UTF-8.
fn for_each_line<R, F>(mut reader: R, mut f: F) -> ParseResult<()>
where
    R: BufRead,
    F: FnMut(usize, &[u8]) -> ParseResult<()>,
{
    let mut buf = Vec::new();
    let mut number = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        number += 1;
        let mut line = buf.as_slice();
        while let Some((&(b'\n' | b'\r'), head)) = line.split_last() {
            line = head;
        }
        f(number, line)?;
    }
}

/// First three coordinates of a vertex line. Extra values (the optional
/// `w`) are ignored, but each coordinate must be a complete number.
fn parse_coords(rest: &str) -> Option<[f64; 3]> {
    let mut tokens = rest.split_whitespace();
    let mut coords = [0.0; 3];
    for coord in &mut coords {
        let (_, value) = all_consuming(coordinate)(tokens.next()?).ok()?;
        *coord = value;
    }
    Some(coords)
}

/// Vertex index of a facet token: `7`, `7/1`, `7//3` or `7/1/3`.
///
/// Fractional forms are truncated. Negative, non-finite and out-of-range
/// values are rejected.
fn parse_index(token: &str) -> Option<u32> {
    let (_, value) = all_consuming(facet_ref)(token).ok()?;
    if !value.is_finite() || value < 0.0 || value >= f64::from(u32::MAX) + 1.0 {
        return None;
    }
    Some(value.trunc() as u32)
}

fn coordinate(input: &str) -> IResult<&str, f64> {
    double(input)
}

fn reference(input: &str) -> IResult<&str, &str> {
    recognize(pair(opt(char('-')), digit1))(input)
}

/// Index followed by at most a texture and a normal reference.
fn facet_ref(input: &str) -> IResult<&str, f64> {
    terminated(
        double,
        opt(alt((
            recognize(preceded(tag("//"), reference)),
            recognize(tuple((char('/'), reference, opt(preceded(char('/'), reference))))),
        ))),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn parse_str(text: &str) -> ParseResult<Mesh> {
        parse_reader(Cursor::new(text))
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(b"v 1 2 3"), Directive::Vertex(b" 1 2 3"));
        assert_eq!(classify(b"f\t1 2 3"), Directive::Facet(b"\t1 2 3"));
        assert_eq!(classify(b"f"), Directive::Facet(b""));
        assert_eq!(classify(b"vn 0 0 1"), Directive::Other);
        assert_eq!(classify(b"vt 0 0"), Directive::Other);
        assert_eq!(classify(b"# comment"), Directive::Other);
        assert_eq!(classify(b""), Directive::Other);
    }

    #[test]
    fn test_scan_status() {
        let text = "# cube\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1 2 3\ng side\n";
        let status = scan_status(Cursor::new(text)).unwrap();
        assert_eq!(status, MeshStatus::new(3, 1));
        assert_eq!(status.edges, 2);
    }

    #[test]
    fn test_fan_order() {
        let mut out = Vec::new();
        triangulate_fan(&[0, 1, 2, 3], &mut out).unwrap();
        assert_eq!(out, vec![0, 1, 2, 0, 2, 3]);

        let mut out = Vec::new();
        triangulate_fan(&[5, 6, 7, 8, 9], &mut out).unwrap();
        assert_eq!(out, vec![5, 6, 7, 5, 7, 8, 5, 8, 9]);
    }

    #[test]
    fn test_fan_degenerate() {
        let mut out = vec![1, 2, 3];
        triangulate_fan(&[0, 1], &mut out).unwrap();
        triangulate_fan(&[4], &mut out).unwrap();
        triangulate_fan(&[], &mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_quad() {
        let mesh = parse_str("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices(), &[1, 2, 3, 1, 3, 4]);
        assert_eq!(mesh.vertex(2).unwrap().coords.as_slice(), &[1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_parse_scientific_and_crlf() {
        let mesh = parse_str("v 1e-3 -2.5E2 +.5\r\nf 0 0 0\r\n").unwrap();
        let v = mesh.vertex(0).unwrap();
        assert_eq!((v.x, v.y, v.z), (0.001, -250.0, 0.5));
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_extra_vertex_component_ignored() {
        let mesh = parse_str("v 1 2 3 1.0\n").unwrap();
        assert_eq!(mesh.vertex(0).unwrap().z, 3.0);
    }

    #[test]
    fn test_short_vertex_rejected() {
        let err = parse_str("v 1.0 2.0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedVertex);
    }

    #[test]
    fn test_partial_number_rejected() {
        let err = parse_str("v 1.0 2.0abc 3.0\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedVertex);
        assert!(matches!(err, ParseError::MalformedVertex { line: 1, .. }));
    }

    #[test]
    fn test_facet_tokens() {
        assert_eq!(parse_index("12"), Some(12));
        assert_eq!(parse_index("3.9"), Some(3));
        assert_eq!(parse_index("7/1/3"), Some(7));
        assert_eq!(parse_index("7//3"), Some(7));
        assert_eq!(parse_index("7/1"), Some(7));
        assert_eq!(parse_index("-1"), None);
        assert_eq!(parse_index("x"), None);
        assert_eq!(parse_index("2x"), None);
        assert_eq!(parse_index("7/a"), None);
        assert_eq!(parse_index("7/"), None);
        assert_eq!(parse_index("7///"), None);
        assert_eq!(parse_index("7/1/"), None);
        assert_eq!(parse_index("7/1/3/9/9"), None);
        assert_eq!(parse_index("99999999999"), None);
    }

    #[test]
    fn test_non_utf8_comment_ignored() {
        let text = b"# caf\xE9\ng \xFFgroup\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let mesh = parse_reader(Cursor::new(&text[..])).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn test_non_utf8_directives_rejected() {
        let err = parse_reader(Cursor::new(&b"v 0 \xE9 0\n"[..])).unwrap_err();
        assert!(matches!(err, ParseError::MalformedVertex { line: 1, .. }));

        let err = parse_reader(Cursor::new(&b"v 0 0 0\nf 1 \xE9 2\n"[..])).unwrap_err();
        assert!(matches!(err, ParseError::MalformedFacet { line: 2, .. }));
    }

    #[test]
    fn test_malformed_facet() {
        let err = parse_str("v 0 0 0\nf 1 two 3\n").unwrap_err();
        match err {
            ParseError::MalformedFacet { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "two");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_facets_are_lenient() {
        let mesh = parse_str("v 0 0 0\nf 0 1\nf\n").unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.status().facets, 2);
    }

    #[test]
    fn test_buffer_overrun() {
        let mut vertices = allocate_vertices(1).unwrap();
        let err = fill(Cursor::new("v 0 0 0\nv 1 1 1\n"), &mut vertices, 0).unwrap_err();
        assert!(matches!(
            err,
            ParseError::BufferOverrun {
                line: 2,
                index: 1,
                capacity: 1
            }
        ));
    }

    #[test]
    fn test_repeat_parse_is_identical() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let first = parse_str(text).unwrap();
        let second = parse_str(text).unwrap();
        assert_eq!(first.vertices(), second.vertices());
        assert_eq!(first.indices(), second.indices());
    }

    #[test]
    fn test_empty_input() {
        let mesh = parse_str("").unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_path_checks() {
        assert_eq!(parse("").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            parse("model.stl").unwrap_err().kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(
            parse("does_not_exist_12345.obj").unwrap_err().kind(),
            ErrorKind::IoFailure
        );
    }
}
