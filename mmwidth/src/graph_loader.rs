//! Loading graphs in DIMACS edge format.
//!
//! ```text
//! c optional comment
//! p edge <vertices> <edges>
//! n <id>          (optional, one per vertex)
//! e <id> <id>
//! ```
//!
//! Without `n` lines the vertices are numbered `1..=vertices`.

use std::fs;
use std::path::Path;

use crate::error::DecompError;
use crate::graph::Graph;

fn format_error(line: usize, msg: impl std::fmt::Display) -> DecompError {
    DecompError::Format(format!("line {}: {}", line, msg))
}

fn parse_number(line: usize, field: Option<&str>, what: &str) -> Result<usize, DecompError> {
    let field = field.ok_or_else(|| format_error(line, format!("missing {}", what)))?;
    field
        .parse()
        .map_err(|_| format_error(line, format!("invalid {} '{}'", what, field)))
}

pub fn parse_dimacs(input: &str) -> Result<Graph, DecompError> {
    let mut g = Graph::new();
    let mut declared: Option<(usize, usize)> = None;
    let mut named = false;

    for (i, raw) in input.lines().enumerate() {
        let line = i + 1;
        let mut fields = raw.split_whitespace();
        match fields.next() {
            None | Some("c") => {}
            Some("p") => {
                if declared.is_some() {
                    return Err(format_error(line, "second problem line"));
                }
                fields
                    .next()
                    .ok_or_else(|| format_error(line, "missing problem kind"))?;
                let n = parse_number(line, fields.next(), "vertex count")?;
                let m = parse_number(line, fields.next(), "edge count")?;
                declared = Some((n, m));
            }
            Some("n") => {
                if declared.is_none() {
                    return Err(format_error(line, "vertex before problem line"));
                }
                let id = parse_number(line, fields.next(), "vertex id")?;
                if g.vertex_named(id).is_some() {
                    return Err(format_error(line, format!("vertex {} declared twice", id)));
                }
                g.add_vertex(id);
                named = true;
            }
            Some("e") => {
                let (n, _) =
                    declared.ok_or_else(|| format_error(line, "edge before problem line"))?;
                if !named && g.num_vertices() == 0 {
                    for id in 1..=n {
                        g.add_vertex(id);
                    }
                }
                let a = parse_number(line, fields.next(), "edge endpoint")?;
                let b = parse_number(line, fields.next(), "edge endpoint")?;
                let va = g
                    .vertex_named(a)
                    .ok_or_else(|| format_error(line, format!("unknown vertex {}", a)))?;
                let vb = g
                    .vertex_named(b)
                    .ok_or_else(|| format_error(line, format!("unknown vertex {}", b)))?;
                if va == vb {
                    return Err(format_error(line, format!("self-loop on vertex {}", a)));
                }
                if !g.add_edge(va, vb) {
                    return Err(format_error(line, format!("duplicate edge {} {}", a, b)));
                }
            }
            Some(other) => {
                return Err(format_error(line, format!("unknown line type '{}'", other)));
            }
        }
    }

    let (n, m) = declared.ok_or_else(|| DecompError::Format("missing problem line".to_string()))?;
    if !named && g.num_vertices() == 0 {
        for id in 1..=n {
            g.add_vertex(id);
        }
    }
    if g.num_vertices() != n || g.num_edges() != m {
        return Err(DecompError::Format(format!(
            "declared {} vertices and {} edges, found {} and {}",
            n,
            m,
            g.num_vertices(),
            g.num_edges()
        )));
    }
    Ok(g)
}

pub fn load_dimacs(path: impl AsRef<Path>) -> Result<Graph, DecompError> {
    let content = fs::read_to_string(path)?;
    parse_dimacs(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn implicit_vertices() {
        let g = parse_dimacs("c a path\np edge 3 2\ne 1 2\ne 2 3\n").unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
        let (v1, v3) = (g.vertex_named(1).unwrap(), g.vertex_named(3).unwrap());
        assert!(!g.connected(v1, v3));
    }

    #[test]
    fn named_vertices() {
        let g = parse_dimacs("p edge 3 1\nn 10\nn 20\nn 30\ne 30 10\n").unwrap();
        assert_eq!(g.num_vertices(), 3);
        let (a, b) = (g.vertex_named(10).unwrap(), g.vertex_named(30).unwrap());
        assert!(g.connected(a, b));
    }

    #[test]
    fn edgeless_graph() {
        let g = parse_dimacs("p edge 4 0\n").unwrap();
        assert_eq!(g.num_vertices(), 4);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn round_trip_through_dimacs() {
        let g = Graph::grid(3, 4).unwrap();
        let h = parse_dimacs(&g.to_dimacs()).unwrap();
        assert_eq!(h.num_vertices(), 12);
        assert_eq!(h.num_edges(), g.num_edges());
        for (a, b) in g.edges() {
            let (ha, hb) = (
                h.vertex_named(g.name(a)).unwrap(),
                h.vertex_named(g.name(b)).unwrap(),
            );
            assert!(h.connected(ha, hb));
        }
    }

    #[rstest]
    #[case("e 1 2\n")]
    #[case("p edge 3\n")]
    #[case("p edge x 2\n")]
    #[case("p edge 2 1\ne 1 3\n")]
    #[case("p edge 2 1\ne 1 1\n")]
    #[case("p edge 2 2\ne 1 2\ne 2 1\n")]
    #[case("p edge 3 2\ne 1 2\n")]
    #[case("p edge 2 1\nn 1\nn 2\nn 3\ne 1 2\n")]
    #[case("p edge 2 1\nx 1 2\n")]
    fn malformed_input(#[case] input: &str) {
        assert!(matches!(parse_dimacs(input), Err(DecompError::Format(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "p edge 2 1\ne 1 2\n").unwrap();
        let g = load_dimacs(file.path()).unwrap();
        assert_eq!(g.num_edges(), 1);
        assert!(matches!(
            load_dimacs("does/not/exist.dimacs"),
            Err(DecompError::Io(_))
        ));
    }
}
