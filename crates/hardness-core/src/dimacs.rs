//! DIMACS CNF text format
//!
//! ```text
//! c comment
//! p cnf <num_vars> <num_clauses>
//! 1 -2 3 0
//! ```

use crate::error::{Error, Result};
use crate::formula::{Clause, Formula};
use crate::literal::Literal;

/// Parse DIMACS CNF text.
///
/// Clauses may span lines; each ends at a `0`. A trailing clause without
/// terminator is accepted.
pub fn parse_str(input: &str) -> Result<Formula> {
    let mut num_vars: Option<usize> = None;
    let mut declared_clauses = 0usize;
    let mut clauses = Vec::new();
    let mut current = Vec::new();

    for (line_idx, raw) in input.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('c') || line.starts_with('%') {
            continue;
        }
        if let Some(header) = line.strip_prefix('p') {
            let fields: Vec<&str> = header.split_whitespace().collect();
            if fields.len() != 3 || fields[0] != "cnf" {
                return Err(Error::DimacsParse {
                    line: line_no,
                    message: format!("bad problem line: {line}"),
                });
            }
            num_vars = Some(parse_number(fields[1], line_no)?);
            declared_clauses = parse_number(fields[2], line_no)?;
            continue;
        }
        if num_vars.is_none() {
            return Err(Error::DimacsParse {
                line: line_no,
                message: "clause before problem line".to_string(),
            });
        }
        for token in line.split_whitespace() {
            let value: i32 = token.parse().map_err(|_| Error::DimacsParse {
                line: line_no,
                message: format!("not an integer: {token}"),
            })?;
            if value == 0 {
                clauses.push(Clause::new(std::mem::take(&mut current)));
            } else {
                current.push(Literal::from_dimacs(value)?);
            }
        }
    }

    if !current.is_empty() {
        clauses.push(Clause::new(current));
    }

    let num_vars = num_vars.ok_or_else(|| Error::DimacsParse {
        line: 0,
        message: "missing problem line".to_string(),
    })?;
    if clauses.len() != declared_clauses {
        tracing::warn!(
            "dimacs header declares {} clauses, found {}",
            declared_clauses,
            clauses.len()
        );
    }
    Formula::new(num_vars, clauses)
}

fn parse_number(field: &str, line: usize) -> Result<usize> {
    field.parse().map_err(|_| Error::DimacsParse {
        line,
        message: format!("not a count: {field}"),
    })
}

impl Formula {
    /// Render as DIMACS CNF text.
    pub fn to_dimacs(&self) -> String {
        let mut out = format!("p cnf {} {}\n", self.num_vars(), self.num_clauses());
        for clause in self.clauses() {
            for lit in clause.literals() {
                out.push_str(&lit.to_string());
                out.push(' ');
            }
            out.push_str("0\n");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let text = r"
c Simple SAT formula
p cnf 3 2
1 -2 3 0
-1 2
-3 0
";
        let f = parse_str(text).unwrap();
        assert_eq!(f.num_vars(), 3);
        assert_eq!(f.num_clauses(), 2);
        assert_eq!(f.clauses()[1].len(), 3);
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse_str("1 2 3 0\n"), Err(Error::DimacsParse { line: 1, .. })));
        assert!(parse_str("c only comments\n").is_err());
    }

    #[test]
    fn test_out_of_range_literal() {
        assert!(matches!(
            parse_str("p cnf 2 1\n1 -3 0\n"),
            Err(Error::VariableOutOfRange { var: 3, .. })
        ));
    }

    #[test]
    fn test_to_dimacs_reparses() {
        let text = "p cnf 4 2\n1 -2 3 0\n-4 2 1 0\n";
        let f = parse_str(text).unwrap();
        assert_eq!(f.to_dimacs(), text);
    }
}
