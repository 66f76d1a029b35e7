//! Condition graph analysis - cycle detection over visibility dependencies.
//!
//! Each field with a visibility condition depends on the field its
//! condition references. A cycle in that graph means no stable set of
//! visible fields exists, so compilation must fail.

use std::collections::HashMap;

use crate::types::{CompilationError, CompilationErrorKind, FormField};

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Detect a cycle in the condition dependency graph.
///
/// Returns the first detected cycle only, reported at the field id where
/// the cycle closed; repair is never attempted. Dangling references are
/// ignored here, the metadata validator reports those separately.
pub fn check_cycles(fields: &[FormField]) -> Option<CompilationError> {
    let index_of: HashMap<&str, usize> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.as_str(), i))
        .collect();

    // At most one outgoing edge per field.
    let edges: Vec<Option<usize>> = fields
        .iter()
        .map(|f| {
            f.condition
                .as_ref()
                .and_then(|c| index_of.get(c.field_id.as_str()).copied())
        })
        .collect();

    let mut marks = vec![Mark::Unvisited; fields.len()];

    for start in 0..fields.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        // Out-degree is at most one, so each walk is a simple chain.
        let mut path = Vec::new();
        let mut node = start;
        loop {
            marks[node] = Mark::OnStack;
            path.push(node);

            let Some(next) = edges[node] else {
                break;
            };
            match marks[next] {
                Mark::OnStack => {
                    for &n in &path {
                        marks[n] = Mark::Done;
                    }
                    return Some(CompilationError {
                        field: Some(fields[next].id.clone()),
                        message: format!(
                            "circular visibility condition detected at field \"{}\"",
                            fields[next].id
                        ),
                        kind: CompilationErrorKind::CircularReference,
                    });
                }
                Mark::Done => break,
                Mark::Unvisited => node = next,
            }
        }
        for n in path {
            marks[n] = Mark::Done;
        }
    }

    None
}
