//! estimation::connectivity — connected components of the count graph.
//!
//! Purpose
//! -------
//! Treat a count matrix as an adjacency-weighted graph (edge `i -> j` exists
//! iff `C[i][j] > 0`) and compute its strongly connected components, the
//! largest connected set, and the count matrix restricted to that set.
//! Estimating a transition matrix is only meaningful on a connected state
//! space, so this module is the usual step between counting and estimation.
//!
//! Key behaviors
//! -------------
//! - `directed = true` computes strongly connected components with an
//!   iterative Tarjan traversal; `directed = false` symmetrizes the edge
//!   pattern first, which makes the same traversal compute ordinary
//!   connected components.
//! - Components are returned sorted by descending size; equal-size
//!   components are ordered by ascending minimum state index, so the output
//!   is fully deterministic. Indices inside each component are ascending.
//! - Both matrix representations are lowered to one canonical adjacency
//!   list before any traversal, so dense and sparse inputs of any dimension
//!   (including 2x2) take the identical code path.
//!
//! Invariants & assumptions
//! ------------------------
//! - Edge existence depends only on strict positivity of an entry; negative
//!   entries (possible after an aggressive prior) do not create edges.
//! - States with no positive entry in row or column still appear, each as a
//!   singleton component.
//!
//! Downstream usage
//! ----------------
//! - `largest_connected_submatrix` feeds the estimator with a count matrix
//!   whose reversible maximum-likelihood problem is well posed.

use crate::estimation::matrix::SquareMatrix;

/// Connected components of the count-matrix graph.
///
/// Parameters
/// ----------
/// - `c`: count matrix interpreted as an adjacency-weighted graph.
/// - `directed`: strongly connected components when `true`, components of
///   the symmetrized pattern when `false`.
///
/// Returns
/// -------
/// `Vec<Vec<usize>>`
///   Components sorted by descending size, ties by ascending minimum state
///   index; the indices inside each component are sorted ascending. The
///   first entry is the largest connected component.
pub fn connected_sets(c: &SquareMatrix, directed: bool) -> Vec<Vec<usize>> {
    let adj = adjacency(c, directed);
    let mut components = tarjan_scc(&adj);
    for comp in &mut components {
        comp.sort_unstable();
    }
    components.sort_by(|a, b| b.len().cmp(&a.len()).then(a[0].cmp(&b[0])));
    components
}

/// States of the largest connected component, sorted ascending.
///
/// Returns an empty vector for a zero-dimensional matrix.
pub fn largest_connected_set(c: &SquareMatrix, directed: bool) -> Vec<usize> {
    connected_sets(c, directed).into_iter().next().unwrap_or_default()
}

/// Count matrix restricted to the largest connected component.
///
/// The retained states keep their relative row/column order; the result has
/// the same representation as the input and never aliases it. A count
/// matrix that is already fully connected comes back equal to the input (up
/// to the identity reindexing).
pub fn largest_connected_submatrix(c: &SquareMatrix, directed: bool) -> SquareMatrix {
    let lcc = largest_connected_set(c, directed);
    match c {
        SquareMatrix::Dense(m) => {
            let sub = m.select(ndarray::Axis(0), &lcc).select(ndarray::Axis(1), &lcc);
            SquareMatrix::Dense(sub)
        }
        SquareMatrix::Sparse(m) => SquareMatrix::Sparse(
            m.select_submatrix(&lcc).expect("component indices are within the matrix dimension"),
        ),
    }
}

/// Whether the count graph consists of exactly one connected component.
pub fn is_connected(c: &SquareMatrix, directed: bool) -> bool {
    connected_sets(c, directed).len() == 1
}

// ---- Helper methods ----

/// Lower a count matrix to an adjacency list over its positive entries.
///
/// Self-loops are kept (they are harmless to the traversal) and the
/// undirected mode inserts both directions of every edge.
fn adjacency(c: &SquareMatrix, directed: bool) -> Vec<Vec<usize>> {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); c.dim()];
    c.for_each_nonzero(|i, j, v| {
        if v > 0.0 {
            adj[i].push(j);
            if !directed && i != j {
                adj[j].push(i);
            }
        }
    });
    adj
}

/// Strongly connected components via iterative Tarjan.
///
/// An explicit frame stack replaces recursion so that deep chains (long
/// trajectories discretized onto many states) cannot overflow the call
/// stack. Components are emitted in reverse topological order; callers
/// re-sort them anyway.
fn tarjan_scc(adj: &[Vec<usize>]) -> Vec<Vec<usize>> {
    const UNVISITED: usize = usize::MAX;
    let n = adj.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut frames: Vec<(usize, usize)> = Vec::new();
    let mut next_index = 0usize;
    let mut components: Vec<Vec<usize>> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        frames.push((root, 0));
        while let Some(&mut (v, child)) = frames.last_mut() {
            if child == 0 {
                index[v] = next_index;
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }
            if child < adj[v].len() {
                frames.last_mut().expect("frame for v is on the stack").1 += 1;
                let w = adj[v][child];
                if index[w] == UNVISITED {
                    frames.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
            } else {
                frames.pop();
                if let Some(&mut (parent, _)) = frames.last_mut() {
                    lowlink[parent] = lowlink[parent].min(lowlink[v]);
                }
                if lowlink[v] == index[v] {
                    let mut comp = Vec::new();
                    loop {
                        let w = stack.pop().expect("Tarjan stack holds the open component");
                        on_stack[w] = false;
                        comp.push(w);
                        if w == v {
                            break;
                        }
                    }
                    components.push(comp);
                }
            }
        }
    }
    components
}
