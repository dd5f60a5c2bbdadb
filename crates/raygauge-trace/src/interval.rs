//! One-dimensional interval lists and their boolean algebra.
//!
//! A solid's intersection with a ray is a sorted, disjoint list of
//! `[t_in, t_out]` spans. CSG trees are evaluated per ray by combining
//! these lists, which reduces boolean solid evaluation to interval
//! arithmetic along one line.

/// A closed span of ray parameters with `t_in <= t_out`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Entry parameter.
    pub t_in: f64,
    /// Exit parameter.
    pub t_out: f64,
}

impl Span {
    /// Create a span; returns `None` if the span is inverted or empty.
    pub fn new(t_in: f64, t_out: f64) -> Option<Self> {
        if t_out > t_in {
            Some(Self { t_in, t_out })
        } else {
            None
        }
    }

    /// Length of the span.
    pub fn length(&self) -> f64 {
        self.t_out - self.t_in
    }
}

/// Union of two sorted disjoint span lists, merging touching spans.
pub fn union(a: &[Span], b: &[Span], tol: f64) -> Vec<Span> {
    let mut merged: Vec<Span> = Vec::with_capacity(a.len() + b.len());
    let mut ai = 0;
    let mut bi = 0;
    while ai < a.len() || bi < b.len() {
        let next = if bi >= b.len() || (ai < a.len() && a[ai].t_in <= b[bi].t_in) {
            let s = a[ai];
            ai += 1;
            s
        } else {
            let s = b[bi];
            bi += 1;
            s
        };
        match merged.last_mut() {
            Some(last) if next.t_in <= last.t_out + tol => {
                last.t_out = last.t_out.max(next.t_out);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Intersection of two sorted disjoint span lists.
pub fn intersection(a: &[Span], b: &[Span]) -> Vec<Span> {
    let mut out = Vec::new();
    let mut ai = 0;
    let mut bi = 0;
    while ai < a.len() && bi < b.len() {
        let lo = a[ai].t_in.max(b[bi].t_in);
        let hi = a[ai].t_out.min(b[bi].t_out);
        if let Some(s) = Span::new(lo, hi) {
            out.push(s);
        }
        if a[ai].t_out < b[bi].t_out {
            ai += 1;
        } else {
            bi += 1;
        }
    }
    out
}

/// Difference `a - b` of two sorted disjoint span lists.
pub fn difference(a: &[Span], b: &[Span]) -> Vec<Span> {
    let mut out = Vec::new();
    let mut bi = 0;
    for span in a {
        let mut lo = span.t_in;
        while bi < b.len() && b[bi].t_out <= lo {
            bi += 1;
        }
        let mut cut = bi;
        while cut < b.len() && b[cut].t_in < span.t_out {
            if let Some(s) = Span::new(lo, b[cut].t_in) {
                out.push(s);
            }
            lo = lo.max(b[cut].t_out);
            cut += 1;
        }
        if let Some(s) = Span::new(lo, span.t_out) {
            out.push(s);
        }
    }
    out
}
