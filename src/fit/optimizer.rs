//! Derivative-free minimization (Nelder–Mead simplex).
//!
//! The CSS objective is cheap but not smooth everywhere (it jumps to `+∞`
//! when the recursion explodes), so we use a simplex search instead of a
//! gradient method. The implementation is fully deterministic: same start,
//! same options, same result.

use std::time::Instant;

/// Simplex search settings.
#[derive(Debug, Clone, Copy)]
pub struct NelderMeadOptions {
    pub max_iterations: usize,
    /// Converged when `f_worst - f_best <= f_tolerance * (1 + |f_best|)` ...
    pub f_tolerance: f64,
    /// ... and every vertex is within `x_tolerance` of the best one.
    pub x_tolerance: f64,
    /// Edge length of the initial simplex.
    pub initial_step: f64,
    /// Abort once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-6,
            initial_step: 0.1,
            deadline: None,
        }
    }
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Converged,
    MaxIterations,
    Deadline,
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub termination: Termination,
}

impl Minimum {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Minimize `f` starting from `x0`.
pub fn nelder_mead(f: impl Fn(&[f64]) -> f64, x0: &[f64], opts: &NelderMeadOptions) -> Minimum {
    let n = x0.len();
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: f(&[]),
            iterations: 0,
            termination: Termination::Converged,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(x0.to_vec());
    for i in 0..n {
        let mut v = x0.to_vec();
        v[i] += opts.initial_step;
        simplex.push(v);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

    let mut iterations = 0;
    let termination = loop {
        order_simplex(&mut simplex, &mut values);

        if has_converged(&simplex, &values, opts) {
            break Termination::Converged;
        }
        if iterations >= opts.max_iterations {
            break Termination::MaxIterations;
        }
        if opts.deadline.is_some_and(|d| Instant::now() >= d) {
            break Termination::Deadline;
        }
        iterations += 1;

        let centroid = centroid(&simplex[..n]);
        let worst = &simplex[n];

        let reflected = along(&centroid, worst, -REFLECT);
        let fr = f(&reflected);

        if fr < values[0] {
            let expanded = along(&centroid, worst, -EXPAND);
            let fe = f(&expanded);
            if fe < fr {
                simplex[n] = expanded;
                values[n] = fe;
            } else {
                simplex[n] = reflected;
                values[n] = fr;
            }
            continue;
        }

        if fr < values[n - 1] {
            simplex[n] = reflected;
            values[n] = fr;
            continue;
        }

        // Contract towards the better of the worst vertex and its reflection.
        let (contracted, fc) = if fr < values[n] {
            let c = along(&centroid, &reflected, CONTRACT);
            let fc = f(&c);
            (c, fc)
        } else {
            let c = along(&centroid, worst, CONTRACT);
            let fc = f(&c);
            (c, fc)
        };
        if fc < values[n].min(fr) {
            simplex[n] = contracted;
            values[n] = fc;
            continue;
        }

        let best = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = along(&best, &simplex[i], SHRINK);
            values[i] = f(&simplex[i]);
        }
    };

    order_simplex(&mut simplex, &mut values);
    Minimum {
        x: simplex.swap_remove(0),
        value: values[0],
        iterations,
        termination,
    }
}

/// Sort vertices by objective value (best first), stable for ties.
fn order_simplex(simplex: &mut Vec<Vec<f64>>, values: &mut Vec<f64>) {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    *simplex = idx.iter().map(|&i| simplex[i].clone()).collect();
    *values = idx.iter().map(|&i| values[i]).collect();
}

fn has_converged(simplex: &[Vec<f64>], values: &[f64], opts: &NelderMeadOptions) -> bool {
    let best = values[0];
    let worst = values[values.len() - 1];
    if !best.is_finite() || !worst.is_finite() {
        return false;
    }
    if worst - best > opts.f_tolerance * (1.0 + best.abs()) {
        return false;
    }
    simplex[1..].iter().all(|v| {
        v.iter()
            .zip(&simplex[0])
            .all(|(a, b)| (a - b).abs() <= opts.x_tolerance)
    })
}

fn centroid(points: &[Vec<f64>]) -> Vec<f64> {
    let n = points.len() as f64;
    let mut c = vec![0.0; points[0].len()];
    for p in points {
        for (ci, pi) in c.iter_mut().zip(p) {
            *ci += pi;
        }
    }
    c.iter_mut().for_each(|ci| *ci /= n);
    c
}

/// `origin + t * (target - origin)`.
fn along(origin: &[f64], target: &[f64], t: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(target)
        .map(|(o, x)| o + t * (x - o))
        .collect()
}
