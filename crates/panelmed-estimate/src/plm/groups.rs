//! Grouping of observations by individual or period.

/// Convergence tolerance of the alternating projections used for twoways
/// demeaning.
const MAP_TOL: f64 = 1e-10;
const MAP_MAX_ITER: usize = 1000;

/// Observations partitioned by a group code.
///
/// Codes may be sparse (listwise deletion can empty a group); groups are
/// renumbered densely in code order.
#[derive(Debug, Clone)]
pub(crate) struct Groups {
    members: Vec<Vec<usize>>,
    of: Vec<usize>,
}

impl Groups {
    pub(crate) fn new(codes: &[usize]) -> Self {
        let max = codes.iter().copied().max().map_or(0, |m| m + 1);
        let mut dense = vec![usize::MAX; max];
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut of = Vec::with_capacity(codes.len());
        let mut order: Vec<usize> = codes.to_vec();
        order.sort_unstable();
        order.dedup();
        for code in order {
            dense[code] = members.len();
            members.push(Vec::new());
        }
        for (row, &code) in codes.iter().enumerate() {
            let group = dense[code];
            members[group].push(row);
            of.push(group);
        }
        Self { members, of }
    }

    pub(crate) fn len(&self) -> usize {
        self.members.len()
    }

    /// Dense group index of every observation.
    pub(crate) fn of(&self) -> &[usize] {
        &self.of
    }

    pub(crate) fn sizes(&self) -> Vec<usize> {
        self.members.iter().map(Vec::len).collect()
    }

    /// Mean of `v` within every group.
    pub(crate) fn means(&self, v: &[f64]) -> Vec<f64> {
        self.members
            .iter()
            .map(|rows| rows.iter().map(|&i| v[i]).sum::<f64>() / rows.len() as f64)
            .collect()
    }

    /// Subtract group means in place.
    pub(crate) fn demean(&self, v: &mut [f64]) {
        for (rows, mean) in self.members.iter().zip(self.means(v)) {
            for &i in rows {
                v[i] -= mean;
            }
        }
    }

    fn max_abs_mean(&self, v: &[f64]) -> f64 {
        self.means(v).into_iter().fold(0.0, |acc, m| acc.max(m.abs()))
    }

    /// True when every group has the same size.
    pub(crate) fn is_uniform(&self) -> bool {
        let sizes = self.sizes();
        sizes.windows(2).all(|pair| pair[0] == pair[1])
    }
}

/// Remove individual and period effects by alternating projections.
///
/// One sweep is exact for balanced panels; unbalanced panels iterate until
/// every group mean is below tolerance.
pub(crate) fn demean_twoways(v: &[f64], individuals: &Groups, periods: &Groups) -> Vec<f64> {
    let mut out = v.to_vec();
    for _ in 0..MAP_MAX_ITER {
        individuals.demean(&mut out);
        periods.demean(&mut out);
        if individuals.max_abs_mean(&out) < MAP_TOL {
            break;
        }
    }
    out
}
