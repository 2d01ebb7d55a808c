
/// Precomputed logistic function over `[-max_exp, max_exp]`.
#[derive(Clone, Debug)]
pub struct SigmoidTable {
    max_exp: f64,
    table: Vec<f64>,
}

impl SigmoidTable {

    pub fn new(max_exp: f64, size: usize) -> SigmoidTable {
        let table = (0..size)
        .map(|i| {
            let x = (i as f64 / size as f64 * 2.0 - 1.0) * max_exp;
            let e = x.exp();
            e / (e + 1.0)
        })
        .collect();
        SigmoidTable { max_exp, table }
    }

    pub fn sigmoid(&self, x: f64) -> f64 {
        if x >= self.max_exp {
            1.0
        } else if x <= -self.max_exp {
            0.0
        } else {
            let scale = self.table.len() as f64 / (2.0 * self.max_exp);
            let i = ((x + self.max_exp) * scale) as usize;
            self.table[i.min(self.table.len() - 1)]
        }
    }
}
