//! Dense vector of doubles

mod binding;

use crate::error::{BindError, Result};

/// Ordered, resizable sequence of `f64`; valid indices are `0..len`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FltVec {
    values: Vec<f64>,
}

impl FltVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FltVec {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_index(&self, index: i64) -> Result<usize> {
        if index < 0 || index as u64 >= self.values.len() as u64 {
            return Err(BindError::index_out_of_bounds(index, self.values.len()));
        }
        Ok(index as usize)
    }

    pub fn at(&self, index: i64) -> Result<f64> {
        let i = self.check_index(index)?;
        Ok(self.values[i])
    }

    pub fn put(&mut self, index: i64, value: f64) -> Result<()> {
        let i = self.check_index(index)?;
        self.values[i] = value;
        Ok(())
    }

    /// Append `value`; returns the new length
    pub fn push(&mut self, value: f64) -> usize {
        self.values.push(value);
        self.values.len()
    }

    pub fn extend_from_slice(&mut self, values: &[f64]) {
        self.values.extend_from_slice(values);
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc + v)
    }

    /// Index of the first maximal element
    pub fn max_idx(&self) -> Result<usize> {
        let (first, rest) = self
            .values
            .split_first()
            .ok_or_else(|| BindError::empty_vector("getMaxIdx"))?;
        let mut max_val = *first;
        let mut max_idx = 0;
        for (i, &v) in rest.iter().enumerate() {
            if v > max_val {
                max_val = v;
                max_idx = i + 1;
            }
        }
        Ok(max_idx)
    }

    /// Sorted copy; the receiver is left as is
    pub fn sorted(&self, ascending: bool) -> FltVec {
        let mut values = self.values.clone();
        if ascending {
            values.sort_by(f64::total_cmp);
        } else {
            values.sort_by(|a, b| b.total_cmp(a));
        }
        FltVec { values }
    }
}

impl From<Vec<f64>> for FltVec {
    fn from(values: Vec<f64>) -> Self {
        FltVec { values }
    }
}

impl FromIterator<f64> for FltVec {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        FltVec {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_then_at_last() {
        let mut v = FltVec::new();
        for x in [3.2, -1.0, 0.25] {
            let len = v.push(x);
            assert_eq!(v.at(len as i64 - 1), Ok(x));
        }
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn test_put_then_at() {
        let mut v = FltVec::from(vec![0.0; 4]);
        for i in 0..4 {
            v.put(i, i as f64 * 1.5).unwrap();
            assert_eq!(v.at(i), Ok(i as f64 * 1.5));
        }
    }

    #[test]
    fn test_index_out_of_bounds() {
        let mut v = FltVec::from(vec![1.0, 2.0]);
        assert_eq!(v.at(2), Err(BindError::index_out_of_bounds(2, 2)));
        assert_eq!(v.at(-1), Err(BindError::index_out_of_bounds(-1, 2)));
        assert_eq!(v.put(5, 0.0), Err(BindError::index_out_of_bounds(5, 2)));
        assert_eq!(v.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_at_on_empty() {
        let v = FltVec::new();
        assert_eq!(v.at(0).unwrap_err().kind(), "IndexOutOfBounds");
    }

    #[test]
    fn test_sum_keeps_fractions() {
        let v = FltVec::from(vec![1.5, 2.5, 3.0]);
        assert_eq!(v.sum(), 7.0);
        let v = FltVec::from(vec![0.25, 0.25, 0.25]);
        assert_eq!(v.sum(), 0.75);
        assert_eq!(FltVec::new().sum(), 0.0);
    }

    #[test]
    fn test_max_idx_first_occurrence() {
        let v = FltVec::from(vec![3.0, 5.0, 5.0, 1.0]);
        assert_eq!(v.max_idx(), Ok(1));
        let v = FltVec::from(vec![-2.0]);
        assert_eq!(v.max_idx(), Ok(0));
        let v = FltVec::from(vec![1.0, 1.0, 1.0]);
        assert_eq!(v.max_idx(), Ok(0));
    }

    #[test]
    fn test_max_idx_empty() {
        assert_eq!(
            FltVec::new().max_idx(),
            Err(BindError::EmptyVectorOperation {
                operation: "getMaxIdx".to_string()
            })
        );
    }

    #[test]
    fn test_sorted_is_a_copy() {
        let v = FltVec::from(vec![3.0, 1.0, 2.0]);
        assert_eq!(v.sorted(true).values(), &[1.0, 2.0, 3.0]);
        assert_eq!(v.sorted(false).values(), &[3.0, 2.0, 1.0]);
        assert_eq!(v.values(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_from_iterator() {
        let v: FltVec = (1..=3).map(f64::from).collect();
        assert_eq!(v.values(), &[1.0, 2.0, 3.0]);
    }
}
