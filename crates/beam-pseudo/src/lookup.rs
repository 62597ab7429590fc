//! 查找表
//!
//! 1 个伪轴 <-> 1 个真实轴，通过表格列之间的线性插值互相换算。
//!
//! 表格是不可变的二维网格：行是采样点，列是命名的轴。构造时校验：
//!
//! 1. 每个配置的轴名都出现在列名中（错误列出缺失的轴）
//! 2. 列名数量等于列数
//! 3. 两个配置的列都单调（递减的列会被反转后使用）
//!
//! 校验通过后，每个轴的限位设置为对应列的 `(min, max)`：伪轴直接设置，
//! 真实轴通过其限位接口设置，失败时只记 debug 日志。

use crate::axis::{AxisSet, PseudoAxisSpec};
use crate::error::{PseudoError, Result};
use crate::interp::{Monotonic, interp, monotonic};
use crate::position::{PseudoPosition, RealPosition};
use crate::transform::Transform;
use nalgebra::DMatrix;
use tracing::debug;

/// 二维数值表格
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    data: DMatrix<f64>,
}

impl Table {
    /// 由行创建
    ///
    /// 至少一行一列，所有行长度一致。
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if nrows == 0 || ncols == 0 {
            return Err(PseudoError::TableShape(format!(
                "table must be 2-dimensional with at least one sample, got {}x{}",
                nrows, ncols
            )));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.as_ref().len() != ncols)
        {
            return Err(PseudoError::TableShape(format!(
                "row {} has {} columns, expected {}",
                i,
                row.as_ref().len(),
                ncols
            )));
        }
        let data = DMatrix::from_fn(nrows, ncols, |r, c| rows[r].as_ref()[c]);
        Ok(Self { data })
    }

    /// 由矩阵创建
    pub fn from_matrix(data: DMatrix<f64>) -> Result<Self> {
        if data.nrows() == 0 || data.ncols() == 0 {
            return Err(PseudoError::TableShape(format!(
                "table must be 2-dimensional with at least one sample, got {}x{}",
                data.nrows(),
                data.ncols()
            )));
        }
        Ok(Self { data })
    }

    /// 采样点数量
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// 列数
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// 复制一列
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.ncols()).then(|| self.data.column(index).iter().copied().collect())
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.data
    }
}

/// 按 x 递增排列的一对列
#[derive(Debug, Clone, PartialEq)]
struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    fn new(x: Vec<f64>, y: Vec<f64>, order: Monotonic) -> Self {
        match order {
            Monotonic::Ascending => Self { x, y },
            Monotonic::Descending => Self {
                x: x.into_iter().rev().collect(),
                y: y.into_iter().rev().collect(),
            },
        }
    }

    fn eval(&self, x: f64) -> f64 {
        interp(x, &self.x, &self.y)
    }
}

/// 查找表变换
#[derive(Debug, Clone)]
pub struct LookupTable {
    table: Table,
    column_names: Vec<String>,
    // attach 之后才有
    forward_curve: Option<Curve>,
    inverse_curve: Option<Curve>,
}

impl LookupTable {
    /// 创建查找表
    ///
    /// 列名与轴的对应关系在绑定轴时校验。
    pub fn new<I, S>(table: Table, column_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table,
            column_names: column_names.into_iter().map(Into::into).collect(),
            forward_curve: None,
            inverse_curve: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// 按列名取列
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_names.iter().position(|n| n == name)?;
        self.table.column(index)
    }

    fn checked_column(&self, name: &str) -> Result<(Vec<f64>, Monotonic)> {
        let column = self
            .column(name)
            .ok_or_else(|| PseudoError::MissingColumns {
                axes: vec![name.to_string()],
            })?;
        let order = monotonic(&column).ok_or_else(|| PseudoError::NonMonotonic {
            column: name.to_string(),
        })?;
        Ok((column, order))
    }

    fn curves(&self) -> Result<(&Curve, &Curve)> {
        match (&self.forward_curve, &self.inverse_curve) {
            (Some(forward), Some(inverse)) => Ok((forward, inverse)),
            _ => Err(PseudoError::AbstractUsage(
                "LookupTable used before it was attached".to_string(),
            )),
        }
    }
}

impl Transform for LookupTable {
    /// 查找表没有默认伪轴，必须显式配置
    fn default_pseudo_axes(&self) -> Vec<PseudoAxisSpec> {
        Vec::new()
    }

    fn attach(&mut self, axes: &AxisSet) -> Result<()> {
        for (kind, actual) in [
            ("pseudo", axes.pseudo_axes().len()),
            ("real", axes.real_axes().len()),
        ] {
            if actual != 1 {
                return Err(PseudoError::UnsupportedAxisCount {
                    transform: "LookupTable",
                    kind,
                    expected: 1,
                    actual,
                });
            }
        }

        let mut missing: Vec<String> = axes
            .pseudo_names()
            .iter()
            .chain(axes.real_names().iter())
            .filter(|name| !self.column_names.iter().any(|c| c.as_str() == *name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(PseudoError::MissingColumns { axes: missing });
        }

        if self.column_names.len() != self.table.ncols() {
            return Err(PseudoError::ColumnCountMismatch {
                names: self.column_names.len(),
                columns: self.table.ncols(),
            });
        }

        let pseudo_axis = &axes.pseudo_axes()[0];
        let real_axis = &axes.real_axes()[0];
        let (pseudo_col, pseudo_order) = self.checked_column(pseudo_axis.name())?;
        let (real_col, real_order) = self.checked_column(real_axis.name())?;

        let (low, high) = column_range(&pseudo_col);
        pseudo_axis.set_limits((low, high));

        let (low, high) = column_range(&real_col);
        if let Err(e) = real_axis.positioner().set_limits((low, high)) {
            debug!(
                "Failed to set limits of {} to ({}, {}): {}",
                real_axis.name(),
                low,
                high,
                e
            );
        }

        self.forward_curve = Some(Curve::new(
            pseudo_col.clone(),
            real_col.clone(),
            pseudo_order,
        ));
        self.inverse_curve = Some(Curve::new(real_col, pseudo_col, real_order));
        Ok(())
    }

    fn forward(&self, axes: &AxisSet, pseudo: &PseudoPosition) -> Result<RealPosition> {
        let (forward, _) = self.curves()?;
        let x = pseudo.values().first().copied().unwrap_or(f64::NAN);
        RealPosition::new(axes.real_names(), [forward.eval(x)])
    }

    fn inverse(&self, axes: &AxisSet, real: &RealPosition) -> Result<PseudoPosition> {
        let (_, inverse) = self.curves()?;
        let x = real.values().first().copied().unwrap_or(f64::NAN);
        PseudoPosition::new(axes.pseudo_names(), [inverse.eval(x)])
    }
}

fn column_range(column: &[f64]) -> (f64, f64) {
    column
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), &v| {
            (low.min(v), high.max(v))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_rows() {
        let table = Table::from_rows(&[[0.0, 0.0], [1.0, 10.0], [2.0, 20.0]]).unwrap();
        assert_eq!(table.nrows(), 3);
        assert_eq!(table.ncols(), 2);
        assert_eq!(table.column(1), Some(vec![0.0, 10.0, 20.0]));
        assert_eq!(table.column(2), None);
    }

    #[test]
    fn test_table_shape_errors() {
        let empty: [[f64; 2]; 0] = [];
        assert!(matches!(
            Table::from_rows(&empty),
            Err(PseudoError::TableShape(_))
        ));

        let ragged = vec![vec![0.0, 1.0], vec![2.0]];
        assert!(matches!(
            Table::from_rows(&ragged),
            Err(PseudoError::TableShape(_))
        ));

        assert!(Table::from_matrix(DMatrix::zeros(0, 2)).is_err());
    }

    #[test]
    fn test_column_by_name() {
        let table = Table::from_rows(&[[0.0, 5.0], [1.0, 6.0]]).unwrap();
        let lut = LookupTable::new(table, ["real", "pseudo"]);
        assert_eq!(lut.column("pseudo"), Some(vec![5.0, 6.0]));
        assert_eq!(lut.column("nope"), None);
        assert_eq!(lut.column_names(), &["real".to_string(), "pseudo".to_string()]);
    }

    #[test]
    fn test_curve_reverses_descending() {
        let curve = Curve::new(vec![3.0, 2.0, 1.0], vec![30.0, 20.0, 10.0], Monotonic::Descending);
        assert_eq!(curve.x, vec![1.0, 2.0, 3.0]);
        assert_eq!(curve.eval(1.5), 15.0);
    }

    #[test]
    fn test_column_range() {
        assert_eq!(column_range(&[3.0, -1.0, 2.0]), (-1.0, 3.0));
    }
}
