//! 一维分段线性插值
//!
//! 规则：
//!
//! - `xp` 必须单调递增
//! - `x` 小于 `xp[0]` 返回 `fp[0]`，大于最后一个采样点返回最后一个 `fp`（边缘钳位，不外推）
//! - `x` 恰好落在采样点上时返回该点的 `fp`

/// 在 `(xp, fp)` 上插值
///
/// `xp` 为空或 `x` 为 NaN 时返回 NaN。`xp` 与 `fp` 长度不一致时按较短者截断。
#[inline]
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let n = xp.len().min(fp.len());
    if n == 0 || x.is_nan() {
        return f64::NAN;
    }
    let (xp, fp) = (&xp[..n], &fp[..n]);

    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }

    // xp[i] <= x < xp[i + 1]
    let i = xp.partition_point(|&v| v <= x) - 1;
    let slope = (fp[i + 1] - fp[i]) / (xp[i + 1] - xp[i]);
    fp[i] + slope * (x - xp[i])
}

/// 列的单调方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotonic {
    /// 非递减
    Ascending,
    /// 非递增
    Descending,
}

/// 判断列的单调方向，非单调返回 `None`
///
/// 少于两个点的列视为递增。
pub fn monotonic(column: &[f64]) -> Option<Monotonic> {
    if column.iter().any(|v| v.is_nan()) {
        return None;
    }
    let ascending = column.windows(2).all(|w| w[0] <= w[1]);
    let descending = column.windows(2).all(|w| w[0] >= w[1]);
    match (ascending, descending) {
        (true, _) => Some(Monotonic::Ascending),
        (false, true) => Some(Monotonic::Descending),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XP: [f64; 4] = [0.0, 10.0, 20.0, 30.0];
    const FP: [f64; 4] = [0.0, 1.0, 2.0, 3.0];

    #[test]
    fn test_interior() {
        assert_eq!(interp(15.0, &XP, &FP), 1.5);
        assert_eq!(interp(25.0, &XP, &FP), 2.5);
        assert_eq!(interp(2.5, &FP, &XP), 25.0);
    }

    #[test]
    fn test_sample_points() {
        for (x, f) in XP.iter().zip(FP.iter()) {
            assert_eq!(interp(*x, &XP, &FP), *f);
        }
    }

    #[test]
    fn test_edge_clamping() {
        assert_eq!(interp(-5.0, &XP, &FP), 0.0);
        assert_eq!(interp(35.0, &XP, &FP), 3.0);
        assert_eq!(interp(f64::NEG_INFINITY, &XP, &FP), 0.0);
        assert_eq!(interp(f64::INFINITY, &XP, &FP), 3.0);
    }

    #[test]
    fn test_degenerate() {
        assert!(interp(1.0, &[], &[]).is_nan());
        assert!(interp(f64::NAN, &XP, &FP).is_nan());
        assert_eq!(interp(7.0, &[1.0], &[4.0]), 4.0);
    }

    #[test]
    fn test_repeated_sample() {
        // 重复的 x 采样点不产生除零
        let xp = [0.0, 1.0, 1.0, 2.0];
        let fp = [0.0, 1.0, 5.0, 6.0];
        assert_eq!(interp(0.5, &xp, &fp), 0.5);
        assert_eq!(interp(1.5, &xp, &fp), 5.5);
    }

    #[test]
    fn test_monotonic() {
        assert_eq!(monotonic(&[0.0, 1.0, 1.0, 2.0]), Some(Monotonic::Ascending));
        assert_eq!(monotonic(&[3.0, 2.0, 0.0]), Some(Monotonic::Descending));
        assert_eq!(monotonic(&[0.0, 2.0, 1.0]), None);
        assert_eq!(monotonic(&[1.0]), Some(Monotonic::Ascending));
        assert_eq!(monotonic(&[0.0, f64::NAN]), None);
    }
}
